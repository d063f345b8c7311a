use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::{
    config::{Config, Quirks},
    decode::OpCodes,
    display::{FrameBuffer, CELL_COUNT},
    error::{EmuError, Result},
    keyboard::{Keypad, KEY_COUNT},
    memory::{Memory, TypeAddr, MEMORY_SIZE},
    registers::{Registers, FLAG_REGISTER},
    timer::{Clock, SystemClock, Timers},
};

/// Execution mode between two `step` calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecState {
    Running,
    /// FX0A is parked on `register`. `held` is the key mask seen on the
    /// previous check; only keys going down after that complete the wait.
    AwaitingKey { register: u8, held: u16 },
    /// A stack fault stopped the engine until the next reset.
    Faulted(EmuError),
}

/// What a single `step` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(OpCodes),
    AwaitingKey,
    Unrecognized(u16),
}

pub struct Emulator {
    fb: FrameBuffer,
    regs: Registers,
    mem: Memory,
    keypad: Keypad,
    timers: Timers,
    state: ExecState,
    quirks: Quirks,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore>,
}

impl Emulator {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_parts(config, Box::new(SystemClock::new()), Box::new(rng))
    }

    /// Full control over time and entropy sources, for deterministic hosts.
    pub fn with_parts(config: Config, clock: Box<dyn Clock>, rng: Box<dyn RngCore>) -> Self {
        let timers = Timers::new(config.timer_mode, clock.now());
        Self {
            fb: FrameBuffer::new(),
            regs: Registers::new(),
            mem: Memory::new(),
            keypad: Keypad::new(),
            timers,
            state: ExecState::Running,
            quirks: config.quirks,
            clock,
            rng,
        }
    }

    pub fn load_glyph_table(&mut self) {
        self.mem.load_glyph_table();
    }

    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.mem.load_program(program)
    }

    /// Back to the power-on state. Storage is zeroed in place, so raw views
    /// taken earlier stay valid. The program image is gone afterwards.
    /// The blanked screen is flagged dirty; key state belongs to the host
    /// and is left as is.
    pub fn reset(&mut self) {
        self.mem.clear();
        self.regs.clear();
        self.fb.clear_buffer();
        self.timers.reset(self.clock.now());
        self.state = ExecState::Running;
    }

    pub fn step(&mut self) -> Result<StepOutcome> {
        let outcome = match self.state.clone() {
            ExecState::Faulted(cause) => {
                return Err(EmuError::Halted {
                    cause: Box::new(cause),
                })
            }
            ExecState::AwaitingKey { register, held } => self.poll_key(register, held),
            ExecState::Running => {
                let pc = self.mem.pc.0;
                let ins = self.fetch_decode();
                log::trace!("{pc:03X}: {ins}");
                match self.execute_ins(ins, pc) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        log::error!("{err}");
                        self.mem.set_pc(pc);
                        self.state = ExecState::Faulted(err.clone());
                        return Err(err);
                    }
                }
            }
        };
        self.timers.sync(self.clock.now());
        Ok(outcome)
    }

    /// Reads the word at PC and moves PC past it.
    pub fn fetch_decode(&mut self) -> OpCodes {
        let ins = self.mem.next_instruction();
        self.mem.increment_pc();
        OpCodes::decode_raw(ins)
    }

    fn poll_key(&mut self, register: u8, held: u16) -> StepOutcome {
        let pressed = self.keypad.pressed_mask();
        let fresh = pressed & !held;
        if fresh == 0 {
            self.state = ExecState::AwaitingKey {
                register,
                held: pressed,
            };
            return StepOutcome::AwaitingKey;
        }
        let key = fresh.trailing_zeros() as u8;
        log::debug!("key {key:X} pressed, stored in V{register:X}");
        self.regs.set_register(register, key);
        self.mem.increment_pc();
        self.state = ExecState::Running;
        StepOutcome::Executed(OpCodes::GetKey(register))
    }

    /// Applies one decoded instruction. PC already points past it; `pc` is the
    /// instruction's own address.
    pub fn execute_ins(&mut self, ins: OpCodes, pc: TypeAddr) -> Result<StepOutcome> {
        match ins {
            OpCodes::MachineCall(_) => {}
            OpCodes::Jump(addr) => {
                self.mem.set_pc(addr);
            }
            OpCodes::SetRegister(vx, nn) => {
                self.regs.set_register(vx, nn);
            }
            OpCodes::AddToRegister(vx, nn) => {
                self.regs.add_to_register(vx, nn);
            }
            OpCodes::SetIndexRegister(addr) => self.mem.set_index(addr),
            OpCodes::ClearScreen => {
                self.fb.clear_buffer();
            }
            OpCodes::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x), self.regs.get(reg_y));
                // From I to I + N, plot at VX, VY
                let sprite: Vec<u8> = (0..height as u16)
                    .map(|row| self.mem.get_indexed(row))
                    .collect();

                let vf = self.fb.paint(x, y, &sprite);
                self.regs.set_flag(vf);
            }
            OpCodes::PushSubroutine(addr) => {
                // return to the instruction after the call
                self.mem.stack.push(self.mem.pc.0, pc)?;
                self.mem.set_pc(addr);
            }
            OpCodes::PopSubroutine => {
                let addr = self.mem.stack.pop(pc)?;
                self.mem.set_pc(addr);
            }
            OpCodes::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy));
            }
            OpCodes::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) | self.regs.get(vx));
                self.logic_flag();
            }
            OpCodes::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) & self.regs.get(vx));
                self.logic_flag();
            }
            OpCodes::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) ^ self.regs.get(vx));
                self.logic_flag();
            }
            // arithmetic writes VF last so the flag wins when X is F
            OpCodes::Add(vx, vy) => {
                let (sum, carry) = self.regs.get(vx).overflowing_add(self.regs.get(vy));
                self.regs.set_register(vx, sum);
                self.regs.set_flag(carry);
            }
            OpCodes::SubtractForward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, x.wrapping_sub(y));
                self.regs.set_flag(x >= y); // 1 = no borrow
            }
            OpCodes::SubtractBackward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, y.wrapping_sub(x));
                self.regs.set_flag(y >= x);
            }
            OpCodes::LeftShift(vx, vy) => {
                let value = self.shift_source(vx, vy);
                self.regs.set_register(vx, value << 1);
                self.regs.set_register(FLAG_REGISTER, (value >> 7) & 1);
            }
            OpCodes::RightShift(vx, vy) => {
                let value = self.shift_source(vx, vy);
                self.regs.set_register(vx, value >> 1);
                self.regs.set_register(FLAG_REGISTER, value & 1);
            }
            OpCodes::Random(vx, nn) => {
                let byte = (self.rng.next_u32() & 0xFF) as u8;
                self.regs.set_register(vx, nn & byte);
            }
            OpCodes::JumpWithOffset(addr) => {
                let offset = if self.quirks.jump_uses_vx {
                    self.regs.get((addr >> 8) as u8)
                } else {
                    self.regs.get(0)
                };
                self.mem.set_pc(addr + offset as u16);
            }
            OpCodes::AddToIndex(vx) => {
                self.mem
                    .set_index(self.mem.index.0.wrapping_add(self.regs.get(vx) as u16));
            }
            OpCodes::SkipEqualConstant(vx, nn) => {
                if self.regs.get(vx) == nn {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipNotEqualConstant(vx, nn) => {
                if self.regs.get(vx) != nn {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipEqualRegister(vx, vy) => {
                if self.regs.get(vx) == self.regs.get(vy) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipNotEqualRegister(vx, vy) => {
                if self.regs.get(vx) != self.regs.get(vy) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::PointChar(vx) => {
                let addr = Memory::glyph_address(self.regs.get(vx));
                self.mem.set_index(addr);
            }
            OpCodes::ToDecimal(vx) => {
                let value = self.regs.get(vx);
                let digits = [value / 100, (value / 10) % 10, value % 10];
                for (i, digit) in digits.into_iter().enumerate() {
                    self.mem.set_indexed(i as u16, digit);
                }
            }
            OpCodes::SkipIfPressed(vx) => {
                if self.keypad.is_pressed(self.regs.get(vx)) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipIfNotPressed(vx) => {
                if !self.keypad.is_pressed(self.regs.get(vx)) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::CopyDelayToRegister(vx) => self.regs.set_register(vx, self.timers.delay.count),
            OpCodes::CopyRegisterToDelay(vx) => self.timers.delay.set(self.regs.get(vx)),
            OpCodes::CopyRegisterToSound(vx) => self.timers.sound.set(self.regs.get(vx)),
            OpCodes::GetKey(vx) => {
                // park on this instruction until a key goes down
                self.mem.set_pc(pc);
                self.state = ExecState::AwaitingKey {
                    register: vx,
                    held: self.keypad.pressed_mask(),
                };
                log::debug!("waiting for key into V{vx:X}");
                return Ok(StepOutcome::AwaitingKey);
            }
            OpCodes::LoadRegisterFromMemory(vx) => {
                for reg in 0..=vx {
                    let reg_val = self.mem.get_indexed(reg as u16);
                    self.regs.set_register(reg, reg_val);
                }
            }
            OpCodes::StoreRegisterToMemory(vx) => {
                for reg in 0..=vx {
                    let reg_val = self.regs.get(reg);
                    self.mem.set_indexed(reg as u16, reg_val);
                }
            }
            OpCodes::Unimplemented(word) => {
                log::warn!("unrecognized opcode {word:04X} at {pc:03X}, skipping");
                return Ok(StepOutcome::Unrecognized(word));
            }
        }
        Ok(StepOutcome::Executed(ins))
    }

    fn shift_source(&self, vx: u8, vy: u8) -> u8 {
        if self.quirks.shift_uses_vy {
            self.regs.get(vy)
        } else {
            self.regs.get(vx)
        }
    }

    fn logic_flag(&mut self) {
        if self.quirks.logic_resets_vf {
            self.regs.set_register(FLAG_REGISTER, 0);
        }
    }

    // host-facing views; the backing arrays are boxed and never reallocated

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        self.mem.bytes()
    }

    pub fn memory_mut(&mut self) -> &mut [u8; MEMORY_SIZE] {
        self.mem.bytes_mut()
    }

    pub fn memory_ptr(&self) -> *const u8 {
        self.mem.bytes().as_ptr()
    }

    pub fn frame_buffer(&self) -> &[u8; CELL_COUNT] {
        self.fb.cells()
    }

    pub fn frame_buffer_ptr(&self) -> *const u8 {
        self.fb.cells().as_ptr()
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        self.keypad.keys()
    }

    pub fn keys_mut(&mut self) -> &mut [bool; KEY_COUNT] {
        self.keypad.keys_mut()
    }

    pub fn keys_ptr(&mut self) -> *mut bool {
        self.keypad.keys_mut().as_mut_ptr()
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.keypad.set(key, pressed);
    }

    pub fn draw_flag(&self) -> bool {
        self.fb.is_dirty()
    }

    pub fn clear_draw_flag(&mut self) {
        self.fb.clear_dirty();
    }

    pub fn pc(&self) -> TypeAddr {
        self.mem.pc.0
    }

    pub fn index(&self) -> u16 {
        self.mem.index.0
    }

    pub fn register(&self, reg_num: u8) -> u8 {
        self.regs.get(reg_num)
    }

    pub fn stack_depth(&self) -> usize {
        self.mem.stack.depth()
    }

    pub fn stack_top(&self) -> Option<TypeAddr> {
        self.mem.stack.top()
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay.count
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound.count
    }

    pub fn is_sound_active(&self) -> bool {
        self.timers.is_sound_active()
    }

    pub fn state(&self) -> &ExecState {
        &self.state
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::{config::TimerMode, timer::ManualClock};

    fn emulator() -> (Emulator, ManualClock) {
        emulator_with(Config::default())
    }

    fn emulator_with(config: Config) -> (Emulator, ManualClock) {
        let clock = ManualClock::new();
        let emu = Emulator::with_parts(
            config,
            Box::new(clock.clone()),
            Box::new(StdRng::seed_from_u64(7)),
        );
        (emu, clock)
    }

    /// Loads `words` at 0x200 and runs one step per word.
    fn run(emu: &mut Emulator, words: &[u16]) {
        let program: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        emu.load_program(&program).unwrap();
        for _ in words {
            emu.step().unwrap();
        }
    }

    #[test]
    fn ret() {
        let (mut emu, _) = emulator();
        emu.mem.stack.push(0x2E, 0x200).unwrap();
        run(&mut emu, &[0x00EE]);

        assert_eq!(emu.stack_depth(), 0);
        assert_eq!(emu.pc(), 0x2E);
    }

    #[test]
    fn jp_addr() {
        let (mut emu, _) = emulator();
        run(&mut emu, &[0x1666]);

        assert_eq!(emu.pc(), 0x666);
    }

    #[test]
    fn call_addr() {
        let (mut emu, _) = emulator();
        run(&mut emu, &[0x2123]);

        assert_eq!(emu.stack_depth(), 1);
        assert_eq!(emu.pc(), 0x123);
        assert_eq!(emu.stack_top(), Some(0x202));
        assert_eq!(emu.mem.stack.pop(0).unwrap(), 0x202);
    }

    #[test]
    fn call_then_return() {
        let (mut emu, _) = emulator();
        emu.load_program(&[0x22, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0xEE])
            .unwrap();
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0x206);
        emu.step().unwrap();

        assert_eq!(emu.pc(), 0x202);
        assert_eq!(emu.stack_depth(), 0);
    }

    #[test]
    fn se_vx_byte() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xFF);
        run(&mut emu, &[0x3AFF]);
        assert_eq!(emu.pc(), 0x204);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xFA);
        run(&mut emu, &[0x3AFF]);
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn sne_vx_byte() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xB, 0xFF);
        run(&mut emu, &[0x4BFF]);
        assert_eq!(emu.pc(), 0x202);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xB, 0xFA);
        run(&mut emu, &[0x4BFF]);
        assert_eq!(emu.pc(), 0x204);
    }

    #[test]
    fn se_and_sne_vx_vy() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0x1, 0x42);
        emu.regs.set_register(0x2, 0x42);
        run(&mut emu, &[0x5120]);
        assert_eq!(emu.pc(), 0x204);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0x1, 0x42);
        run(&mut emu, &[0x9120]);
        assert_eq!(emu.pc(), 0x204);
    }

    #[test]
    fn add_vx_byte_wraps_without_flag() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xFF);
        emu.regs.set_register(0xF, 0x7);
        run(&mut emu, &[0x7A02]);

        assert_eq!(emu.register(0xA), 0x1);
        assert_eq!(emu.register(0xF), 0x7);
    }

    #[test]
    fn logic_ops() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x2F);
        emu.regs.set_register(0xB, 0xAB);
        emu.regs.set_register(0xF, 0x9);
        run(&mut emu, &[0x8AB2]);
        assert_eq!(emu.register(0xA), 0x2B);
        assert_eq!(emu.register(0xF), 0x9);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x0F);
        emu.regs.set_register(0xB, 0xF0);
        run(&mut emu, &[0x8AB1]);
        assert_eq!(emu.register(0xA), 0xFF);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xFF);
        emu.regs.set_register(0xB, 0x0F);
        run(&mut emu, &[0x8AB3]);
        assert_eq!(emu.register(0xA), 0xF0);
    }

    #[test]
    fn logic_ops_reset_vf_quirk() {
        let quirks = Quirks {
            logic_resets_vf: true,
            ..Quirks::default()
        };
        let (mut emu, _) = emulator_with(Config::default().quirks(quirks));
        emu.regs.set_register(0xF, 0x1);
        run(&mut emu, &[0x8AB1]);

        assert_eq!(emu.register(0xF), 0);
    }

    #[test]
    fn ld_vx_vy() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0x7, 0xAA);
        run(&mut emu, &[0x8070]);

        assert_eq!(emu.register(0x0), 0xAA);
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn add_vx_vy_carry() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x2F);
        emu.regs.set_register(0xB, 0xAB);
        run(&mut emu, &[0x8AB4]);
        assert_eq!(emu.register(0xA), 0xDA);
        assert_eq!(emu.register(0xF), 0);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xFF);
        emu.regs.set_register(0xB, 0x2);
        run(&mut emu, &[0x8AB4]);
        assert_eq!(emu.register(0xA), 0x1);
        assert_eq!(emu.register(0xF), 1);
    }

    #[test]
    fn flag_wins_when_vf_is_destination() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xF, 0xFF);
        emu.regs.set_register(0x1, 0x02);
        run(&mut emu, &[0x8F14]);

        assert_eq!(emu.register(0xF), 1);
    }

    #[test]
    fn sub_vx_vy_borrow() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xFF);
        emu.regs.set_register(0xB, 0xAA);
        run(&mut emu, &[0x8AB5]);
        assert_eq!(emu.register(0xA), 0x55);
        assert_eq!(emu.register(0xF), 1);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xAA);
        emu.regs.set_register(0xB, 0xFF);
        run(&mut emu, &[0x8AB5]);
        assert_eq!(emu.register(0xA), 0xAB);
        assert_eq!(emu.register(0xF), 0);
    }

    #[test]
    fn subn_vx_vy() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x10);
        emu.regs.set_register(0xB, 0x30);
        run(&mut emu, &[0x8AB7]);
        assert_eq!(emu.register(0xA), 0x20);
        assert_eq!(emu.register(0xF), 1);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x30);
        emu.regs.set_register(0xB, 0x10);
        run(&mut emu, &[0x8AB7]);
        assert_eq!(emu.register(0xA), 0xE0);
        assert_eq!(emu.register(0xF), 0);
    }

    #[test]
    fn shifts_set_bit_out() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0x3, 0b1000_0001);
        run(&mut emu, &[0x830E]);
        assert_eq!(emu.register(0x3), 0b0000_0010);
        assert_eq!(emu.register(0xF), 1);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0x3, 0b1000_0001);
        run(&mut emu, &[0x8306]);
        assert_eq!(emu.register(0x3), 0b0100_0000);
        assert_eq!(emu.register(0xF), 1);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0x3, 0b0000_0010);
        run(&mut emu, &[0x8306]);
        assert_eq!(emu.register(0xF), 0);
    }

    #[test]
    fn shift_uses_vy_quirk() {
        let quirks = Quirks {
            shift_uses_vy: true,
            ..Quirks::default()
        };
        let (mut emu, _) = emulator_with(Config::default().quirks(quirks));
        emu.regs.set_register(0x3, 0xFF);
        emu.regs.set_register(0x4, 0b0000_0110);
        run(&mut emu, &[0x8346]);

        assert_eq!(emu.register(0x3), 0b0000_0011);
        assert_eq!(emu.register(0xF), 0);
    }

    #[test]
    fn ld_i_addr() {
        let (mut emu, _) = emulator();
        run(&mut emu, &[0xA123]);

        assert_eq!(emu.index(), 0x123);
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn jp_v0_addr() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0x0, 0x10);
        emu.regs.set_register(0x3, 0x20);
        run(&mut emu, &[0xB300]);
        assert_eq!(emu.pc(), 0x310);

        let quirks = Quirks {
            jump_uses_vx: true,
            ..Quirks::default()
        };
        let (mut emu, _) = emulator_with(Config::default().quirks(quirks));
        emu.regs.set_register(0x0, 0x10);
        emu.regs.set_register(0x3, 0x20);
        run(&mut emu, &[0xB300]);
        assert_eq!(emu.pc(), 0x320);
    }

    #[test]
    fn jp_v0_addr_wraps_to_address_width() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0x0, 0xFF);
        run(&mut emu, &[0xBFFF]);

        assert_eq!(emu.pc(), 0x0FE);
    }

    #[test]
    fn rnd_vx_byte_uses_injected_rng() {
        let clock = ManualClock::new();
        let mut emu = Emulator::with_parts(
            Config::default(),
            Box::new(clock),
            Box::new(StepRng::new(0xAB, 0)),
        );
        run(&mut emu, &[0xCA0F]);

        assert_eq!(emu.register(0xA), 0x0B);
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let program = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF];
        let mut a = Emulator::with_config(Config::default().seed(99));
        let mut b = Emulator::with_config(Config::default().seed(99));
        a.load_program(&program).unwrap();
        b.load_program(&program).unwrap();
        for _ in 0..3 {
            a.step().unwrap();
            b.step().unwrap();
        }

        for reg in 0..3 {
            assert_eq!(a.register(reg), b.register(reg));
        }
    }

    #[test]
    fn drw_vx_vy_n() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x0);
        emu.regs.set_register(0xB, 0x0);
        emu.mem.set(0x300, 0x3C);
        emu.mem.set(0x301, 0xC3);
        emu.mem.set(0x302, 0xFF);
        run(&mut emu, &[0xA300, 0xDAB3]);

        assert_eq!(emu.register(0xF), 0);
        assert_eq!(&emu.frame_buffer()[0..8], &[0, 0, 1, 1, 1, 1, 0, 0]);
        assert_eq!(&emu.frame_buffer()[64..72], &[1, 1, 0, 0, 0, 0, 1, 1]);
        assert_eq!(&emu.frame_buffer()[128..136], &[1, 1, 1, 1, 1, 1, 1, 1]);
        assert!(emu.draw_flag());
        assert_eq!(emu.index(), 0x300);
    }

    #[test]
    fn drw_vx_vy_n_collision() {
        let (mut emu, _) = emulator();
        emu.mem.set(0x300, 0xFF);
        run(&mut emu, &[0xA300, 0xD011, 0xD011]);

        assert_eq!(emu.register(0xF), 1);
        assert!(emu.frame_buffer().iter().all(|&c| c == 0));
    }

    #[test]
    fn drw_zero_rows_still_marks_dirty() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xF, 1);
        run(&mut emu, &[0xD010]);

        assert!(emu.draw_flag());
        assert_eq!(emu.register(0xF), 0);
    }

    #[test]
    fn skp_and_sknp() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xF);
        emu.set_key(0xF, true);
        run(&mut emu, &[0xEA9E]);
        assert_eq!(emu.pc(), 0x204);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xF);
        run(&mut emu, &[0xEA9E]);
        assert_eq!(emu.pc(), 0x202);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xF);
        run(&mut emu, &[0xEAA1]);
        assert_eq!(emu.pc(), 0x204);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xF);
        emu.set_key(0xF, true);
        run(&mut emu, &[0xEAA1]);
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn timer_registers() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x7);
        run(&mut emu, &[0xFA15, 0xFA18, 0xFB07]);

        assert_eq!(emu.delay_timer(), 0x7);
        assert_eq!(emu.sound_timer(), 0x7);
        assert_eq!(emu.register(0xB), 0x7);
        assert!(emu.is_sound_active());
    }

    #[test]
    fn add_i_vx() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0x1, 0x10);
        emu.regs.set_register(0xF, 0x5);
        run(&mut emu, &[0xAFF8, 0xF11E]);

        assert_eq!(emu.index(), 0x1008);
        assert_eq!(emu.register(0xF), 0x5);
    }

    #[test]
    fn ld_f_vx() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x1);
        run(&mut emu, &[0xFA29]);
        assert_eq!(emu.index(), 0x5);

        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0xF);
        run(&mut emu, &[0xFA29]);
        assert_eq!(emu.index(), 0x4B);
    }

    #[test]
    fn ld_b_vx() {
        let (mut emu, _) = emulator();
        emu.regs.set_register(0xA, 0x7B);
        run(&mut emu, &[0xA400, 0xFA33]);

        assert_eq!(emu.memory()[0x400], 0x1);
        assert_eq!(emu.memory()[0x401], 0x2);
        assert_eq!(emu.memory()[0x402], 0x3);
        assert_eq!(emu.index(), 0x400);
    }

    #[test]
    fn store_and_load_registers() {
        let (mut emu, _) = emulator();
        for reg in 0..=3 {
            emu.regs.set_register(reg, 0x10 + reg);
        }
        run(&mut emu, &[0xA400, 0xF255]);

        assert_eq!(&emu.memory()[0x400..0x404], &[0x10, 0x11, 0x12, 0x00]);
        assert_eq!(emu.index(), 0x400);

        let (mut emu, _) = emulator();
        emu.mem.set(0x400, 0x1);
        emu.mem.set(0x401, 0x2);
        emu.mem.set(0x402, 0x3);
        run(&mut emu, &[0xA400, 0xF265]);

        assert_eq!(emu.register(0x0), 0x1);
        assert_eq!(emu.register(0x1), 0x2);
        assert_eq!(emu.register(0x2), 0x3);
        assert_eq!(emu.index(), 0x400);
    }

    #[test]
    fn machine_call_is_ignored() {
        let (mut emu, _) = emulator();
        emu.load_program(&[0x03, 0x45]).unwrap();

        assert_eq!(
            emu.step(),
            Ok(StepOutcome::Executed(OpCodes::MachineCall(0x345)))
        );
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn unrecognized_opcode_is_skipped() {
        let (mut emu, _) = emulator();
        emu.load_program(&[0xFF, 0xFF, 0x60, 0x01]).unwrap();

        assert_eq!(emu.step(), Ok(StepOutcome::Unrecognized(0xFFFF)));
        assert_eq!(emu.pc(), 0x202);
        emu.step().unwrap();
        assert_eq!(emu.register(0x0), 0x1);
    }

    #[test]
    fn stack_underflow_halts() {
        let (mut emu, _) = emulator();
        emu.load_program(&[0x00, 0xEE]).unwrap();

        assert_eq!(emu.step(), Err(EmuError::StackUnderflow { pc: 0x200 }));
        assert_eq!(emu.pc(), 0x200);
        assert_eq!(
            emu.state(),
            &ExecState::Faulted(EmuError::StackUnderflow { pc: 0x200 })
        );
        assert!(matches!(emu.step(), Err(EmuError::Halted { .. })));

        emu.reset();
        assert_eq!(emu.state(), &ExecState::Running);
    }

    #[test]
    fn stack_overflow_halts_without_side_effects() {
        let (mut emu, _) = emulator();
        // calls itself forever
        emu.load_program(&[0x22, 0x00]).unwrap();
        for _ in 0..16 {
            emu.step().unwrap();
        }
        emu.regs.set_register(0x5, 0x55);

        assert_eq!(emu.step(), Err(EmuError::StackOverflow { pc: 0x200 }));
        assert_eq!(emu.stack_depth(), 16);
        assert_eq!(emu.pc(), 0x200);
        assert_eq!(emu.register(0x5), 0x55);
    }

    #[test]
    fn get_key_waits_for_fresh_press() {
        let (mut emu, _) = emulator();
        emu.set_key(0x3, true);
        emu.load_program(&[0xF5, 0x0A]).unwrap();

        assert_eq!(emu.step(), Ok(StepOutcome::AwaitingKey));
        // key 3 was already down when the wait began
        assert_eq!(emu.step(), Ok(StepOutcome::AwaitingKey));
        assert_eq!(emu.pc(), 0x200);

        emu.set_key(0x3, false);
        assert_eq!(emu.step(), Ok(StepOutcome::AwaitingKey));
        emu.set_key(0x3, true);
        assert_eq!(
            emu.step(),
            Ok(StepOutcome::Executed(OpCodes::GetKey(0x5)))
        );
        assert_eq!(emu.register(0x5), 0x3);
        assert_eq!(emu.pc(), 0x202);
        assert_eq!(emu.state(), &ExecState::Running);
    }

    #[test]
    fn get_key_takes_lowest_new_key() {
        let (mut emu, _) = emulator();
        emu.load_program(&[0xF0, 0x0A]).unwrap();
        emu.step().unwrap();
        emu.set_key(0xC, true);
        emu.set_key(0x9, true);
        emu.step().unwrap();

        assert_eq!(emu.register(0x0), 0x9);
    }

    #[test]
    fn timers_keep_running_while_waiting() {
        let (mut emu, clock) = emulator();
        emu.regs.set_register(0x1, 10);
        run(&mut emu, &[0xF115, 0xF20A]);

        clock.advance_ticks(4);
        emu.step().unwrap();
        assert_eq!(emu.delay_timer(), 6);
    }

    #[test]
    fn per_step_timers() {
        let (mut emu, _) = emulator_with(Config::default().timer_mode(TimerMode::PerStep));
        emu.regs.set_register(0x1, 10);
        // set delay, then three no-op machine calls
        run(&mut emu, &[0xF115, 0x0000, 0x0000, 0x0000]);

        assert_eq!(emu.delay_timer(), 6);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let (mut emu, _) = emulator();
        emu.load_glyph_table();
        emu.regs.set_register(0x1, 10);
        run(&mut emu, &[0xF115, 0xA123, 0xD015, 0x2400]);
        emu.set_key(0x2, true);
        emu.clear_draw_flag();
        let (mem, fb) = (emu.memory_ptr(), emu.frame_buffer_ptr());

        emu.reset();

        assert_eq!(emu.pc(), 0x200);
        assert_eq!(emu.index(), 0);
        assert_eq!(emu.stack_depth(), 0);
        assert_eq!(emu.delay_timer(), 0);
        assert_eq!(emu.register(0x1), 0);
        assert!(emu.memory().iter().all(|&b| b == 0));
        assert!(emu.frame_buffer().iter().all(|&c| c == 0));
        // blanked screen must reach a host that only redraws on the flag
        assert!(emu.draw_flag());
        // keys are host-owned
        assert!(emu.keys()[0x2]);
        assert_eq!(emu.memory_ptr(), mem);
        assert_eq!(emu.frame_buffer_ptr(), fb);
    }
}
