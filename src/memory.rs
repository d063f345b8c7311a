use crate::{
    error::{EmuError, Result},
    registers::{IndexRegister, ProgramCounter},
};

pub type TypeAddr = u16; // in reality u12

pub const MEMORY_SIZE: usize = 4096;
pub const ADDRESS_MASK: TypeAddr = 0x0FFF;
pub const PROGRAM_START: TypeAddr = 0x200;
pub const STACK_DEPTH: usize = 16;
pub const GLYPH_HEIGHT: u16 = 5;

type FontBytes = [u8; 5 * 16];

pub const GLYPH_TABLE: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub struct Memory {
    // 4k bytes, boxed so host views survive moves of the owner
    // glyphs stored from 000 -> 04F, programs start at 200
    bytes: Box<[u8; MEMORY_SIZE]>,
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    pub stack: Stack,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0; MEMORY_SIZE]),
            pc: ProgramCounter(PROGRAM_START),
            index: IndexRegister(0x0),
            stack: Stack::new(),
        }
    }

    pub fn set(&mut self, addr: TypeAddr, val: u8) {
        self.bytes[(addr & ADDRESS_MASK) as usize] = val;
    }

    pub fn get(&self, addr: TypeAddr) -> u8 {
        self.bytes[(addr & ADDRESS_MASK) as usize]
    }

    pub fn increment_pc(&mut self) {
        self.pc.increment();
    }

    /// Big-endian word at PC. Does not move PC.
    pub fn next_instruction(&self) -> u16 {
        let (l, r) = (self.get(self.pc.0), self.get(self.pc.0.wrapping_add(1)));
        ((l as u16) << 8) | r as u16
    }

    pub fn set_pc(&mut self, addr: TypeAddr) {
        self.pc.set_addr(addr);
    }

    pub fn set_index(&mut self, addr: u16) {
        self.index.set_addr(addr);
    }

    /// Byte at `I + offset`, masked to the address width.
    pub fn get_indexed(&self, offset: u16) -> u8 {
        self.get(self.index.offset(offset))
    }

    pub fn set_indexed(&mut self, offset: u16, val: u8) {
        self.set(self.index.offset(offset), val);
    }

    pub fn load_glyph_table(&mut self) {
        self.bytes[..GLYPH_TABLE.len()].copy_from_slice(&GLYPH_TABLE);
    }

    pub fn glyph_address(digit: u8) -> TypeAddr {
        (digit & 0xF) as TypeAddr * GLYPH_HEIGHT
    }

    // loads program instructions starting at address 0x200
    pub fn load_program(&mut self, bytes: &[u8]) -> Result<()> {
        let start_index = PROGRAM_START as usize;
        let max = MEMORY_SIZE - start_index;
        if bytes.len() > max {
            return Err(EmuError::ProgramTooLarge {
                size: bytes.len(),
                max,
            });
        }
        self.bytes[start_index..start_index + bytes.len()].copy_from_slice(bytes);
        log::debug!("loaded {} byte program at {:#05X}", bytes.len(), PROGRAM_START);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.pc = ProgramCounter(PROGRAM_START);
        self.index = IndexRegister(0x0);
        self.stack.clear();
    }

    pub fn bytes(&self) -> &[u8; MEMORY_SIZE] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8; MEMORY_SIZE] {
        &mut self.bytes
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Stack {
    addresses: [TypeAddr; STACK_DEPTH],
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    /// `pc` is only used to describe the failure.
    pub fn push(&mut self, addr: TypeAddr, pc: TypeAddr) -> Result<()> {
        if self.sp == STACK_DEPTH {
            return Err(EmuError::StackOverflow { pc });
        }
        self.addresses[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self, pc: TypeAddr) -> Result<TypeAddr> {
        if self.sp == 0 {
            return Err(EmuError::StackUnderflow { pc });
        }
        self.sp -= 1;
        Ok(self.addresses[self.sp])
    }

    /// Most recent return address, if any.
    pub fn top(&self) -> Option<TypeAddr> {
        self.sp.checked_sub(1).map(|i| self.addresses[i])
    }

    pub fn depth(&self) -> usize {
        self.sp
    }

    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    pub fn clear(&mut self) {
        self.addresses = [0; STACK_DEPTH];
        self.sp = 0;
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
