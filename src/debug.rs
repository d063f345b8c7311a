//! State dumps for diagnosing programs that hit an unknown opcode or a
//! stack fault. Both views borrow the engine and format lazily.

use std::fmt;

use crate::emulator::Emulator;

const ROW_BYTES: usize = 16;

/// V0..VF, PC, I, stack, timers and execution state.
pub struct RegisterDump<'a>(&'a Emulator);

/// Hex dump, 16 bytes per row. Runs of all-zero rows collapse into `*`.
pub struct MemoryDump<'a>(&'a Emulator);

impl Emulator {
    pub fn dump_registers(&self) -> RegisterDump<'_> {
        RegisterDump(self)
    }

    pub fn dump_memory(&self) -> MemoryDump<'_> {
        MemoryDump(self)
    }
}

impl fmt::Display for RegisterDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let emu = self.0;
        for row in 0..2u8 {
            for col in 0..8u8 {
                let reg = row * 8 + col;
                if col > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "V{reg:X} {:02X}", emu.register(reg))?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "PC {:03X}  I {:04X}  SP {}  top ",
            emu.pc(),
            emu.index(),
            emu.stack_depth()
        )?;
        match emu.stack_top() {
            Some(addr) => writeln!(f, "{addr:03X}")?,
            None => writeln!(f, "---")?,
        }
        write!(
            f,
            "DT {:02X}  ST {:02X}  state {:?}",
            emu.delay_timer(),
            emu.sound_timer(),
            emu.state()
        )
    }
}

impl fmt::Display for MemoryDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut skipping = false;
        for (row, chunk) in self.0.memory().chunks(ROW_BYTES).enumerate() {
            if chunk.iter().all(|&b| b == 0) {
                if !skipping {
                    writeln!(f, "*")?;
                    skipping = true;
                }
                continue;
            }
            skipping = false;
            write!(f, "{:03X}:", row * ROW_BYTES)?;
            for byte in chunk {
                write!(f, " {byte:02X}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
