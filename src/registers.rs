use crate::memory::{TypeAddr, ADDRESS_MASK};

pub const REGISTER_COUNT: usize = 16;
pub const FLAG_REGISTER: u8 = 0xF;

pub struct Registers {
    registers: [u8; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
        }
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[(reg_num & 0xF) as usize] = value;
    }

    /// 7XNN: wraps silently, VF is left alone.
    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let reg = &mut self.registers[(reg_num & 0xF) as usize];
        *reg = reg.wrapping_add(value);
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[(reg_num & 0xF) as usize]
    }

    pub fn set_flag(&mut self, value: bool) {
        self.set_register(FLAG_REGISTER, value as u8);
    }

    pub fn clear(&mut self) {
        self.registers.fill(0);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl ProgramCounter {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(2) & ADDRESS_MASK;
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr & ADDRESS_MASK;
    }
}

/// Holds a full 16-bit value; only masked when used to address memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRegister(pub u16);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: u16) {
        self.0 = addr;
    }

    pub fn offset(&self, by: u16) -> TypeAddr {
        self.0.wrapping_add(by) & ADDRESS_MASK
    }
}
