use crate::memory::TypeAddr;

pub type Result<T> = std::result::Result<T, EmuError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmuError {
    #[error("stack overflow: call at {pc:#05X} exceeds 16 nested subroutines")]
    StackOverflow { pc: TypeAddr },

    #[error("stack underflow: return at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: TypeAddr },

    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("engine halted after an earlier fault: {cause}")]
    Halted { cause: Box<EmuError> },
}
