// 16 8-bit data registers named V0 to VF, VF doubles as the flag register
// I -> address register, 12 bits wide when used as an address
//
// 16 level return stack
//
// Delay timer & Sound timer: Count down at 60 times / s until 0
// Display res: 64 width, 32 height, monochrome
//
// 35 opcodes, each are 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier
//
// The host owns the window, input and program loading; it drives the engine
// by writing key state, calling `step` and reading the frame buffer.

pub mod config;
pub mod debug;
pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod timer;

pub use config::{Config, Quirks, TimerMode};
pub use debug::{MemoryDump, RegisterDump};
pub use decode::OpCodes;
pub use display::{HEIGHT, WIDTH};
pub use emulator::{Emulator, ExecState, StepOutcome};
pub use error::{EmuError, Result};
pub use memory::PROGRAM_START;
pub use timer::{Clock, ManualClock, SystemClock};
