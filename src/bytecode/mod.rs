pub mod chunk;
pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod op;

pub use chunk::{Chunk, POOL_MAX};
pub use op::Opcode;
