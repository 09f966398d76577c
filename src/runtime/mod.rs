pub mod runtime_error;
pub mod value;
pub mod vm;

pub use value::Value;
pub use vm::Vm;
