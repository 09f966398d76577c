/// A terminating runtime error.
///
/// Policy: no local recovery. The VM surfaces exactly one of these per run;
/// the driver prints it to stderr and exits non-zero. Messages are full
/// sentences ending with a period.
#[derive(Debug)]
pub struct RuntimeError {
    pub message: String,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

impl RuntimeError {
    pub fn new(msg: impl Into<String>) -> Self {
        RuntimeError {
            message: msg.into(),
        }
    }
}

pub fn undefined_variable(name: &str) -> RuntimeError {
    RuntimeError::new(format!("Variable '{}' is not defined.", name))
}

pub fn undefined_function(name: &str) -> RuntimeError {
    RuntimeError::new(format!("Function '{}' is not defined.", name))
}

pub fn arity_mismatch(name: &str, arity: u8, got: u8) -> RuntimeError {
    RuntimeError::new(format!(
        "Function '{}' expects {} arguments but got {}.",
        name, arity, got
    ))
}

pub fn type_error(expected: &str, got: &str) -> RuntimeError {
    RuntimeError::new(format!("Expected {} but got {}.", expected, got))
}

pub fn stack_overflow() -> RuntimeError {
    RuntimeError::new("Stack overflow.")
}

pub fn stack_underflow() -> RuntimeError {
    RuntimeError::new("Stack underflow.")
}
