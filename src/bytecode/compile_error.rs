#[derive(Debug, Clone)]
pub enum CompileError {
    /// The constant pool already holds 256 entries.
    ConstantPoolOverflow,
    /// The string pool already holds 256 entries.
    StringPoolOverflow,
    /// A forward jump spans more bytes than an i16 offset can encode.
    JumpTooLarge { bytes: usize },
    /// A function body starts past byte offset 255; the `OP_FUNC` location
    /// operand is a single byte.
    FunctionTooFar { name: String, location: usize },
    /// More than 255 parameters or arguments.
    TooManyArguments { name: String, count: usize },
    /// A function frame ran out of local slots.
    TooManyLocals { name: String },
    /// `fn` declared inside another function body.
    NestedFunction { name: String },
    /// `return` outside a function body.
    ReturnOutsideFunction,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "compile error: ")?;
        match self {
            CompileError::ConstantPoolOverflow => {
                write!(f, "too many constants in one chunk (max 256)")
            }
            CompileError::StringPoolOverflow => {
                write!(f, "too many strings in one chunk (max 256)")
            }
            CompileError::JumpTooLarge { bytes } => {
                write!(f, "jump of {} bytes exceeds the i16 offset range", bytes)
            }
            CompileError::FunctionTooFar { name, location } => {
                write!(
                    f,
                    "function '{}' starts at byte {}, beyond the u8 location range",
                    name, location
                )
            }
            CompileError::TooManyArguments { name, count } => {
                write!(f, "'{}' takes {} arguments (max 255)", name, count)
            }
            CompileError::TooManyLocals { name } => {
                write!(f, "too many locals in function '{}' (max 256)", name)
            }
            CompileError::NestedFunction { name } => {
                write!(
                    f,
                    "function '{}' is declared inside another function; nested functions are not supported",
                    name
                )
            }
            CompileError::ReturnOutsideFunction => {
                write!(f, "'return' outside of a function body")
            }
        }
    }
}

impl std::error::Error for CompileError {}
