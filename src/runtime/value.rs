/// Runtime value in the venom VM.
///
/// Every stack slot holds exactly one `Value`; the tag determines which
/// payload is valid. Arithmetic opcodes require `Number`, conditional
/// jumps require `Bool`, and `OP_RET` requires a `Pointer` return address
/// beneath the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// IEEE-754 double. The only numeric type.
    Number(f64),

    /// Boolean value.
    Bool(bool),

    /// Interned string: an index into the owning chunk's string pool.
    Str(u8),

    /// Function descriptor registered by `OP_FUNC`. `location` is the byte
    /// offset of the body in the owning chunk's code.
    Function { name: u8, arity: u8, location: u8 },

    /// Return address: a byte offset into the owning chunk's code, never a
    /// raw pointer (survives code-buffer reallocation).
    Pointer(usize),

    /// The null value.
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Function { .. } => "function",
            Value::Pointer(_) => "pointer",
            Value::Null => "null",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Number(1.0).type_name(), "number");
        assert_eq!(Value::Bool(true).type_name(), "boolean");
        assert_eq!(Value::Str(0).type_name(), "string");
        assert_eq!(Value::Null.type_name(), "null");
    }
}
