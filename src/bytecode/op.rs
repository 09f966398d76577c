// =============================================================================
// Opcode - Bytecode instructions
// =============================================================================
//
// Every instruction is one opcode byte optionally followed by immediates.
// Operand widths are fixed per opcode and are part of the ABI between the
// emitter and the VM: `u8` for pool indices and frame slots, big-endian
// `i16` for jump offsets (relative to the byte after the offset).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Pop a value, write its textual form plus newline to stdout.
    Print = 0x00,

    // arithmetic: pop b, pop a, push a (op) b
    Add = 0x01,
    Sub = 0x02,
    Mul = 0x03,
    Div = 0x04,
    Mod = 0x05,

    // comparison: pop b, pop a, push bool
    Eq = 0x06,
    Gt = 0x07,
    Lt = 0x08,

    /// Pop a bool, push its logical negation.
    Not = 0x09,
    /// Pop a number, push its arithmetic negation.
    Negate = 0x0a,

    /// `u8` constant-pool index: push a number.
    Const = 0x0b,
    /// `u8` string-pool index: push a string.
    Str = 0x0c,

    /// `u8` string-pool index: pop a value, bind it to the named global.
    SetGlobal = 0x0d,
    /// `u8` string-pool index: push the value of the named global.
    GetGlobal = 0x0e,

    /// `u8` slot: push `stack[fp + slot]`.
    DeepGet = 0x0f,
    /// `u8` slot: pop into `stack[fp + slot]`.
    DeepSet = 0x10,

    /// `i16` offset: pop a bool, jump if false.
    Jz = 0x11,
    /// `i16` offset: unconditional relative jump.
    Jmp = 0x12,

    /// `u8` name, `u8` arity, `u8` location: register a function in the
    /// globals table.
    Func = 0x13,
    /// `u8` name, `u8` argcount: call a function.
    Invoke = 0x14,
    /// Return from the current call frame.
    Ret = 0x15,

    // literal pushes
    True = 0x16,
    False = 0x17,
    Null = 0x18,

    /// Terminate execution.
    Exit = 0x19,
}

impl Opcode {
    /// Number of immediate operand bytes following the opcode.
    pub fn operand_bytes(self) -> usize {
        match self {
            Opcode::Const
            | Opcode::Str
            | Opcode::SetGlobal
            | Opcode::GetGlobal
            | Opcode::DeepGet
            | Opcode::DeepSet => 1,
            Opcode::Jz | Opcode::Jmp | Opcode::Invoke => 2,
            Opcode::Func => 3,
            _ => 0,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Print => "OP_PRINT",
            Opcode::Add => "OP_ADD",
            Opcode::Sub => "OP_SUB",
            Opcode::Mul => "OP_MUL",
            Opcode::Div => "OP_DIV",
            Opcode::Mod => "OP_MOD",
            Opcode::Eq => "OP_EQ",
            Opcode::Gt => "OP_GT",
            Opcode::Lt => "OP_LT",
            Opcode::Not => "OP_NOT",
            Opcode::Negate => "OP_NEGATE",
            Opcode::Const => "OP_CONST",
            Opcode::Str => "OP_STR",
            Opcode::SetGlobal => "OP_SET_GLOBAL",
            Opcode::GetGlobal => "OP_GET_GLOBAL",
            Opcode::DeepGet => "OP_DEEP_GET",
            Opcode::DeepSet => "OP_DEEP_SET",
            Opcode::Jz => "OP_JZ",
            Opcode::Jmp => "OP_JMP",
            Opcode::Func => "OP_FUNC",
            Opcode::Invoke => "OP_INVOKE",
            Opcode::Ret => "OP_RET",
            Opcode::True => "OP_TRUE",
            Opcode::False => "OP_FALSE",
            Opcode::Null => "OP_NULL",
            Opcode::Exit => "OP_EXIT",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        let op = match byte {
            0x00 => Opcode::Print,
            0x01 => Opcode::Add,
            0x02 => Opcode::Sub,
            0x03 => Opcode::Mul,
            0x04 => Opcode::Div,
            0x05 => Opcode::Mod,
            0x06 => Opcode::Eq,
            0x07 => Opcode::Gt,
            0x08 => Opcode::Lt,
            0x09 => Opcode::Not,
            0x0a => Opcode::Negate,
            0x0b => Opcode::Const,
            0x0c => Opcode::Str,
            0x0d => Opcode::SetGlobal,
            0x0e => Opcode::GetGlobal,
            0x0f => Opcode::DeepGet,
            0x10 => Opcode::DeepSet,
            0x11 => Opcode::Jz,
            0x12 => Opcode::Jmp,
            0x13 => Opcode::Func,
            0x14 => Opcode::Invoke,
            0x15 => Opcode::Ret,
            0x16 => Opcode::True,
            0x17 => Opcode::False,
            0x18 => Opcode::Null,
            0x19 => Opcode::Exit,
            other => return Err(other),
        };
        Ok(op)
    }
}
