use std::collections::HashMap;

use crate::bytecode::chunk::Chunk;
use crate::bytecode::op::Opcode;
use crate::runtime::runtime_error::{
    RuntimeError, arity_mismatch, stack_overflow, stack_underflow, type_error, undefined_function,
    undefined_variable,
};
use crate::runtime::value::Value;

/// Value-stack capacity (slots).
pub const STACK_MAX: usize = 256;

/// Frame-pointer stack capacity (call depth).
pub const FP_STACK_MAX: usize = 256;

/// The venom virtual machine.
///
/// A register-less stack machine: one value stack, one frame-pointer stack,
/// and a globals table shared by variable bindings and function
/// definitions. The VM borrows the chunk for the duration of `run`; return
/// addresses are byte offsets into the chunk's code, so nothing outlives
/// the borrow.
#[derive(Debug)]
pub struct Vm {
    stack: Vec<Value>,
    fp_stack: Vec<u32>,
    globals: HashMap<String, Value>,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            fp_stack: Vec::new(),
            globals: HashMap::new(),
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn frame_depth(&self) -> usize {
        self.fp_stack.len()
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Fetch-execute loop over the chunk's byte stream.
    ///
    /// Execution halts on `OP_EXIT`, on running past the last byte, or on
    /// the first runtime error. Strict dispatch: unknown opcodes and
    /// wrongly-tagged operands are errors, never ignored.
    pub fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        let mut ip: usize = 0;

        while ip < chunk.code.len() {
            let byte = chunk.code[ip];
            ip += 1;

            let op = Opcode::try_from(byte)
                .map_err(|b| RuntimeError::new(format!("Unknown opcode 0x{:02x}.", b)))?;

            match op {
                Opcode::Print => {
                    let value = self.pop()?;
                    println!("{}", display_value(chunk, &value)?);
                }

                // Arithmetic: IEEE-754 throughout. Division by zero yields
                // the IEEE result; MOD is fmod.
                Opcode::Add => self.numeric_binary(|a, b| a + b)?,
                Opcode::Sub => self.numeric_binary(|a, b| a - b)?,
                Opcode::Mul => self.numeric_binary(|a, b| a * b)?,
                Opcode::Div => self.numeric_binary(|a, b| a / b)?,
                Opcode::Mod => self.numeric_binary(|a, b| a % b)?,

                Opcode::Gt => self.numeric_compare(|a, b| a > b)?,
                Opcode::Lt => self.numeric_compare(|a, b| a < b)?,

                Opcode::Eq => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let result = match (&a, &b) {
                        (Value::Number(a), Value::Number(b)) => a == b,
                        (Value::Bool(a), Value::Bool(b)) => a == b,
                        _ => {
                            return Err(RuntimeError::new(format!(
                                "Cannot compare {} and {}.",
                                a.type_name(),
                                b.type_name()
                            )));
                        }
                    };
                    self.push(Value::Bool(result))?;
                }

                Opcode::Not => {
                    let value = self.pop_bool()?;
                    self.push(Value::Bool(!value))?;
                }

                Opcode::Negate => {
                    let value = self.pop_number()?;
                    self.push(Value::Number(-value))?;
                }

                Opcode::Const => {
                    let idx = read_u8(chunk, &mut ip)?;
                    let constant = chunk
                        .constants
                        .get(idx as usize)
                        .copied()
                        .ok_or_else(|| malformed_pool_index("constant", idx))?;
                    self.push(Value::Number(constant))?;
                }

                Opcode::Str => {
                    let idx = read_u8(chunk, &mut ip)?;
                    pool_string(chunk, idx)?;
                    self.push(Value::Str(idx))?;
                }

                Opcode::SetGlobal => {
                    let idx = read_u8(chunk, &mut ip)?;
                    let name = pool_string(chunk, idx)?;
                    let value = self.pop()?;
                    self.globals.insert(name.to_string(), value);
                }

                Opcode::GetGlobal => {
                    let idx = read_u8(chunk, &mut ip)?;
                    let name = pool_string(chunk, idx)?;
                    let value = self
                        .globals
                        .get(name)
                        .copied()
                        .ok_or_else(|| undefined_variable(name))?;
                    self.push(value)?;
                }

                Opcode::DeepGet => {
                    let slot = read_u8(chunk, &mut ip)?;
                    let index = self.frame_pointer()? + slot as usize;
                    let value = self
                        .stack
                        .get(index)
                        .copied()
                        .ok_or_else(|| frame_slot_out_of_bounds(slot))?;
                    self.push(value)?;
                }

                Opcode::DeepSet => {
                    let slot = read_u8(chunk, &mut ip)?;
                    let value = self.pop()?;
                    let index = self.frame_pointer()? + slot as usize;
                    if index >= self.stack.len() {
                        return Err(frame_slot_out_of_bounds(slot));
                    }
                    self.stack[index] = value;
                }

                Opcode::Jz => {
                    let offset = read_i16(chunk, &mut ip)?;
                    let condition = self.pop_bool()?;
                    if !condition {
                        ip = jump_target(ip, offset, chunk.code.len())?;
                    }
                }

                Opcode::Jmp => {
                    let offset = read_i16(chunk, &mut ip)?;
                    ip = jump_target(ip, offset, chunk.code.len())?;
                }

                Opcode::Func => {
                    let name = read_u8(chunk, &mut ip)?;
                    let arity = read_u8(chunk, &mut ip)?;
                    let location = read_u8(chunk, &mut ip)?;
                    let key = pool_string(chunk, name)?.to_string();
                    self.globals.insert(
                        key,
                        Value::Function {
                            name,
                            arity,
                            location,
                        },
                    );
                }

                Opcode::Invoke => {
                    let name_idx = read_u8(chunk, &mut ip)?;
                    let argc = read_u8(chunk, &mut ip)?;
                    ip = self.invoke(chunk, name_idx, argc, ip)?;
                }

                Opcode::Ret => {
                    ip = self.ret()?;
                }

                Opcode::True => self.push(Value::Bool(true))?,
                Opcode::False => self.push(Value::Bool(false))?,
                Opcode::Null => self.push(Value::Null)?,

                Opcode::Exit => return Ok(()),
            }
        }

        Ok(())
    }

    // =========================================================================
    // Calling convention
    // =========================================================================

    /// `INVOKE name argc`: resolve the callee, lay out the new frame, and
    /// return the body's entry offset.
    ///
    /// Frame layout after setup (growing upward):
    ///
    /// ```text
    ///   ... caller slots | Pointer(return ip) | arg0 arg1 ... argN-1
    ///                                           ^fp
    /// ```
    fn invoke(
        &mut self,
        chunk: &Chunk,
        name_idx: u8,
        argc: u8,
        return_ip: usize,
    ) -> Result<usize, RuntimeError> {
        let name = pool_string(chunk, name_idx)?;

        let (arity, location) = match self.globals.get(name) {
            Some(Value::Function {
                arity, location, ..
            }) => (*arity, *location),
            Some(other) => {
                return Err(RuntimeError::new(format!(
                    "'{}' is not a function (it is a {}).",
                    name,
                    other.type_name()
                )));
            }
            None => return Err(undefined_function(name)),
        };

        if argc != arity {
            return Err(arity_mismatch(name, arity, argc));
        }

        // Pop the arguments (top of stack = last argument) so the return
        // address can slot in beneath them.
        let mut args = Vec::with_capacity(argc as usize);
        for _ in 0..argc {
            args.push(self.pop()?);
        }

        self.push(Value::Pointer(return_ip))?;

        if self.fp_stack.len() >= FP_STACK_MAX {
            return Err(RuntimeError::new("Frame-pointer stack overflow."));
        }
        self.fp_stack.push(self.stack.len() as u32);

        // Push back in reverse of pop order: argument i lands at fp + i.
        for arg in args.into_iter().rev() {
            self.push(arg)?;
        }

        Ok(location as usize)
    }

    /// `RET`: unwind the frame, leaving only the return value above the
    /// caller's stack, and resume at the saved return address.
    fn ret(&mut self) -> Result<usize, RuntimeError> {
        let result = self.pop()?;

        let fp = self
            .fp_stack
            .pop()
            .ok_or_else(|| RuntimeError::new("OP_RET with no active call frame."))?;

        // Discard arguments and locals.
        self.stack.truncate(fp as usize);

        let return_ip = match self.pop()? {
            Value::Pointer(addr) => addr,
            other => {
                return Err(RuntimeError::new(format!(
                    "Expected a return address beneath the frame, found {}.",
                    other.type_name()
                )));
            }
        };

        self.push(result)?;
        Ok(return_ip)
    }

    // =========================================================================
    // Stack operations
    // =========================================================================

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= STACK_MAX {
            return Err(stack_overflow());
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(stack_underflow)
    }

    fn pop_number(&mut self) -> Result<f64, RuntimeError> {
        match self.pop()? {
            Value::Number(n) => Ok(n),
            other => Err(type_error("number", other.type_name())),
        }
    }

    fn pop_bool(&mut self) -> Result<bool, RuntimeError> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(type_error("boolean", other.type_name())),
        }
    }

    fn frame_pointer(&self) -> Result<usize, RuntimeError> {
        self.fp_stack
            .last()
            .map(|fp| *fp as usize)
            .ok_or_else(|| RuntimeError::new("No active call frame."))
    }

    fn numeric_binary(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop_number()?;
        let a = self.pop_number()?;
        self.push(Value::Number(f(a, b)))
    }

    fn numeric_compare(&mut self, f: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop_number()?;
        let a = self.pop_number()?;
        self.push(Value::Bool(f(a, b)))
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Decoding helpers
// =============================================================================

fn read_u8(chunk: &Chunk, ip: &mut usize) -> Result<u8, RuntimeError> {
    let byte = chunk
        .code
        .get(*ip)
        .copied()
        .ok_or_else(|| RuntimeError::new("Truncated instruction operand."))?;
    *ip += 1;
    Ok(byte)
}

fn read_i16(chunk: &Chunk, ip: &mut usize) -> Result<i16, RuntimeError> {
    let hi = read_u8(chunk, ip)?;
    let lo = read_u8(chunk, ip)?;
    Ok(i16::from_be_bytes([hi, lo]))
}

/// Jump offsets are relative to the byte immediately after the offset
/// operand; landing exactly on `len` is a clean halt.
fn jump_target(ip: usize, offset: i16, len: usize) -> Result<usize, RuntimeError> {
    let target = ip as i64 + offset as i64;
    if target < 0 || target > len as i64 {
        return Err(RuntimeError::new("Jump target out of bounds."));
    }
    Ok(target as usize)
}

fn pool_string(chunk: &Chunk, idx: u8) -> Result<&str, RuntimeError> {
    chunk
        .strings
        .get(idx as usize)
        .map(String::as_str)
        .ok_or_else(|| malformed_pool_index("string", idx))
}

fn malformed_pool_index(pool: &str, idx: u8) -> RuntimeError {
    RuntimeError::new(format!("Malformed {}-pool index {}.", pool, idx))
}

fn frame_slot_out_of_bounds(slot: u8) -> RuntimeError {
    RuntimeError::new(format!("Frame slot {} is out of bounds.", slot))
}

/// Textual form of a value, resolving interned strings through the chunk.
/// Numbers print with fixed six decimals, C `%f`-style.
pub fn display_value(chunk: &Chunk, value: &Value) -> Result<String, RuntimeError> {
    let text = match value {
        Value::Number(n) => format!("{:.6}", n),
        Value::Bool(b) => b.to_string(),
        Value::Str(idx) => pool_string(chunk, *idx)?.to_string(),
        Value::Function { name, .. } => format!("<fn {}>", pool_string(chunk, *name)?),
        Value::Pointer(addr) => format!("<addr {}>", addr),
        Value::Null => "null".to_string(),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile::Compiler;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;

    // =========================================================================
    // Test helpers
    // =========================================================================

    fn compile_source(source: &str) -> Chunk {
        let tokens = Lexer::new(source).tokenize().expect("lexing should succeed");
        let program = Parser::new(tokens).parse().expect("parsing should succeed");

        let mut chunk = Chunk::new();
        Compiler::new()
            .compile_program(&mut chunk, &program)
            .expect("compilation should succeed");
        chunk
    }

    /// Compile and run source, returning the VM for state assertions.
    fn run_src(source: &str) -> Vm {
        let chunk = compile_source(source);
        let mut vm = Vm::new();
        vm.run(&chunk).expect("execution should succeed");
        vm
    }

    fn run_src_err(source: &str) -> RuntimeError {
        let chunk = compile_source(source);
        let mut vm = Vm::new();
        vm.run(&chunk).expect_err("execution should fail")
    }

    /// Run a hand-assembled byte stream.
    fn run_raw(code: Vec<u8>) -> Result<Vm, RuntimeError> {
        let chunk = Chunk {
            code,
            constants: Vec::new(),
            strings: Vec::new(),
        };
        let mut vm = Vm::new();
        vm.run(&chunk)?;
        Ok(vm)
    }

    fn number_global(vm: &Vm, name: &str) -> f64 {
        match vm.global(name) {
            Some(Value::Number(n)) => *n,
            other => panic!("expected number global '{}', got {:?}", name, other),
        }
    }

    // =========================================================================
    // Arithmetic and comparison
    // =========================================================================

    #[test]
    fn test_arithmetic_precedence() {
        let vm = run_src("let x = 1 + 2 * 3;");
        assert_eq!(number_global(&vm, "x"), 7.0);
    }

    #[test]
    fn test_subtraction_order() {
        let vm = run_src("let x = 7 - 3;");
        assert_eq!(number_global(&vm, "x"), 4.0);
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        let vm = run_src("let x = 1 / 0;");
        assert_eq!(number_global(&vm, "x"), f64::INFINITY);

        let vm = run_src("let x = 0 / 0;");
        match vm.global("x") {
            Some(Value::Number(n)) => assert!(n.is_nan()),
            other => panic!("expected NaN, got {:?}", other),
        }
    }

    #[test]
    fn test_mod_is_fmod() {
        let vm = run_src("let x = 7 % 3;");
        assert_eq!(number_global(&vm, "x"), 1.0);

        let vm = run_src("let x = 7.5 % 2;");
        assert_eq!(number_global(&vm, "x"), 1.5);
    }

    #[test]
    fn test_double_negation_law() {
        let vm = run_src("let x = --5;");
        assert_eq!(number_global(&vm, "x"), 5.0);
    }

    #[test]
    fn test_double_not_law() {
        let vm = run_src("let x = !!true; let y = !!false;");
        assert_eq!(vm.global("x"), Some(&Value::Bool(true)));
        assert_eq!(vm.global("y"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_commutative_ops_agree() {
        // a + b == b + a and a * b == b * a on finite numbers
        let forward = run_src("let x = 2.5 + 4; let y = 2.5 * 4;");
        let reversed = run_src("let x = 4 + 2.5; let y = 4 * 2.5;");
        assert_eq!(number_global(&forward, "x"), number_global(&reversed, "x"));
        assert_eq!(number_global(&forward, "y"), number_global(&reversed, "y"));
    }

    #[test]
    fn test_comparisons() {
        let vm = run_src(
            "let a = 1 < 2; let b = 1 > 2; let c = 2 >= 2; let d = 1 >= 2; \
             let e = 1 <= 1; let f = 1 == 1; let g = 1 != 1;",
        );
        assert_eq!(vm.global("a"), Some(&Value::Bool(true)));
        assert_eq!(vm.global("b"), Some(&Value::Bool(false)));
        assert_eq!(vm.global("c"), Some(&Value::Bool(true)));
        assert_eq!(vm.global("d"), Some(&Value::Bool(false)));
        assert_eq!(vm.global("e"), Some(&Value::Bool(true)));
        assert_eq!(vm.global("f"), Some(&Value::Bool(true)));
        assert_eq!(vm.global("g"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_bool_equality() {
        let vm = run_src("let x = !false == true;");
        assert_eq!(vm.global("x"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_heterogeneous_eq_is_type_error() {
        let err = run_src_err("let x = 1 == true;");
        assert!(err.message.contains("Cannot compare"));
    }

    #[test]
    fn test_arithmetic_type_error() {
        let err = run_src_err("let x = 1 + true;");
        assert!(err.message.contains("Expected number"));
    }

    // =========================================================================
    // Globals
    // =========================================================================

    #[test]
    fn test_let_and_reassign() {
        let vm = run_src("let x = 10; x = x + 1;");
        assert_eq!(number_global(&vm, "x"), 11.0);
    }

    #[test]
    fn test_undefined_variable() {
        let err = run_src_err("print undefined_var;");
        assert_eq!(
            err.to_string(),
            "runtime error: Variable 'undefined_var' is not defined."
        );
    }

    #[test]
    fn test_string_global() {
        let vm = run_src("let s = \"hi\";");
        assert_eq!(vm.global("s"), Some(&Value::Str(0)));
    }

    #[test]
    fn test_statements_are_stack_neutral() {
        let vm = run_src("let x = 1; print x; if (x < 2) { print 2; } let y = x + 1;");
        assert!(vm.stack().is_empty());
        assert_eq!(vm.frame_depth(), 0);
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    #[test]
    fn test_if_takes_then_branch() {
        let vm = run_src("let x = 0; if (1 < 2) { x = 1; } else { x = 2; }");
        assert_eq!(number_global(&vm, "x"), 1.0);
    }

    #[test]
    fn test_if_takes_else_branch() {
        let vm = run_src("let x = 0; if (1 > 2) { x = 1; } else { x = 2; }");
        assert_eq!(number_global(&vm, "x"), 2.0);
    }

    #[test]
    fn test_if_without_else_skips_cleanly() {
        let vm = run_src("let x = 0; if (1 > 2) { x = 1; }");
        assert_eq!(number_global(&vm, "x"), 0.0);
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_jz_requires_bool() {
        let err = run_src_err("if (1) { print 1; }");
        assert!(err.message.contains("Expected boolean"));
    }

    // =========================================================================
    // Functions and the calling convention
    // =========================================================================

    #[test]
    fn test_call_returns_value() {
        let vm = run_src("fn add(a, b) { return a + b; } let r = add(2, 3);");
        assert_eq!(number_global(&vm, "r"), 5.0);
    }

    #[test]
    fn test_call_restores_stacks() {
        let vm = run_src("fn add(a, b) { return a + b; } let r = add(2, 3);");
        assert!(vm.stack().is_empty(), "RET must unwind the whole frame");
        assert_eq!(vm.frame_depth(), 0);
    }

    #[test]
    fn test_arguments_land_in_frame_slots() {
        // A non-commutative body detects swapped argument order.
        let vm = run_src("fn sub(a, b) { return a - b; } let r = sub(10, 4);");
        assert_eq!(number_global(&vm, "r"), 6.0);
    }

    #[test]
    fn test_implicit_return_is_null() {
        let vm = run_src("fn noop() { print 1; } let r = noop();");
        assert_eq!(vm.global("r"), Some(&Value::Null));
    }

    #[test]
    fn test_function_local_let() {
        let vm = run_src("fn f(a) { let b = a + 1; return b * 2; } let r = f(3);");
        assert_eq!(number_global(&vm, "r"), 8.0);
    }

    #[test]
    fn test_let_in_skipped_branch_keeps_slots_aligned() {
        // x's slot is reserved even when the branch does not run, so y
        // still lands in its own slot
        let vm = run_src(
            "fn f(c) { if (c) { let x = 1; } let y = 2; return y; } let r = f(false);",
        );
        assert_eq!(number_global(&vm, "r"), 2.0);
    }

    #[test]
    fn test_branch_local_reads_its_own_slot() {
        let vm = run_src(
            "fn f(c) { if (c) { let x = 10; return x + 1; } let y = 2; return y; } \
             let a = f(true); let b = f(false);",
        );
        assert_eq!(number_global(&vm, "a"), 11.0);
        assert_eq!(number_global(&vm, "b"), 2.0);
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_parameter_mutation_stays_local() {
        let vm = run_src(
            "let a = 100; fn f(a) { a = a + 1; return a; } let r = f(1);",
        );
        assert_eq!(number_global(&vm, "r"), 2.0);
        assert_eq!(number_global(&vm, "a"), 100.0, "global a must be untouched");
    }

    #[test]
    fn test_nested_calls() {
        let vm = run_src(
            "fn inc(a) { return a + 1; } fn twice(a) { return inc(inc(a)); } let r = twice(1);",
        );
        assert_eq!(number_global(&vm, "r"), 3.0);
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_recursion() {
        let vm = run_src(
            "fn fact(n) { if (n < 1) { return 1; } return n * fact(n - 1); } let r = fact(5);",
        );
        assert_eq!(number_global(&vm, "r"), 120.0);
    }

    #[test]
    fn test_function_reads_global() {
        let vm = run_src("let g = 40; fn f(a) { return g + a; } let r = f(2);");
        assert_eq!(number_global(&vm, "r"), 42.0);
    }

    #[test]
    fn test_wrong_arity() {
        let err = run_src_err("fn f(a) { return a; } let x = f(1, 2);");
        assert_eq!(
            err.message,
            "Function 'f' expects 1 arguments but got 2."
        );
    }

    #[test]
    fn test_undefined_function() {
        let err = run_src_err("let x = nope();");
        assert_eq!(err.message, "Function 'nope' is not defined.");
    }

    #[test]
    fn test_calling_a_non_function() {
        let err = run_src_err("let g = 1; let x = g();");
        assert!(err.message.contains("'g' is not a function"));
    }

    // =========================================================================
    // Raw byte streams: terminal states and strictness
    // =========================================================================

    #[test]
    fn test_exit_halts() {
        // EXIT followed by garbage never reaches the garbage
        let vm = run_raw(vec![Opcode::Exit as u8, 0xff]).expect("EXIT halts cleanly");
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_running_past_the_end_halts() {
        let vm = run_raw(vec![Opcode::True as u8]).expect("falling off the end halts");
        assert_eq!(vm.stack(), &[Value::Bool(true)]);
    }

    #[test]
    fn test_unknown_opcode_is_strict_error() {
        let err = run_raw(vec![0xff]).unwrap_err();
        assert!(err.message.contains("Unknown opcode 0xff"));
    }

    #[test]
    fn test_truncated_operand() {
        let err = run_raw(vec![Opcode::Const as u8]).unwrap_err();
        assert!(err.message.contains("Truncated"));
    }

    #[test]
    fn test_jump_out_of_bounds() {
        let err = run_raw(vec![Opcode::Jmp as u8, 0x7f, 0xff]).unwrap_err();
        assert!(err.message.contains("Jump target out of bounds"));

        // condition true: no jump taken, halts cleanly
        let ok = run_raw(vec![
            Opcode::True as u8,
            Opcode::Jz as u8,
            0xff,
            0xf0, // -16: before the start of code
        ]);
        assert!(ok.is_ok());

        let err = run_raw(vec![Opcode::False as u8, Opcode::Jz as u8, 0xff, 0xf0]).unwrap_err();
        assert!(err.message.contains("Jump target out of bounds"));
    }

    #[test]
    fn test_stack_overflow() {
        let code = vec![Opcode::Null as u8; STACK_MAX + 1];
        let err = run_raw(code).unwrap_err();
        assert_eq!(err.message, "Stack overflow.");
    }

    #[test]
    fn test_stack_underflow() {
        let err = run_raw(vec![Opcode::Print as u8]).unwrap_err();
        assert_eq!(err.message, "Stack underflow.");
    }

    #[test]
    fn test_deep_get_without_frame() {
        let err = run_raw(vec![Opcode::DeepGet as u8, 0]).unwrap_err();
        assert!(err.message.contains("No active call frame"));
    }

    #[test]
    fn test_ret_without_frame() {
        let err = run_raw(vec![Opcode::Null as u8, Opcode::Ret as u8]).unwrap_err();
        assert!(err.message.contains("no active call frame"));
    }

    // =========================================================================
    // Value formatting
    // =========================================================================

    #[test]
    fn test_display_number_fixed_decimals() {
        let chunk = Chunk::new();
        assert_eq!(
            display_value(&chunk, &Value::Number(7.0)).unwrap(),
            "7.000000"
        );
        assert_eq!(
            display_value(&chunk, &Value::Number(2.5)).unwrap(),
            "2.500000"
        );
    }

    #[test]
    fn test_display_other_values() {
        let mut chunk = Chunk::new();
        chunk.add_string("hello").unwrap();
        chunk.add_string("add").unwrap();

        assert_eq!(display_value(&chunk, &Value::Bool(true)).unwrap(), "true");
        assert_eq!(display_value(&chunk, &Value::Null).unwrap(), "null");
        assert_eq!(display_value(&chunk, &Value::Str(0)).unwrap(), "hello");
        assert_eq!(
            display_value(
                &chunk,
                &Value::Function {
                    name: 1,
                    arity: 2,
                    location: 3
                }
            )
            .unwrap(),
            "<fn add>"
        );
    }
}
