use crate::ast::{BinaryOp, Expression, Statement, UnaryOp};
use crate::bytecode::chunk::Chunk;
use crate::bytecode::compile_error::CompileError;
use crate::bytecode::op::Opcode;

/// Locals context for the function body currently being compiled.
///
/// `locals[slot]` is the name bound to frame slot `slot`; parameters occupy
/// slots `0..arity` and every `let` in the body claims the next slot in
/// source order. The prologue reserves a null per `let` up front, so the
/// claimed index is valid even when the declaring branch never runs.
struct FnScope {
    name: String,
    locals: Vec<String>,
}

/// Bytecode emitter.
///
/// Transforms one AST statement at a time into appended bytecode, updating
/// the chunk's pools, and returns the exact number of bytes appended (the
/// caller needs byte counts to compute forward-jump offsets).
///
/// Expressions emit code that leaves exactly one value on the VM stack;
/// statements are stack-neutral. A function body reserves its local slots
/// in the prologue, and a `let` inside the body stores into its slot.
pub struct Compiler {
    scope: Option<FnScope>,
}

impl Compiler {
    pub fn new() -> Self {
        Self { scope: None }
    }

    /// Compiles a whole program and terminates it with `OP_EXIT`.
    pub fn compile_program(
        &mut self,
        chunk: &mut Chunk,
        statements: &[Statement],
    ) -> Result<usize, CompileError> {
        let mut bytes_emitted = 0;
        for stmt in statements {
            bytes_emitted += self.compile(chunk, stmt)?;
        }
        self.emit_op(chunk, Opcode::Exit);
        Ok(bytes_emitted + 1)
    }

    /// Compiles one statement, returning the number of bytes appended.
    pub fn compile(&mut self, chunk: &mut Chunk, stmt: &Statement) -> Result<usize, CompileError> {
        match stmt {
            Statement::Print(expr) => {
                let bytes = self.compile_expression(chunk, expr)?;
                self.emit_op(chunk, Opcode::Print);
                Ok(bytes + 1)
            }

            Statement::Let { name, value } => {
                let bytes = self.compile_expression(chunk, value)?;

                // Local declaration: store into the slot reserved by the
                // function prologue. Slots are claimed in source order, so
                // a `let` in a skipped branch still holds its index.
                let local_slot = match &mut self.scope {
                    Some(scope) => {
                        if scope.locals.len() >= 256 {
                            return Err(CompileError::TooManyLocals {
                                name: scope.name.clone(),
                            });
                        }
                        scope.locals.push(name.clone());
                        Some((scope.locals.len() - 1) as u8)
                    }
                    None => None,
                };

                match local_slot {
                    Some(slot) => {
                        self.emit_op(chunk, Opcode::DeepSet);
                        chunk.write(slot);
                    }
                    None => {
                        let name_idx = self.add_string(chunk, name)?;
                        self.emit_op(chunk, Opcode::SetGlobal);
                        chunk.write(name_idx);
                    }
                }
                Ok(bytes + 2)
            }

            Statement::Assign { name, value } => {
                let bytes = self.compile_expression(chunk, value)?;

                if let Some(slot) = self.resolve_local(name) {
                    self.emit_op(chunk, Opcode::DeepSet);
                    chunk.write(slot);
                } else {
                    let name_idx = self.add_string(chunk, name)?;
                    self.emit_op(chunk, Opcode::SetGlobal);
                    chunk.write(name_idx);
                }
                Ok(bytes + 2)
            }

            Statement::Block(statements) => {
                let mut bytes = 0;
                for stmt in statements {
                    bytes += self.compile(chunk, stmt)?;
                }
                Ok(bytes)
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => self.compile_if(chunk, condition, then_branch, else_branch.as_deref()),

            Statement::Fn { name, params, body } => self.compile_fn(chunk, name, params, body),

            Statement::Return(expr) => {
                if self.scope.is_none() {
                    return Err(CompileError::ReturnOutsideFunction);
                }
                let bytes = self.compile_expression(chunk, expr)?;
                self.emit_op(chunk, Opcode::Ret);
                Ok(bytes + 1)
            }
        }
    }

    fn compile_if(
        &mut self,
        chunk: &mut Chunk,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
    ) -> Result<usize, CompileError> {
        let cond_bytes = self.compile_expression(chunk, condition)?;

        // Conditional jump over the then-branch; offset patched once the
        // branch length is known.
        let jz_addr = self.emit_jump_placeholder(chunk, Opcode::Jz);
        let then_bytes = self.compile(chunk, then_branch)?;

        match else_branch {
            Some(else_branch) => {
                let jmp_addr = self.emit_jump_placeholder(chunk, Opcode::Jmp);

                // False case skips the then-branch plus the 3-byte JMP.
                chunk.patch_i16(jz_addr, jump_delta(then_bytes + 3)?);

                let else_bytes = self.compile(chunk, else_branch)?;
                chunk.patch_i16(jmp_addr, jump_delta(else_bytes)?);

                Ok(cond_bytes + 3 + then_bytes + 3 + else_bytes)
            }
            None => {
                chunk.patch_i16(jz_addr, jump_delta(then_bytes)?);
                Ok(cond_bytes + 3 + then_bytes)
            }
        }
    }

    fn compile_fn(
        &mut self,
        chunk: &mut Chunk,
        name: &str,
        params: &[String],
        body: &[Statement],
    ) -> Result<usize, CompileError> {
        if self.scope.is_some() {
            return Err(CompileError::NestedFunction {
                name: name.to_string(),
            });
        }
        if params.len() > 255 {
            return Err(CompileError::TooManyArguments {
                name: name.to_string(),
                count: params.len(),
            });
        }

        // Control falls through around the body at runtime.
        let jmp_addr = self.emit_jump_placeholder(chunk, Opcode::Jmp);

        let location = chunk.code.len();
        if location > u8::MAX as usize {
            return Err(CompileError::FunctionTooFar {
                name: name.to_string(),
                location,
            });
        }

        self.scope = Some(FnScope {
            name: name.to_string(),
            locals: params.to_vec(),
        });

        let body_result = self.compile_fn_body(chunk, body);
        self.scope = None;
        let body_bytes = body_result?;

        chunk.patch_i16(jmp_addr, jump_delta(body_bytes)?);

        let name_idx = self.add_string(chunk, name)?;
        self.emit_op(chunk, Opcode::Func);
        chunk.write(name_idx);
        chunk.write(params.len() as u8);
        chunk.write(location as u8);

        Ok(3 + body_bytes + 4)
    }

    fn compile_fn_body(
        &mut self,
        chunk: &mut Chunk,
        body: &[Statement],
    ) -> Result<usize, CompileError> {
        let mut bytes = 0;

        // Prologue: reserve a null slot per `let` in the body, so a local
        // declared in a skipped branch still owns its frame index.
        for _ in 0..body.iter().map(count_locals).sum::<usize>() {
            self.emit_op(chunk, Opcode::Null);
            bytes += 1;
        }

        for stmt in body {
            bytes += self.compile(chunk, stmt)?;
        }

        // Bodies that do not end in an explicit return fall through to
        // `return null`, so every call leaves exactly one value.
        if !matches!(body.last(), Some(Statement::Return(_))) {
            self.emit_op(chunk, Opcode::Null);
            self.emit_op(chunk, Opcode::Ret);
            bytes += 2;
        }

        Ok(bytes)
    }

    /// Compiles one expression, returning the number of bytes appended.
    pub fn compile_expression(
        &mut self,
        chunk: &mut Chunk,
        expr: &Expression,
    ) -> Result<usize, CompileError> {
        match expr {
            Expression::Number(n) => {
                let idx = chunk
                    .add_constant(*n)
                    .ok_or(CompileError::ConstantPoolOverflow)?;
                self.emit_op(chunk, Opcode::Const);
                chunk.write(idx);
                Ok(2)
            }

            Expression::Str(s) => {
                let idx = self.add_string(chunk, s)?;
                self.emit_op(chunk, Opcode::Str);
                chunk.write(idx);
                Ok(2)
            }

            Expression::Bool(true) => {
                self.emit_op(chunk, Opcode::True);
                Ok(1)
            }
            Expression::Bool(false) => {
                self.emit_op(chunk, Opcode::False);
                Ok(1)
            }
            Expression::Null => {
                self.emit_op(chunk, Opcode::Null);
                Ok(1)
            }

            Expression::Variable(name) => {
                if let Some(slot) = self.resolve_local(name) {
                    self.emit_op(chunk, Opcode::DeepGet);
                    chunk.write(slot);
                } else {
                    let name_idx = self.add_string(chunk, name)?;
                    self.emit_op(chunk, Opcode::GetGlobal);
                    chunk.write(name_idx);
                }
                Ok(2)
            }

            Expression::Unary { op, rhs } => {
                let mut bytes = self.compile_expression(chunk, rhs)?;
                bytes += match op {
                    UnaryOp::Negate => self.emit_op(chunk, Opcode::Negate),
                    UnaryOp::Not => self.emit_op(chunk, Opcode::Not),
                };
                Ok(bytes)
            }

            Expression::Binary { op, lhs, rhs } => {
                // Left first, so the VM's `pop b; pop a` keeps source order.
                let mut bytes = self.compile_expression(chunk, lhs)?;
                bytes += self.compile_expression(chunk, rhs)?;

                bytes += match op {
                    BinaryOp::Add => self.emit_op(chunk, Opcode::Add),
                    BinaryOp::Sub => self.emit_op(chunk, Opcode::Sub),
                    BinaryOp::Mul => self.emit_op(chunk, Opcode::Mul),
                    BinaryOp::Div => self.emit_op(chunk, Opcode::Div),
                    BinaryOp::Mod => self.emit_op(chunk, Opcode::Mod),
                    BinaryOp::Gt => self.emit_op(chunk, Opcode::Gt),
                    BinaryOp::Lt => self.emit_op(chunk, Opcode::Lt),
                    BinaryOp::EqEq => self.emit_op(chunk, Opcode::Eq),
                    // Derived operators
                    BinaryOp::GtEq => {
                        self.emit_op(chunk, Opcode::Lt);
                        self.emit_op(chunk, Opcode::Not)
                    }
                    BinaryOp::LtEq => {
                        self.emit_op(chunk, Opcode::Gt);
                        self.emit_op(chunk, Opcode::Not)
                    }
                    BinaryOp::NotEq => {
                        self.emit_op(chunk, Opcode::Eq);
                        self.emit_op(chunk, Opcode::Not)
                    }
                };

                Ok(bytes)
            }

            Expression::Call { name, args } => {
                if args.len() > 255 {
                    return Err(CompileError::TooManyArguments {
                        name: name.clone(),
                        count: args.len(),
                    });
                }

                let mut bytes = 0;
                for arg in args {
                    bytes += self.compile_expression(chunk, arg)?;
                }

                let name_idx = self.add_string(chunk, name)?;
                self.emit_op(chunk, Opcode::Invoke);
                chunk.write(name_idx);
                chunk.write(args.len() as u8);
                Ok(bytes + 3)
            }
        }
    }

    // =========================================================================
    // Emission helpers
    // =========================================================================

    /// Writes the opcode byte; the returned count is the running-total
    /// increment for derived-operator sequences.
    fn emit_op(&mut self, chunk: &mut Chunk, op: Opcode) -> usize {
        chunk.write(op as u8);
        1
    }

    /// Emits a jump opcode with a 0xFFFF placeholder offset and returns the
    /// opcode's address for later patching.
    fn emit_jump_placeholder(&mut self, chunk: &mut Chunk, op: Opcode) -> usize {
        let addr = chunk.write(op as u8);
        chunk.write(0xff);
        chunk.write(0xff);
        addr
    }

    fn add_string(&self, chunk: &mut Chunk, s: &str) -> Result<u8, CompileError> {
        chunk.add_string(s).ok_or(CompileError::StringPoolOverflow)
    }

    /// Looks up `name` in the current function frame, innermost-declaration
    /// last (shadowing picks the most recent slot).
    fn resolve_local(&self, name: &str) -> Option<u8> {
        let scope = self.scope.as_ref()?;
        scope
            .locals
            .iter()
            .rposition(|local| local == name)
            .map(|slot| slot as u8)
    }
}

/// Number of `let` declarations under a statement, counting through blocks
/// and both branches of an `if`. Used to size a function's frame prologue.
fn count_locals(stmt: &Statement) -> usize {
    match stmt {
        Statement::Let { .. } => 1,
        Statement::Block(statements) => statements.iter().map(count_locals).sum(),
        Statement::If {
            then_branch,
            else_branch,
            ..
        } => count_locals(then_branch) + else_branch.as_deref().map_or(0, count_locals),
        _ => 0,
    }
}

/// Converts a byte distance to an i16 jump delta, or errors when the span
/// does not fit the operand width.
fn jump_delta(bytes: usize) -> Result<i16, CompileError> {
    i16::try_from(bytes).map_err(|_| CompileError::JumpTooLarge { bytes })
}
