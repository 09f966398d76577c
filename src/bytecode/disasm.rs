use crate::bytecode::chunk::Chunk;
use crate::bytecode::op::Opcode;

/// Print a disassembly of a bytecode chunk.
pub fn print_chunk(chunk: &Chunk) {
    println!("=== BYTECODE CHUNK ===");
    println!(
        "{} bytes, {} constants, {} strings",
        chunk.code.len(),
        chunk.constants.len(),
        chunk.strings.len()
    );
    println!("======================");

    let jump_targets = collect_jump_targets(chunk);

    let mut addr = 0;
    while addr < chunk.code.len() {
        if jump_targets.contains(&addr) {
            print!("{:04} ► ", addr);
        } else {
            print!("{:04}   ", addr);
        }
        addr = print_instruction(chunk, addr);
    }
    println!();
}

/// Addresses that some jump in the chunk lands on.
fn collect_jump_targets(chunk: &Chunk) -> Vec<usize> {
    let mut targets = Vec::new();

    let mut addr = 0;
    while addr < chunk.code.len() {
        let Ok(op) = Opcode::try_from(chunk.code[addr]) else {
            addr += 1;
            continue;
        };

        if matches!(op, Opcode::Jz | Opcode::Jmp) && addr + 2 < chunk.code.len() {
            let offset = chunk.read_i16(addr + 1);
            let after = addr + 3;
            let target = after as i64 + offset as i64;
            if target >= 0 && !targets.contains(&(target as usize)) {
                targets.push(target as usize);
            }
        }

        addr += 1 + op.operand_bytes();
    }

    targets
}

/// Print one instruction and return the address of the next one.
fn print_instruction(chunk: &Chunk, addr: usize) -> usize {
    let byte = chunk.code[addr];
    let Ok(op) = Opcode::try_from(byte) else {
        println!("0x{:02x}            ; unknown opcode", byte);
        return addr + 1;
    };

    let next = addr + 1 + op.operand_bytes();
    if next > chunk.code.len() {
        println!("{} ; truncated operands", op.mnemonic());
        return chunk.code.len();
    }

    match op {
        Opcode::Const => {
            let idx = chunk.code[addr + 1];
            let value = chunk
                .constants
                .get(idx as usize)
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "<out of range>".to_string());
            println!("{} {} ('{}')", op.mnemonic(), idx, value);
        }
        Opcode::Str | Opcode::SetGlobal | Opcode::GetGlobal => {
            let idx = chunk.code[addr + 1];
            let name = chunk
                .strings
                .get(idx as usize)
                .map(String::as_str)
                .unwrap_or("<out of range>");
            println!("{} {} ('{}')", op.mnemonic(), idx, name);
        }
        Opcode::DeepGet | Opcode::DeepSet => {
            println!("{} slot {}", op.mnemonic(), chunk.code[addr + 1]);
        }
        Opcode::Jz | Opcode::Jmp => {
            let offset = chunk.read_i16(addr + 1);
            let target = next as i64 + offset as i64;
            println!("{} {:+} -> {:04}", op.mnemonic(), offset, target);
        }
        Opcode::Func => {
            let name_idx = chunk.code[addr + 1];
            let arity = chunk.code[addr + 2];
            let location = chunk.code[addr + 3];
            let name = chunk
                .strings
                .get(name_idx as usize)
                .map(String::as_str)
                .unwrap_or("<out of range>");
            println!(
                "{} '{}' arity {} @ {:04}",
                op.mnemonic(),
                name,
                arity,
                location
            );
        }
        Opcode::Invoke => {
            let name_idx = chunk.code[addr + 1];
            let argc = chunk.code[addr + 2];
            let name = chunk
                .strings
                .get(name_idx as usize)
                .map(String::as_str)
                .unwrap_or("<out of range>");
            println!("{} '{}' argc {}", op.mnemonic(), name, argc);
        }
        _ => println!("{}", op.mnemonic()),
    }

    next
}
