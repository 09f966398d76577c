mod ast;
mod bytecode;
mod frontend;
mod runtime;

use std::{env, fs, path::Path, process};

use crate::bytecode::chunk::Chunk;
use crate::bytecode::compile::Compiler;
use crate::bytecode::disasm::print_chunk;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use crate::frontend::token_dumper::TokenDumper;
use crate::runtime::vm::Vm;

// sysexits-style codes
const EX_DATAERR: i32 = 65;
const EX_SOFTWARE: i32 = 70;
const EX_IOERR: i32 = 74;

fn main() {
    let args: Vec<String> = env::args().collect();

    let tokens_only = args.contains(&"--tokens".to_string());
    let no_color = args.contains(&"--no-color".to_string());
    let pretty = args.contains(&"--pretty".to_string());
    let bytecode = args.contains(&"--bc".to_string()) || args.contains(&"--bytecode".to_string());
    let compile_only = args.contains(&"--compile".to_string());

    // first non-flag argument is the filename
    let filename = args.iter().skip(1).find(|a| !a.starts_with('-'));

    let Some(filename) = filename else {
        print_usage();
        process::exit(if args.len() == 1 { 0 } else { EX_DATAERR });
    };

    match extension(filename) {
        Some("vnm") => {
            let source = read_source(filename);
            if tokens_only {
                dump_tokens(&source, no_color, pretty);
                return;
            }

            let chunk = compile_source(&source);

            if bytecode {
                print_chunk(&chunk);
                return;
            }

            if compile_only {
                write_compiled(filename, &chunk);
                return;
            }

            run_chunk(&chunk);
        }
        Some("vnb") => {
            let chunk = read_compiled(filename);
            if bytecode {
                print_chunk(&chunk);
                return;
            }
            run_chunk(&chunk);
        }
        _ => {
            eprintln!("Error: expected a .vnm or .vnb file, got {}", filename);
            process::exit(EX_DATAERR);
        }
    }
}

fn extension(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|e| e.to_str())
}

fn read_source(filename: &str) -> String {
    match fs::read_to_string(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            process::exit(EX_IOERR);
        }
    }
}

fn compile_source(source: &str) -> Chunk {
    let tokens = match Lexer::new(source).tokenize() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Lexer error: {}", e);
            process::exit(EX_DATAERR);
        }
    };

    let program = match Parser::new(tokens).parse() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            process::exit(EX_DATAERR);
        }
    };

    let mut chunk = Chunk::new();
    if let Err(e) = Compiler::new().compile_program(&mut chunk, &program) {
        eprintln!("{}", e);
        process::exit(EX_DATAERR);
    }
    chunk
}

fn run_chunk(chunk: &Chunk) {
    let mut vm = Vm::new();
    if let Err(e) = vm.run(chunk) {
        eprintln!("{}", e);
        process::exit(EX_SOFTWARE);
    }
}

/// Serialize the compiled chunk next to the source, `.vnm` -> `.vnb`.
fn write_compiled(filename: &str, chunk: &Chunk) {
    let out_path = Path::new(filename).with_extension("vnb");

    let bytes = match postcard::to_allocvec(chunk) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to serialize bytecode: {}", e);
            process::exit(EX_SOFTWARE);
        }
    };

    if let Err(e) = fs::write(&out_path, bytes) {
        eprintln!("Failed to write '{}': {}", out_path.display(), e);
        process::exit(EX_IOERR);
    }
}

fn read_compiled(filename: &str) -> Chunk {
    let bytes = match fs::read(filename) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            process::exit(EX_IOERR);
        }
    };

    match postcard::from_bytes(&bytes) {
        Ok(chunk) => chunk,
        Err(e) => {
            eprintln!("Failed to load '{}': {}", filename, e);
            process::exit(EX_DATAERR);
        }
    }
}

fn dump_tokens(source: &str, no_color: bool, pretty: bool) {
    match Lexer::new(source).tokenize() {
        Ok(tokens) => {
            let mut dumper = TokenDumper::new();

            if no_color {
                dumper = dumper.no_color();
            }
            if pretty {
                dumper = dumper.pretty();
            }

            dumper.dump(&tokens);
        }
        Err(e) => {
            eprintln!("Lexer error: {}", e);
            process::exit(EX_DATAERR);
        }
    }
}

fn print_usage() {
    println!("VENOM - Bytecode Compiler and Virtual Machine");
    println!();
    println!("Usage:");
    println!("  venom <file.vnm>            Compile and run a program");
    println!("  venom <file.vnb>            Run precompiled bytecode");
    println!("  venom --compile <file.vnm>  Compile to <file.vnb>");
    println!("  venom --bc <file>           Disassemble instead of running");
    println!("  venom --tokens <file.vnm>   Show tokens only");
}
