//! PL/0 Compiler - typed PL/0 AST to J1 assembly.
//!
//! This crate lowers an already-parsed PL/0 program to assembly text for the
//! J1 stack CPU, ready for the `j1-assembler` crate. It supports:
//!
//! - Constants, global variables, and nested procedures and functions
//! - Recursion through a software frame stack (see [`frame`])
//! - Constant folding and dead-branch elimination
//! - Peephole optimization of the generated assembly
//!
//! # Usage
//!
//! ```
//! use pl0_compiler::ast::{BinaryOp, Block, Expression, Program, Statement};
//! use pl0_compiler::{compile, compile_with_options, CompileOptions};
//!
//! let program = Program {
//!     block: Block::new(Statement::Write(Expression::binary(
//!         BinaryOp::Add,
//!         Expression::Number(2),
//!         Expression::Number(3),
//!     ))),
//! };
//!
//! let asm = compile(&program).unwrap();
//! assert!(asm.starts_with("JUMP main\n"));
//! assert!(asm.contains("LIT 5\nCALL write\n"));
//!
//! // Without the peephole pass
//! let options = CompileOptions { optimize: false };
//! let plain = compile_with_options(&program, options).unwrap();
//! assert_eq!(plain, asm);
//! ```

pub mod asm_writer;
pub mod ast;
pub mod codegen;
pub mod error;
pub mod frame;
pub mod optimizer;
pub mod symbol_table;

// Re-export key types
pub use asm_writer::AsmWriter;
pub use codegen::CodeGenerator;
pub use error::CompileError;
pub use optimizer::{ConstantFolder, PeepholeOptimizer};
pub use symbol_table::{FrameLayout, Scope, Symbol, SymbolTable};

/// Compilation options.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Run the peephole pass over the generated assembly.
    pub optimize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Compile a program with default options.
pub fn compile(program: &ast::Program) -> Result<String, CompileError> {
    compile_with_options(program, CompileOptions::default())
}

/// Compile a program with specified options.
pub fn compile_with_options(
    program: &ast::Program,
    options: CompileOptions,
) -> Result<String, CompileError> {
    CodeGenerator::with_options(options.optimize).generate(program)
}
