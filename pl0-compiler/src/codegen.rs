//! J1 code generator for the PL/0 compiler.
//!
//! Walks the typed AST in one pass and emits assembly through the
//! [`AsmWriter`]. Every identifier goes through the [`SymbolTable`]; frame
//! management follows the convention in [`crate::frame`].

use crate::asm_writer::AsmWriter;
use crate::ast::*;
use crate::error::{CompileError, Result};
use crate::frame;
use crate::optimizer::ConstantFolder;
use crate::symbol_table::SymbolTable;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Runtime entry points the generated code calls, with their contracts.
/// Their bodies are placeholders meant to be linked against a platform.
const RUNTIME_STUBS: [(&str, &str); 4] = [
    ("write", "write: output T"),
    ("read", "read: push one input word"),
    ("mul", "mul: N * T"),
    ("div", "div: N / T"),
];

/// What a call site needs to know about a subprogram.
#[derive(Debug, Clone)]
struct Signature {
    kind: SubprogramKind,
    arity: usize,
    label: String,
}

/// Code generator that compiles a PL/0 AST to J1 assembly.
pub struct CodeGenerator {
    /// Symbol table for identifier resolution.
    symbols: SymbolTable,
    /// Assembly emitter.
    out: AsmWriter,
    /// Subprograms declared so far, keyed by name.
    subprograms: HashMap<String, Signature>,
    /// Kinds of the subprograms being compiled, innermost last.
    context: Vec<SubprogramKind>,
    /// Whether to run the peephole pass on the output.
    optimize: bool,
}

impl CodeGenerator {
    /// Create a new code generator with optimizations enabled.
    pub fn new() -> Self {
        Self::with_options(true)
    }

    /// Create a new code generator with specified optimization setting.
    pub fn with_options(optimize: bool) -> Self {
        Self {
            symbols: SymbolTable::new(),
            out: AsmWriter::new(),
            subprograms: HashMap::new(),
            context: Vec::new(),
            optimize,
        }
    }

    /// Compile a program with optimizations enabled.
    pub fn compile(program: &Program) -> Result<String> {
        Self::compile_with_options(program, true)
    }

    /// Compile a program with specified optimization setting.
    pub fn compile_with_options(program: &Program, optimize: bool) -> Result<String> {
        CodeGenerator::with_options(optimize).generate(program)
    }

    /// Generate assembly text for `program`, consuming the generator.
    ///
    /// The first semantic error aborts generation.
    pub fn generate(mut self, program: &Program) -> Result<String> {
        self.compile_program(program)?;
        debug!(
            lines = self.out.len(),
            subprograms = self.subprograms.len(),
            "generation complete"
        );
        Ok(self.out.finish(self.optimize))
    }

    // ========================================================================
    // Program Compilation
    // ========================================================================

    fn compile_program(&mut self, program: &Program) -> Result<()> {
        let block = &program.block;
        self.out.write_jump("main");

        for def in &block.consts {
            self.symbols.declare_constant(&def.name, def.value)?;
        }
        for name in &block.vars {
            self.symbols.declare_global_variable(name)?;
        }
        for sub in &block.subprograms {
            self.compile_subprogram(sub)?;
        }

        self.out.write_label("main");
        frame::write_bootstrap(&mut self.out);
        self.compile_statement(&block.body)?;

        self.out.write_label("halt");
        self.out.write_jump("halt");
        self.write_runtime_stubs();
        Ok(())
    }

    fn write_runtime_stubs(&mut self) {
        for (label, contract) in RUNTIME_STUBS {
            self.out.write_label(label);
            self.out.write_comment(contract);
            self.out.write_instruction("EXIT");
        }
    }

    // ========================================================================
    // Subprogram Compilation
    // ========================================================================

    fn compile_subprogram(&mut self, decl: &SubprogramDecl) -> Result<()> {
        if self.subprograms.contains_key(&decl.name) {
            return Err(CompileError::DuplicateSubprogram {
                name: decl.name.clone(),
            });
        }

        // Registered before the body so the subprogram can call itself.
        let prefix = match decl.kind {
            SubprogramKind::Procedure => "proc",
            SubprogramKind::Function => "func",
        };
        let label = format!("{}_{}", prefix, decl.name);
        self.subprograms.insert(
            decl.name.clone(),
            Signature {
                kind: decl.kind,
                arity: decl.parameters.len(),
                label: label.clone(),
            },
        );

        self.symbols.enter_subprogram(&decl.name);
        self.context.push(decl.kind);

        for param in &decl.parameters {
            self.symbols.declare_parameter(&param.name)?;
        }
        for def in &decl.block.consts {
            self.symbols.declare_constant(&def.name, def.value)?;
        }
        for name in &decl.block.vars {
            self.symbols.declare_local(name)?;
        }

        // Nested subprograms are emitted ahead of their parent's label.
        for nested in &decl.block.subprograms {
            self.compile_subprogram(nested)?;
        }

        let (params, locals) = self.symbols.frame_size(&decl.name).unwrap_or((0, 0));
        self.out.write_comment(&format!(
            "{} {}: {} param(s), {} local(s)",
            decl.kind.as_str(),
            decl.name,
            params,
            locals
        ));
        self.out.write_label(&label);
        frame::write_prologue(&mut self.out, params, locals);

        let always_returns = self.compile_statement(&decl.block.body)?;
        match decl.kind {
            SubprogramKind::Procedure => frame::write_epilogue(&mut self.out, false),
            SubprogramKind::Function if !always_returns => {
                self.push_literal(0);
                frame::write_epilogue(&mut self.out, true);
            }
            SubprogramKind::Function => {}
        }

        self.context.pop();
        self.symbols.exit_subprogram();
        debug!(
            subprogram = %decl.name,
            kind = decl.kind.as_str(),
            params,
            locals,
            "compiled subprogram"
        );
        Ok(())
    }

    // ========================================================================
    // Statement Compilation
    // ========================================================================

    /// Compile a statement. Returns whether every path through it ends in
    /// a `return`.
    fn compile_statement(&mut self, stmt: &Statement) -> Result<bool> {
        match stmt {
            Statement::Assign { target, value } => {
                self.check_assignable(target)?;
                self.compile_expression(value)?;
                self.compile_store(target)?;
                Ok(false)
            }
            Statement::Call(call) => {
                if self.compile_call(call, false)? == SubprogramKind::Function {
                    self.out.write_instruction("DROP");
                }
                Ok(false)
            }
            Statement::Compound(statements) => {
                let mut returns = false;
                for statement in statements {
                    returns |= self.compile_statement(statement)?;
                }
                Ok(returns)
            }
            Statement::If(stmt) => self.compile_if(stmt),
            Statement::While(stmt) => {
                self.compile_while(stmt)?;
                Ok(false)
            }
            Statement::Write(value) => {
                self.compile_expression(value)?;
                self.out.write_call("write");
                Ok(false)
            }
            Statement::Read(target) => {
                self.check_assignable(target)?;
                self.out.write_call("read");
                self.compile_store(target)?;
                Ok(false)
            }
            Statement::Return(value) => {
                if self.context.last() != Some(&SubprogramKind::Function) {
                    return Err(CompileError::ReturnOutsideFunction);
                }
                self.compile_expression(value)?;
                frame::write_epilogue(&mut self.out, true);
                Ok(true)
            }
            Statement::Empty => Ok(false),
        }
    }

    fn compile_if(&mut self, stmt: &IfStatement) -> Result<bool> {
        if let Some(taken) = self.fold_condition(&stmt.condition) {
            trace!(taken, "folded if condition");
            return match (taken, &stmt.else_branch) {
                (true, _) => self.compile_statement(&stmt.then_branch),
                (false, Some(else_branch)) => self.compile_statement(else_branch),
                (false, None) => Ok(false),
            };
        }

        let then_label = self.out.unique_label("THEN");
        match &stmt.else_branch {
            None => {
                let end_label = self.out.unique_label("ENDI");
                self.compile_condition(&stmt.condition)?;
                self.out.write_branch(&then_label);
                self.out.write_jump(&end_label);
                self.out.write_label(&then_label);
                self.compile_statement(&stmt.then_branch)?;
                self.out.write_label(&end_label);
                Ok(false)
            }
            Some(else_branch) => {
                let else_label = self.out.unique_label("ELSE");
                let end_label = self.out.unique_label("ENDI");
                self.compile_condition(&stmt.condition)?;
                self.out.write_branch(&then_label);
                self.out.write_jump(&else_label);
                self.out.write_label(&then_label);
                let then_returns = self.compile_statement(&stmt.then_branch)?;
                self.out.write_jump(&end_label);
                self.out.write_label(&else_label);
                let else_returns = self.compile_statement(else_branch)?;
                self.out.write_label(&end_label);
                Ok(then_returns && else_returns)
            }
        }
    }

    fn compile_while(&mut self, stmt: &WhileStatement) -> Result<()> {
        if self.fold_condition(&stmt.condition) == Some(false) {
            trace!("dropped while loop with false condition");
            return Ok(());
        }

        let top_label = self.out.unique_label("WH");
        let body_label = self.out.unique_label("WB");
        let exit_label = self.out.unique_label("WE");

        self.out.write_label(&top_label);
        self.compile_condition(&stmt.condition)?;
        self.out.write_branch(&body_label);
        self.out.write_jump(&exit_label);
        self.out.write_label(&body_label);
        self.compile_statement(&stmt.body)?;
        self.out.write_jump(&top_label);
        self.out.write_label(&exit_label);
        Ok(())
    }

    /// Leave zero on the stack exactly when the operands are equal.
    fn compile_condition(&mut self, condition: &Condition) -> Result<()> {
        if let Some(equal) = self.fold_condition(condition) {
            self.push_literal(if equal { 0 } else { 1 });
            return Ok(());
        }
        self.compile_expression(&condition.lhs)?;
        self.compile_expression(&condition.rhs)?;
        self.out.write_instruction("SUB");
        Ok(())
    }

    // ========================================================================
    // Expression Compilation
    // ========================================================================

    fn compile_expression(&mut self, expr: &Expression) -> Result<()> {
        if let Some(value) = self.fold_expression(expr) {
            self.push_literal(value);
            return Ok(());
        }

        match expr {
            Expression::Number(n) => self.push_literal(*n),
            Expression::Char(c) => self.push_literal(*c as i32),
            Expression::Identifier(name) => self.compile_load(name)?,
            Expression::Binary(op, lhs, rhs) => {
                self.compile_expression(lhs)?;
                self.compile_expression(rhs)?;
                match op {
                    BinaryOp::Add => self.out.write_instruction("ADD"),
                    BinaryOp::Sub => self.out.write_instruction("SUB"),
                    BinaryOp::Mul => self.out.write_call("mul"),
                    BinaryOp::Div => self.out.write_call("div"),
                }
            }
            Expression::Call(call) => {
                self.compile_call(call, true)?;
            }
        }
        Ok(())
    }

    /// Push a 16-bit literal. Values with the high bit set do not fit `LIT`
    /// and are pushed as their complement followed by `INVERT`.
    fn push_literal(&mut self, value: i32) {
        let word = value as u16;
        if word <= 0x7FFF {
            self.out.write_lit(word);
        } else {
            self.out.write_lit(!word);
            self.out.write_instruction("INVERT");
        }
    }

    /// Evaluate arguments left to right, then call. Returns the callee kind.
    fn compile_call(&mut self, call: &Call, needs_value: bool) -> Result<SubprogramKind> {
        let signature = self
            .subprograms
            .get(&call.name)
            .cloned()
            .ok_or_else(|| CompileError::undeclared(&call.name))?;

        if needs_value && signature.kind == SubprogramKind::Procedure {
            return Err(CompileError::NotAFunction {
                name: call.name.clone(),
            });
        }
        if call.arguments.len() != signature.arity {
            return Err(CompileError::ArgumentCount {
                name: call.name.clone(),
                expected: signature.arity,
                found: call.arguments.len(),
            });
        }

        for argument in &call.arguments {
            self.compile_expression(argument)?;
        }
        self.out.write_call(&signature.label);
        Ok(signature.kind)
    }

    // ========================================================================
    // Identifier Access
    // ========================================================================

    fn fold_expression(&self, expr: &Expression) -> Option<i32> {
        ConstantFolder::fold_expression(expr, &|name: &str| self.symbols.lookup_constant(name))
    }

    fn fold_condition(&self, condition: &Condition) -> Option<bool> {
        ConstantFolder::fold_condition(condition, &|name: &str| self.symbols.lookup_constant(name))
    }

    /// Targets resolve frame slot first, so a parameter or local may share
    /// its name with a global constant.
    fn check_assignable(&self, name: &str) -> Result<()> {
        if self.symbols.lookup_frame_offset(name).is_some() {
            return Ok(());
        }
        if self.symbols.lookup_constant(name).is_some() {
            return Err(CompileError::ConstantAssignment {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Push a variable: frame slot first, then global.
    fn compile_load(&mut self, name: &str) -> Result<()> {
        if let Some(offset) = self.symbols.lookup_frame_offset(name) {
            frame::write_frame_load(&mut self.out, offset);
        } else {
            let address = self.symbols.lookup_global_address(name)?;
            frame::write_global_load(&mut self.out, address);
        }
        Ok(())
    }

    /// Pop into a variable: frame slot first, then global.
    fn compile_store(&mut self, name: &str) -> Result<()> {
        if let Some(offset) = self.symbols.lookup_frame_offset(name) {
            frame::write_frame_store(&mut self.out, offset);
        } else {
            let address = self.symbols.lookup_global_address(name)?;
            frame::write_global_store(&mut self.out, address);
        }
        Ok(())
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
