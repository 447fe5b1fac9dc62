//! Abstract Syntax Tree definitions for PL/0.
//!
//! The front end hands the code generator a fully normalised tree: optional
//! productions are already resolved into empty vectors, `None`, or
//! [`Statement::Empty`], so the generator matches variants exhaustively and
//! never searches children by tag.

/// A complete program: its top-level block followed by `.`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub block: Block,
}

/// Declarations followed by a single body statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub consts: Vec<ConstDef>,
    pub vars: Vec<String>,
    pub subprograms: Vec<SubprogramDecl>,
    pub body: Statement,
}

impl Block {
    /// A block with no declarations.
    pub fn new(body: Statement) -> Self {
        Self {
            consts: Vec::new(),
            vars: Vec::new(),
            subprograms: Vec::new(),
            body,
        }
    }
}

/// `name = value` inside a `const` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDef {
    pub name: String,
    pub value: i32,
}

/// Kind of subprogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubprogramKind {
    Procedure,
    Function,
}

impl SubprogramKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubprogramKind::Procedure => "procedure",
            SubprogramKind::Function => "function",
        }
    }
}

/// Declared parameter or return type. Both are 16-bit words at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Integer,
    Char,
}

/// Subprogram parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub param_type: Type,
}

/// Procedure or function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct SubprogramDecl {
    pub kind: SubprogramKind,
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// `Some` for functions.
    pub return_type: Option<Type>,
    pub block: Block,
}

/// Statement types.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign { target: String, value: Expression },
    Call(Call),
    Compound(Vec<Statement>),
    If(IfStatement),
    While(WhileStatement),
    /// `! expr`
    Write(Expression),
    /// `? name`
    Read(String),
    Return(Expression),
    Empty,
}

/// if-statement, with optional else branch.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Condition,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
}

/// while-statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Condition,
    pub body: Box<Statement>,
}

/// `lhs = rhs`, the only comparison in the language.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub lhs: Expression,
    pub rhs: Expression,
}

/// Subprogram call, as a statement or inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub arguments: Vec<Expression>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn as_char(&self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(i32),
    /// Character literal; its value is the code point.
    Char(char),
    Identifier(String),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Call(Call),
}

// ============================================================================
// Construction helpers
// ============================================================================

impl Expression {
    pub fn ident(name: &str) -> Self {
        Expression::Identifier(name.to_string())
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn call(name: &str, arguments: Vec<Expression>) -> Self {
        Expression::Call(Call {
            name: name.to_string(),
            arguments,
        })
    }
}

impl Condition {
    pub fn equal(lhs: Expression, rhs: Expression) -> Self {
        Self { lhs, rhs }
    }
}

impl Statement {
    pub fn assign(target: &str, value: Expression) -> Self {
        Statement::Assign {
            target: target.to_string(),
            value,
        }
    }

    pub fn call(name: &str, arguments: Vec<Expression>) -> Self {
        Statement::Call(Call {
            name: name.to_string(),
            arguments,
        })
    }

    pub fn if_then(condition: Condition, then_branch: Statement) -> Self {
        Statement::If(IfStatement {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: None,
        })
    }

    pub fn if_else(condition: Condition, then_branch: Statement, else_branch: Statement) -> Self {
        Statement::If(IfStatement {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        })
    }

    pub fn while_do(condition: Condition, body: Statement) -> Self {
        Statement::While(WhileStatement {
            condition,
            body: Box::new(body),
        })
    }
}

impl SubprogramDecl {
    pub fn procedure(name: &str, params: &[&str], block: Block) -> Self {
        Self {
            kind: SubprogramKind::Procedure,
            name: name.to_string(),
            parameters: integer_params(params),
            return_type: None,
            block,
        }
    }

    pub fn function(name: &str, params: &[&str], block: Block) -> Self {
        Self {
            kind: SubprogramKind::Function,
            name: name.to_string(),
            parameters: integer_params(params),
            return_type: Some(Type::Integer),
            block,
        }
    }
}

fn integer_params(names: &[&str]) -> Vec<Parameter> {
    names
        .iter()
        .map(|name| Parameter {
            name: name.to_string(),
            param_type: Type::Integer,
        })
        .collect()
}
