//! Property-based fuzzing tests for the PL/0 compiler.
//!
//! Uses proptest to generate random programs and verify compiler
//! invariants hold across all inputs.

use j1_assembler::assemble;
use pl0_compiler::ast::*;
use pl0_compiler::{CompileOptions, SymbolTable, compile, compile_with_options};
use proptest::prelude::*;

const CONSTANTS: &[(&str, i32)] = &[("a", 7), ("b", -3), ("c", 0)];

// =============================================================================
// Arbitrary Value Generators
// =============================================================================

fn arb_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Add),
        Just(BinaryOp::Sub),
        Just(BinaryOp::Mul),
        Just(BinaryOp::Div),
    ]
}

/// Expressions whose every leaf is a literal or one of `CONSTANTS`.
fn arb_const_expr() -> impl Strategy<Value = Expression> {
    let leaf = prop_oneof![
        (-40000i32..40000).prop_map(Expression::Number),
        prop::sample::select(vec!["a", "b", "c"]).prop_map(|name| Expression::ident(name)),
        proptest::char::range('0', 'z').prop_map(Expression::Char),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        (arb_op(), inner.clone(), inner).prop_map(|(op, l, r)| Expression::binary(op, l, r))
    })
}

/// Expressions over globals `x`, `y`, the constant `k` and the function `f`.
fn arb_expr() -> impl Strategy<Value = Expression> {
    let leaf = prop_oneof![
        (-50000i32..50000).prop_map(Expression::Number),
        prop::sample::select(vec!["x", "y", "k"]).prop_map(|name| Expression::ident(name)),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (arb_op(), inner.clone(), inner.clone())
                .prop_map(|(op, l, r)| Expression::binary(op, l, r)),
            inner.prop_map(|arg| Expression::call("f", vec![arg])),
        ]
    })
}

fn arb_condition() -> impl Strategy<Value = Condition> {
    (arb_expr(), arb_expr()).prop_map(|(lhs, rhs)| Condition::equal(lhs, rhs))
}

fn arb_target() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["x", "y"]).prop_map(str::to_string)
}

fn arb_statement() -> impl Strategy<Value = Statement> {
    let leaf = prop_oneof![
        (arb_target(), arb_expr()).prop_map(|(t, e)| Statement::Assign { target: t, value: e }),
        arb_expr().prop_map(Statement::Write),
        arb_target().prop_map(Statement::Read),
        arb_expr().prop_map(|e| Statement::call("p", vec![e])),
        Just(Statement::Empty),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Statement::Compound),
            (arb_condition(), inner.clone()).prop_map(|(c, s)| Statement::if_then(c, s)),
            (arb_condition(), inner.clone(), inner.clone())
                .prop_map(|(c, s1, s2)| Statement::if_else(c, s1, s2)),
            (arb_condition(), inner).prop_map(|(c, s)| Statement::while_do(c, s)),
        ]
    })
}

/// Program with `k`, globals `x`/`y`, a function `f(n)` and a procedure
/// `p(q)` whose body is arbitrary.
fn arb_program() -> impl Strategy<Value = Program> {
    (arb_statement(), arb_statement()).prop_map(|(proc_body, main_body)| {
        let f = SubprogramDecl::function(
            "f",
            &["n"],
            Block::new(Statement::Return(Expression::binary(
                BinaryOp::Add,
                Expression::ident("n"),
                Expression::ident("k"),
            ))),
        );
        let p = SubprogramDecl::procedure(
            "p",
            &["q"],
            Block {
                consts: vec![],
                vars: vec!["t".to_string()],
                subprograms: vec![],
                body: proc_body,
            },
        );
        Program {
            block: Block {
                consts: vec![ConstDef {
                    name: "k".to_string(),
                    value: 5,
                }],
                vars: vec!["x".to_string(), "y".to_string()],
                subprograms: vec![f, p],
                body: main_body,
            },
        }
    })
}

// =============================================================================
// Reference Evaluation
// =============================================================================

fn eval(expr: &Expression) -> i32 {
    match expr {
        Expression::Number(n) => *n,
        Expression::Char(c) => *c as i32,
        Expression::Identifier(name) => CONSTANTS
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .unwrap(),
        Expression::Binary(op, lhs, rhs) => {
            let (l, r) = (eval(lhs), eval(rhs));
            match op {
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Sub => l.wrapping_sub(r),
                BinaryOp::Mul => l.wrapping_mul(r),
                BinaryOp::Div => {
                    if r == 0 {
                        0
                    } else {
                        l.wrapping_div(r)
                    }
                }
            }
        }
        Expression::Call(_) => unreachable!("constant expressions have no calls"),
    }
}

fn const_program(body: Statement) -> Program {
    Program {
        block: Block {
            consts: CONSTANTS
                .iter()
                .map(|(name, value)| ConstDef {
                    name: name.to_string(),
                    value: *value,
                })
                .collect(),
            vars: vec![],
            subprograms: vec![],
            body,
        },
    }
}

/// Main body: everything between the bootstrap and `halt:`.
fn main_body(asm: &str) -> Vec<&str> {
    let lines: Vec<&str> = asm.lines().collect();
    let start = lines.iter().position(|l| *l == "main:").unwrap() + 7;
    let end = lines.iter().position(|l| *l == "halt:").unwrap();
    lines[start..end].to_vec()
}

/// Word pushed by a one- or two-line literal sequence.
fn pushed_word(code: &[&str]) -> Option<u16> {
    match code {
        [lit] => lit.strip_prefix("LIT ")?.parse().ok(),
        [lit, "INVERT"] => lit.strip_prefix("LIT ")?.parse::<u16>().ok().map(|v| !v),
        _ => None,
    }
}

fn instruction_lines(asm: &str) -> usize {
    asm.lines()
        .filter(|l| !l.is_empty() && !l.starts_with(';') && !l.ends_with(':'))
        .count()
}

proptest! {
    /// Constant folding is sound: a constant expression becomes a single
    /// literal push equal to direct evaluation.
    #[test]
    fn test_constant_folding_is_sound(expr in arb_const_expr()) {
        let expected = eval(&expr) as u16;
        let asm = compile_with_options(
            &const_program(Statement::Write(expr)),
            CompileOptions { optimize: false },
        ).unwrap();

        let body = main_body(&asm);
        prop_assert_eq!(body.last().copied(), Some("CALL write"));
        let push = &body[..body.len() - 1];
        prop_assert_eq!(pushed_word(push), Some(expected), "pushed {:?}", push);
    }

    /// A constant condition leaves exactly one branch and no labels.
    #[test]
    fn test_constant_if_selects_one_branch(lhs in arb_const_expr(), rhs in arb_const_expr()) {
        let equal = eval(&lhs) as u16 == eval(&rhs) as u16;
        let program = const_program(Statement::if_else(
            Condition::equal(lhs, rhs),
            Statement::Write(Expression::Number(1111)),
            Statement::Write(Expression::Number(2222)),
        ));
        let asm = compile(&program).unwrap();
        let body = main_body(&asm);

        let expected = if equal { "LIT 1111" } else { "LIT 2222" };
        prop_assert_eq!(body, vec![expected, "CALL write"]);
    }

    /// Every generated program assembles, one word per instruction line.
    #[test]
    fn test_generated_programs_assemble(program in arb_program()) {
        let asm = compile(&program).unwrap();
        let assembly = assemble(&asm);
        prop_assert!(assembly.is_ok(), "{:?}\n{}", assembly.as_ref().err(), asm);
        let assembly = assembly.unwrap();
        prop_assert_eq!(assembly.words.len(), instruction_lines(&asm));
    }

    /// The peephole pass never adds lines and is deterministic.
    #[test]
    fn test_optimization_never_grows_output(program in arb_program()) {
        let plain = compile_with_options(&program, CompileOptions { optimize: false }).unwrap();
        let optimized = compile(&program).unwrap();
        prop_assert!(optimized.lines().count() <= plain.lines().count());
        prop_assert_eq!(compile(&program).unwrap(), optimized);
    }

    /// Parameter offsets are 1..=P and local offsets P+1..=P+L regardless
    /// of declaration interleaving.
    #[test]
    fn test_frame_offsets(order in prop::collection::vec(any::<bool>(), 0..20)) {
        let mut table = SymbolTable::new();
        table.enter_subprogram("sub");

        let (mut params, mut locals) = (Vec::new(), Vec::new());
        for (i, is_param) in order.iter().enumerate() {
            let name = format!("v{}", i);
            if *is_param {
                table.declare_parameter(&name).unwrap();
                params.push(name);
            } else {
                table.declare_local(&name).unwrap();
                locals.push(name);
            }
        }

        let p = params.len() as u16;
        prop_assert_eq!(table.frame_size("sub"), Some((p, locals.len() as u16)));
        for (i, name) in params.iter().enumerate() {
            prop_assert_eq!(table.lookup_frame_offset(name), Some(i as u16 + 1));
        }
        for (j, name) in locals.iter().enumerate() {
            prop_assert_eq!(table.lookup_frame_offset(name), Some(p + j as u16 + 1));
        }
    }

    /// Constants read back exactly; global addresses strictly increase.
    #[test]
    fn test_declarations(values in prop::collection::vec(any::<i32>(), 1..20)) {
        let mut table = SymbolTable::new();
        let mut last = None;
        for (i, value) in values.iter().enumerate() {
            table.declare_constant(&format!("c{}", i), *value).unwrap();
            let address = table.declare_global_variable(&format!("g{}", i)).unwrap();
            if let Some(prev) = last {
                prop_assert!(address > prev);
            }
            last = Some(address);
        }
        for (i, value) in values.iter().enumerate() {
            prop_assert_eq!(table.lookup_constant(&format!("c{}", i)), Some(*value));
            let name = format!("c{}", i);
            prop_assert!(table.declare_global_variable(&name).is_err());
        }
    }
}
