//! Compiler optimizations for the PL/0 compiler.
//!
//! Includes:
//! - Constant folding (AST-level)
//! - Peephole optimization (assembly-level)

use crate::ast::{BinaryOp, Condition, Expression};

/// Constant folder for compile-time expression evaluation.
///
/// Identifiers fold through a caller-supplied constant lookup, so the folder
/// stays independent of scoping rules.
pub struct ConstantFolder;

impl ConstantFolder {
    /// Fold an expression to a constant value if every leaf is constant.
    pub fn fold_expression<F>(expr: &Expression, lookup: &F) -> Option<i32>
    where
        F: Fn(&str) -> Option<i32>,
    {
        match expr {
            Expression::Number(n) => Some(*n),
            Expression::Char(c) => Some(*c as i32),
            Expression::Identifier(name) => lookup(name),
            Expression::Binary(op, lhs, rhs) => {
                let left = Self::fold_expression(lhs, lookup)?;
                let right = Self::fold_expression(rhs, lookup)?;
                Some(Self::apply_op(left, *op, right))
            }
            Expression::Call(_) => None,
        }
    }

    /// Fold an equality condition to its truth value.
    ///
    /// Operands compare as 16-bit words, matching the run-time subtraction.
    pub fn fold_condition<F>(condition: &Condition, lookup: &F) -> Option<bool>
    where
        F: Fn(&str) -> Option<i32>,
    {
        let lhs = Self::fold_expression(&condition.lhs, lookup)?;
        let rhs = Self::fold_expression(&condition.rhs, lookup)?;
        Some(lhs as u16 == rhs as u16)
    }

    /// Apply a binary operation. Division by zero yields 0; other division
    /// truncates toward zero.
    pub fn apply_op(left: i32, op: BinaryOp, right: i32) -> i32 {
        match op {
            BinaryOp::Add => left.wrapping_add(right),
            BinaryOp::Sub => left.wrapping_sub(right),
            BinaryOp::Mul => left.wrapping_mul(right),
            BinaryOp::Div if right == 0 => 0,
            BinaryOp::Div => left.wrapping_div(right),
        }
    }
}

/// Peephole optimizer for J1 assembly text.
pub struct PeepholeOptimizer;

impl PeepholeOptimizer {
    /// Single left-to-right pass over adjacent line pairs.
    ///
    /// A removed pair is never re-examined against its new neighbours.
    pub fn optimize(asm: &str) -> String {
        let lines: Vec<&str> = asm.lines().collect();
        let mut optimized: Vec<&str> = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];

            // Pattern: ; a / ; b → ; a
            if Self::is_comment(line) && optimized.last().is_some_and(|prev| Self::is_comment(prev))
            {
                i += 1;
                continue;
            }

            if i + 1 < lines.len() && Self::is_cancelling_pair(line, lines[i + 1]) {
                i += 2;
                continue;
            }

            optimized.push(line);
            i += 1;
        }

        if optimized.is_empty() {
            String::new()
        } else {
            optimized.join("\n") + "\n"
        }
    }

    fn is_comment(line: &str) -> bool {
        line.trim_start().starts_with(';')
    }

    /// Pairs that leave the stack exactly as they found it.
    fn is_cancelling_pair(first: &str, second: &str) -> bool {
        matches!(
            (first.trim(), second.trim()),
            // x + 0
            ("LIT 0", "ADD")
                // double swap
                | ("SWAP", "SWAP")
                // copy then discard
                | ("DUP", "DROP")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_constants(_: &str) -> Option<i32> {
        None
    }

    fn num(n: i32) -> Expression {
        Expression::Number(n)
    }

    fn bin(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::binary(op, lhs, rhs)
    }

    // ========================================================================
    // Constant Folding Tests
    // ========================================================================

    #[test]
    fn test_fold_integer_constant() {
        assert_eq!(ConstantFolder::fold_expression(&num(42), &no_constants), Some(42));
    }

    #[test]
    fn test_fold_char_literal() {
        let expr = Expression::Char('A');
        assert_eq!(ConstantFolder::fold_expression(&expr, &no_constants), Some(65));
    }

    #[test]
    fn test_fold_simple_arithmetic() {
        let cases = [
            (BinaryOp::Add, 2, 3, 5),
            (BinaryOp::Sub, 10, 4, 6),
            (BinaryOp::Mul, 6, 7, 42),
            (BinaryOp::Div, 20, 4, 5),
        ];
        for (op, l, r, expected) in cases {
            let expr = bin(op, num(l), num(r));
            assert_eq!(
                ConstantFolder::fold_expression(&expr, &no_constants),
                Some(expected),
                "{} {} {}",
                l,
                op.as_char(),
                r
            );
        }
    }

    #[test]
    fn test_fold_division_truncates_toward_zero() {
        assert_eq!(ConstantFolder::apply_op(7, BinaryOp::Div, 2), 3);
        assert_eq!(ConstantFolder::apply_op(-7, BinaryOp::Div, 2), -3);
        assert_eq!(ConstantFolder::apply_op(7, BinaryOp::Div, -2), -3);
    }

    #[test]
    fn test_fold_division_by_zero_is_zero() {
        let expr = bin(BinaryOp::Div, num(9), num(0));
        assert_eq!(ConstantFolder::fold_expression(&expr, &no_constants), Some(0));
    }

    #[test]
    fn test_fold_wraps_instead_of_overflowing() {
        assert_eq!(ConstantFolder::apply_op(i32::MAX, BinaryOp::Add, 1), i32::MIN);
        assert_eq!(ConstantFolder::apply_op(i32::MIN, BinaryOp::Div, -1), i32::MIN);
    }

    #[test]
    fn test_fold_nested() {
        // (2 + 3) * (10 - 4) / 3
        let expr = bin(
            BinaryOp::Div,
            bin(
                BinaryOp::Mul,
                bin(BinaryOp::Add, num(2), num(3)),
                bin(BinaryOp::Sub, num(10), num(4)),
            ),
            num(3),
        );
        assert_eq!(ConstantFolder::fold_expression(&expr, &no_constants), Some(10));
    }

    #[test]
    fn test_fold_uses_constant_lookup() {
        let lookup = |name: &str| match name {
            "a" => Some(2),
            "b" => Some(3),
            _ => None,
        };
        let sum = bin(BinaryOp::Add, Expression::ident("a"), Expression::ident("b"));
        assert_eq!(ConstantFolder::fold_expression(&sum, &lookup), Some(5));

        let mixed = bin(BinaryOp::Add, Expression::ident("a"), Expression::ident("x"));
        assert_eq!(ConstantFolder::fold_expression(&mixed, &lookup), None);
    }

    #[test]
    fn test_fold_call_is_not_constant() {
        let expr = bin(BinaryOp::Add, num(1), Expression::call("f", vec![]));
        assert_eq!(ConstantFolder::fold_expression(&expr, &no_constants), None);
    }

    #[test]
    fn test_fold_condition() {
        let equal = Condition::equal(num(4), bin(BinaryOp::Add, num(2), num(2)));
        assert_eq!(ConstantFolder::fold_condition(&equal, &no_constants), Some(true));

        let unequal = Condition::equal(num(4), num(5));
        assert_eq!(ConstantFolder::fold_condition(&unequal, &no_constants), Some(false));

        let unknown = Condition::equal(Expression::ident("x"), num(5));
        assert_eq!(ConstantFolder::fold_condition(&unknown, &no_constants), None);
    }

    #[test]
    fn test_fold_condition_compares_words() {
        let cond = Condition::equal(num(-1), num(65535));
        assert_eq!(ConstantFolder::fold_condition(&cond, &no_constants), Some(true));
    }

    // ========================================================================
    // Peephole Optimization Tests
    // ========================================================================

    #[test]
    fn test_peephole_zero_add() {
        assert_eq!(PeepholeOptimizer::optimize("DUP\nLIT 0\nADD\n"), "DUP\n");
    }

    #[test]
    fn test_peephole_double_swap() {
        assert_eq!(PeepholeOptimizer::optimize("SWAP\nSWAP\nEXIT\n"), "EXIT\n");
    }

    #[test]
    fn test_peephole_dup_drop() {
        assert_eq!(PeepholeOptimizer::optimize("LIT 1\nDUP\nDROP\n"), "LIT 1\n");
    }

    #[test]
    fn test_peephole_comment_run() {
        let input = "; first\n; second\n; third\nDUP\n; fourth\n";
        assert_eq!(PeepholeOptimizer::optimize(input), "; first\nDUP\n; fourth\n");
    }

    #[test]
    fn test_peephole_other_literals_kept() {
        let input = "LIT 1\nADD\nLIT 0\nSUB\n";
        assert_eq!(PeepholeOptimizer::optimize(input), input);
    }

    #[test]
    fn test_peephole_label_breaks_pattern() {
        let input = "LIT 0\nWB1:\nADD\n";
        assert_eq!(PeepholeOptimizer::optimize(input), input);
    }

    #[test]
    fn test_peephole_ignores_surrounding_whitespace() {
        assert_eq!(PeepholeOptimizer::optimize("  DUP \n\tDROP\nEXIT\n"), "EXIT\n");
    }

    #[test]
    fn test_peephole_does_not_cascade() {
        assert_eq!(PeepholeOptimizer::optimize("SWAP\nSWAP\nSWAP\n"), "SWAP\n");
        assert_eq!(
            PeepholeOptimizer::optimize("DUP\nDUP\nDROP\nDROP\n"),
            "DUP\nDROP\n"
        );
    }

    #[test]
    fn test_peephole_empty_input() {
        assert_eq!(PeepholeOptimizer::optimize(""), "");
        assert_eq!(PeepholeOptimizer::optimize("DUP\nDROP\n"), "");
    }
}
