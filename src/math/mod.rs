//! Calculator and equation solver backing the agent's math tools.

mod expr;
mod solve;

pub use expr::{parse, BinOp, Expr};
pub use solve::{solve, Solution};

use crate::error::{Result, SvarError};
use std::collections::HashMap;

/// How an expression was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationKind {
    /// Plain arithmetic on literals.
    Arithmetic,
    /// Functions, constants or powers.
    Scientific,
}

impl std::fmt::Display for CalculationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalculationKind::Arithmetic => write!(f, "Arithmetic calculation"),
            CalculationKind::Scientific => write!(f, "Scientific calculation"),
        }
    }
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub expression: String,
    pub value: f64,
    pub kind: CalculationKind,
}

impl std::fmt::Display for Calculation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CALCULATION RESULT\nExpression: {}\nResult: {}\nType: {}",
            self.expression,
            format_number(self.value),
            self.kind
        )
    }
}

/// Evaluate a closed expression (no free variables).
pub fn calculate(expression: &str) -> Result<Calculation> {
    let parsed = parse(expression)?;

    if let Some(symbol) = parsed.variables().first() {
        return Err(SvarError::Math(format!(
            "Unknown symbol '{}'. Use solve_equation for equations with variables.",
            symbol
        )));
    }

    let value = parsed.eval(&HashMap::new())?;
    let kind = if is_plain_arithmetic(expression) {
        CalculationKind::Arithmetic
    } else {
        CalculationKind::Scientific
    };

    Ok(Calculation {
        expression: expression.trim().to_string(),
        value,
        kind,
    })
}

/// Digits, `+ - * / . ( )` and spaces only; `**` counts, `^` and `%` do not.
fn is_plain_arithmetic(expression: &str) -> bool {
    expression
        .chars()
        .all(|c| c.is_ascii_digit() || "+-*/.() ".contains(c))
}

/// Format a number without a trailing fractional part when it is integral.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    if !(1e-6..1e15).contains(&abs) {
        return format!("{:e}", value);
    }
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }

    let fixed = format!("{:.10}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}
