//! Numeric equation solving in one variable.

use super::expr::{parse, BinOp, Expr};
use super::format_number;
use crate::error::{Result, SvarError};
use std::collections::HashMap;

const SCAN_MIN: f64 = -1000.0;
const SCAN_MAX: f64 = 1000.0;
const SCAN_STEPS: usize = 200_000;
const ROOT_TOLERANCE: f64 = 1e-6;
const MAX_LISTED_ROOTS: usize = 10;

/// Real roots of an equation.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// The equation as displayed, always in `lhs = rhs` form.
    pub equation: String,
    pub variable: String,
    /// Roots in ascending order.
    pub roots: Vec<f64>,
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solution = match self.roots.as_slice() {
            [] => "No real solutions found".to_string(),
            [root] => format!("{} = {}", self.variable, format_number(*root)),
            roots => {
                let listed = roots
                    .iter()
                    .take(MAX_LISTED_ROOTS)
                    .map(|r| format_number(*r))
                    .collect::<Vec<_>>()
                    .join(", ");
                if roots.len() > MAX_LISTED_ROOTS {
                    format!(
                        "{} = [{}, ...] ({} roots in [{}, {}])",
                        self.variable,
                        listed,
                        roots.len(),
                        SCAN_MIN,
                        SCAN_MAX
                    )
                } else {
                    format!("{} = [{}]", self.variable, listed)
                }
            }
        };

        write!(
            f,
            "EQUATION SOLUTION\nEquation: {}\nVariable: {}\nSolution: {}",
            self.equation, self.variable, solution
        )
    }
}

/// Solve `equation` for `variable`.
///
/// Accepts either `lhs = rhs` or a bare expression that is taken to equal zero.
/// Real roots in [-1000, 1000] are located by a grid scan and refined by bisection;
/// sign changes across poles are discarded.
pub fn solve(equation: &str, variable: &str) -> Result<Solution> {
    let variable = variable.trim().to_lowercase();
    if variable.is_empty() {
        return Err(SvarError::Math("No variable given".to_string()));
    }

    let (expr, display) = parse_equation(equation)?;

    let symbols = expr.variables();
    if !symbols.contains(&variable) {
        return Err(SvarError::Math(format!(
            "Equation does not contain the variable '{}'",
            variable
        )));
    }
    if let Some(other) = symbols.iter().find(|s| **s != variable) {
        return Err(SvarError::Math(format!(
            "Equation contains an unknown symbol '{}'",
            other
        )));
    }

    let roots = find_roots(&expr, &variable);
    Ok(Solution {
        equation: display,
        variable,
        roots,
    })
}

fn parse_equation(equation: &str) -> Result<(Expr, String)> {
    let sides: Vec<&str> = equation.split('=').filter(|s| !s.trim().is_empty()).collect();
    match sides.as_slice() {
        [expr] => Ok((parse(expr)?, format!("{} = 0", expr.trim()))),
        [lhs, rhs] => {
            let expr = Expr::Binary(BinOp::Sub, Box::new(parse(lhs)?), Box::new(parse(rhs)?));
            Ok((expr, format!("{} = {}", lhs.trim(), rhs.trim())))
        }
        _ => Err(SvarError::Math(format!("Cannot parse equation '{}'", equation))),
    }
}

fn find_roots(expr: &Expr, variable: &str) -> Vec<f64> {
    let mut vars = HashMap::new();
    let mut f = |x: f64| -> Option<f64> {
        vars.insert(variable.to_string(), x);
        expr.eval(&vars).ok()
    };

    let step = (SCAN_MAX - SCAN_MIN) / SCAN_STEPS as f64;
    let xs: Vec<f64> = (0..=SCAN_STEPS).map(|i| SCAN_MIN + i as f64 * step).collect();
    let ys: Vec<Option<f64>> = xs.iter().map(|&x| f(x)).collect();

    let mut roots = Vec::new();

    for i in 0..xs.len() {
        let Some(y) = ys[i] else { continue };

        if y == 0.0 {
            roots.push(xs[i]);
            continue;
        }

        // Sign change between neighbours
        if let Some(Some(next)) = ys.get(i + 1) {
            if y * next < 0.0 {
                let root = bisect(&mut f, xs[i], xs[i + 1]);
                if f(root).is_some_and(|v| v.abs() < ROOT_TOLERANCE) {
                    roots.push(root);
                }
                continue;
            }
        }

        // Touching roots such as x^2 = 0 show up as a shallow local minimum of |f|
        if i > 0 && i + 1 < xs.len() {
            if let (Some(prev), Some(next)) = (ys[i - 1], ys[i + 1]) {
                if y.abs() < 1e-3 && y.abs() <= prev.abs() && y.abs() <= next.abs() {
                    let x = minimize_abs(&mut f, xs[i - 1], xs[i + 1]);
                    if f(x).is_some_and(|v| v.abs() < 1e-9) {
                        roots.push(x);
                    }
                }
            }
        }
    }

    let mut cleaned: Vec<f64> = roots.into_iter().map(clean_root).collect();
    cleaned.sort_by(|a, b| a.total_cmp(b));
    cleaned.dedup_by(|a, b| (*a - *b).abs() < ROOT_TOLERANCE);
    cleaned
}

fn bisect<F: FnMut(f64) -> Option<f64>>(f: &mut F, mut lo: f64, mut hi: f64) -> f64 {
    let Some(mut f_lo) = f(lo) else { return lo };
    for _ in 0..100 {
        let mid = (lo + hi) / 2.0;
        let Some(f_mid) = f(mid) else { return mid };
        if f_mid == 0.0 {
            return mid;
        }
        if f_lo * f_mid < 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }
    (lo + hi) / 2.0
}

fn minimize_abs<F: FnMut(f64) -> Option<f64>>(f: &mut F, mut lo: f64, mut hi: f64) -> f64 {
    for _ in 0..200 {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        let a = f(m1).map(f64::abs).unwrap_or(f64::INFINITY);
        let b = f(m2).map(f64::abs).unwrap_or(f64::INFINITY);
        if a < b {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    (lo + hi) / 2.0
}

/// Round away floating-point noise and snap near-integers.
fn clean_root(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() < 1e-7 {
        return nearest + 0.0;
    }
    (x * 1e9).round() / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic() {
        let solution = solve("x**2 - 9", "x").unwrap();
        assert_eq!(solution.roots, vec![-3.0, 3.0]);
        assert!(solution.to_string().ends_with("Solution: x = [-3, 3]"));
        assert!(solution.to_string().contains("Equation: x**2 - 9 = 0"));
    }

    #[test]
    fn test_linear_with_equals() {
        let solution = solve("2x + 3 = 11", "x").unwrap();
        assert_eq!(solution.roots, vec![4.0]);
        assert!(solution.to_string().ends_with("Solution: x = 4"));

        let solution = solve("2*x + 5", "x").unwrap();
        assert_eq!(solution.roots, vec![-2.5]);
    }

    #[test]
    fn test_double_root() {
        let solution = solve("(y - 1)^2", "y").unwrap();
        assert_eq!(solution.roots, vec![1.0]);
    }

    #[test]
    fn test_no_real_roots() {
        let solution = solve("x^2 + 1", "x").unwrap();
        assert!(solution.roots.is_empty());
        assert!(solution.to_string().ends_with("No real solutions found"));
    }

    #[test]
    fn test_pole_is_not_a_root() {
        let solution = solve("1 / (x - 2)", "x").unwrap();
        assert!(solution.roots.is_empty());
    }

    #[test]
    fn test_rejects_wrong_variable() {
        assert!(solve("x + 1", "t").is_err());
        assert!(solve("x + y", "x").is_err());
        assert!(solve("x = 1 = 2", "x").is_err());
    }
}
