//! Expression tokenizer, parser and evaluator.

use crate::error::{Result, SvarError};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    LParen,
    RParen,
    Comma,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Variable or named constant, resolved at evaluation time.
    Var(String),
    Neg(Box<Expr>),
    Factorial(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "sqrt", "cbrt", "exp",
    "ln", "log", "log10", "log2", "abs", "floor", "ceil", "round", "min", "max", "factorial",
];

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "tau" => Some(std::f64::consts::TAU),
        _ => None,
    }
}

fn math_err(msg: impl Into<String>) -> SvarError {
    SvarError::Math(msg.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation: 1e5, 2.5E-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| math_err(format!("Invalid number '{}'", text)))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' | '\u{2212}' => Token::Minus,
                    '*' | '\u{00d7}' => Token::Star,
                    '/' | '\u{00f7}' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Caret,
                    '!' => Token::Bang,
                    '(' | '[' => Token::LParen,
                    ')' | ']' => Token::RParen,
                    ',' => Token::Comma,
                    other => return Err(math_err(format!("Unexpected character '{}'", other))),
                };
                tokens.push(token);
                i += 1;
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(math_err(format!("Expected {:?}, found {:?}", expected, t))),
            None => Err(math_err(format!("Expected {:?} at end of input", expected))),
        }
    }

    fn expression(&mut self) -> Result<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                // Implicit multiplication: 2x, 3(4 + 1), (a)(b)
                Some(Token::Number(_)) | Some(Token::Ident(_)) | Some(Token::LParen) => {
                    let right = self.power()?;
                    left = Expr::Binary(BinOp::Mul, Box::new(left), Box::new(right));
                    continue;
                }
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.postfix()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            // Right associative: 2^3^2 = 2^(3^2)
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        while self.peek() == Some(&Token::Bang) {
            self.pos += 1;
            expr = Expr::Factorial(Box::new(expr));
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) && FUNCTIONS.contains(&name.as_str()) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.pos += 1;
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(t) => Err(math_err(format!("Unexpected token {:?}", t))),
            None => Err(math_err("Unexpected end of expression")),
        }
    }
}

/// Parse an expression string into an [`Expr`] tree.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(math_err("Empty expression"));
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;

    if let Some(t) = parser.peek() {
        return Err(math_err(format!("Unexpected trailing input at {:?}", t)));
    }
    Ok(expr)
}

impl Expr {
    /// Evaluate the expression with the given variable bindings.
    pub fn eval(&self, vars: &HashMap<String, f64>) -> Result<f64> {
        let value = match self {
            Expr::Number(n) => *n,
            Expr::Var(name) => vars
                .get(name)
                .copied()
                .or_else(|| constant(name))
                .ok_or_else(|| math_err(format!("Unknown symbol '{}'", name)))?,
            Expr::Neg(inner) => -inner.eval(vars)?,
            Expr::Factorial(inner) => factorial(inner.eval(vars)?)?,
            Expr::Binary(op, l, r) => {
                let a = l.eval(vars)?;
                let b = r.eval(vars)?;
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => {
                        if b == 0.0 {
                            return Err(math_err("Division by zero"));
                        }
                        a / b
                    }
                    BinOp::Rem => {
                        if b == 0.0 {
                            return Err(math_err("Modulo by zero"));
                        }
                        // Floored modulo, the sign follows the divisor
                        a - b * (a / b).floor()
                    }
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(name, args) => call(name, args, vars)?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(math_err("Result is undefined or not a finite number"))
        }
    }

    /// Names of all free symbols, excluding known constants.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Var(name) => {
                if constant(name).is_none() && !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Neg(inner) | Expr::Factorial(inner) => inner.collect_variables(out),
            Expr::Binary(_, l, r) => {
                l.collect_variables(out);
                r.collect_variables(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_variables(out)),
        }
    }
}

fn call(name: &str, args: &[Expr], vars: &HashMap<String, f64>) -> Result<f64> {
    let values = args
        .iter()
        .map(|a| a.eval(vars))
        .collect::<Result<Vec<f64>>>()?;

    let arity = |n: usize| -> Result<()> {
        if values.len() == n {
            Ok(())
        } else {
            Err(math_err(format!(
                "{}() takes {} argument(s), got {}",
                name,
                n,
                values.len()
            )))
        }
    };

    let value = match name {
        "min" | "max" => {
            if values.is_empty() {
                return Err(math_err(format!("{}() needs at least one argument", name)));
            }
            let init = values[0];
            if name == "min" {
                values.iter().copied().fold(init, f64::min)
            } else {
                values.iter().copied().fold(init, f64::max)
            }
        }
        "log" => match values.as_slice() {
            [x] => positive(name, *x)?.ln(),
            [x, base] => positive(name, *x)?.ln() / positive(name, *base)?.ln(),
            _ => return Err(math_err("log() takes 1 or 2 arguments")),
        },
        _ => {
            arity(1)?;
            let x = values[0];
            match name {
                "sin" => x.sin(),
                "cos" => x.cos(),
                "tan" => x.tan(),
                "asin" => x.asin(),
                "acos" => x.acos(),
                "atan" => x.atan(),
                "sinh" => x.sinh(),
                "cosh" => x.cosh(),
                "tanh" => x.tanh(),
                "sqrt" => {
                    if x < 0.0 {
                        return Err(math_err("sqrt() of a negative number"));
                    }
                    x.sqrt()
                }
                "cbrt" => x.cbrt(),
                "exp" => x.exp(),
                "ln" => positive(name, x)?.ln(),
                "log10" => positive(name, x)?.log10(),
                "log2" => positive(name, x)?.log2(),
                "abs" => x.abs(),
                "floor" => x.floor(),
                "ceil" => x.ceil(),
                "round" => x.round(),
                "factorial" => factorial(x)?,
                other => return Err(math_err(format!("Unknown function '{}'", other))),
            }
        }
    };

    Ok(value)
}

fn positive(name: &str, x: f64) -> Result<f64> {
    if x > 0.0 {
        Ok(x)
    } else {
        Err(math_err(format!("{}() requires a positive argument", name)))
    }
}

fn factorial(n: f64) -> Result<f64> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err(math_err("factorial requires a non-negative integer"));
    }
    if n > 170.0 {
        return Err(math_err("factorial argument too large"));
    }
    Ok((1..=n as u64).fold(1.0, |acc, k| acc * k as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str) -> f64 {
        parse(input).unwrap().eval(&HashMap::new()).unwrap()
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(10 + 2) * 3"), 36.0);
        assert_eq!(eval("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(eval("2 ** 10"), 1024.0);
        assert_eq!(eval("-2 ^ 2"), -4.0);
        assert_eq!(eval("100 / 5 - 3"), 17.0);
        assert_eq!(eval("-7 % 3"), 2.0);
    }

    #[test]
    fn test_functions_and_constants() {
        assert!((eval("sin(pi / 2)") - 1.0).abs() < 1e-12);
        assert_eq!(eval("sqrt(16)"), 4.0);
        assert!((eval("log(e)") - 1.0).abs() < 1e-12);
        assert!((eval("log(8, 2)") - 3.0).abs() < 1e-12);
        assert_eq!(eval("max(3, 9, 4)"), 9.0);
        assert_eq!(eval("5!"), 120.0);
        assert_eq!(eval("factorial(4)"), 24.0);
        assert_eq!(eval("1.5e3"), 1500.0);
    }

    #[test]
    fn test_implicit_multiplication_and_variables() {
        let expr = parse("2x + 3(x - 1)").unwrap();
        let vars = HashMap::from([("x".to_string(), 2.0)]);
        assert_eq!(expr.eval(&vars).unwrap(), 7.0);
        assert_eq!(expr.variables(), vec!["x".to_string()]);
    }

    #[test]
    fn test_errors() {
        assert!(parse("2 +").is_err());
        assert!(parse("(1 + 2").is_err());
        assert!(parse("1 + 2)").is_err());
        assert!(parse("").is_err());
        assert!(parse("2 $ 3").is_err());

        let empty = HashMap::new();
        assert!(parse("1 / 0").unwrap().eval(&empty).is_err());
        assert!(parse("sqrt(-1)").unwrap().eval(&empty).is_err());
        assert!(parse("y + 1").unwrap().eval(&empty).is_err());
        assert!(parse("sin(1, 2)").unwrap().eval(&empty).is_err());
    }
}
