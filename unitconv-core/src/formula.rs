//! Conversion formulas
//!
//! Catalog formulas are arithmetic over a single variable `n` (the value
//! being converted), e.g. `n*0.6213711` or `(n-32)*5/9`. They are parsed once
//! when the catalog is loaded and interpreted from the typed form afterwards.
//!
//! Grammar:
//! ```text
//! expr    = term (('+' | '-') term)*
//! term    = unary (('*' | '/') unary)*
//! unary   = ('-' | '+') unary | power
//! power   = primary (('^' | '**') unary)?      right associative
//! primary = number | 'n' | func '(' expr ')' | '(' expr ')'
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name of the free variable bound to the input value
pub const VARIABLE: &str = "n";

/// Deepest nesting of parentheses, calls, signs and powers the parser accepts
pub const MAX_DEPTH: usize = 256;

/// Errors from parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("Empty formula")]
    Empty,

    #[error("Unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Unknown variable '{0}', only 'n' is allowed")]
    UnknownVariable(String),

    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Result is not a finite number")]
    NonFinite,

    #[error("Formula nested deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Variable,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Func(Func),
}

/// Functions callable from a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Abs,
    Sqrt,
    Floor,
    Ceil,
    Round,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Func::Abs),
            "sqrt" => Some(Func::Sqrt),
            "floor" => Some(Func::Floor),
            "ceil" => Some(Func::Ceil),
            "round" => Some(Func::Round),
            _ => None,
        }
    }

    fn apply(self, x: f64) -> Result<f64, FormulaError> {
        match self {
            Func::Abs => Ok(x.abs()),
            Func::Sqrt if x < 0.0 => Err(FormulaError::Domain(format!("sqrt of negative value {}", x))),
            Func::Sqrt => Ok(x.sqrt()),
            Func::Floor => Ok(x.floor()),
            Func::Ceil => Ok(x.ceil()),
            Func::Round => Ok(x.round_ties_even()),
        }
    }
}

/// AST node for formulas
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var,
    BinOp(Box<Expr>, Op, Box<Expr>),
    Neg(Box<Expr>),
    Call(Func, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' if chars.get(i + 1) == Some(&'*') => { tokens.push(Token::Caret); i += 2; }
            '*' => { tokens.push(Token::Star); i += 1; }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '^' => { tokens.push(Token::Caret); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '_') {
                    i += 1;
                }
                // Exponent part, only when digits follow (1e3, 2.5E-4)
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
                let literal: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                let value = literal.parse::<f64>()
                    .map_err(|_| FormulaError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                if ident == VARIABLE {
                    tokens.push(Token::Variable);
                } else if let Some(func) = Func::from_name(&ident.to_lowercase()) {
                    tokens.push(Token::Func(func));
                } else {
                    return Err(FormulaError::UnknownVariable(ident));
                }
            }
            _ => return Err(FormulaError::UnexpectedChar(ch)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, depth: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect_rparen(&mut self) -> Result<(), FormulaError> {
        match self.peek() {
            Some(Token::RParen) => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(FormulaError::UnexpectedToken(format!("{:?}, expected ')'", token))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    // Every recursive path (parens, calls, signs, powers) passes through here
    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.parse_signed();
        self.depth -= 1;
        result
    }

    // Unary minus binds looser than power: -2^2 == -(2^2)
    fn parse_signed(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.parse_primary()?;

        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Expr::BinOp(Box::new(base), Op::Pow, Box::new(exponent)));
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek().cloned() {
            Some(Token::Number(value)) => {
                self.advance();
                Ok(Expr::Num(value))
            }
            Some(Token::Variable) => {
                self.advance();
                Ok(Expr::Var)
            }
            Some(Token::Func(func)) => {
                self.advance();
                if !matches!(self.peek(), Some(Token::LParen)) {
                    return Err(FormulaError::UnexpectedToken(format!("expected '(' after {:?}", func)));
                }
                self.advance();
                let arg = self.parse_expr()?;
                self.expect_rparen()?;
                Ok(Expr::Call(func, Box::new(arg)))
            }
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Some(token) => Err(FormulaError::UnexpectedToken(format!("{:?}", token))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

impl Expr {
    /// Evaluate with `n` bound to `value`
    pub fn eval(&self, value: f64) -> Result<f64, FormulaError> {
        match self {
            Expr::Num(x) => Ok(*x),
            Expr::Var => Ok(value),
            Expr::BinOp(left, op, right) => {
                let l = left.eval(value)?;
                let r = right.eval(value)?;
                match op {
                    Op::Add => Ok(l + r),
                    Op::Sub => Ok(l - r),
                    Op::Mul => Ok(l * r),
                    Op::Div if r == 0.0 => Err(FormulaError::DivisionByZero),
                    Op::Div => Ok(l / r),
                    Op::Pow if l == 0.0 && r < 0.0 => Err(FormulaError::DivisionByZero),
                    Op::Pow if l < 0.0 && r.fract() != 0.0 => Err(FormulaError::Domain(
                        "negative base with non-integer exponent".to_string(),
                    )),
                    Op::Pow => Ok(l.powf(r)),
                }
            }
            Expr::Neg(inner) => Ok(-inner.eval(value)?),
            Expr::Call(func, arg) => func.apply(arg.eval(value)?),
        }
    }
}

/// A parsed conversion formula together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expr()?;

        if let Some(token) = parser.peek() {
            return Err(FormulaError::UnexpectedToken(format!("{:?} at end of formula", token)));
        }

        Ok(Formula {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// The formula as written in the catalog
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Apply the formula to `n`. Non-finite results are errors.
    pub fn eval(&self, n: f64) -> Result<f64, FormulaError> {
        let result = self.expr.eval(n)?;
        if result.is_finite() {
            Ok(result)
        } else {
            Err(FormulaError::NonFinite)
        }
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, n: f64) -> f64 {
        Formula::parse(source).unwrap().eval(n).unwrap()
    }

    #[test]
    fn test_tokenize_simple() {
        let tokens = tokenize("n * 1000").unwrap();
        assert_eq!(tokens, vec![Token::Variable, Token::Star, Token::Number(1000.0)]);
    }

    #[test]
    fn test_tokenize_double_star_is_power() {
        let tokens = tokenize("n**2").unwrap();
        assert_eq!(tokens, vec![Token::Variable, Token::Caret, Token::Number(2.0)]);
    }

    #[test]
    fn test_tokenize_exponent_literal() {
        let tokens = tokenize("n*1.5e-3").unwrap();
        assert_eq!(tokens[2], Token::Number(0.0015));
    }

    #[test]
    fn test_linear() {
        assert!((eval("n*0.6213711", 4.0) - 2.4854844).abs() < 1e-12);
        assert_eq!(eval("n/1000", 4000.0), 4.0);
    }

    #[test]
    fn test_affine() {
        assert_eq!(eval("(n*9/5)+32", 100.0), 212.0);
        assert_eq!(eval("(n-32)*5/9", 212.0), 100.0);
        assert!((eval("n+273.15", 0.0) - 273.15).abs() < 1e-12);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + n * 3", 4.0), 14.0);
        assert_eq!(eval("(2 + n) * 3", 4.0), 18.0);
        assert_eq!(eval("n - 1 - 1", 4.0), 2.0);
        assert_eq!(eval("n / 2 / 2", 8.0), 2.0);
    }

    #[test]
    fn test_power() {
        assert_eq!(eval("n^2", 3.0), 9.0);
        assert_eq!(eval("n**2", 3.0), 9.0);
        // Right associative
        assert_eq!(eval("2^3^2", 0.0), 512.0);
        // Unary minus applies after power
        assert_eq!(eval("-n^2", 3.0), -9.0);
        assert_eq!(eval("2**-1", 0.0), 0.5);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("sqrt(n)", 16.0), 4.0);
        assert_eq!(eval("abs(n - 10)", 4.0), 6.0);
        assert_eq!(eval("floor(n / 3)", 10.0), 3.0);
        assert_eq!(eval("ceil(n / 3)", 10.0), 4.0);
        assert_eq!(eval("round(n)", 2.5), 2.0);
    }

    #[test]
    fn test_unknown_variable() {
        assert_eq!(
            Formula::parse("x * 2").unwrap_err(),
            FormulaError::UnknownVariable("x".to_string())
        );
    }

    #[test]
    fn test_rejects_calls_and_trailing_tokens() {
        assert!(Formula::parse("__import__(n)").is_err());
        assert!(Formula::parse("n 2").is_err());
        assert!(Formula::parse("(n * 2").is_err());
        assert_eq!(Formula::parse("  ").unwrap_err(), FormulaError::Empty);
    }

    #[test]
    fn test_division_by_zero() {
        let formula = Formula::parse("1 / n").unwrap();
        assert_eq!(formula.eval(0.0), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_sqrt_negative() {
        let formula = Formula::parse("sqrt(n)").unwrap();
        assert!(matches!(formula.eval(-1.0), Err(FormulaError::Domain(_))));
    }

    #[test]
    fn test_overflow_is_non_finite() {
        let formula = Formula::parse("n * 1e308").unwrap();
        assert_eq!(formula.eval(10.0), Err(FormulaError::NonFinite));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let parens = format!("{}n{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(Formula::parse(&parens).unwrap_err(), FormulaError::TooDeep(MAX_DEPTH));

        let signs = format!("{}n", "-".repeat(200_000));
        assert_eq!(Formula::parse(&signs).unwrap_err(), FormulaError::TooDeep(MAX_DEPTH));

        let powers = vec!["n"; 200_000].join("^");
        assert_eq!(Formula::parse(&powers).unwrap_err(), FormulaError::TooDeep(MAX_DEPTH));
    }

    #[test]
    fn test_moderate_nesting_accepted() {
        let formula = format!("{}n*2{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&formula, 3.0), 6.0);
        assert_eq!(eval("--n", 3.0), 3.0);
    }

    #[test]
    fn test_source_kept() {
        let formula: Formula = " n*1000 ".parse().unwrap();
        assert_eq!(formula.source(), "n*1000");
        assert_eq!(formula.to_string(), "n*1000");
    }
}
