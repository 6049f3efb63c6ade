//! Recursive-descent parser producing the predicate AST.
//!
//! Precedence, loosest first:
//! `or` / `||`, `and` / `&&`, `not` / `!`, comparisons (chained, `in`,
//! `not in`), `+ -`, `* / // %`, unary `-`, indexing.

use super::lexer::{Token, TokenKind, tokenize};
use super::value::{ArithOp, CmpOp, Value};
use crate::context::Feature;
use crate::error::ParseError;

/// Deepest nesting of brackets, calls, subscripts and prefix operators
/// a predicate may use.
pub const MAX_NESTING: usize = 200;

/// Built-in functions callable from a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    SharedNumbers,
    Len,
    Sum,
    Min,
    Max,
    Abs,
    Sorted,
    Set,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        Some(match name {
            "shared_numbers" => Function::SharedNumbers,
            "len" => Function::Len,
            "sum" => Function::Sum,
            "min" => Function::Min,
            "max" => Function::Max,
            "abs" => Function::Abs,
            "sorted" => Function::Sorted,
            "set" => Function::Set,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::SharedNumbers => "shared_numbers",
            Function::Len => "len",
            Function::Sum => "sum",
            Function::Min => "min",
            Function::Max => "max",
            Function::Abs => "abs",
            Function::Sorted => "sorted",
            Function::Set => "set",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Feature(Feature),
    /// Identifier outside the feature set; fails at evaluation time
    Unknown(String),
    List(Vec<Expr>),
    Index(Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
    /// Call to a function that does not exist; fails at evaluation time
    UnknownCall(String, Vec<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    /// Operands of one `and` chain, at least two
    And(Vec<Expr>),
    Or(Vec<Expr>),
    /// Left-associative chain: `a + b - c` is `a` plus `[(+, b), (-, c)]`
    Arith(Box<Expr>, Vec<(ArithOp, Expr)>),
    /// `a < b <= c` is stored as `a` plus `[(<, b), (<=, c)]`
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
}

impl Expr {
    /// Names that are neither features nor known functions.
    pub fn unknown_names(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal(_) | Expr::Feature(_) => {}
            Expr::Unknown(name) => out.push(name.clone()),
            Expr::UnknownCall(name, args) => {
                out.push(name.clone());
                args.iter().for_each(|a| a.unknown_names(out));
            }
            Expr::List(items) | Expr::Call(_, items) | Expr::And(items) | Expr::Or(items) => {
                items.iter().for_each(|a| a.unknown_names(out));
            }
            Expr::Neg(e) | Expr::Not(e) => e.unknown_names(out),
            Expr::Index(a, b) => {
                a.unknown_names(out);
                b.unknown_names(out);
            }
            Expr::Arith(first, rest) => {
                first.unknown_names(out);
                rest.iter().for_each(|(_, e)| e.unknown_names(out));
            }
            Expr::Compare(first, rest) => {
                first.unknown_names(out);
                rest.iter().for_each(|(_, e)| e.unknown_names(out));
            }
        }
    }
}

/// Parse predicate text into an expression tree.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::new(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(ParseError::new(tok.position, "unexpected token after expression"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Position reported for errors at end of input
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Ident(s)) if s == keyword)
    }

    fn keyword_at(&self, offset: usize, keyword: &str) -> bool {
        matches!(
            self.tokens.get(self.pos + offset).map(|t| &t.kind),
            Some(TokenKind::Ident(s)) if s == keyword
        )
    }

    fn position(&self) -> usize {
        self.peek().map(|t| t.position).unwrap_or(self.end)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(ParseError::new(self.position(), format!("expected {}", what)))
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(self.position(), "expression nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `parse` one nesting level down.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        self.descend()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_and()?;
        let mut operands = vec![first];
        while self.peek_keyword("or") || self.peek_kind() == Some(&TokenKind::OrOr) {
            self.pos += 1;
            operands.push(self.parse_and()?);
        }
        Ok(collapse(operands, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_not()?;
        let mut operands = vec![first];
        while self.peek_keyword("and") || self.peek_kind() == Some(&TokenKind::AndAnd) {
            self.pos += 1;
            operands.push(self.parse_not()?);
        }
        Ok(collapse(operands, Expr::And))
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.peek_keyword("not") || self.peek_kind() == Some(&TokenKind::Bang) {
            self.pos += 1;
            let inner = self.nested(Self::parse_not)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_sum()?;
        let mut rest = Vec::new();

        loop {
            let (op, width) = match self.peek_kind() {
                Some(TokenKind::EqEq) => (CmpOp::Eq, 1),
                Some(TokenKind::NotEq) => (CmpOp::Ne, 1),
                Some(TokenKind::Lt) => (CmpOp::Lt, 1),
                Some(TokenKind::Le) => (CmpOp::Le, 1),
                Some(TokenKind::Gt) => (CmpOp::Gt, 1),
                Some(TokenKind::Ge) => (CmpOp::Ge, 1),
                _ if self.peek_keyword("in") => (CmpOp::In, 1),
                _ if self.peek_keyword("not") && self.keyword_at(1, "in") => (CmpOp::NotIn, 2),
                _ => break,
            };
            self.pos += width;
            rest.push((op, self.parse_sum()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => ArithOp::Add,
                Some(TokenKind::Minus) => ArithOp::Sub,
                _ => return Ok(arith_chain(first, rest)),
            };
            self.pos += 1;
            rest.push((op, self.parse_term()?));
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_unary()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => ArithOp::Mul,
                Some(TokenKind::Slash) => ArithOp::Div,
                Some(TokenKind::DoubleSlash) => ArithOp::FloorDiv,
                Some(TokenKind::Percent) => ArithOp::Mod,
                _ => return Ok(arith_chain(first, rest)),
            };
            self.pos += 1;
            rest.push((op, self.parse_unary()?));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::Minus) {
            let inner = self.nested(Self::parse_unary)?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        if self.eat(&TokenKind::Plus) {
            return self.nested(Self::parse_unary);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let outer = self.depth;
        let mut expr = self.parse_primary()?;
        // each subscript wraps the target one level deeper
        while self.eat(&TokenKind::LBracket) {
            self.descend()?;
            let index = self.parse_or()?;
            self.expect(TokenKind::RBracket, "']'")?;
            expr = Expr::Index(Box::new(expr), Box::new(index));
        }
        self.depth = outer;
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let position = self.position();
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(ParseError::new(position, "unexpected end of expression"));
        };
        self.pos += 1;

        match token.kind {
            TokenKind::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            TokenKind::LParen => {
                let inner = self.nested(Self::parse_or)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                let items = self.nested(|p| p.parse_args(TokenKind::RBracket, "']'"))?;
                Ok(Expr::List(items))
            }
            TokenKind::Ident(name) => self.parse_name(name, position),
            _ => Err(ParseError::new(position, "expected a value")),
        }
    }

    fn parse_name(&mut self, name: String, position: usize) -> Result<Expr, ParseError> {
        if name.eq_ignore_ascii_case("true") {
            return Ok(Expr::Literal(Value::Bool(true)));
        }
        if name.eq_ignore_ascii_case("false") {
            return Ok(Expr::Literal(Value::Bool(false)));
        }
        if matches!(name.as_str(), "and" | "or" | "not" | "in") {
            return Err(ParseError::new(position, format!("unexpected keyword '{}'", name)));
        }

        if self.eat(&TokenKind::LParen) {
            let args = self.nested(|p| p.parse_args(TokenKind::RParen, "')'"))?;
            return Ok(match Function::from_name(&name) {
                Some(func) => Expr::Call(func, args),
                None => Expr::UnknownCall(name, args),
            });
        }

        Ok(match Feature::from_name(&name) {
            Some(feature) => Expr::Feature(feature),
            None => Expr::Unknown(name),
        })
    }

    /// Comma-separated expressions up to `close`; trailing comma allowed.
    fn parse_args(&mut self, close: TokenKind, what: &str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.eat(&close) {
                return Ok(items);
            }
            items.push(self.parse_or()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close.clone(), what)?;
                return Ok(items);
            }
        }
    }
}

fn collapse(mut operands: Vec<Expr>, chain: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        chain(operands)
    }
}

fn arith_chain(first: Expr, rest: Vec<(ArithOp, Expr)>) -> Expr {
    if rest.is_empty() {
        first
    } else {
        Expr::Arith(Box::new(first), rest)
    }
}
