//! Predicate language for filter rules.
//!
//! Filter files carry Python-flavoured boolean expressions such as
//! `final_sum > 180 and shared_numbers(combo_numbers, seed_numbers) >= 2`.
//! They are compiled once at load time into an expression tree and then
//! evaluated against one `EvaluationContext` at a time.
//!
//! Only the context's feature names and a fixed set of pure built-in
//! functions are reachable. Unknown names still compile (the filter stays
//! loadable) but every evaluation that reaches them fails, which the
//! elimination engine counts as "no match".

mod eval;
mod lexer;
mod parser;
mod value;

pub use parser::{Expr, Function, parse};
pub use value::{ArithOp, CmpOp, Value};

use crate::context::EvaluationContext;
use crate::error::{EvalError, ParseError};

/// A compiled boolean expression plus the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    root: Expr,
}

impl Predicate {
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        let root = parse(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// A predicate that is always `value`.
    pub fn constant(value: bool) -> Self {
        Self {
            source: if value { "True" } else { "False" }.to_string(),
            root: Expr::Literal(Value::Bool(value)),
        }
    }

    /// Original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate and reduce to a boolean using Python truthiness.
    pub fn evaluate(&self, ctx: &EvaluationContext) -> Result<bool, EvalError> {
        self.root.eval(ctx).map(|v| v.truthy())
    }

    /// Identifiers and function names outside the language's vocabulary.
    pub fn unknown_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.root.unknown_names(&mut names);
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBuilder;
    use data_loader::Combination;

    #[test]
    fn test_compile_and_evaluate() {
        let p = Predicate::compile("final_sum > 300").unwrap();
        let builder = ContextBuilder::default();

        let low = builder.build(&Combination::new([1, 2, 3, 4, 5]).unwrap());
        let high = builder.build(&Combination::new([60, 61, 62, 63, 65]).unwrap());
        assert_eq!(p.evaluate(&low), Ok(false));
        assert_eq!(p.evaluate(&high), Ok(true));
        assert_eq!(p.source(), "final_sum > 300");
    }

    #[test]
    fn test_constant_predicates() {
        let ctx = ContextBuilder::default().build(&Combination::new([1, 2, 3, 4, 5]).unwrap());
        assert_eq!(Predicate::constant(true).evaluate(&ctx), Ok(true));
        assert_eq!(Predicate::constant(false).evaluate(&ctx), Ok(false));
        assert_eq!(Predicate::constant(true).source(), "True");
    }

    #[test]
    fn test_unknown_names_are_deduplicated() {
        let p = Predicate::compile("foo > 1 and foo < 5 and Counter(combo_numbers)").unwrap();
        assert_eq!(p.unknown_names(), vec!["Counter".to_string(), "foo".to_string()]);
    }

    #[test]
    fn test_compile_rejects_bad_syntax() {
        let err = Predicate::compile("final_sum >> 3").unwrap_err();
        assert_eq!(err.position, 11);
    }
}
