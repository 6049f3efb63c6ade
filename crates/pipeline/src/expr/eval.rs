//! Tree-walking evaluator.
//!
//! Evaluation reads only the supplied `EvaluationContext`; there is no
//! other state a predicate can observe or change.

use super::parser::{Expr, Function};
use super::value::{CmpOp, Value};
use crate::context::{EvaluationContext, shared_numbers};
use crate::error::EvalError;

impl Expr {
    pub fn eval(&self, ctx: &EvaluationContext) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Feature(f) => Ok(ctx.get(*f)),
            Expr::Unknown(name) => Err(EvalError::UnknownName(name.clone())),
            Expr::UnknownCall(name, _) => Err(EvalError::UnknownFunction(name.clone())),
            Expr::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let v = item.eval(ctx)?;
                    let n = v.as_int().ok_or(EvalError::TypeMismatch {
                        op: "list element",
                        left: v.type_name(),
                        right: "int",
                    })?;
                    out.push(n);
                }
                Ok(Value::List(out.into()))
            }
            Expr::Index(target, index) => {
                let target = target.eval(ctx)?;
                let index = index.eval(ctx)?;
                eval_index(&target, &index)
            }
            Expr::Call(func, args) => {
                let args = args
                    .iter()
                    .map(|a| a.eval(ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                call(*func, &args)
            }
            Expr::Neg(inner) => inner.eval(ctx)?.negate(),
            Expr::Not(inner) => Ok(Value::Bool(!inner.eval(ctx)?.truthy())),
            Expr::And(items) => {
                for item in items {
                    if !item.eval(ctx)?.truthy() {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Expr::Or(items) => {
                for item in items {
                    if item.eval(ctx)?.truthy() {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Expr::Arith(first, rest) => {
                let mut acc = first.eval(ctx)?;
                for (op, next) in rest {
                    acc = acc.arith(*op, &next.eval(ctx)?)?;
                }
                Ok(acc)
            }
            Expr::Compare(first, rest) => {
                let mut lhs = first.eval(ctx)?;
                for (op, next) in rest {
                    let rhs = next.eval(ctx)?;
                    if !lhs.compare(*op, &rhs)? {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs;
                }
                Ok(Value::Bool(true))
            }
        }
    }
}

fn eval_index(target: &Value, index: &Value) -> Result<Value, EvalError> {
    let Value::List(items) = target else {
        return Err(EvalError::TypeMismatch {
            op: "[]",
            left: target.type_name(),
            right: index.type_name(),
        });
    };
    let i = index.as_int().ok_or(EvalError::TypeMismatch {
        op: "[]",
        left: target.type_name(),
        right: index.type_name(),
    })?;

    let len = items.len() as i64;
    let resolved = if i < 0 { len + i } else { i };
    if resolved < 0 || resolved >= len {
        return Err(EvalError::IndexOutOfRange {
            index: i,
            len: items.len(),
        });
    }
    Ok(Value::Int(items[resolved as usize]))
}

fn call(func: Function, args: &[Value]) -> Result<Value, EvalError> {
    let bad = |expected: &'static str| EvalError::BadArgument {
        function: func.name(),
        expected,
        found: describe(args),
    };

    match func {
        Function::SharedNumbers => match args {
            [Value::List(a), Value::List(b)] => Ok(Value::Int(shared_numbers(a, b) as i64)),
            _ => Err(bad("two lists")),
        },
        Function::Len => match args {
            [Value::List(a)] => Ok(Value::Int(a.len() as i64)),
            _ => Err(bad("one list")),
        },
        Function::Sum => match args {
            [Value::List(a)] => a
                .iter()
                .try_fold(0i64, |acc, &n| acc.checked_add(n))
                .map(Value::Int)
                .ok_or(EvalError::Overflow),
            _ => Err(bad("one list")),
        },
        Function::Min | Function::Max => {
            let pick_max = func == Function::Max;
            match args {
                [Value::List(a)] => {
                    let found = if pick_max { a.iter().max() } else { a.iter().min() };
                    found
                        .map(|&n| Value::Int(n))
                        .ok_or_else(|| bad("a non-empty list"))
                }
                [_, _, ..] => {
                    let mut best = args[0].clone();
                    for candidate in &args[1..] {
                        let replace = if pick_max {
                            candidate.compare(CmpOp::Gt, &best)?
                        } else {
                            candidate.compare(CmpOp::Lt, &best)?
                        };
                        if replace {
                            best = candidate.clone();
                        }
                    }
                    Ok(best)
                }
                _ => Err(bad("a list or at least two numbers")),
            }
        }
        Function::Abs => match args {
            [Value::Int(n)] => n.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
            [Value::Float(f)] => Ok(Value::Float(f.abs())),
            [Value::Bool(b)] => Ok(Value::Int(i64::from(*b))),
            _ => Err(bad("one number")),
        },
        Function::Sorted => match args {
            [Value::List(a)] => {
                let mut sorted = a.to_vec();
                sorted.sort_unstable();
                Ok(Value::List(sorted.into()))
            }
            _ => Err(bad("one list")),
        },
        Function::Set => match args {
            [Value::List(a)] => {
                let mut unique = a.to_vec();
                unique.sort_unstable();
                unique.dedup();
                Ok(Value::List(unique.into()))
            }
            _ => Err(bad("one list")),
        },
    }
}

fn describe(args: &[Value]) -> String {
    let names: Vec<&str> = args.iter().map(Value::type_name).collect();
    format!("({})", names.join(", "))
}
