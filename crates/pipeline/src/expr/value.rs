//! Runtime values and their operators.
//!
//! Semantics follow the Python-style filter files: booleans act as 0/1
//! in arithmetic, `/` always yields a float, `//` and `%` floor toward
//! negative infinity, and empty lists and zero are falsy.

use crate::error::EvalError;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Shared so feature lookups do not copy
    List(Arc<[i64]>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::FloorDiv => "//",
            ArithOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

/// Numeric view used for mixed int/float arithmetic.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::List(_) => "list",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::List(items) => !items.is_empty(),
        }
    }

    fn as_num(&self) -> Option<Num> {
        match self {
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(f) => Some(Num::Float(*f)),
            Value::List(_) => None,
        }
    }

    /// Integer view for indexing and list elements; floats are not accepted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn negate(&self) -> Result<Value, EvalError> {
        match self.as_num() {
            Some(Num::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(EvalError::TypeMismatch {
                op: "unary -",
                left: self.type_name(),
                right: self.type_name(),
            }),
        }
    }

    pub fn arith(&self, op: ArithOp, rhs: &Value) -> Result<Value, EvalError> {
        if let (ArithOp::Add, Value::List(a), Value::List(b)) = (op, self, rhs) {
            let joined: Vec<i64> = a.iter().chain(b.iter()).copied().collect();
            return Ok(Value::List(joined.into()));
        }

        let mismatch = || EvalError::TypeMismatch {
            op: op.symbol(),
            left: self.type_name(),
            right: rhs.type_name(),
        };
        let lhs = self.as_num().ok_or_else(mismatch)?;
        let rhs = rhs.as_num().ok_or_else(mismatch)?;

        match (lhs, rhs) {
            (Num::Int(a), Num::Int(b)) => int_arith(op, a, b),
            (a, b) => float_arith(op, a.as_f64(), b.as_f64()),
        }
    }

    pub fn compare(&self, op: CmpOp, rhs: &Value) -> Result<bool, EvalError> {
        match op {
            CmpOp::In | CmpOp::NotIn => {
                let Value::List(items) = rhs else {
                    return Err(EvalError::TypeMismatch {
                        op: op.symbol(),
                        left: self.type_name(),
                        right: rhs.type_name(),
                    });
                };
                let found = match self.as_num() {
                    Some(Num::Int(n)) => items.contains(&n),
                    Some(Num::Float(f)) => items.iter().any(|&n| n as f64 == f),
                    None => false,
                };
                Ok(found == (op == CmpOp::In))
            }
            CmpOp::Eq => Ok(self.loose_eq(rhs)),
            CmpOp::Ne => Ok(!self.loose_eq(rhs)),
            CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
                let ordering = self.order(rhs).ok_or(EvalError::TypeMismatch {
                    op: op.symbol(),
                    left: self.type_name(),
                    right: rhs.type_name(),
                })?;
                Ok(match op {
                    CmpOp::Lt => ordering == Ordering::Less,
                    CmpOp::Le => ordering != Ordering::Greater,
                    CmpOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                })
            }
        }
    }

    /// Equality across numeric types; a list only equals a list.
    fn loose_eq(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::List(a), Value::List(b)) => a == b,
            _ => match (self.as_num(), rhs.as_num()) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
                (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
                _ => false,
            },
        }
    }

    fn order(&self, rhs: &Value) -> Option<Ordering> {
        match (self, rhs) {
            (Value::List(a), Value::List(b)) => Some(a.cmp(b)),
            _ => match (self.as_num()?, rhs.as_num()?) {
                (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
                (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
            },
        }
    }
}

fn int_arith(op: ArithOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let result = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Div => return float_arith(op, a as f64, b as f64),
        ArithOp::FloorDiv | ArithOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let mut q = a.checked_div(b).ok_or(EvalError::Overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q -= 1;
            }
            if op == ArithOp::FloorDiv {
                Some(q)
            } else {
                Some(a - q * b)
            }
        }
    };
    result.map(Value::Int).ok_or(EvalError::Overflow)
}

fn float_arith(op: ArithOp, a: f64, b: f64) -> Result<Value, EvalError> {
    if matches!(op, ArithOp::Div | ArithOp::FloorDiv | ArithOp::Mod) && b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::FloorDiv => (a / b).floor(),
        ArithOp::Mod => a - b * (a / b).floor(),
    };
    Ok(Value::Float(result))
}
