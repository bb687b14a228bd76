//! Tree-walking interpreter for parsed conditions.
//!
//! Values borrow from the request scope wherever possible; only literals,
//! computed helpers and the string-map roots allocate.

use super::lexer::Root;
use super::parser::{CompareOp, Expr, Helper};
use super::{ConditionError, Scope};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;

pub struct Interpreter<'s> {
    scope: &'s Scope<'s>,
}

/// Result of reading one key or index from a value.
enum Child<'v> {
    Ref(&'v Value),
    Computed(Value),
}

impl<'s> Interpreter<'s> {
    pub fn new(scope: &'s Scope<'s>) -> Self {
        Self { scope }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Cow<'s, Value>, ConditionError> {
        match expr {
            Expr::Literal(value) => Ok(Cow::Owned(value.clone())),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item).map(Cow::into_owned))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Cow::Owned(Value::Array(values)))
            }
            Expr::Root(root) => Ok(self.root(*root)),
            Expr::Member { target, key } => {
                let key = self.eval(key)?;
                if let Expr::Root(root) = target.as_ref() {
                    if let Some(map) = self.string_map(*root) {
                        return Self::lookup(*root, map, &key);
                    }
                }
                access(self.eval(target)?, &key)
            }
            Expr::Call {
                target,
                helper,
                arg,
            } => {
                let base = self.eval(target)?;
                let arg = self.eval(arg)?;
                call(&base, *helper, &arg).map(Cow::Owned)
            }
            Expr::Not(inner) => Ok(Cow::Owned(Value::Bool(!truthy(&*self.eval(inner)?)))),
            Expr::Neg(inner) => negate(&*self.eval(inner)?).map(Cow::Owned),
            Expr::Compare { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                compare_op(*op, &left, &right).map(|b| Cow::Owned(Value::Bool(b)))
            }
            // `&&` and `||` yield the deciding operand, not a boolean
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if truthy(&left) {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if truthy(&left) {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
        }
    }

    /// The string-valued roots; `None` for `$body`.
    fn string_map(&self, root: Root) -> Option<&'s HashMap<String, String>> {
        match root {
            Root::Header => Some(self.scope.header),
            Root::Query => Some(self.scope.query),
            Root::Path => Some(self.scope.path),
            Root::Body => None,
        }
    }

    fn root(&self, root: Root) -> Cow<'s, Value> {
        let Some(map) = self.string_map(root) else {
            return Cow::Borrowed(self.scope.body);
        };
        let map = map
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>();
        Cow::Owned(Value::Object(map))
    }

    fn lookup(
        root: Root,
        map: &HashMap<String, String>,
        key: &Value,
    ) -> Result<Cow<'s, Value>, ConditionError> {
        let name = match key {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(ConditionError::TypeMismatch(format!(
                    "cannot use {} as a property name",
                    kind(other)
                )))
            }
        };
        let found = match root {
            Root::Header => map.get(&name).or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(&name))
                    .map(|(_, v)| v)
            }),
            _ => map.get(&name),
        };
        found
            .map(|v| Cow::Owned(Value::String(v.clone())))
            .ok_or(ConditionError::UnknownProperty(name))
    }
}

fn access<'s>(base: Cow<'s, Value>, key: &Value) -> Result<Cow<'s, Value>, ConditionError> {
    match base {
        Cow::Borrowed(value) => Ok(match child(value, key)? {
            Child::Ref(v) => Cow::Borrowed(v),
            Child::Computed(v) => Cow::Owned(v),
        }),
        Cow::Owned(value) => Ok(Cow::Owned(match child(&value, key)? {
            Child::Ref(v) => v.clone(),
            Child::Computed(v) => v,
        })),
    }
}

fn child<'v>(value: &'v Value, key: &Value) -> Result<Child<'v>, ConditionError> {
    match key {
        Value::String(name) => property(value, name),
        Value::Number(n) => {
            let index = as_index(n)?;
            match value {
                Value::Array(items) => items
                    .get(index)
                    .map(Child::Ref)
                    .ok_or(ConditionError::IndexOutOfRange(index)),
                Value::String(s) => s
                    .chars()
                    .nth(index)
                    .map(|c| Child::Computed(Value::String(c.to_string())))
                    .ok_or(ConditionError::IndexOutOfRange(index)),
                Value::Object(_) => property(value, &index.to_string()),
                other => Err(ConditionError::TypeMismatch(format!(
                    "cannot index into {}",
                    kind(other)
                ))),
            }
        }
        other => Err(ConditionError::TypeMismatch(format!(
            "cannot use {} as a property name",
            kind(other)
        ))),
    }
}

fn property<'v>(value: &'v Value, name: &str) -> Result<Child<'v>, ConditionError> {
    match value {
        Value::Object(map) => map
            .get(name)
            .map(Child::Ref)
            .ok_or_else(|| ConditionError::UnknownProperty(name.to_string())),
        Value::Array(items) if name == "length" => Ok(Child::Computed(items.len().into())),
        Value::String(s) if name == "length" => Ok(Child::Computed(s.chars().count().into())),
        Value::Array(_) | Value::String(_) => Err(ConditionError::UnknownProperty(name.to_string())),
        other => Err(ConditionError::TypeMismatch(format!(
            "cannot read property '{name}' of {}",
            kind(other)
        ))),
    }
}

fn as_index(n: &Number) -> Result<usize, ConditionError> {
    if let Some(i) = n.as_u64() {
        return usize::try_from(i).map_err(|_| ConditionError::TypeMismatch(format!("index {n} too large")));
    }
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => Ok(f as usize),
        _ => Err(ConditionError::TypeMismatch(format!("invalid index {n}"))),
    }
}

fn call(base: &Value, helper: Helper, arg: &Value) -> Result<Value, ConditionError> {
    match (helper, base) {
        (Helper::Contains, Value::Array(items)) => {
            Ok(Value::Bool(items.iter().any(|item| loose_eq(item, arg))))
        }
        (Helper::Contains, Value::String(s)) => Ok(Value::Bool(s.contains(expect_str(arg)?))),
        (Helper::ContainsAll, Value::Array(items)) => {
            let wanted = expect_array(arg)?;
            Ok(Value::Bool(
                wanted
                    .iter()
                    .all(|w| items.iter().any(|item| loose_eq(item, w))),
            ))
        }
        (Helper::ContainsAll, Value::String(s)) => {
            let wanted = expect_array(arg)?;
            let mut all = true;
            for w in wanted {
                all &= s.contains(expect_str(w)?);
            }
            Ok(Value::Bool(all))
        }
        (Helper::IndexOf, Value::Array(items)) => {
            let position = items.iter().position(|item| loose_eq(item, arg));
            Ok(position_value(position))
        }
        (Helper::IndexOf, Value::String(s)) => {
            let needle = expect_str(arg)?;
            let position = s.find(needle).map(|byte| s[..byte].chars().count());
            Ok(position_value(position))
        }
        (_, other) => Err(ConditionError::TypeMismatch(format!(
            "{helper:?} is not available on {}",
            kind(other)
        ))),
    }
}

fn position_value(position: Option<usize>) -> Value {
    match position {
        Some(i) => Value::Number(i.into()),
        None => Value::Number((-1).into()),
    }
}

fn expect_str(value: &Value) -> Result<&str, ConditionError> {
    value.as_str().ok_or_else(|| {
        ConditionError::TypeMismatch(format!("expected a string, found {}", kind(value)))
    })
}

fn expect_array(value: &Value) -> Result<&Vec<Value>, ConditionError> {
    value.as_array().ok_or_else(|| {
        ConditionError::TypeMismatch(format!("expected a list, found {}", kind(value)))
    })
}

fn negate(value: &Value) -> Result<Value, ConditionError> {
    let Value::Number(n) = value else {
        return Err(ConditionError::TypeMismatch(format!(
            "cannot negate {}",
            kind(value)
        )));
    };
    if let Some(negated) = n.as_i64().and_then(i64::checked_neg) {
        return Ok(Value::Number(negated.into()));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .ok_or_else(|| ConditionError::TypeMismatch(format!("cannot negate {n}")))
}

fn compare_op(op: CompareOp, left: &Value, right: &Value) -> Result<bool, ConditionError> {
    Ok(match op {
        CompareOp::Eq => loose_eq(left, right),
        CompareOp::NotEq => !loose_eq(left, right),
        CompareOp::StrictEq => strict_eq(left, right),
        CompareOp::StrictNotEq => !strict_eq(left, right),
        CompareOp::Lt => ordering(left, right)? == Ordering::Less,
        CompareOp::Le => ordering(left, right)? != Ordering::Greater,
        CompareOp::Gt => ordering(left, right)? == Ordering::Greater,
        CompareOp::Ge => ordering(left, right)? != Ordering::Less,
    })
}

/// `==`: numbers by value, number vs. numeric string numerically.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (parse_number(s), n.as_f64()) {
                (Some(parsed), Some(n)) => parsed == n,
                _ => false,
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| loose_eq(x, y)))
        }
        _ => strict_eq(left, right),
    }
}

/// `===`: same kind and same value, numbers still compared by value.
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => number_eq(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| strict_eq(x, y)))
        }
        _ => false,
    }
}

fn number_eq(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn ordering(left: &Value, right: &Value) -> Result<Ordering, ConditionError> {
    let numeric = match (left, right) {
        (Value::String(a), Value::String(b)) => return Ok(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => (a.as_f64(), b.as_f64()),
        (Value::Number(a), Value::String(b)) => (a.as_f64(), parse_number(b)),
        (Value::String(a), Value::Number(b)) => (parse_number(a), b.as_f64()),
        _ => (None, None),
    };
    match numeric {
        (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| mismatch(left, right)),
        _ => Err(mismatch(left, right)),
    }
}

fn mismatch(left: &Value, right: &Value) -> ConditionError {
    ConditionError::TypeMismatch(format!(
        "cannot order {} against {}",
        kind(left),
        kind(right)
    ))
}

/// Parse a string that is exactly a finite number, no surrounding space.
fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() || s.trim() != s {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
