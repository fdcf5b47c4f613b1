//! Tree-walking interpreter over `serde_json::Value`.

use std::cmp::Ordering;

use serde_json::{Map, Value};
use stratus_core::errors::SelectorError;

use super::ast::{Ast, Comparator};
use super::functions::{self, Arg};

/// Evaluate `ast` against `data`.
pub fn interpret(ast: &Ast, data: &Value) -> Result<Value, SelectorError> {
    match ast {
        Ast::Identity => Ok(data.clone()),
        Ast::Field(name) => Ok(data.get(name).cloned().unwrap_or(Value::Null)),
        Ast::Subexpr(lhs, rhs) => {
            let left = interpret(lhs, data)?;
            interpret(rhs, &left)
        }
        Ast::Index(index) => Ok(match data {
            Value::Array(items) => normalize_index(*index, items.len())
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        Ast::Slice { start, stop, step } => Ok(match data {
            Value::Array(items) => Value::Array(slice(items, *start, *stop, *step)),
            _ => Value::Null,
        }),
        Ast::Projection { lhs, rhs } => {
            let Value::Array(items) = interpret(lhs, data)? else {
                return Ok(Value::Null);
            };
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                let value = interpret(rhs, item)?;
                if !value.is_null() {
                    out.push(value);
                }
            }
            Ok(Value::Array(out))
        }
        Ast::FilterProjection { lhs, predicate, rhs } => {
            let Value::Array(items) = interpret(lhs, data)? else {
                return Ok(Value::Null);
            };
            let mut out = Vec::new();
            for item in &items {
                if !is_truthy(&interpret(predicate, item)?) {
                    continue;
                }
                let value = interpret(rhs, item)?;
                if !value.is_null() {
                    out.push(value);
                }
            }
            Ok(Value::Array(out))
        }
        Ast::ObjectValues(inner) => Ok(match interpret(inner, data)? {
            Value::Object(map) => Value::Array(map.into_iter().map(|(_, v)| v).collect()),
            _ => Value::Null,
        }),
        Ast::Flatten(inner) => Ok(match interpret(inner, data)? {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Array(nested) => out.extend(nested),
                        other => out.push(other),
                    }
                }
                Value::Array(out)
            }
            _ => Value::Null,
        }),
        Ast::MultiList(items) => {
            if data.is_null() {
                return Ok(Value::Null);
            }
            let values = items
                .iter()
                .map(|item| interpret(item, data))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(values))
        }
        Ast::MultiHash(pairs) => {
            if data.is_null() {
                return Ok(Value::Null);
            }
            let mut map = Map::new();
            for (key, expr) in pairs {
                map.insert(key.clone(), interpret(expr, data)?);
            }
            Ok(Value::Object(map))
        }
        Ast::Literal(value) => Ok(value.clone()),
        Ast::Not(inner) => Ok(Value::Bool(!is_truthy(&interpret(inner, data)?))),
        Ast::And(lhs, rhs) => {
            let left = interpret(lhs, data)?;
            if is_truthy(&left) {
                interpret(rhs, data)
            } else {
                Ok(left)
            }
        }
        Ast::Or(lhs, rhs) => {
            let left = interpret(lhs, data)?;
            if is_truthy(&left) {
                Ok(left)
            } else {
                interpret(rhs, data)
            }
        }
        Ast::Compare { op, lhs, rhs } => {
            let left = interpret(lhs, data)?;
            let right = interpret(rhs, data)?;
            Ok(compare(*op, &left, &right))
        }
        Ast::Function { name, args } => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Ast::Expref(expr) => evaluated.push(Arg::Expref(&**expr)),
                    other => evaluated.push(Arg::Value(interpret(other, data)?)),
                }
            }
            functions::call(name, evaluated)
        }
        // A bare `&expr` outside a function argument evaluates to null.
        Ast::Expref(_) => Ok(Value::Null),
    }
}

/// `null`, `false`, `""`, `[]` and `{}` are false; everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

/// Equality that treats `1` and `1.0` as the same number.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => left == right,
    }
}

fn compare(op: Comparator, left: &Value, right: &Value) -> Value {
    match op {
        Comparator::Eq => Value::Bool(values_equal(left, right)),
        Comparator::Ne => Value::Bool(!values_equal(left, right)),
        _ => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Value::Null;
            };
            let Some(ordering) = a.partial_cmp(&b) else {
                return Value::Null;
            };
            Value::Bool(match op {
                Comparator::Lt => ordering == Ordering::Less,
                Comparator::Lte => ordering != Ordering::Greater,
                Comparator::Gt => ordering == Ordering::Greater,
                Comparator::Gte => ordering != Ordering::Less,
                Comparator::Eq => ordering == Ordering::Equal,
                Comparator::Ne => ordering != Ordering::Equal,
            })
        }
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { len + index } else { index };
    (0..len).contains(&i).then_some(i as usize)
}

fn slice(items: &[Value], start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Vec<Value> {
    let len = items.len() as i64;
    let step = step.unwrap_or(1);
    let clamp = |v: i64, low: i64, high: i64| {
        let v = if v < 0 { v + len } else { v };
        v.clamp(low, high)
    };
    let mut out = Vec::new();
    if step > 0 {
        let mut i = start.map_or(0, |s| clamp(s, 0, len));
        let end = stop.map_or(len, |s| clamp(s, 0, len));
        while i < end {
            out.push(items[i as usize].clone());
            let Some(next) = i.checked_add(step) else {
                break;
            };
            i = next;
        }
    } else {
        let mut i = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
        let end = stop.map_or(-1, |s| clamp(s, -1, len - 1));
        while i > end {
            out.push(items[i as usize].clone());
            let Some(next) = i.checked_add(step) else {
                break;
            };
            i = next;
        }
    }
    out
}
