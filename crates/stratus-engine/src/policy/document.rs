//! Policy document decoding.
//!
//! Documents arrive as JSON objects, JSON strings, or URL-encoded JSON
//! strings (the IAM API returns the latter). `Statement`, `Action` and
//! `Resource` may each be a single value or a list.

use serde::Deserialize;
use serde_json::Value;
use smallvec::{smallvec, SmallVec};
use stratus_core::errors::PolicyError;

// Untagged variants are tried in order; `Many` first so an array is never
// taken whole as a single `Value`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }

    fn into_small(self) -> SmallVec<[T; 2]> {
        match self {
            Self::One(v) => smallvec![v],
            Self::Many(v) => SmallVec::from_vec(v),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "Statement", default)]
    statement: Option<OneOrMany<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawStatement {
    #[serde(rename = "Effect", default)]
    effect: Option<String>,
    #[serde(rename = "Action", default)]
    action: Option<OneOrMany<String>>,
    #[serde(rename = "Resource", default)]
    resource: Option<OneOrMany<String>>,
}

/// One policy statement. Only `resources` drives edge resolution; the rest
/// is carried as explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub effect: Option<String>,
    pub actions: SmallVec<[String; 2]>,
    pub resources: SmallVec<[String; 2]>,
    /// The statement as written, for edge metadata.
    pub raw: Value,
}

impl Statement {
    pub fn is_deny(&self) -> bool {
        self.effect
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case("deny"))
    }
}

/// Decode a policy document into its statements.
pub fn decode_statements(policy: &str, document: &Value) -> Result<Vec<Statement>, PolicyError> {
    let document = match document {
        Value::String(text) => parse_text(policy, text)?,
        other => other.clone(),
    };
    let raw: RawDocument =
        serde_json::from_value(document).map_err(|source| PolicyError::InvalidDocument {
            policy: policy.to_string(),
            source,
        })?;

    let mut statements = Vec::new();
    for value in raw.statement.map(OneOrMany::into_vec).unwrap_or_default() {
        let parsed: RawStatement = serde_json::from_value(value.clone()).map_err(|source| {
            PolicyError::InvalidDocument {
                policy: policy.to_string(),
                source,
            }
        })?;
        statements.push(Statement {
            effect: parsed.effect,
            actions: parsed.action.map(OneOrMany::into_small).unwrap_or_default(),
            resources: parsed.resource.map(OneOrMany::into_small).unwrap_or_default(),
            raw: value,
        });
    }
    Ok(statements)
}

fn parse_text(policy: &str, text: &str) -> Result<Value, PolicyError> {
    let trimmed = text.trim();
    let json = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        urlencoding::decode(trimmed)
            .map_err(|e| PolicyError::InvalidEncoding {
                policy: policy.to_string(),
                message: e.to_string(),
            })?
            .into_owned()
    };
    serde_json::from_str(&json).map_err(|source| PolicyError::InvalidDocument {
        policy: policy.to_string(),
        source,
    })
}
