//! Selectors: `Service|Operation|Query` strings evaluated against the state store.
//!
//! The query half is a JMESPath-style expression language (field paths,
//! projections, flattening, filters, multi-select, pipes, functions). It is
//! parsed once when the selector is constructed, so a malformed selector
//! fails at load time rather than silently producing nothing.

pub mod ast;
pub mod engine;
pub mod eval;
mod functions;
mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use stratus_core::errors::SelectorError;

pub use ast::Ast;
pub use engine::SelectorEngine;

/// A compiled query expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    source: String,
    ast: Ast,
}

impl Query {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SelectorError::Syntax {
                query: String::new(),
                offset: 0,
                message: "empty query".into(),
            });
        }
        Ok(Self {
            source: source.to_string(),
            ast: parser::parse(source)?,
        })
    }

    pub fn search(&self, data: &Value) -> Result<Value, SelectorError> {
        eval::interpret(&self.ast, data)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A parsed `Service|Operation|Query` selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    service: String,
    operation: String,
    query: Query,
}

impl Selector {
    /// Split on the first two `|`; the query may itself contain `|`.
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let malformed = |reason: &str| SelectorError::Malformed {
            selector: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = raw.splitn(3, '|');
        let service = parts.next().map(str::trim).unwrap_or_default();
        let operation = parts.next().map(str::trim).unwrap_or_default();
        let query = parts
            .next()
            .ok_or_else(|| malformed("expected `Service|Operation|Query`"))?;

        if service.is_empty() {
            return Err(malformed("empty service"));
        }
        if operation.is_empty() {
            return Err(malformed("empty operation"));
        }
        if query.trim().is_empty() {
            return Err(malformed("empty query"));
        }

        Ok(Self {
            service: service.to_string(),
            operation: operation.to_string(),
            query: Query::parse(query)?,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.service, self.operation, self.query)
    }
}
