//! Dependent-parameter resolution.
//!
//! A list of `{Key, Selector | Value}` specs becomes the ordered list of
//! parameter objects driving repeated calls to a dependent operation.
//! Selector specs fan out (one object per result element), literal specs
//! broadcast onto every object, and objects missing any declared key are
//! discarded.

use serde_json::{Map, Value};
use stratus_core::config::service_config::ParameterSpecDef;
use stratus_core::errors::{ConfigError, EvalError};
use stratus_core::types::scan::ParameterObject;
use stratus_core::ScanScope;

use crate::selector::{Selector, SelectorEngine};

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSource {
    Selector(Selector),
    Value(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterResolverSpec {
    pub key: String,
    pub source: ParameterSource,
}

impl ParameterResolverSpec {
    pub fn selector(key: impl Into<String>, selector: Selector) -> Self {
        Self {
            key: key.into(),
            source: ParameterSource::Selector(selector),
        }
    }

    pub fn value(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            source: ParameterSource::Value(value),
        }
    }

    /// Compile a raw spec. When both `Selector` and `Value` are present the
    /// selector wins; when neither is, the spec is rejected.
    pub fn compile(
        def: &ParameterSpecDef,
        service: &str,
        operation: &str,
    ) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidParameter {
            service: service.to_string(),
            operation: operation.to_string(),
            key: def.key.clone(),
            reason,
        };

        if def.key.trim().is_empty() {
            return Err(invalid("empty Key".into()));
        }

        match (&def.selector, &def.value) {
            (Some(raw), value) => {
                if value.is_some() {
                    tracing::debug!(
                        service,
                        operation,
                        key = %def.key,
                        "parameter has both Selector and Value; using Selector"
                    );
                }
                let selector = Selector::parse(raw).map_err(|e| invalid(e.to_string()))?;
                Ok(Self::selector(def.key.clone(), selector))
            }
            (None, Some(value)) => Ok(Self::value(def.key.clone(), value.clone())),
            (None, None) => Err(invalid("neither Selector nor Value given".into())),
        }
    }

    pub fn depends_on(&self) -> Option<(&str, &str)> {
        match &self.source {
            ParameterSource::Selector(s) => Some((s.service(), s.operation())),
            ParameterSource::Value(_) => None,
        }
    }
}

/// Resolve `specs` into complete parameter objects, in fan-out order.
///
/// An empty selector result creates no objects, so a dependent operation
/// whose producer returned nothing resolves to zero calls.
pub fn resolve_parameters(
    engine: &SelectorEngine<'_>,
    scope: &ScanScope,
    specs: &[ParameterResolverSpec],
) -> Result<Vec<ParameterObject>, EvalError> {
    let mut partials: Vec<ParameterObject> = Vec::new();

    for spec in specs {
        match &spec.source {
            ParameterSource::Selector(selector) => {
                let values = engine.evaluate(scope, selector)?;
                for (i, value) in values.into_iter().enumerate() {
                    if i == partials.len() {
                        partials.push(Map::new());
                    }
                    partials[i].insert(spec.key.clone(), value);
                }
            }
            ParameterSource::Value(value) => {
                if partials.is_empty() {
                    partials.push(Map::new());
                }
                for partial in &mut partials {
                    partial.insert(spec.key.clone(), value.clone());
                }
            }
        }
    }

    let total = partials.len();
    let resolved: Vec<ParameterObject> = partials
        .into_iter()
        .filter(|p| specs.iter().all(|s| p.contains_key(&s.key)))
        .collect();
    if resolved.len() < total {
        tracing::debug!(
            scope = %scope,
            dropped = total - resolved.len(),
            "discarded partially resolved parameter objects"
        );
    }
    Ok(resolved)
}
