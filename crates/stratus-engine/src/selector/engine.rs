//! Evaluates selectors against a [`StateStore`] in scoped or global mode.

use serde_json::Value;
use stratus_core::errors::{EvalError, StorageError};
use stratus_core::{ScanRecord, ScanScope, StateStore};

use super::{Query, Selector};

/// Read-only view over a state store. Evaluation never writes.
#[derive(Clone, Copy)]
pub struct SelectorEngine<'a> {
    store: &'a dyn StateStore,
}

impl<'a> SelectorEngine<'a> {
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a dyn StateStore {
        self.store
    }

    /// Records for the selector's `(service, operation)` at `scope`.
    pub fn records(
        &self,
        scope: &ScanScope,
        selector: &Selector,
    ) -> Result<Vec<ScanRecord>, StorageError> {
        match scope {
            ScanScope::Scoped { account, region } => self.store.read_scoped(
                account,
                region,
                selector.service(),
                selector.operation(),
            ),
            ScanScope::Global => self
                .store
                .read_global(selector.service(), selector.operation()),
        }
    }

    /// Raw query result: whatever shape the query produces. `None` when the
    /// `(service, operation)` has no records at this scope.
    pub fn evaluate_value(
        &self,
        scope: &ScanScope,
        selector: &Selector,
    ) -> Result<Option<Value>, EvalError> {
        let records = self.records(scope, selector)?;
        if records.is_empty() {
            tracing::trace!(selector = %selector, scope = %scope, "no records");
            return Ok(None);
        }
        let document = serde_json::to_value(&records).map_err(StorageError::from)?;
        Ok(Some(selector.query().search(&document)?))
    }

    /// Query result as a sequence: arrays yield their elements, `null`
    /// yields nothing, any other value yields itself.
    pub fn evaluate(&self, scope: &ScanScope, selector: &Selector) -> Result<Vec<Value>, EvalError> {
        Ok(self
            .evaluate_value(scope, selector)?
            .map(into_sequence)
            .unwrap_or_default())
    }

    /// Parse and evaluate in one step.
    pub fn evaluate_str(&self, scope: &ScanScope, selector: &str) -> Result<Vec<Value>, EvalError> {
        let selector = Selector::parse(selector)?;
        self.evaluate(scope, &selector)
    }
}

/// Apply a bare query to one value, flattening to a sequence the same way.
pub fn search_sequence(query: &Query, data: &Value) -> Result<Vec<Value>, EvalError> {
    Ok(into_sequence(query.search(data)?))
}

fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
