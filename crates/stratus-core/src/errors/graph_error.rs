//! Graph assembly errors.
//!
//! Assembly degrades on nearly every failure; these surface only from the
//! pieces (generators, selector evaluation, role hydration) that report
//! before the assembler decides to log and continue.

use super::error_code::{self, StratusErrorCode};
use super::{EvalError, PolicyError};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Selector evaluation failed: {0}")]
    Eval(#[from] EvalError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Edge generator `{generator}` failed: {reason}")]
    Generator { generator: String, reason: String },
}

impl StratusErrorCode for GraphError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Eval(e) => e.error_code(),
            Self::Policy(e) => e.error_code(),
            Self::Generator { .. } => error_code::GRAPH_ERROR,
        }
    }
}
