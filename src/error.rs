//! Crate-level error type.
//!
//! Every module keeps its own error enum; [`QuestError`] aggregates them so a
//! run can propagate any of them with `?`.

use thiserror::Error;

use crate::evaluator::EvaluatorError;
use crate::schema::ValidationError;
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum QuestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}

impl QuestError {
    /// True for schema, arity and coverage violations
    pub fn is_validation(&self) -> bool {
        matches!(self, QuestError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, QuestError>;
