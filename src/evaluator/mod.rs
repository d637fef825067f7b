//! Evaluator Interface
//!
//! The Datalog/Overlog evaluator itself lives outside this crate. It is driven
//! through two traits:
//!
//! - [`Evaluator`] opens a fresh session
//! - [`EvaluatorSession`] installs program text, dumps tables, and is destroyed
//!
//! ## Session Lifecycle
//!
//! ```text
//! open() -> SessionGuard -> install(program) -> dump_table(t)* -> destroy()
//! ```
//!
//! [`SessionGuard`] owns the session for the duration of a run and destroys it
//! exactly once when dropped, whichever way the run exits.

pub mod results;

use std::ops::{Deref, DerefMut};

use thiserror::Error;
use tracing::{debug, warn};

pub use results::{decode_dump, ResultSet, SEPARATOR};

/// Failures reported by an evaluator backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    #[error("failed to open evaluator session: {0}")]
    Open(String),

    #[error("evaluator rejected program: {0}")]
    Install(String),

    #[error("failed to dump table '{table}': {message}")]
    Dump { table: String, message: String },

    #[error("failed to destroy evaluator session: {0}")]
    Destroy(String),
}

/// Result type for evaluator operations
pub type EvaluatorResult<T> = std::result::Result<T, EvaluatorError>;

/// Factory for evaluator sessions
pub trait Evaluator {
    type Session: EvaluatorSession;

    /// Initialize a new, empty session
    fn open(&mut self) -> EvaluatorResult<Self::Session>;
}

/// One live evaluator instance
pub trait EvaluatorSession {
    /// Load program text (defines, facts and rules)
    fn install(&mut self, program: &str) -> EvaluatorResult<()>;

    /// Newline-separated rows of `table`, each row newline-terminated
    fn dump_table(&mut self, table: &str) -> EvaluatorResult<String>;

    /// Tear the session down
    fn destroy(&mut self) -> EvaluatorResult<()>;
}

/// Scoped owner of an evaluator session; destroys it on drop
pub struct SessionGuard<S: EvaluatorSession> {
    session: S,
    destroyed: bool,
}

impl<S: EvaluatorSession> SessionGuard<S> {
    /// Open a session from `evaluator` and take ownership of it
    pub fn open<E>(evaluator: &mut E) -> EvaluatorResult<Self>
    where
        E: Evaluator<Session = S>,
    {
        let session = evaluator.open()?;
        debug!("evaluator_session_opened");
        Ok(SessionGuard {
            session,
            destroyed: false,
        })
    }

    /// Destroy the session now and report the outcome
    pub fn close(mut self) -> EvaluatorResult<()> {
        self.destroyed = true;
        debug!("evaluator_session_destroyed");
        self.session.destroy()
    }
}

impl<S: EvaluatorSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: EvaluatorSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: EvaluatorSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        match self.session.destroy() {
            Ok(()) => debug!("evaluator_session_destroyed"),
            Err(e) => warn!(error = %e, "evaluator_session_destroy_failed"),
        }
    }
}
