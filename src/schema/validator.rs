//! # Schema Validation
//!
//! Cross-checks relation arities coming from three independent sources:
//! - the declared schema (define statements)
//! - the synthesized EDB facts
//! - every occurrence of the relation in query text
//!
//! Validation is fail-fast: the first violation aborts the run before any
//! program reaches the evaluator. Column types are not enforced.

use std::fmt;

use tracing::{trace, warn};

use super::{format_types, Schema};
use crate::value::{Primitive, Tuple};

/// Which pair of arity sources disagreed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityMismatchKind {
    DefineVsEdb,
    DefineVsQuery,
    EdbVsQuery,
}

impl ArityMismatchKind {
    fn labels(self) -> (&'static str, &'static str) {
        match self {
            ArityMismatchKind::DefineVsEdb => ("define_arity", "edb_arity"),
            ArityMismatchKind::DefineVsQuery => ("define_arity", "query_arity"),
            ArityMismatchKind::EdbVsQuery => ("edb_arity", "query_arity"),
        }
    }
}

impl fmt::Display for ArityMismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArityMismatchKind::DefineVsEdb => write!(f, "define vs edb"),
            ArityMismatchKind::DefineVsQuery => write!(f, "define vs query"),
            ArityMismatchKind::EdbVsQuery => write!(f, "edb vs query"),
        }
    }
}

/// Where a set of disagreeing observations came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityOrigin {
    Edb,
    Query,
}

impl fmt::Display for ArityOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArityOrigin::Edb => write!(f, "edb definitions"),
            ArityOrigin::Query => write!(f, "query occurrences"),
        }
    }
}

/// Fatal schema, arity and tuple-length violations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A table used by a query has no schema entry
    #[error("table '{table}' has no define statement")]
    MissingDefinition { table: String },

    /// A table has neither EDB facts nor any query occurrence
    #[error("table '{table}' does not appear in any query or edb fact")]
    Unreferenced { table: String },

    /// Two arity sources disagree
    #[error("table '{table}' has inconsistent arities ({kind}): {} = {left}, {} = {right}", .kind.labels().0, .kind.labels().1)]
    ArityMismatch {
        table: String,
        kind: ArityMismatchKind,
        left: usize,
        right: usize,
    },

    /// Observations from a single source disagree with each other
    #[error("{origin} for table '{table}' have inconsistent arities: {arities:?}")]
    InconsistentArity {
        table: String,
        origin: ArityOrigin,
        arities: Vec<usize>,
    },

    /// Arities must be whole numbers of at least one
    #[error("table '{table}' has arity {arity}. relation arities must be positive integers")]
    InvalidArity { table: String, arity: usize },

    /// A normalized tuple does not fit the declared column list
    #[error("table '{table}' has edb definition inconsistent with length of table schema : edb = {tuple}, table schema = {schema}")]
    SchemaLengthMismatch {
        table: String,
        tuple: String,
        schema: String,
    },
}

/// Arity observations for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArityCheck {
    pub table: String,
    /// Declared by the schema
    pub define: Option<usize>,
    /// Length of the synthesized facts, `None` when the table has no facts
    pub edb: Option<usize>,
    /// Arity in query text, `None` when no query mentions the table
    pub query: Option<usize>,
}

impl ArityCheck {
    pub fn new(table: impl Into<String>) -> Self {
        ArityCheck {
            table: table.into(),
            define: None,
            edb: None,
            query: None,
        }
    }

    pub fn with_define(mut self, arity: Option<usize>) -> Self {
        self.define = arity;
        self
    }

    pub fn with_edb(mut self, arity: Option<usize>) -> Self {
        self.edb = arity;
        self
    }

    pub fn with_query(mut self, arity: Option<usize>) -> Self {
        self.query = arity;
        self
    }

    /// Check this table's observations against each other
    pub fn verify(&self) -> Result<(), ValidationError> {
        let table = || self.table.clone();

        let Some(define) = self.define else {
            return Err(ValidationError::MissingDefinition { table: table() });
        };

        for arity in [Some(define), self.edb, self.query].into_iter().flatten() {
            if arity == 0 {
                return Err(ValidationError::InvalidArity { table: table(), arity });
            }
        }

        if self.edb.is_none() && self.query.is_none() {
            return Err(ValidationError::Unreferenced { table: table() });
        }

        let mismatch = |kind, left, right| ValidationError::ArityMismatch {
            table: table(),
            kind,
            left,
            right,
        };

        if let Some(edb) = self.edb {
            if edb != define {
                return Err(mismatch(ArityMismatchKind::DefineVsEdb, define, edb));
            }
        }
        // Stored rows that agree with the schema are blamed on the query text
        if let (Some(edb), Some(query)) = (self.edb, self.query) {
            if edb != query {
                return Err(mismatch(ArityMismatchKind::EdbVsQuery, edb, query));
            }
        }
        if let Some(query) = self.query {
            if query != define {
                return Err(mismatch(ArityMismatchKind::DefineVsQuery, define, query));
            }
        }

        Ok(())
    }
}

/// Verify every table in order, stopping at the first violation
pub fn verify_arities(checks: &[ArityCheck]) -> Result<(), ValidationError> {
    for check in checks {
        trace!(
            table = %check.table,
            define = ?check.define,
            edb = ?check.edb,
            query = ?check.query,
            "verify_arity"
        );
        check.verify()?;
    }
    Ok(())
}

/// Reduce a list of observed arities to one value.
///
/// `Ok(None)` when nothing was observed.
pub fn unify_arities(
    table: &str,
    origin: ArityOrigin,
    arities: &[usize],
) -> Result<Option<usize>, ValidationError> {
    match arities.split_first() {
        None => Ok(None),
        Some((first, rest)) if rest.iter().all(|a| a == first) => Ok(Some(*first)),
        Some(_) => Err(ValidationError::InconsistentArity {
            table: table.to_string(),
            origin,
            arities: arities.to_vec(),
        }),
    }
}

/// Arity of a table's EDB facts
pub fn edb_arity(table: &str, tuples: &[Tuple]) -> Result<Option<usize>, ValidationError> {
    let arities: Vec<usize> = tuples.iter().map(Tuple::arity).collect();
    unify_arities(table, ArityOrigin::Edb, &arities)
}

/// Ensure a tuple has exactly one value per declared column
pub fn check_tuple_length(
    table: &str,
    tuple: &Tuple,
    schema: &Schema,
) -> Result<(), ValidationError> {
    let types = schema
        .get(table)
        .ok_or_else(|| ValidationError::MissingDefinition {
            table: table.to_string(),
        })?;

    if tuple.arity() == types.len() {
        return Ok(());
    }

    let values: Vec<String> = tuple
        .iter()
        .map(|v| match v {
            Primitive::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        })
        .collect();
    Err(ValidationError::SchemaLengthMismatch {
        table: table.to_string(),
        tuple: format!("[{}]", values.join(", ")),
        schema: format_types(types),
    })
}

/// Column type check between EDB rows and declared types.
///
/// Advisory only: suspicious columns are logged, nothing is rejected. Callers
/// get no type-level guarantee beyond arity.
pub fn verify_types(table: &str, tuples: &[Tuple], schema: &Schema) -> Result<(), ValidationError> {
    let Some(types) = schema.get(table) else {
        return Ok(());
    };

    for tuple in tuples {
        for (column, (value, ty)) in tuple.iter().zip(types).enumerate() {
            if !ty.accepts(value) {
                warn!(table, column, value = %value, expected = %ty, "column_type_not_enforced");
            }
        }
    }
    Ok(())
}
