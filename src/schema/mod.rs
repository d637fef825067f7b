//! # Schema Module
//!
//! Caller-declared relation schemas and the registration object that carries
//! them, together with the queries, into a run.
//!
//! Schemas are never inferred: every relation referenced by a query must be
//! declared with an ordered list of column types.
//!
//! ## Example
//!
//! ```rust
//! use quest::schema::{QueryConfig, SchemaType};
//!
//! let mut config = QueryConfig::new();
//! config.add_query("a(X) :- b(X), c(X) ;");
//! config.set_schema("a", vec![SchemaType::String]);
//! assert_eq!(config.schema().arity("a"), Some(1));
//! ```

pub mod validator;

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Primitive;

// Re-export public types
pub use validator::{ArityCheck, ArityMismatchKind, ArityOrigin, ValidationError};

/// Column type understood by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Int,
    Float,
    Bool,
}

impl SchemaType {
    /// String columns are quoted in fact statements, everything else is bare
    pub fn is_quoted(self) -> bool {
        matches!(self, SchemaType::String)
    }

    /// Check if a value matches this column type.
    ///
    /// Lenient the same way document stores are: integer-looking strings are
    /// accepted for numeric columns because mapping keys always arrive as strings.
    pub fn accepts(self, value: &Primitive) -> bool {
        match (self, value) {
            (SchemaType::String, Primitive::Str(_)) => true,
            (SchemaType::Int, Primitive::Int(_)) => true,
            (SchemaType::Int, Primitive::Str(s)) => s.parse::<i64>().is_ok(),
            (SchemaType::Float, Primitive::Float(_) | Primitive::Int(_)) => true,
            (SchemaType::Float, Primitive::Str(s)) => s.parse::<f64>().is_ok(),
            (SchemaType::Bool, Primitive::Bool(_)) => true,
            _ => false,
        }
    }
}

impl FromStr for SchemaType {
    type Err = String;

    /// Parse from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "str" => Ok(SchemaType::String),
            "int" | "integer" => Ok(SchemaType::Int),
            "float" | "double" => Ok(SchemaType::Float),
            "bool" | "boolean" => Ok(SchemaType::Bool),
            other => Err(format!("unknown column type '{other}'")),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::String => write!(f, "string"),
            SchemaType::Int => write!(f, "int"),
            SchemaType::Float => write!(f, "float"),
            SchemaType::Bool => write!(f, "bool"),
        }
    }
}

/// Render a type list the way error messages show it: `['string', 'int']`
pub fn format_types(types: &[SchemaType]) -> String {
    let inner: Vec<String> = types.iter().map(|t| format!("'{t}'")).collect();
    format!("[{}]", inner.join(", "))
}

/// Relation name -> ordered column types
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    relations: IndexMap<String, Vec<SchemaType>>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    /// Declare (or redeclare) the column types of a relation
    pub fn set(&mut self, relation: impl Into<String>, types: Vec<SchemaType>) {
        self.relations.insert(relation.into(), types);
    }

    /// Column types of a relation, if declared
    pub fn get(&self, relation: &str) -> Option<&[SchemaType]> {
        self.relations.get(relation).map(Vec::as_slice)
    }

    pub fn arity(&self, relation: &str) -> Option<usize> {
        self.get(relation).map(<[SchemaType]>::len)
    }

    pub fn contains(&self, relation: &str) -> bool {
        self.relations.contains_key(relation)
    }

    /// Declared relation names, in declaration order
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn clear(&mut self) {
        self.relations.clear();
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<SchemaType>)> for Schema {
    fn from_iter<I: IntoIterator<Item = (S, Vec<SchemaType>)>>(iter: I) -> Self {
        Schema {
            relations: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Everything a caller registers before a run: queries and the schema.
///
/// Built once and passed by reference into [`crate::Quest::run`]; it must not
/// be mutated while a run is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Query rules in registration order, each already `;`-terminated
    #[serde(default)]
    pub queries: Vec<String>,
    /// Column types per relation
    #[serde(default)]
    pub schema: Schema,
}

impl QueryConfig {
    pub fn new() -> Self {
        QueryConfig::default()
    }

    /// Append a query rule
    pub fn add_query(&mut self, query: impl Into<String>) -> &mut Self {
        self.queries.push(query.into());
        self
    }

    /// Declare the column types of a relation
    pub fn set_schema(&mut self, relation: impl Into<String>, types: Vec<SchemaType>) -> &mut Self {
        self.schema.set(relation, types);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Forget all queries and schemas
    pub fn clear(&mut self) {
        self.queries.clear();
        self.schema.clear();
    }
}

/// Parse a `name=type,type` schema declaration (command-line form)
pub fn parse_schema_decl(decl: &str) -> Result<(String, Vec<SchemaType>), String> {
    let (name, types) = decl
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TYPE[,TYPE...], got '{decl}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing relation name in '{decl}'"));
    }
    let types = types
        .split(',')
        .map(SchemaType::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.to_string(), types))
}
