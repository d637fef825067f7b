//! # Quest
//!
//! Schema-driven fact synthesis and validation for Datalog/Overlog queries
//! over a key-value document store.
//!
//! Given query rules, a declared schema and a store, Quest normalizes every
//! stored document into relational tuples, synthesizes `define` and fact
//! statements, checks that arities agree everywhere a relation appears, then
//! drives an external evaluator and decodes its per-table dumps.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Queries ──► [Query Analyzer]        → table list, query arities
//!     │
//! Store ───► [Value Normalizer]       → tuples per relation
//!     │
//! Schema ──► [Program Synthesizer]    → defines ++ facts ++ queries
//!     │
//!            [Schema Validator]       → arity / coverage errors
//!     │
//!            [Evaluator Session]      → install, dump_table per table
//!     │
//!            [Result Decoder]         → ResultSet
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use quest::{MemoryStore, Quest, QueryConfig, RawValue, SchemaType};
//!
//! let mut config = QueryConfig::new();
//! config
//!     .add_query("a(X):-b(X),c(X);")
//!     .set_schema("a", vec![SchemaType::String])
//!     .set_schema("b", vec![SchemaType::String])
//!     .set_schema("c", vec![SchemaType::String]);
//!
//! let mut store = MemoryStore::new();
//! store.set("b", RawValue::sequence(["str10"]));
//! store.set("c", RawValue::sequence(["str10"]));
//!
//! let plan = Quest::new(store).plan(&config).unwrap();
//! assert_eq!(plan.tables, vec!["a", "b", "c"]);
//! assert_eq!(plan.program.facts, vec!["b(\"str10\");", "c(\"str10\");"]);
//! ```

pub mod code_generator;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod query;
pub mod schema;
pub mod storage;
pub mod value;

// Re-export commonly used types
pub use code_generator::{Program, ProgramBuilder};
pub use config::Config;
pub use engine::{Plan, Quest, RunOutput};
pub use error::{QuestError, Result};
pub use evaluator::{Evaluator, EvaluatorError, EvaluatorSession, ResultSet, SessionGuard};
pub use schema::{QueryConfig, Schema, SchemaType, ValidationError};
pub use storage::{JsonFileStore, MemoryStore, Store, StoreError};
pub use value::{normalize, Primitive, RawValue, Tuple};
