//! # Code Generator
//!
//! Synthesizes the program text handed to the external evaluator.
//!
//! ## Pipeline Position
//!
//! ```text
//! Queries + Schema + Store -> [Code Generator] -> Program -> Evaluator
//! ```
//!
//! ## Statement Grammar
//!
//! ```text
//! define(<name>,{<type>[, <type>]*});
//! <name>(<col>[,<col>]*);            string columns quoted, others bare
//! <query>                            passed through verbatim
//! ```
//!
//! A program is always `defines ++ facts ++ queries`.

pub mod program;

pub use program::{Program, ProgramBuilder, Synthesis};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Result;
use crate::schema::validator::check_tuple_length;
use crate::schema::{Schema, SchemaType, ValidationError};
use crate::storage::Store;
use crate::value::{normalize, Primitive, Tuple};

/// Render the define statement declaring a relation's column types
pub fn define_statement(relation: &str, types: &[SchemaType]) -> String {
    let types: Vec<String> = types.iter().map(ToString::to_string).collect();
    format!("define({relation},{{{}}});", types.join(", "))
}

/// Render one column value; string-typed columns are quoted
pub fn render_column(value: &Primitive, ty: SchemaType) -> String {
    if ty.is_quoted() {
        let text = value.to_string().replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{text}\"")
    } else {
        value.to_string()
    }
}

/// Render a fact statement for a tuple whose length matches `types`
pub fn fact_statement(relation: &str, tuple: &Tuple, types: &[SchemaType]) -> String {
    let columns: Vec<String> = tuple
        .iter()
        .zip(types)
        .map(|(value, ty)| render_column(value, *ty))
        .collect();
    format!("{relation}({});", columns.join(","))
}

/// Define statements for every table, in table-list order
pub fn define_statements(tables: &[String], schema: &Schema) -> std::result::Result<Vec<String>, ValidationError> {
    tables
        .iter()
        .map(|table| {
            schema
                .get(table)
                .map(|types| define_statement(table, types))
                .ok_or_else(|| ValidationError::MissingDefinition {
                    table: table.clone(),
                })
        })
        .collect()
}

/// Normalized EDB tuples per table, plus their rendered fact statements
#[derive(Debug, Clone, Default)]
pub struct EdbFacts {
    /// Tuples per table; tables without stored data have no entry
    pub tuples: IndexMap<String, Vec<Tuple>>,
    /// Fact statements, grouped by table in table-list order
    pub statements: Vec<String>,
}

impl EdbFacts {
    /// Tuples synthesized for `table` (empty when the store had nothing)
    pub fn tuples_for(&self, table: &str) -> &[Tuple] {
        self.tuples.get(table).map_or(&[], Vec::as_slice)
    }
}

/// Pull each table's stored value, normalize it, check it against the schema
/// and render it as fact statements.
///
/// A key missing from the store means the table has no facts. Every other
/// store error, and every tuple whose length does not match the schema,
/// aborts synthesis.
pub fn edb_facts<S: Store>(tables: &[String], schema: &Schema, store: &S) -> Result<EdbFacts> {
    let mut facts = EdbFacts::default();

    for table in tables {
        let raw = match store.get(table) {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => {
                debug!(table = %table, "no_stored_value");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let tuples = normalize(&raw);
        debug!(table = %table, raw = %raw, tuples = tuples.len(), "normalized_relation");

        let types = schema
            .get(table)
            .ok_or_else(|| ValidationError::MissingDefinition {
                table: table.clone(),
            })?;

        for tuple in &tuples {
            check_tuple_length(table, tuple, schema)?;
            facts.statements.push(fact_statement(table, tuple, types));
        }
        facts.tuples.insert(table.clone(), tuples);
    }

    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuestError;
    use crate::storage::{MemoryStore, StoreError, StoreResult};
    use crate::value::RawValue;

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_define_statement() {
        assert_eq!(define_statement("a", &[SchemaType::Int]), "define(a,{int});");
        assert_eq!(
            define_statement("b", &[SchemaType::String, SchemaType::Int, SchemaType::Int]),
            "define(b,{string, int, int});"
        );
    }

    #[test]
    fn test_fact_statement_quotes_string_columns() {
        let tuple = Tuple::new(vec![
            Primitive::from("id0"),
            Primitive::from("0"),
            Primitive::from(1),
            Primitive::from(11),
        ]);
        let types = [SchemaType::String, SchemaType::Int, SchemaType::Int, SchemaType::Int];
        assert_eq!(fact_statement("b", &tuple, &types), "b(\"id0\",0,1,11);");
    }

    #[test]
    fn test_render_column_escapes_quotes() {
        assert_eq!(render_column(&Primitive::from("a\"b"), SchemaType::String), "\"a\\\"b\"");
        assert_eq!(render_column(&Primitive::from(1.5), SchemaType::Float), "1.5");
        assert_eq!(render_column(&Primitive::from(true), SchemaType::Bool), "true");
    }

    #[test]
    fn test_define_statements_require_schema() {
        let mut schema = Schema::new();
        schema.set("a", vec![SchemaType::String]);
        let err = define_statements(&tables(&["a", "b"]), &schema).unwrap_err();
        assert_eq!(err, ValidationError::MissingDefinition { table: "b".into() });
    }

    #[test]
    fn test_edb_facts_skip_missing_keys() {
        let mut schema = Schema::new();
        schema.set("a", vec![SchemaType::String]);
        schema.set("b", vec![SchemaType::String]);
        let mut store = MemoryStore::new();
        store.set("b", "str10");

        let facts = edb_facts(&tables(&["a", "b"]), &schema, &store).unwrap();
        assert_eq!(facts.statements, vec!["b(\"str10\");"]);
        assert!(facts.tuples_for("a").is_empty());
        assert_eq!(facts.tuples_for("b").len(), 1);
    }

    #[test]
    fn test_edb_facts_length_mismatch() {
        let mut schema = Schema::new();
        schema.set("b", vec![SchemaType::Int, SchemaType::Int]);
        let mut store = MemoryStore::new();
        store.set("b", RawValue::sequence([1, 2]));

        let err = edb_facts(&tables(&["b"]), &schema, &store).unwrap_err();
        assert!(matches!(
            err,
            QuestError::Validation(ValidationError::SchemaLengthMismatch { .. })
        ));
    }

    struct BrokenStore;

    impl Store for BrokenStore {
        fn get(&self, _key: &str) -> StoreResult<RawValue> {
            Err(StoreError::Backend("connection reset".into()))
        }
    }

    #[test]
    fn test_edb_facts_propagate_backend_errors() {
        let mut schema = Schema::new();
        schema.set("b", vec![SchemaType::Int]);
        let err = edb_facts(&tables(&["b"]), &schema, &BrokenStore).unwrap_err();
        assert!(matches!(err, QuestError::Store(StoreError::Backend(_))));
    }
}
