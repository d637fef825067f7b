//! Synthesized program and the builder that assembles it.

use std::fmt;

use super::{define_statements, edb_facts, EdbFacts};
use crate::error::Result;
use crate::query::table_list;
use crate::schema::QueryConfig;
use crate::storage::Store;

/// Program text in evaluator order: defines, then facts, then queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub defines: Vec<String>,
    pub facts: Vec<String>,
    pub queries: Vec<String>,
}

impl Program {
    /// All statements, defines ++ facts ++ queries
    pub fn statements(&self) -> Vec<String> {
        self.defines
            .iter()
            .chain(&self.facts)
            .chain(&self.queries)
            .cloned()
            .collect()
    }

    /// The concatenated text submitted to the evaluator
    pub fn text(&self) -> String {
        self.statements().concat()
    }

    /// One `;`-terminated statement per line, for logs
    pub fn legible(&self) -> String {
        let mut lines = Vec::new();
        for statement in self.statements() {
            for part in statement.split(';') {
                let part = part.trim();
                if !part.is_empty() {
                    lines.push(format!("{part};"));
                }
            }
        }
        lines.join("\n")
    }

    pub fn len(&self) -> usize {
        self.defines.len() + self.facts.len() + self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Everything synthesis produces for one run
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Relations of the run, in first-seen query order
    pub tables: Vec<String>,
    pub program: Program,
    /// Normalized facts, kept for arity validation
    pub edb: EdbFacts,
}

/// Builds a [`Program`] from a registration and a store
pub struct ProgramBuilder<'a, S: Store> {
    config: &'a QueryConfig,
    store: &'a S,
}

impl<'a, S: Store> ProgramBuilder<'a, S> {
    pub fn new(config: &'a QueryConfig, store: &'a S) -> Self {
        ProgramBuilder { config, store }
    }

    /// Synthesize defines, facts and queries for every referenced table
    pub fn build(&self) -> Result<Synthesis> {
        let queries = self.config.queries();
        let schema = self.config.schema();
        let tables = table_list(queries);

        let defines = define_statements(&tables, schema)?;
        let edb = edb_facts(&tables, schema, self.store)?;

        let program = Program {
            defines,
            facts: edb.statements.clone(),
            queries: queries.to_vec(),
        };

        Ok(Synthesis {
            tables,
            program,
            edb,
        })
    }
}
