//! # Quest Engine
//!
//! Orchestrates one run end to end:
//!
//! ```text
//! QueryConfig ──► table list ──► defines ──► facts ──► arity checks
//!                                                         │
//!      ResultSet ◄── decode ◄── dump tables ◄── install ◄─┘
//! ```
//!
//! [`Quest::plan`] stops after validation and never touches an evaluator.
//! [`Quest::run`] opens an evaluator session first and keeps it inside a
//! [`SessionGuard`], so the session is destroyed on every exit path.

use tracing::{debug, info};

use crate::code_generator::{EdbFacts, Program, ProgramBuilder, Synthesis};
use crate::error::Result;
use crate::evaluator::{Evaluator, EvaluatorSession, ResultSet, SessionGuard};
use crate::query::query_arity;
use crate::schema::validator::{edb_arity, verify_arities, verify_types};
use crate::schema::{ArityCheck, QueryConfig, Schema, ValidationError};
use crate::storage::Store;
use crate::value::normalize;

/// Validated program and the tables it will be dumped for
#[derive(Debug, Clone)]
pub struct Plan {
    pub program: Program,
    pub tables: Vec<String>,
}

/// Everything a completed run produces
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub program: Program,
    pub tables: Vec<String>,
    pub results: ResultSet,
}

impl RunOutput {
    /// `(program statements, table list, flattened result stream)`
    pub fn triple(&self) -> (Vec<String>, Vec<String>, Vec<String>) {
        (
            self.program.statements(),
            self.tables.clone(),
            self.results.stream(),
        )
    }
}

/// Fact synthesis and validation over a document store
pub struct Quest<S: Store> {
    store: S,
}

impl<S: Store> Quest<S> {
    pub fn new(store: S) -> Self {
        Quest { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Synthesize and validate the program without evaluating it
    pub fn plan(&self, config: &QueryConfig) -> Result<Plan> {
        let Synthesis {
            tables,
            program,
            edb,
        } = ProgramBuilder::new(config, &self.store).build()?;

        self.validate(config, &tables, &edb)?;

        debug!(
            defines = program.defines.len(),
            facts = program.facts.len(),
            queries = program.queries.len(),
            "program_synthesized"
        );
        Ok(Plan { program, tables })
    }

    /// Validate only; `Ok(())` means the program would be submitted
    pub fn check(&self, config: &QueryConfig) -> Result<()> {
        self.plan(config).map(|_| ())
    }

    /// Synthesize, validate, evaluate and decode.
    ///
    /// The evaluator session is opened before synthesis and destroyed before
    /// this returns, also when validation or evaluation fails.
    pub fn run<E: Evaluator>(&self, config: &QueryConfig, evaluator: &mut E) -> Result<RunOutput> {
        info!(
            queries = config.queries().len(),
            relations = config.schema().len(),
            "run_started"
        );
        let mut session = SessionGuard::open(evaluator)?;

        let Plan { program, tables } = self.plan(config)?;
        debug!(program = %program.legible(), "submitting_program");

        session.install(&program.text())?;

        let mut dumps = Vec::with_capacity(tables.len());
        for table in &tables {
            dumps.push(session.dump_table(table)?);
        }
        session.close()?;

        let results = ResultSet::decode(&tables, &dumps);
        info!(tables = tables.len(), "run_finished");
        Ok(RunOutput {
            program,
            tables,
            results,
        })
    }

    fn validate(&self, config: &QueryConfig, tables: &[String], edb: &EdbFacts) -> Result<()> {
        let schema = config.schema();
        let queries = config.queries();

        let mut checks = Vec::with_capacity(tables.len());
        for table in tables {
            let tuples = edb.tuples_for(table);
            checks.push(
                ArityCheck::new(table.as_str())
                    .with_define(schema.arity(table))
                    .with_edb(edb_arity(table, tuples)?)
                    .with_query(query_arity(queries, table)?),
            );
        }
        verify_arities(&checks)?;

        self.verify_schema_only_relations(schema, tables)?;

        for table in tables {
            verify_types(table, edb.tuples_for(table), schema)?;
        }
        Ok(())
    }

    /// Declared relations no query mentions still need stored facts
    fn verify_schema_only_relations(&self, schema: &Schema, tables: &[String]) -> Result<()> {
        for relation in schema.relations() {
            if tables.iter().any(|t| t == relation) {
                continue;
            }
            let raw = match self.store.get(relation) {
                Ok(raw) => raw,
                Err(e) if e.is_not_found() => {
                    return Err(ValidationError::Unreferenced {
                        table: relation.to_string(),
                    }
                    .into())
                }
                Err(e) => return Err(e.into()),
            };
            let tuples = normalize(&raw);
            ArityCheck::new(relation)
                .with_define(schema.arity(relation))
                .with_edb(edb_arity(relation, &tuples)?)
                .verify()?;
        }
        Ok(())
    }
}
