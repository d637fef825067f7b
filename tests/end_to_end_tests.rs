//! End-to-end runs against a scripted evaluator.
//!
//! The evaluator records what was installed and returns canned dumps per
//! table, so these tests pin down program text, validation behavior, session
//! teardown and result decoding together.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{json, Value as JsonValue};

use quest::evaluator::{EvaluatorResult, SEPARATOR};
use quest::schema::{ArityMismatchKind, ValidationError};
use quest::{
    Evaluator, EvaluatorError, EvaluatorSession, MemoryStore, Quest, QuestError, QueryConfig,
    RawValue, SchemaType, Store, StoreError,
};

// Scripted evaluator

#[derive(Default)]
struct Journal {
    opened: usize,
    installed: Vec<String>,
    dumped: Vec<String>,
    destroyed: usize,
}

struct ScriptedSession {
    dumps: HashMap<String, String>,
    fail_dump: Option<String>,
    journal: Rc<RefCell<Journal>>,
}

impl EvaluatorSession for ScriptedSession {
    fn install(&mut self, program: &str) -> EvaluatorResult<()> {
        self.journal.borrow_mut().installed.push(program.to_string());
        Ok(())
    }

    fn dump_table(&mut self, table: &str) -> EvaluatorResult<String> {
        if self.fail_dump.as_deref() == Some(table) {
            return Err(EvaluatorError::Dump {
                table: table.to_string(),
                message: "table vanished".to_string(),
            });
        }
        self.journal.borrow_mut().dumped.push(table.to_string());
        Ok(self.dumps.get(table).cloned().unwrap_or_default())
    }

    fn destroy(&mut self) -> EvaluatorResult<()> {
        self.journal.borrow_mut().destroyed += 1;
        Ok(())
    }
}

#[derive(Default)]
struct ScriptedEvaluator {
    dumps: HashMap<String, String>,
    fail_dump: Option<String>,
    journal: Rc<RefCell<Journal>>,
}

impl ScriptedEvaluator {
    fn with_dump(mut self, table: &str, dump: &str) -> Self {
        self.dumps.insert(table.to_string(), dump.to_string());
        self
    }
}

impl Evaluator for ScriptedEvaluator {
    type Session = ScriptedSession;

    fn open(&mut self) -> EvaluatorResult<ScriptedSession> {
        self.journal.borrow_mut().opened += 1;
        Ok(ScriptedSession {
            dumps: self.dumps.clone(),
            fail_dump: self.fail_dump.clone(),
            journal: Rc::clone(&self.journal),
        })
    }
}

// Fixtures

fn store_from(documents: JsonValue) -> MemoryStore {
    let mut store = MemoryStore::new();
    if let JsonValue::Object(map) = documents {
        for (key, value) in map {
            store.set(key, RawValue::try_from(value).unwrap());
        }
    }
    store
}

fn four_columns() -> Vec<SchemaType> {
    vec![
        SchemaType::String,
        SchemaType::Int,
        SchemaType::Int,
        SchemaType::Int,
    ]
}

fn mixed_nested_store() -> MemoryStore {
    store_from(json!({
        "b": { "id0": [ { "0": 1 }, [11, 12] ], "0": [ 0, [ [1, 2], 111, 3 ] ] },
        "c": { "id1": [ { "0": 1 }, [11, 12] ], "1": [ 1, [ [1, 2], 222, 3 ] ] },
        "e": { "id2": [ { "50": 51 }, [511, 512] ], "1": [ 51, [ [51, 52], 5222, 53 ] ] }
    }))
}

fn mixed_nested_config() -> QueryConfig {
    let mut config = QueryConfig::new();
    config
        .add_query("a(Z) :- d(Y,Z), b(_,Y,_,_) ;")
        .add_query("a(Z) :- c(_,Y,_,Z), notin b(_,_,Y,_) ;")
        .add_query("a(Z) :- e(_,_,Z,_) ;")
        .add_query("d(Y,Z) :- c(_,Y,_,Z) ;")
        .set_schema("a", vec![SchemaType::Int])
        .set_schema("b", four_columns())
        .set_schema("c", four_columns())
        .set_schema("d", vec![SchemaType::Int, SchemaType::Int])
        .set_schema("e", four_columns());
    config
}

fn str10_config() -> QueryConfig {
    let mut config = QueryConfig::new();
    config
        .add_query("a(X):-b(X),c(X);")
        .set_schema("a", vec![SchemaType::String])
        .set_schema("b", vec![SchemaType::String])
        .set_schema("c", vec![SchemaType::String]);
    config
}

fn str10_store() -> MemoryStore {
    store_from(json!({ "b": ["str10"], "c": ["str10"] }))
}

// Scenarios

#[test]
fn test_str10_full_run() {
    let mut evaluator = ScriptedEvaluator::default()
        .with_dump("a", "str10\n")
        .with_dump("b", "str10\n")
        .with_dump("c", "str10\n");
    let journal = Rc::clone(&evaluator.journal);

    let output = Quest::new(str10_store())
        .run(&str10_config(), &mut evaluator)
        .unwrap();
    let (statements, tables, results) = output.triple();

    assert_eq!(
        statements,
        vec![
            "define(a,{string});",
            "define(b,{string});",
            "define(c,{string});",
            "b(\"str10\");",
            "c(\"str10\");",
            "a(X):-b(X),c(X);",
        ]
    );
    assert_eq!(tables, vec!["a", "b", "c"]);
    assert_eq!(
        results,
        vec![SEPARATOR, "a", "str10", SEPARATOR, "b", "str10", SEPARATOR, "c", "str10"]
    );

    let journal = journal.borrow();
    assert_eq!(journal.opened, 1);
    assert_eq!(journal.installed, vec![statements.concat()]);
    assert_eq!(journal.dumped, vec!["a", "b", "c"]);
    assert_eq!(journal.destroyed, 1);
}

#[test]
fn test_mixed_nested_documents_program() {
    let plan = Quest::new(mixed_nested_store())
        .plan(&mixed_nested_config())
        .unwrap();

    assert_eq!(plan.tables, vec!["a", "d", "b", "c", "e"]);
    assert_eq!(
        plan.program.defines,
        vec![
            "define(a,{int});",
            "define(d,{int, int});",
            "define(b,{string, int, int, int});",
            "define(c,{string, int, int, int});",
            "define(e,{string, int, int, int});",
        ]
    );
    assert_eq!(
        plan.program.facts,
        vec![
            "b(\"id0\",0,1,11);",
            "b(\"id0\",0,1,12);",
            "b(\"0\",0,1,111);",
            "b(\"0\",0,2,111);",
            "b(\"0\",0,1,3);",
            "b(\"0\",0,2,3);",
            "c(\"id1\",0,1,11);",
            "c(\"id1\",0,1,12);",
            "c(\"1\",1,1,222);",
            "c(\"1\",1,2,222);",
            "c(\"1\",1,1,3);",
            "c(\"1\",1,2,3);",
            "e(\"id2\",50,51,511);",
            "e(\"id2\",50,51,512);",
            "e(\"1\",51,51,5222);",
            "e(\"1\",51,52,5222);",
            "e(\"1\",51,51,53);",
            "e(\"1\",51,52,53);",
        ]
    );
    assert_eq!(plan.program.queries, mixed_nested_config().queries());
}

#[test]
fn test_mixed_nested_documents_results_keep_table_order() {
    let mut evaluator = ScriptedEvaluator::default()
        .with_dump("a", "0\n1\n51\n52\n")
        .with_dump("d", "0,1\n1,1\n");
    let output = Quest::new(mixed_nested_store())
        .run(&mixed_nested_config(), &mut evaluator)
        .unwrap();

    assert_eq!(
        output.results.tables().collect::<Vec<_>>(),
        vec!["a", "d", "b", "c", "e"]
    );
    assert_eq!(output.results.rows("a").unwrap(), ["0", "1", "51", "52"]);
    assert!(output.results.rows("e").unwrap().is_empty());
    // Empty dumps still contribute a separator and the table name
    assert_eq!(output.results.stream().len(), 5 * 2 + 4 + 2);
}

#[test]
fn test_row_wider_than_schema_reports_both() {
    let store = store_from(json!({
        "b": [ "str", { "0": [ 0, [ [1, 2], 111, 3 ] ], "id0": [ { "0": 1 }, [11, 12] ] } ],
        "c": { "id1": [ { "0": 1 }, [11, 12] ], "1": [ 1, [ [1, 2], 222, 3 ] ] }
    }));
    let mut config = QueryConfig::new();
    config
        .add_query("a(Z) :- d(Y,Z), b(_,Y,_,_) ;")
        .add_query("a(Z) :- b(_,_,Y,_), c(_,Y,_,Z) ;")
        .add_query("d(Y,Z) :- c(_,Y,_,Z) ;")
        .set_schema("a", vec![SchemaType::Int])
        .set_schema("b", four_columns())
        .set_schema("c", four_columns())
        .set_schema("d", vec![SchemaType::Int, SchemaType::Int]);

    let err = Quest::new(store).check(&config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "table 'b' has edb definition inconsistent with length of table schema : \
         edb = ['str', '0', 0, 1, 111], table schema = ['string', 'int', 'int', 'int']"
    );
}

#[test]
fn test_wrong_head_arity() {
    let mut config = str10_config();
    config.set_schema("a", vec![SchemaType::Int, SchemaType::String]);

    let err = Quest::new(str10_store()).check(&config).unwrap_err();
    match err {
        QuestError::Validation(ValidationError::ArityMismatch {
            table,
            kind,
            left,
            right,
        }) => {
            assert_eq!(table, "a");
            assert_eq!(kind, ArityMismatchKind::DefineVsQuery);
            assert_eq!((left, right), (2, 1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_edb_arity_disagrees_with_schema() {
    let mut config = str10_config();
    config.set_schema("b", vec![SchemaType::String, SchemaType::String]);
    let store = store_from(json!({ "b": { "k": "v" }, "c": ["str10"] }));

    // Stored rows have two columns, the query uses one
    let err = Quest::new(store).check(&config).unwrap_err();
    assert!(matches!(
        err,
        QuestError::Validation(ValidationError::ArityMismatch {
            kind: ArityMismatchKind::EdbVsQuery,
            left: 2,
            right: 1,
            ..
        })
    ));
    assert!(err.to_string().contains("edb_arity = 2, query_arity = 1"));
}

#[test]
fn test_declared_but_unused_relation_is_unreferenced() {
    let mut config = str10_config();
    config.set_schema("f", vec![SchemaType::Int]);

    let err = Quest::new(str10_store()).check(&config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "table 'f' does not appear in any query or edb fact"
    );
}

#[test]
fn test_missing_schema_entry() {
    let mut config = QueryConfig::new();
    config
        .add_query("a(X):-b(X),c(X);")
        .set_schema("a", vec![SchemaType::String])
        .set_schema("b", vec![SchemaType::String]);

    let err = Quest::new(str10_store()).check(&config).unwrap_err();
    assert!(matches!(
        err,
        QuestError::Validation(ValidationError::MissingDefinition { ref table }) if table == "c"
    ));
}

#[test]
fn test_missing_store_key_yields_no_facts() {
    let store = store_from(json!({ "b": ["str10"] }));
    let plan = Quest::new(store).plan(&str10_config()).unwrap();
    assert_eq!(plan.program.facts, vec!["b(\"str10\");"]);
}

#[test]
fn test_validation_failure_never_installs_but_destroys() {
    let mut config = str10_config();
    config.set_schema("a", vec![SchemaType::Int, SchemaType::String]);
    let mut evaluator = ScriptedEvaluator::default();
    let journal = Rc::clone(&evaluator.journal);

    assert!(Quest::new(str10_store()).run(&config, &mut evaluator).is_err());

    let journal = journal.borrow();
    assert_eq!(journal.opened, 1);
    assert!(journal.installed.is_empty());
    assert_eq!(journal.destroyed, 1);
}

#[test]
fn test_dump_failure_destroys_session() {
    let mut evaluator = ScriptedEvaluator {
        fail_dump: Some("b".to_string()),
        ..ScriptedEvaluator::default()
    };
    let journal = Rc::clone(&evaluator.journal);

    let err = Quest::new(str10_store())
        .run(&str10_config(), &mut evaluator)
        .unwrap_err();
    assert!(matches!(
        err,
        QuestError::Evaluator(EvaluatorError::Dump { ref table, .. }) if table == "b"
    ));
    assert_eq!(journal.borrow().dumped, vec!["a"]);
    assert_eq!(journal.borrow().destroyed, 1);
}

struct FlakyStore;

impl Store for FlakyStore {
    fn get(&self, key: &str) -> Result<RawValue, StoreError> {
        Err(StoreError::Backend(format!("read of '{key}' timed out")))
    }
}

#[test]
fn test_store_failures_other_than_missing_keys_abort() {
    let err = Quest::new(FlakyStore).check(&str10_config()).unwrap_err();
    assert!(matches!(err, QuestError::Store(StoreError::Backend(_))));
}
