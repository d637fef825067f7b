//! # Query Text Analyzer
//!
//! Pulls relation names and per-relation arities straight out of raw rule
//! text such as `a(Z) :- c(_,Y,_,Z), notin b(_,_,Y,_) ;`.
//!
//! No full parse is attempted. The text is stripped of the `notin` marker and
//! of all whitespace, then scanned on parenthesis boundaries:
//! - a relation name is the identifier directly in front of a `(`
//! - its arity is the number of comma-separated tokens inside that group

use crate::schema::validator::{unify_arities, ArityOrigin, ValidationError};

/// Symbols that can never be part of a relation name
const CONTROL_SYMBOLS: [&str; 5] = [":-", "(", ")", ",", ";"];

/// Negation marker placed in front of a body literal
const NEGATION_MARKER: &str = "notin";

/// Remove the negation marker and every whitespace character.
///
/// `notin` only counts as the marker when it opens a body literal (after `:-`
/// or `,`) and is followed by whitespace, so names such as `notinvited` stay
/// intact.
pub fn strip_query(query: &str) -> String {
    let mut kept = String::with_capacity(query.len());
    let mut rest = query;
    while let Some(pos) = rest.find(NEGATION_MARKER) {
        let (before, after) = rest.split_at(pos);
        kept.push_str(before);
        let tail = &after[NEGATION_MARKER.len()..];
        if !is_negation_marker(&kept, tail) {
            kept.push_str(NEGATION_MARKER);
        }
        rest = tail;
    }
    kept.push_str(rest);
    kept.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_negation_marker(before: &str, after: &str) -> bool {
    let before = before.trim_end();
    let opens_literal = before.ends_with(',') || before.ends_with(":-");
    opens_literal && after.starts_with(char::is_whitespace)
}

fn has_control_symbol(candidate: &str) -> bool {
    CONTROL_SYMBOLS.iter().any(|s| candidate.contains(s))
}

/// Relations referenced by one query, in order of first appearance
pub fn extract_tables(query: &str) -> Vec<String> {
    let stripped = strip_query(query);
    let components: Vec<&str> = stripped.split('(').collect();

    let mut tables: Vec<String> = Vec::new();
    // The last component follows the final `(` and is never a name
    let Some((_, named)) = components.split_last() else {
        return tables;
    };

    for component in named {
        // `-` closes the `:-` operator, `,` separates body literals
        let candidate = match component.rfind(['-', ',']) {
            Some(pos) => &component[pos + 1..],
            None => component,
        };
        if candidate.is_empty() || has_control_symbol(candidate) {
            continue;
        }
        if !tables.iter().any(|t| t == candidate) {
            tables.push(candidate.to_string());
        }
    }
    tables
}

/// Table list for a run: every relation of every query, first-seen order
pub fn table_list<S: AsRef<str>>(queries: &[S]) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for query in queries {
        for table in extract_tables(query.as_ref()) {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
    }
    tables
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Arity of every occurrence of `table` in one query (head and body)
pub fn occurrence_arities(query: &str, table: &str) -> Vec<usize> {
    let stripped = strip_query(query);
    let needle = format!("{table}(");
    let mut arities = Vec::new();

    let mut from = 0;
    while let Some(found) = stripped[from..].find(&needle) {
        let start = from + found;
        let args_start = start + needle.len();
        from = args_start;

        // `ab(` must not count as an occurrence of `b`
        let preceded_by_name = stripped[..start].chars().next_back().is_some_and(is_name_char);
        if preceded_by_name {
            continue;
        }

        let Some(len) = stripped[args_start..].find(')') else {
            continue;
        };
        let args = &stripped[args_start..args_start + len];
        let arity = if args.is_empty() {
            0
        } else {
            args.split(',').count()
        };
        arities.push(arity);
    }
    arities
}

/// Arity of `table` across all queries.
///
/// `Ok(None)` when no query mentions it; every occurrence must agree.
pub fn query_arity<S: AsRef<str>>(queries: &[S], table: &str) -> Result<Option<usize>, ValidationError> {
    let arities: Vec<usize> = queries
        .iter()
        .flat_map(|q| occurrence_arities(q.as_ref(), table))
        .collect();
    unify_arities(table, ArityOrigin::Query, &arities)
}
