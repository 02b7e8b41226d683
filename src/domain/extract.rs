//! Procedure Extraction
//!
//! Lexical scan of one PL/I source file. Lines are fed through a two-state
//! machine: outside any procedure, or collecting the body of the most recent
//! declaration. Each finished body is searched for `CALL name;` statements.
//!
//! There is no parser behind this; anything that does not look like a
//! declaration or a terminated call is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// `NAME: PROC` at line start, leading whitespace allowed.
static DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\w+):\s*PROC").expect("declaration pattern"));

/// `CALL NAME;` with the terminator required. May span lines.
///
/// The leading `\b` is stricter than a bare `CALL\s+` search: it stops
/// identifiers ending in `CALL` (`RECALL X;`) from producing an edge.
static CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bCALL\s+(\w+)\s*;").expect("call pattern"));

/// A declared procedure and the names its body calls, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    pub name: String,
    pub calls: Vec<String>,
}

impl Procedure {
    pub fn new(name: impl Into<String>, calls: Vec<String>) -> Self {
        Self {
            name: name.into(),
            calls,
        }
    }
}

enum ScanState<'a> {
    Outside,
    InBody { name: String, body: Vec<&'a str> },
}

/// Extract every procedure declared in `text`, in declaration order.
///
/// A name declared twice in the same file (in any letter case) keeps its
/// first position and spelling, and the calls of its last body. Never fails; unrecognised text yields nothing.
pub fn extract(text: &str) -> Vec<Procedure> {
    let mut procedures = Vec::new();
    let mut state = ScanState::Outside;

    for line in text.split(&['\r', '\n'][..]) {
        if let Some(caps) = DECLARATION.captures(line) {
            if let ScanState::InBody { name, body } = state {
                finish(&mut procedures, name, &body);
            }
            state = ScanState::InBody {
                name: caps[1].to_string(),
                body: Vec::new(),
            };
        } else if let ScanState::InBody { body, .. } = &mut state {
            body.push(line);
        }
    }

    if let ScanState::InBody { name, body } = state {
        finish(&mut procedures, name, &body);
    }

    procedures
}

/// All terminated `CALL` targets in `body`, duplicates kept.
pub fn calls_in(body: &str) -> Vec<String> {
    CALL.captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn finish(procedures: &mut Vec<Procedure>, name: String, body: &[&str]) {
    let calls = calls_in(&body.join("\n"));
    match procedures.iter_mut().find(|p| p.name.eq_ignore_ascii_case(&name)) {
        Some(existing) => existing.calls = calls,
        None => procedures.push(Procedure { name, calls }),
    }
}
