// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses `elm make --report=json`'s stderr report into our error model.

use std::path::PathBuf;

use ew_core::project::CompileError;
use serde_json::Value;

use crate::errors::{CompileOutcome, CompileResultError};

/// A compiler report is either one general error (stray argument, missing
/// file) or a batch of per-module compile errors, each with one or more
/// problems. Message arrays mix plain strings and `{"string": ...}` styled
/// chunks; we only need the text for terminal rendering, so they're
/// flattened and concatenated.
pub fn parse_report_json(raw: &str) -> Result<CompileOutcome, CompileResultError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| CompileResultError::JsonParseError { message: err.to_string() })?;

    match value.get("type").and_then(Value::as_str) {
        Some("error") => {
            let title = value.get("title").and_then(Value::as_str).unwrap_or("ERROR").to_string();
            let message = render_message(value.get("message"));
            Err(CompileResultError::ElmMakeErrorGeneral { title, message })
        }
        Some("compile-errors") => {
            let errors = value
                .get("errors")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .flat_map(module_errors)
                .collect();
            Ok(CompileOutcome::CompileErrors { errors })
        }
        _ => Err(CompileResultError::JsonParseError {
            message: "report missing a recognized \"type\" field".to_string(),
        }),
    }
}

fn module_errors(module: &Value) -> Vec<CompileError> {
    let path = module.get("path").and_then(Value::as_str).map(PathBuf::from);
    module
        .get("problems")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|problem| {
            let title = problem.get("title").and_then(Value::as_str).unwrap_or("ERROR").to_string();
            let rendered = render_message(problem.get("message"));
            CompileError { path: path.clone(), title, rendered }
        })
        .collect()
}

fn render_message(message: Option<&Value>) -> String {
    match message {
        Some(Value::Array(chunks)) => chunks
            .iter()
            .map(|chunk| match chunk {
                Value::String(s) => s.clone(),
                Value::Object(obj) => {
                    obj.get("string").and_then(Value::as_str).unwrap_or_default().to_string()
                }
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(""),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_general_error_report() {
        let raw = r#"{"type":"error","path":null,"title":"NO ELM JSON","message":["couldn't find it"]}"#;
        let result = parse_report_json(raw);
        assert!(matches!(
            result,
            Err(CompileResultError::ElmMakeErrorGeneral { title, .. }) if title == "NO ELM JSON"
        ));
    }

    #[test]
    fn parses_compile_errors_report_with_styled_message_chunks() {
        let raw = r#"{
            "type": "compile-errors",
            "errors": [{
                "path": "src/Main.elm",
                "name": "Main",
                "problems": [{
                    "title": "TYPE MISMATCH",
                    "message": ["Expected ", {"bold": true, "string": "Int"}, " but got String"]
                }]
            }]
        }"#;
        let result = parse_report_json(raw).unwrap();
        match result {
            CompileOutcome::CompileErrors { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].title, "TYPE MISMATCH");
                assert_eq!(errors[0].rendered, "Expected Int but got String");
                assert_eq!(errors[0].path, Some(PathBuf::from("src/Main.elm")));
            }
            _ => panic!("expected CompileErrors"),
        }
    }

    #[test]
    fn unrecognized_json_shape_is_a_parse_error() {
        let raw = r#"{"foo": "bar"}"#;
        assert!(matches!(parse_report_json(raw), Err(CompileResultError::JsonParseError { .. })));
    }
}
