// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns `CompileError`/`ConfigError`/`ElmJsonError` values into terminal-
//! ready strings, colored when the terminal supports it (`crates/cli/src/
//! output.rs`'s render-to-terminal idiom).

use crossterm::style::Stylize;

use ew_core::project::{CompileError, ElmJsonError};
use ew_project::ConfigError;

use crate::term::is_fancy;

fn title(text: &str) -> String {
    if is_fancy() {
        text.bold().red().to_string()
    } else {
        text.to_string()
    }
}

fn path(text: &str) -> String {
    if is_fancy() {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

pub fn render_compile_error(error: &CompileError) -> String {
    let mut out = String::new();
    out.push_str(&title(&format!("-- {} ", error.title)));
    if let Some(file_path) = &error.path {
        out.push_str(&path(&file_path.display().to_string()));
    }
    out.push('\n');
    out.push_str(&error.rendered);
    out.push('\n');
    out
}

pub fn render_elm_json_error(error: &ElmJsonError) -> String {
    format!("{} {}: {}", title("--"), error.output, error.message)
}

pub fn render_config_error(error: &ConfigError) -> String {
    format!("{}\n{error}", title("-- CONFIG ERROR --"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn compile_error_includes_title_and_rendered_body() {
        let error = CompileError {
            path: Some(PathBuf::from("src/Main.elm")),
            title: "TYPE MISMATCH".to_string(),
            rendered: "the types don't match".to_string(),
        };
        let out = render_compile_error(&error);
        assert!(out.contains("TYPE MISMATCH"));
        assert!(out.contains("src/Main.elm"));
        assert!(out.contains("the types don't match"));
    }

    #[test]
    fn compile_error_without_a_path_omits_it() {
        let error = CompileError { path: None, title: "ERROR".to_string(), rendered: "body".to_string() };
        let out = render_compile_error(&error);
        assert!(out.contains("ERROR"));
        assert!(out.contains("body"));
    }

    #[test]
    fn elm_json_error_names_the_offending_output() {
        let error = ElmJsonError { output: "main.js".to_string(), message: "duplicate inputs".to_string() };
        let out = render_elm_json_error(&error);
        assert!(out.contains("main.js"));
        assert!(out.contains("duplicate inputs"));
    }

    #[test]
    fn config_error_includes_the_underlying_message() {
        let error = ConfigError::NoTargets;
        let out = render_config_error(&error);
        assert!(out.contains("no targets"));
    }
}
