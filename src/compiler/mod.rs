//! Turns a sealed step sequence into test source text.
//!
//! Compilation is pure: the same steps, URL, dialect and options always produce
//! byte-identical output.

mod cypress;
mod playwright;
pub mod selector;

use crate::recorder::RecordedStep;
use crate::{RecorderError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Cypress, function-style callbacks.
    #[serde(rename = "javascript")]
    CypressJavascript,
    /// Cypress, arrow-style callbacks.
    #[serde(rename = "typescript")]
    CypressTypescript,
    Playwright,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [
        Dialect::CypressJavascript,
        Dialect::CypressTypescript,
        Dialect::Playwright,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::CypressJavascript => "javascript",
            Dialect::CypressTypescript => "typescript",
            Dialect::Playwright => "playwright",
        }
    }

    pub fn framework(&self) -> &'static str {
        match self {
            Dialect::CypressJavascript | Dialect::CypressTypescript => "Cypress",
            Dialect::Playwright => "Playwright Test",
        }
    }

    /// Conventional spec file extension.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Dialect::CypressJavascript => "cy.js",
            Dialect::CypressTypescript => "cy.ts",
            Dialect::Playwright => "spec.ts",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = RecorderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" | "cypress" => Ok(Dialect::CypressJavascript),
            "typescript" | "ts" => Ok(Dialect::CypressTypescript),
            "playwright" | "pw" => Ok(Dialect::Playwright),
            _ => Err(RecorderError::UnsupportedDialect(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOptions {
    pub suite_name: String,
    pub test_name: String,
}

impl ScriptOptions {
    pub const DEFAULT_SUITE: &'static str = "Recorded Test";
    pub const DEFAULT_TEST: &'static str = "performs recorded actions";
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            suite_name: Self::DEFAULT_SUITE.to_string(),
            test_name: Self::DEFAULT_TEST.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedScript {
    pub dialect: Dialect,
    pub source_text: String,
}

/// Compiles `steps` with default suite and test names.
pub fn compile(steps: &[RecordedStep], target_url: &str, dialect: &str) -> Result<GeneratedScript> {
    let dialect: Dialect = dialect.parse()?;
    Ok(compile_with(
        steps,
        target_url,
        dialect,
        &ScriptOptions::default(),
    ))
}

pub fn compile_with(
    steps: &[RecordedStep],
    target_url: &str,
    dialect: Dialect,
    options: &ScriptOptions,
) -> GeneratedScript {
    let source_text = match dialect {
        Dialect::CypressJavascript => {
            cypress::render(steps, target_url, options, cypress::Style::Function)
        }
        Dialect::CypressTypescript => {
            cypress::render(steps, target_url, options, cypress::Style::Arrow)
        }
        Dialect::Playwright => playwright::render(steps, target_url, options),
    };

    GeneratedScript {
        dialect,
        source_text,
    }
}

/// Indented line buffer shared by the dialect renderers.
struct ScriptWriter {
    lines: Vec<String>,
    depth: usize,
}

impl ScriptWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
            depth: 0,
        }
    }

    fn add(&mut self, line: impl Into<String>) {
        self.lines
            .push(format!("{}{}", "  ".repeat(self.depth), line.into()));
    }

    fn add_empty(&mut self) {
        self.lines.push(String::new());
    }

    fn open(&mut self, line: impl Into<String>) {
        self.add(line);
        self.depth += 1;
    }

    fn close(&mut self, line: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.add(line);
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Escapes text for a single-quoted JavaScript string literal.
pub(crate) fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
