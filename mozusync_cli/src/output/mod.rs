//! User-facing output
//!
//! Run output goes through a [`Console`] so the same lines can be printed
//! to the terminal or captured for inspection.

mod format;

pub use format::{WRAP_WIDTH, format_bytes, pluralize, rule, table, wordlist, wraptext};

use colored::Colorize;
use std::sync::{Arc, Mutex};

/// Line-oriented output sink
#[derive(Clone, Default)]
pub struct Console {
    captured: Option<Arc<Mutex<Vec<String>>>>,
}

impl Console {
    /// Print to stdout
    pub fn stdout() -> Self {
        Self { captured: None }
    }

    /// Keep lines in memory instead of printing them
    pub fn captured() -> Self {
        Self {
            captured: Some(Arc::default()),
        }
    }

    /// Plain line
    pub fn line(&self, text: &str) {
        match &self.captured {
            Some(lines) => push_lines(lines, text),
            None => println!("{text}"),
        }
    }

    /// Success line, shown with a green marker
    pub fn ok(&self, text: &str) {
        match &self.captured {
            Some(lines) => push_lines(lines, text),
            None => {
                for line in text.lines() {
                    println!("{} {line}", ">>".green());
                }
            }
        }
    }

    /// Section heading preceded by a blank line
    pub fn subhead(&self, text: &str) {
        match &self.captured {
            Some(lines) => {
                push_lines(lines, "");
                push_lines(lines, text);
            }
            None => println!("\n{}", text.bold()),
        }
    }

    /// Captured lines; empty when printing to stdout
    pub fn lines(&self) -> Vec<String> {
        self.captured
            .as_ref()
            .and_then(|lines| lines.lock().ok().map(|lines| lines.clone()))
            .unwrap_or_default()
    }

    /// Captured output joined with newlines
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

fn push_lines(lines: &Mutex<Vec<String>>, text: &str) {
    if let Ok(mut lines) = lines.lock() {
        if text.is_empty() {
            lines.push(String::new());
        }
        lines.extend(text.lines().map(str::to_string));
    }
}
