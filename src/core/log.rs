//! Symbolic log lines and the localization seam.
//!
//! The engine never builds display text. Every user-facing message is a
//! [`LogLine`] carrying a translation key plus named parameters, and the host
//! renders it through a [`Translator`].

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub key: String,
    #[serde(default)]
    pub params: Vec<(String, String)>,
}

impl LogLine {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            params: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Display) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Pushes onto a bounded log, dropping the oldest entry when full.
pub fn push_bounded<T>(log: &mut VecDeque<T>, entry: T, capacity: usize) {
    if log.len() >= capacity {
        log.pop_front();
    }
    log.push_back(entry);
}

/// Host-provided localization.
pub trait Translator {
    fn translate(&self, key: &str, params: &[(String, String)]) -> String;

    fn render(&self, line: &LogLine) -> String {
        self.translate(&line.key, &line.params)
    }
}

/// Fallback translator that echoes the key and its parameters.
///
/// The simulator renders run logs through it at `-vv`. Hosts can fall back to
/// it when a key has no catalog entry, so an unknown id still reads.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyEcho;

impl Translator for KeyEcho {
    fn translate(&self, key: &str, params: &[(String, String)]) -> String {
        if params.is_empty() {
            return key.to_string();
        }
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}{{{}}}", key, rendered.join(","))
    }
}
