// Copyright (C) 2024 Bellande Architecture Mechanism Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::error::CosmoError;
use crate::utilities::utilities::{is_identifier, SourceText, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Live name→value bindings for one script invocation.
///
/// `parameters` keeps the declaration order of the bracketed first line so
/// callers can map positional arguments onto it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    variables: BTreeMap<String, Value>,
    parameters: Vec<String>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            variables: BTreeMap::new(),
            parameters: Vec::new(),
        }
    }

    pub fn extract(source: &SourceText) -> Result<Self, CosmoError> {
        Self::parse_declaration(&source.declaration.text, source.declaration.number)
    }

    /// Parses `[a, b=3, c]`. Bare names start out unbound.
    pub fn parse_declaration(text: &str, line: usize) -> Result<Self, CosmoError> {
        let mut environment = Environment::new();
        for item in declaration_items(text, line)? {
            let (name, value) = match item.split_once('=') {
                Some((name, literal)) => {
                    let literal = literal.trim();
                    if literal.is_empty() {
                        return Err(malformed(line, format!("missing value for `{}`", name.trim())));
                    }
                    (name.trim(), Value::parse_literal(literal))
                }
                None => (item, Value::Unbound),
            };
            if !is_identifier(name) {
                return Err(malformed(line, format!("`{}` is not an identifier", name)));
            }
            if environment.variables.contains_key(name) {
                return Err(malformed(line, format!("duplicate parameter `{}`", name)));
            }
            environment.parameters.push(name.to_string());
            environment.variables.insert(name.to_string(), value);
        }
        debug!(line, parameters = ?environment.parameters, "extracted environment");
        Ok(environment)
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Like [`Environment::get`] but treats unbound parameters as missing.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).filter(|value| value.is_bound())
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.variables.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Bindings in name order, unbound parameters included.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter()
    }

    /// Binds call-site arguments to the declared parameters, in declaration
    /// order. Each argument is taken whole as one literal, commas included,
    /// and replaces any pre-bound value.
    pub fn inject_arguments<S: AsRef<str>>(&mut self, args: &[S]) -> Result<(), CosmoError> {
        if self.parameters.len() != args.len() {
            return Err(CosmoError::ArgumentCount {
                expected: self.parameters.clone(),
                got: args.len(),
            });
        }
        for (name, arg) in self.parameters.iter().zip(args) {
            self.variables
                .insert(name.clone(), Value::parse_literal(arg.as_ref().trim()));
        }
        debug!(parameters = ?self.parameters, "injected arguments");
        Ok(())
    }
}

fn declaration_items(text: &str, line: usize) -> Result<Vec<&str>, CosmoError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .ok_or_else(|| malformed(line, "missing opening `[`"))?
        .strip_suffix(']')
        .ok_or_else(|| malformed(line, "missing closing `]`"))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(str::trim)
        .map(|item| {
            if item.is_empty() {
                Err(malformed(line, "empty parameter"))
            } else {
                Ok(item)
            }
        })
        .collect()
}

fn malformed(line: usize, reason: impl Into<String>) -> CosmoError {
    CosmoError::MalformedEnvironment {
        line,
        reason: reason.into(),
    }
}
