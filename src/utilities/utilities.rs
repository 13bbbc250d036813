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

use std::fmt;

/// Prefix marking an operand as "look up this name".
pub const DEREFERENCE_SIGIL: char = '&';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Quoted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn word(text: impl Into<String>, line: usize) -> Self {
        Token {
            kind: TokenKind::Word,
            text: text.into(),
            line,
        }
    }

    pub fn quoted(text: impl Into<String>, line: usize) -> Self {
        Token {
            kind: TokenKind::Quoted,
            text: text.into(),
            line,
        }
    }
}

/// One non-empty source line. `number` is 1-based and counts the lines that
/// were filtered out as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
    pub tokens: Vec<Token>,
}

/// Tokenized program: the verbatim declaration line plus the statement lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub declaration: Line,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Unbound,
}

impl Value {
    /// Integer first, then float, then string. Surrounding double quotes are
    /// stripped from string literals.
    pub fn parse_literal(text: &str) -> Value {
        if let Ok(int) = text.parse::<i64>() {
            return Value::Int(int);
        }
        if let Ok(float) = text.parse::<f64>() {
            if float.is_finite() {
                return Value::Float(float);
            }
        }
        let unquoted = text
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(text);
        Value::Str(unquoted.to_string())
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, Value::Unbound)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Unbound => "unbound",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(int) => write!(f, "{}", int),
            Value::Float(float) if float.fract() == 0.0 => write!(f, "{:.1}", float),
            Value::Float(float) => write!(f, "{}", float),
            Value::Str(text) => f.write_str(text),
            Value::Unbound => f.write_str("<unbound>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Reference(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(Value::Str(text)) if text.chars().any(char::is_whitespace) => {
                write!(f, "\"{}\"", text)
            }
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Reference(name) => write!(f, "{}{}", DEREFERENCE_SIGIL, name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Set,
    Add,
    Print,
}

impl Opcode {
    pub fn from_word(word: &str) -> Option<Opcode> {
        match word {
            "SET" => Some(Opcode::Set),
            "ADD" => Some(Opcode::Add),
            "PRINT" => Some(Opcode::Print),
            _ => None,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Opcode::Set => 2,
            Opcode::Add => 3,
            Opcode::Print => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Opcode::Set => "SET",
            Opcode::Add => "ADD",
            Opcode::Print => "PRINT",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Set {
        dest: String,
        value: Operand,
    },
    Add {
        dest: String,
        lhs: Operand,
        rhs: Operand,
    },
    Print {
        expr: Operand,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub line: usize,
    pub kind: StatementKind,
}

impl Statement {
    pub fn opcode(&self) -> Opcode {
        match self.kind {
            StatementKind::Set { .. } => Opcode::Set,
            StatementKind::Add { .. } => Opcode::Add,
            StatementKind::Print { .. } => Opcode::Print,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Set { dest, value } => write!(f, "SET {} {}", dest, value),
            StatementKind::Add { dest, lhs, rhs } => write!(f, "ADD {} {} {}", dest, lhs, rhs),
            StatementKind::Print { expr } => write!(f, "PRINT {}", expr),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literals_prefer_integers_then_floats() {
        assert_eq!(Value::parse_literal("5"), Value::Int(5));
        assert_eq!(Value::parse_literal("-12"), Value::Int(-12));
        assert_eq!(Value::parse_literal("3.5"), Value::Float(3.5));
        assert_eq!(Value::parse_literal("hello"), Value::Str("hello".to_string()));
        assert_eq!(Value::parse_literal("\"a b\""), Value::Str("a b".to_string()));
        assert_eq!(Value::parse_literal("inf"), Value::Str("inf".to_string()));
    }

    #[test]
    fn floats_always_render_a_fraction() {
        assert_eq!(Value::Float(5.5).to_string(), "5.5");
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::Int(8).to_string(), "8");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("hi"));
        assert!(is_identifier("_tmp2"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("&x"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn statements_render_as_source() {
        let statement = Statement {
            line: 2,
            kind: StatementKind::Add {
                dest: "c".to_string(),
                lhs: Operand::Reference("a".to_string()),
                rhs: Operand::Literal(Value::Int(2)),
            },
        };
        assert_eq!(statement.to_string(), "ADD c &a 2");
        assert_eq!(statement.opcode(), Opcode::Add);
    }
}
