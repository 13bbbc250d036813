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
use crate::utilities::utilities::{
    is_identifier, Line, Opcode, Operand, Program, Statement, StatementKind, Token, TokenKind,
    Value, DEREFERENCE_SIGIL,
};
use tracing::debug;

/// Builds a [`Program`] from the statement lines. Only arity and name
/// well-formedness are checked here; types are the interpreter's business.
pub struct Parser {
    lines: Vec<Line>,
    position: usize,
}

impl Parser {
    pub fn new(lines: Vec<Line>) -> Self {
        Parser { lines, position: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, CosmoError> {
        let mut statements = Vec::new();
        while self.position < self.lines.len() {
            let line = &self.lines[self.position];
            if !line.tokens.is_empty() {
                statements.push(parse_statement(line)?);
            }
            self.position += 1;
        }
        debug!(statements = statements.len(), "parsed program");
        Ok(Program { statements })
    }
}

fn parse_statement(line: &Line) -> Result<Statement, CosmoError> {
    let head = &line.tokens[0];
    let opcode = match head.kind {
        TokenKind::Word => Opcode::from_word(&head.text),
        TokenKind::Quoted => None,
    }
    .ok_or_else(|| CosmoError::UnknownOpcode {
        line: line.number,
        opcode: head.text.clone(),
    })?;

    let operands = &line.tokens[1..];
    if operands.len() != opcode.arity() {
        return Err(CosmoError::Arity {
            line: line.number,
            opcode: opcode.to_string(),
            expected: opcode.arity(),
            got: operands.len(),
        });
    }

    let kind = match opcode {
        Opcode::Set => StatementKind::Set {
            dest: parse_destination(opcode, &operands[0])?,
            value: parse_operand(opcode, &operands[1])?,
        },
        Opcode::Add => StatementKind::Add {
            dest: parse_destination(opcode, &operands[0])?,
            lhs: parse_operand(opcode, &operands[1])?,
            rhs: parse_operand(opcode, &operands[2])?,
        },
        Opcode::Print => StatementKind::Print {
            expr: parse_operand(opcode, &operands[0])?,
        },
    };

    Ok(Statement {
        line: line.number,
        kind,
    })
}

fn parse_destination(opcode: Opcode, token: &Token) -> Result<String, CosmoError> {
    if token.kind == TokenKind::Word && is_identifier(&token.text) {
        Ok(token.text.clone())
    } else {
        Err(malformed_operand(opcode, token))
    }
}

fn parse_operand(opcode: Opcode, token: &Token) -> Result<Operand, CosmoError> {
    match token.kind {
        TokenKind::Quoted => Ok(Operand::Literal(Value::Str(token.text.clone()))),
        TokenKind::Word => match token.text.strip_prefix(DEREFERENCE_SIGIL) {
            Some(name) if is_identifier(name) => Ok(Operand::Reference(name.to_string())),
            Some(_) => Err(malformed_operand(opcode, token)),
            None => Ok(Operand::Literal(Value::parse_literal(&token.text))),
        },
    }
}

fn malformed_operand(opcode: Opcode, token: &Token) -> CosmoError {
    CosmoError::MalformedOperand {
        line: token.line,
        opcode: opcode.to_string(),
        operand: token.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse_source(text: &str) -> Result<Program, CosmoError> {
        let source = tokenize(text)?;
        Parser::new(source.lines).parse()
    }

    #[test]
    fn builds_statements_in_source_order() {
        let program = parse_source("[hello, there]\nSET hi 3\nADD hi 6 2\nPRINT &hi").unwrap();
        assert_eq!(
            program.statements,
            vec![
                Statement {
                    line: 2,
                    kind: StatementKind::Set {
                        dest: "hi".to_string(),
                        value: Operand::Literal(Value::Int(3)),
                    },
                },
                Statement {
                    line: 3,
                    kind: StatementKind::Add {
                        dest: "hi".to_string(),
                        lhs: Operand::Literal(Value::Int(6)),
                        rhs: Operand::Literal(Value::Int(2)),
                    },
                },
                Statement {
                    line: 4,
                    kind: StatementKind::Print {
                        expr: Operand::Reference("hi".to_string()),
                    },
                },
            ]
        );
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = "[a=1]\nSET b &a\nADD c &a 2.5\nPRINT \"done here\"";
        assert_eq!(parse_source(text).unwrap(), parse_source(text).unwrap());
    }

    #[test]
    fn arity_mismatch_names_expected_and_actual() {
        let error = parse_source("[]\nADD x 1").unwrap_err();
        assert_eq!(
            error,
            CosmoError::Arity {
                line: 2,
                opcode: "ADD".to_string(),
                expected: 3,
                got: 2,
            }
        );
    }

    #[test]
    fn opcodes_are_case_sensitive() {
        let error = parse_source("[]\nSET a 1\nprint &a").unwrap_err();
        assert_eq!(
            error,
            CosmoError::UnknownOpcode {
                line: 3,
                opcode: "print".to_string(),
            }
        );
    }

    #[test]
    fn destinations_must_be_bare_identifiers() {
        let error = parse_source("[]\nSET &a 1").unwrap_err();
        assert_eq!(
            error,
            CosmoError::MalformedOperand {
                line: 2,
                opcode: "SET".to_string(),
                operand: "&a".to_string(),
            }
        );
    }

    #[test]
    fn references_must_name_an_identifier() {
        for bad in ["&", "&1x", "&a-b"] {
            let error = parse_source(&format!("[]\nPRINT {}", bad)).unwrap_err();
            assert!(matches!(error, CosmoError::MalformedOperand { line: 2, .. }));
        }
    }

    #[test]
    fn type_errors_are_left_for_the_interpreter() {
        let program = parse_source("[]\nADD x hello 1").unwrap();
        assert_eq!(program.len(), 1);
    }
}
