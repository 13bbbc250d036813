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
use crate::utilities::utilities::{Line, SourceText, Token};
use tracing::trace;

/// Splits program text into lines and whitespace-delimited tokens.
///
/// Empty and whitespace-only lines are dropped, but every kept line remembers
/// its original 1-based number. The first kept line is the environment
/// declaration and is carried verbatim, untokenized.
pub struct Lexer {
    source: String,
    input: Vec<char>,
    position: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        Lexer {
            source,
            input: Vec::new(),
            position: 0,
            line: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<SourceText, CosmoError> {
        let source = std::mem::take(&mut self.source);
        let mut declaration = None;
        let mut lines = Vec::new();

        for (index, raw) in source.split('\n').enumerate() {
            let text = raw.strip_suffix('\r').unwrap_or(raw);
            if text.trim().is_empty() {
                continue;
            }
            let number = index + 1;
            if declaration.is_none() {
                declaration = Some(Line {
                    number,
                    text: text.to_string(),
                    tokens: Vec::new(),
                });
                continue;
            }
            let tokens = self.tokenize_line(text, number)?;
            trace!(line = number, tokens = tokens.len(), "tokenized line");
            lines.push(Line {
                number,
                text: text.to_string(),
                tokens,
            });
        }

        let declaration = declaration.ok_or(CosmoError::EmptyProgram)?;
        Ok(SourceText { declaration, lines })
    }

    fn tokenize_line(&mut self, text: &str, number: usize) -> Result<Vec<Token>, CosmoError> {
        self.input = text.chars().collect();
        self.position = 0;
        self.line = number;

        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, CosmoError> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(None);
        }

        match self.input[self.position] {
            '"' => self.read_string().map(Some),
            _ => Ok(Some(self.read_word())),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.input[self.position].is_whitespace() {
            self.position += 1;
        }
    }

    fn read_word(&mut self) -> Token {
        let start = self.position;
        while self.position < self.input.len() && !self.input[self.position].is_whitespace() {
            self.position += 1;
        }
        Token::word(
            self.input[start..self.position].iter().collect::<String>(),
            self.line,
        )
    }

    fn read_string(&mut self) -> Result<Token, CosmoError> {
        self.position += 1; // opening quote
        let start = self.position;
        while self.position < self.input.len() && self.input[self.position] != '"' {
            self.position += 1;
        }
        if self.position >= self.input.len() {
            return Err(CosmoError::UnterminatedString { line: self.line });
        }
        let text: String = self.input[start..self.position].iter().collect();
        self.position += 1; // closing quote
        Ok(Token::quoted(text, self.line))
    }
}

/// Convenience wrapper over [`Lexer::tokenize`].
pub fn tokenize(source: &str) -> Result<SourceText, CosmoError> {
    Lexer::new(source.to_string()).tokenize()
}
