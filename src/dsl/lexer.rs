//! Lexer for the cell description language.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{FieldError, Result};

/// Token types in the cell description language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Keyword, axis letter or label
    Identifier,
    /// Numeric value, possibly with an engineering suffix
    Number,
    /// Directive (starts with '.')
    Directive,
    /// Equals sign in key=value pairs
    Equals,
    /// End of line
    Newline,
    /// End of input
    Eof,
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// Line-oriented tokenizer.
pub struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Next token; comments and blanks are skipped.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_blanks_and_comments();

        let line = self.line;
        let column = self.column;
        let token = |kind, text: String| Token {
            kind,
            text,
            line,
            column,
        };

        let Some(&(_, ch)) = self.chars.peek() else {
            return Ok(token(TokenKind::Eof, String::new()));
        };

        match ch {
            '\n' => {
                self.bump();
                Ok(token(TokenKind::Newline, "\n".to_string()))
            }
            '=' => {
                self.bump();
                Ok(token(TokenKind::Equals, "=".to_string()))
            }
            '.' if !self.second_is_numeric() => {
                self.bump();
                let name = self.read_word();
                if name.is_empty() {
                    return Err(FieldError::lexer(line, column, "directive name expected after '.'"));
                }
                Ok(token(TokenKind::Directive, format!(".{name}")))
            }
            c if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' => {
                let text = self.read_word();
                if parse_value(&text).is_none() {
                    return Err(FieldError::lexer(line, column, format!("malformed number '{text}'")));
                }
                Ok(token(TokenKind::Number, text))
            }
            c if c.is_alphabetic() || c == '_' => Ok(token(TokenKind::Identifier, self.read_word())),
            c => Err(FieldError::lexer(line, column, format!("unexpected character '{c}'"))),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Whether the character after the current one is a digit, as in `.5`.
    fn second_is_numeric(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.peek().is_some_and(|&(_, c)| c.is_ascii_digit())
    }

    fn skip_blanks_and_comments(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            match ch {
                ' ' | '\t' | '\r' | ',' => {
                    self.bump();
                }
                '#' | ';' => {
                    while self.chars.peek().is_some_and(|&(_, c)| c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read up to the next separator.
    fn read_word(&mut self) -> String {
        let mut text = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() || matches!(ch, '=' | ',' | '#' | ';') {
                break;
            }
            text.push(ch);
            self.bump();
        }
        text
    }
}

/// Parse a number with an optional suffix.
///
/// Length units `um`, `mm` and `cm` convert to cm. Single-letter engineering
/// suffixes (`p`, `n`, `u`, `µ`, `m`, `k`, `M`, `G`) are plain SI
/// multipliers, so `20u` is 2e-5 and `20um` is 2e-3 (cm).
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    for (unit, scale) in [("um", 1e-4), ("µm", 1e-4), ("mm", 1e-1), ("cm", 1.0)] {
        if let Some(digits) = text.strip_suffix(unit) {
            return digits.parse::<f64>().ok().map(|v| v * scale);
        }
    }
    let last = text.chars().last()?;
    let scale = match last {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => return text.parse::<f64>().ok(),
    };
    let digits = &text[..text.len() - last.len_utf8()];
    digits.parse::<f64>().ok().map(|v| v * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            out.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_parse_value() {
        assert_relative_eq!(parse_value("20u").unwrap(), 20e-6);
        assert_relative_eq!(parse_value("20um").unwrap(), 20e-4);
        assert_relative_eq!(parse_value("1.5mm").unwrap(), 0.15);
        assert_relative_eq!(parse_value("2cm").unwrap(), 2.0);
        assert!(parse_value("um").is_none());
        assert_relative_eq!(parse_value("1.5k").unwrap(), 1500.0);
        assert_relative_eq!(parse_value("-2.5m").unwrap(), -2.5e-3);
        assert_relative_eq!(parse_value(".25").unwrap(), 0.25);
        assert_relative_eq!(parse_value("1e-3").unwrap(), 1e-3);
        assert!(parse_value("abc").is_none());
        assert!(parse_value("").is_none());
    }

    #[test]
    fn test_lexer_element_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("wire 0 -.5 20u 1.5k anode tension=80 # comment\n"),
            vec![Identifier, Number, Number, Number, Number, Identifier, Identifier, Equals, Number, Newline, Eof]
        );
    }

    #[test]
    fn test_lexer_directive_and_positions() {
        let mut lexer = Lexer::new("; header\n.period y 0.4");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Newline);
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Directive);
        assert_eq!(tok.text, ".period");
        assert_eq!(tok.line, 2);
        assert_eq!(tok.column, 1);
    }

    #[test]
    fn test_lexer_rejects_bad_number() {
        let mut lexer = Lexer::new("wire 1x2");
        lexer.next_token().unwrap();
        assert!(matches!(
            lexer.next_token(),
            Err(FieldError::LexerError { line: 1, column: 6, .. })
        ));
    }
}
