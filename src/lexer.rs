//! Hand-written lexer: turns source text into a flat token vector. Unlike the
//! pattern-table lexer this crate's interpreter ancestor favors, this one scans
//! character-by-character, because the grammar needs single-character lookahead for
//! multi-character operators (`->`, `==`, `!=`, `<=`, `>=`) and precise escape
//! handling inside string literals that a table of independent regexes can't give
//! clean span boundaries for.

use std::rc::Rc;

use crate::error::{LexError, LexErrorKind};
use crate::position::{Position, SourceSpan};

/// The reserved words of the language. Checked against every scanned identifier
/// before it's classified as `TokenKind::Ident`.
const KEYWORDS: &[&str] = &["set", "and", "or", "not", "if", "then", "elif", "else", "for", "to", "step", "while", "func", "end", "return", "continue", "break"];

/// A closed variant over every kind of token the lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	Int,
	Float,
	String,
	Ident,
	Keyword,
	Plus,
	Minus,
	Mul,
	Div,
	Pow,
	LParen,
	RParen,
	LBracket,
	RBracket,
	Equals,
	DoubleEquals,
	NotEquals,
	Less,
	LessEquals,
	Greater,
	GreaterEquals,
	Comma,
	Arrow,
	QuestionMark,
	Newline,
	Eof,
}

/// The payload a token carries beyond its kind and span: the literal text or
/// numeric value that matters to the parser/evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Int(i64),
	Float(f64),
	Text(String),
}

/// A single token: its kind, optional literal payload, and the span of source text
/// that produced it.
#[derive(Debug, Clone)]
pub struct Token {
	pub kind: TokenKind,
	pub literal: Option<Literal>,
	pub span: SourceSpan,
}

impl Token {
	/// True iff this token's kind matches `kind`, and (when `text` is given) its
	/// text payload matches too. Used by the parser to check for a specific keyword
	/// or operator without unpacking the literal itself.
	#[must_use]
	pub fn matches(&self, kind: TokenKind, text: Option<&str>) -> bool {
		self.kind == kind
			&& match (text, &self.literal) {
				(Some(expected), Some(Literal::Text(actual))) => expected == actual,
				(Some(_), _) => false,
				(None, _) => true,
			}
	}

	/// Convenience for matching a keyword token by its text, e.g. `token.is_keyword("if")`.
	#[must_use]
	pub fn is_keyword(&self, word: &str) -> bool {
		self.matches(TokenKind::Keyword, Some(word))
	}

	/// The identifier text of this token, expected to be called only on `Ident` tokens.
	#[must_use]
	pub fn ident_text(&self) -> &str {
		match &self.literal {
			Some(Literal::Text(text)) => text,
			_ => unreachable!("ident_text() called on a non-identifier token"),
		}
	}
}

fn is_letter(ch: char) -> bool {
	ch.is_ascii_alphabetic() || ch == '_'
}

fn is_letter_or_digit(ch: char) -> bool {
	is_letter(ch) || ch.is_ascii_digit()
}

/// Scans `code` into a flat token vector ending in a single `Eof` sentinel.
/// Whitespace (spaces and tabs) is skipped silently; newlines and semicolons both
/// produce a `Newline` token; `//` introduces a line comment.
///
/// # Errors
/// Returns a [`LexError`] at the first illegal character, unterminated string, or
/// malformed two-character operator.
pub fn tokenize(filename: &str, source: &str) -> Result<Vec<Token>, LexError> {
	let filename: Rc<str> = Rc::from(filename);
	let source_rc: Rc<str> = Rc::from(source);
	let chars: Vec<char> = source.chars().collect();
	let mut pos = Position::start(filename, source_rc);
	let mut index = 0usize;
	let mut tokens = Vec::new();

	let peek = |index: usize| chars.get(index).copied();
	let advance_pos = |pos: &mut Position, index: &mut usize| {
		pos.advance(chars.get(*index).copied());
		*index += 1;
	};

	while index < chars.len() {
		let ch = chars[index];

		if ch == ' ' || ch == '\t' {
			advance_pos(&mut pos, &mut index);
			continue;
		}

		if ch == '\n' || ch == ';' {
			let start = pos.clone();
			advance_pos(&mut pos, &mut index);
			tokens.push(Token { kind: TokenKind::Newline, literal: None, span: SourceSpan::new(start, pos.clone()) });
			continue;
		}

		if ch.is_ascii_digit() {
			let start = pos.clone();
			let mut text = String::new();
			let mut seen_dot = false;
			while let Some(c) = peek(index) {
				if c.is_ascii_digit() {
					text.push(c);
					advance_pos(&mut pos, &mut index);
				} else if c == '.' && !seen_dot {
					seen_dot = true;
					text.push(c);
					advance_pos(&mut pos, &mut index);
				} else {
					break;
				}
			}
			let span = SourceSpan::new(start, pos.clone());
			if seen_dot {
				let value: f64 = text.parse().map_err(|_| LexError { kind: LexErrorKind::IllegalCharacter, detail: format!("'{text}' is not a valid number"), span: span.clone() })?;
				tokens.push(Token { kind: TokenKind::Float, literal: Some(Literal::Float(value)), span });
			} else {
				let value: i64 = text.parse().map_err(|_| LexError { kind: LexErrorKind::IllegalCharacter, detail: format!("'{text}' is not a valid number"), span: span.clone() })?;
				tokens.push(Token { kind: TokenKind::Int, literal: Some(Literal::Int(value)), span });
			}
			continue;
		}

		if is_letter(ch) {
			let start = pos.clone();
			let mut text = String::new();
			while let Some(c) = peek(index) {
				if is_letter_or_digit(c) {
					text.push(c);
					advance_pos(&mut pos, &mut index);
				} else {
					break;
				}
			}
			let span = SourceSpan::new(start, pos.clone());
			if KEYWORDS.contains(&text.as_str()) {
				tokens.push(Token { kind: TokenKind::Keyword, literal: Some(Literal::Text(text)), span });
			} else {
				tokens.push(Token { kind: TokenKind::Ident, literal: Some(Literal::Text(text)), span });
			}
			continue;
		}

		if ch == '"' || ch == '\'' {
			let quote = ch;
			let start = pos.clone();
			advance_pos(&mut pos, &mut index);
			let mut text = String::new();
			loop {
				match peek(index) {
					None => return Err(LexError { kind: LexErrorKind::IllegalCharacter, detail: "unterminated string literal".to_owned(), span: SourceSpan::new(start, pos.clone()) }),
					Some(c) if c == quote => {
						advance_pos(&mut pos, &mut index);
						break;
					},
					Some('\\') => {
						advance_pos(&mut pos, &mut index);
						let escaped = peek(index);
						let resolved = match escaped {
							Some('n') => '\n',
							Some('t') => '\t',
							Some('\\') => '\\',
							Some('"') => '"',
							Some('\'') => '\'',
							other => {
								let span = SourceSpan::new(pos.clone(), pos.clone());
								return Err(LexError { kind: LexErrorKind::IllegalCharacter, detail: format!("invalid escape sequence '\\{}'", other.map_or(String::new(), String::from)), span });
							},
						};
						text.push(resolved);
						advance_pos(&mut pos, &mut index);
					},
					Some(c) => {
						text.push(c);
						advance_pos(&mut pos, &mut index);
					},
				}
			}
			let span = SourceSpan::new(start, pos.clone());
			tokens.push(Token { kind: TokenKind::String, literal: Some(Literal::Text(text)), span });
			continue;
		}

		let start = pos.clone();
		match ch {
			'+' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::Plus, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			'*' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::Mul, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			'^' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::Pow, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			'(' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::LParen, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			')' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::RParen, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			'[' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::LBracket, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			']' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::RBracket, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			'?' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::QuestionMark, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			',' => {
				advance_pos(&mut pos, &mut index);
				tokens.push(Token { kind: TokenKind::Comma, literal: None, span: SourceSpan::new(start, pos.clone()) });
			},
			'/' => {
				advance_pos(&mut pos, &mut index);
				if peek(index) == Some('/') {
					while let Some(c) = peek(index) {
						if c == '\n' || c == ';' {
							break;
						}
						advance_pos(&mut pos, &mut index);
					}
				} else {
					tokens.push(Token { kind: TokenKind::Div, literal: None, span: SourceSpan::new(start, pos.clone()) });
				}
			},
			'-' => {
				advance_pos(&mut pos, &mut index);
				if peek(index) == Some('>') {
					advance_pos(&mut pos, &mut index);
					tokens.push(Token { kind: TokenKind::Arrow, literal: None, span: SourceSpan::new(start, pos.clone()) });
				} else {
					tokens.push(Token { kind: TokenKind::Minus, literal: None, span: SourceSpan::new(start, pos.clone()) });
				}
			},
			'!' => {
				advance_pos(&mut pos, &mut index);
				if peek(index) == Some('=') {
					advance_pos(&mut pos, &mut index);
					tokens.push(Token { kind: TokenKind::NotEquals, literal: None, span: SourceSpan::new(start, pos.clone()) });
				} else {
					return Err(LexError { kind: LexErrorKind::ExpectedChar, detail: "'=' (after '!')".to_owned(), span: SourceSpan::new(start, pos.clone()) });
				}
			},
			'=' => {
				advance_pos(&mut pos, &mut index);
				if peek(index) == Some('=') {
					advance_pos(&mut pos, &mut index);
					tokens.push(Token { kind: TokenKind::DoubleEquals, literal: None, span: SourceSpan::new(start, pos.clone()) });
				} else {
					tokens.push(Token { kind: TokenKind::Equals, literal: None, span: SourceSpan::new(start, pos.clone()) });
				}
			},
			'<' => {
				advance_pos(&mut pos, &mut index);
				if peek(index) == Some('=') {
					advance_pos(&mut pos, &mut index);
					tokens.push(Token { kind: TokenKind::LessEquals, literal: None, span: SourceSpan::new(start, pos.clone()) });
				} else {
					tokens.push(Token { kind: TokenKind::Less, literal: None, span: SourceSpan::new(start, pos.clone()) });
				}
			},
			'>' => {
				advance_pos(&mut pos, &mut index);
				if peek(index) == Some('=') {
					advance_pos(&mut pos, &mut index);
					tokens.push(Token { kind: TokenKind::GreaterEquals, literal: None, span: SourceSpan::new(start, pos.clone()) });
				} else {
					tokens.push(Token { kind: TokenKind::Greater, literal: None, span: SourceSpan::new(start, pos.clone()) });
				}
			},
			other => {
				let mut end = pos.clone();
				end.advance(Some(other));
				return Err(LexError { kind: LexErrorKind::IllegalCharacter, detail: format!("illegal character '{other}'"), span: SourceSpan::new(start, end) });
			},
		}
	}

	tokens.push(Token { kind: TokenKind::Eof, literal: None, span: SourceSpan::point(pos) });
	Ok(tokens)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kinds(source: &str) -> Vec<TokenKind> {
		tokenize("test", source).unwrap().into_iter().map(|token| token.kind).collect()
	}

	#[test]
	fn number_with_two_dots_stops_at_second_dot() {
		let tokens = tokenize("test", "1.2.3").unwrap();
		assert_eq!(tokens[0].kind, TokenKind::Float);
		assert_eq!(tokens[0].literal, Some(Literal::Float(1.2)));
		assert_eq!(tokens[1].kind, TokenKind::Float);
		assert_eq!(tokens[1].literal, Some(Literal::Float(0.3)));
	}

	#[test]
	fn keywords_are_not_identifiers() {
		let tokens = tokenize("test", "if notset").unwrap();
		assert_eq!(tokens[0].kind, TokenKind::Keyword);
		// "notset" is a single identifier, not "not" + "set": longest-match scanning.
		assert_eq!(tokens[1].kind, TokenKind::Ident);
	}

	#[test]
	fn string_escapes() {
		let tokens = tokenize("test", r#""a\nb\tc\\d\"e""#).unwrap();
		assert_eq!(tokens[0].literal, Some(Literal::Text("a\nb\tc\\d\"e".to_owned())));
	}

	#[test]
	fn unterminated_string_is_an_error() {
		assert!(tokenize("test", "\"abc").is_err());
	}

	#[test]
	fn line_comment_is_dropped() {
		assert_eq!(kinds("1 // comment\n2"), vec![TokenKind::Int, TokenKind::Newline, TokenKind::Int, TokenKind::Eof]);
	}

	#[test]
	fn semicolon_and_newline_both_emit_newline() {
		assert_eq!(kinds("1;2\n3"), vec![TokenKind::Int, TokenKind::Newline, TokenKind::Int, TokenKind::Newline, TokenKind::Int, TokenKind::Eof]);
	}

	#[test]
	fn multi_char_operators() {
		assert_eq!(kinds("-> == != <= >="), vec![TokenKind::Arrow, TokenKind::DoubleEquals, TokenKind::NotEquals, TokenKind::LessEquals, TokenKind::GreaterEquals, TokenKind::Eof]);
	}

	#[test]
	fn lone_bang_is_expected_char_error() {
		let error = tokenize("test", "!").unwrap_err();
		assert_eq!(error.kind, LexErrorKind::ExpectedChar);
	}

	#[test]
	fn illegal_character_is_reported() {
		let error = tokenize("test", "@").unwrap_err();
		assert_eq!(error.kind, LexErrorKind::IllegalCharacter);
	}

	#[test]
	fn every_token_has_eof_sentinel() {
		let tokens = tokenize("test", "set x = 1").unwrap();
		assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
	}
}
