//! The four error kinds the language can raise, and the shared diagnostic renderer
//! used by the CLI and REPL to print them. Lexing and parsing errors carry only a
//! span; runtime errors additionally carry the [`Context`](crate::context::Context)
//! chain active when they were raised, so a traceback can be rendered.

use std::fmt;

use colored::Colorize as _;

use crate::context::Context;
use crate::position::SourceSpan;

/// An error produced while turning source text into tokens.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct LexError {
	/// Which lexing failure occurred.
	pub kind: LexErrorKind,
	/// A human-readable description, e.g. the illegal character or the expected one.
	pub detail: String,
	/// Where in the source the failure was detected.
	pub span: SourceSpan,
}

/// The two ways the lexer can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
	/// A character matched no token rule at all.
	IllegalCharacter,
	/// A two-character operator's first character was seen but the required second
	/// character was not (e.g. `!` not followed by `=`).
	ExpectedChar,
}

impl fmt::Display for LexErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::IllegalCharacter => "IllegalCharacter",
			Self::ExpectedChar => "ExpectedChar",
		};
		write!(f, "{name}")
	}
}

/// An error produced while turning a token stream into an AST.
#[derive(Debug, thiserror::Error)]
#[error("InvalidSyntax: {detail}")]
pub struct ParseError {
	/// A human-readable description of what was expected.
	pub detail: String,
	/// The offending token's span.
	pub span: SourceSpan,
}

/// An error raised during evaluation. Unlike the lexer/parser errors, this carries
/// the call-stack [`Context`] active at the point of failure, so the embedder can
/// render a traceback.
#[derive(Debug, thiserror::Error)]
#[error("RuntimeError: {detail}")]
pub struct RtError {
	/// The message that follows `RuntimeError: ` in the rendered diagnostic.
	pub detail: String,
	/// The span of the expression or statement that raised the error.
	pub span: SourceSpan,
	/// The call stack active when the error was raised, innermost frame last.
	pub context: Context,
}

impl RtError {
	/// Builds a runtime error at `span`, in the call stack rooted at `context`.
	#[must_use]
	pub fn new(detail: impl Into<String>, span: SourceSpan, context: Context) -> Self {
		Self { detail: detail.into(), span, context }
	}
}

/// Any of the four error kinds the language can raise, ready for rendering.
#[derive(Debug, thiserror::Error)]
pub enum Diagnostic {
	/// See [`LexError`].
	#[error(transparent)]
	Lex(#[from] LexError),
	/// See [`ParseError`].
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// See [`RtError`].
	#[error(transparent)]
	Runtime(#[from] RtError),
}

impl Diagnostic {
	/// Renders this diagnostic as: a traceback (runtime errors only), a header line
	/// naming the file and position, and a caret-annotated one-line excerpt of the
	/// offending span.
	#[must_use]
	pub fn render(&self) -> String {
		match self {
			Self::Lex(error) => render_span_error(&error.kind.to_string(), &error.detail, &error.span),
			Self::Parse(error) => render_span_error("InvalidSyntax", &error.detail, &error.span),
			Self::Runtime(error) => {
				let mut out = String::from("Traceback (most recent call last):\n");
				for (name, position) in error.context.frames(&error.span.start) {
					out.push_str(&format!("    File {}, line {}:{}, in {}\n", position.filename, position.line + 1, position.column + 1, name));
				}
				out.push_str(&render_span_error("RuntimeError", &error.detail, &error.span));
				out
			},
		}
	}
}

/// Shared by lex/parse rendering and the body of runtime rendering: a header line
/// plus a caret-annotated excerpt of `span`'s source line.
fn render_span_error(kind: &str, detail: &str, span: &SourceSpan) -> String {
	let filename = &span.start.filename;
	let line = span.start.line + 1;
	let column = span.start.column + 1;
	let header = format!("File{filename}, line {line}:{column}");
	let excerpt = span.source_line();
	let caret_count = (span.end.column.saturating_sub(span.start.column)).max(1);
	let caret_line = format!("{}{}", " ".repeat(span.start.column), "^".repeat(caret_count));
	format!("{kind}: {detail}\n{}\n{excerpt}\n{}\n", header.dimmed(), caret_line.red())
}
