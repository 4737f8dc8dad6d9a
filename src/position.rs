//! Source positions and spans. Every token and AST node carries a [`SourceSpan`] so
//! that diagnostics can always point back at the exact source text that produced them.

use std::rc::Rc;

/// A single point in a source file: a byte index plus the line/column a human would
/// use to describe it. Positions are value-like and cheap to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
	/// The byte index into `source` that this position refers to.
	pub index: usize,
	/// The 0-indexed line number.
	pub line: usize,
	/// The 0-indexed column number.
	pub column: usize,
	/// The name of the file this position is in, as given to the lexer.
	pub filename: Rc<str>,
	/// The full source text, shared with every other position in the same file so
	/// diagnostics can slice out an excerpt without re-reading the file.
	pub source: Rc<str>,
}

impl Position {
	/// Creates the initial position at the start of `source`.
	#[must_use]
	pub fn start(filename: Rc<str>, source: Rc<str>) -> Self {
		Self { index: 0, line: 0, column: 0, filename, source }
	}

	/// Advances this position past `ch`, bumping the line and resetting the column
	/// when `ch` is a newline.
	pub fn advance(&mut self, ch: Option<char>) {
		self.index += 1;
		self.column += 1;
		if ch == Some('\n') {
			self.line += 1;
			self.column = 0;
		}
	}
}

/// A contiguous region of source text, as a (start, end) pair of [`Position`]s. `end`
/// is exclusive, matching the convention that a span of one character has
/// `end.index == start.index + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
	/// The first position covered by this span.
	pub start: Position,
	/// The position just past the last character covered by this span.
	pub end: Position,
}

impl SourceSpan {
	/// Builds a span from a start and end position.
	#[must_use]
	pub fn new(start: Position, end: Position) -> Self {
		Self { start, end }
	}

	/// Builds a zero-width span at a single position (used for synthetic nodes that
	/// have no corresponding source text, such as an implicit `Number.null`).
	#[must_use]
	pub fn point(position: Position) -> Self {
		let end = position.clone();
		Self { start: position, end }
	}

	/// Returns a span covering from `self`'s start to `other`'s end. Used when a
	/// parsed node's span should cover several sub-nodes, e.g. a binary expression's
	/// span covers both its operands.
	#[must_use]
	pub fn to(&self, other: &Self) -> Self {
		Self { start: self.start.clone(), end: other.end.clone() }
	}

	/// Returns the single line of source text this span starts on, for use in
	/// caret-annotated error excerpts.
	#[must_use]
	pub fn source_line(&self) -> &str {
		self.start.source.lines().nth(self.start.line).unwrap_or("")
	}
}
