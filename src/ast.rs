//! The abstract syntax tree. A closed variant over every expression/statement shape
//! the parser can produce; every node carries the [`SourceSpan`] of the source text
//! it was parsed from, so every evaluation error can point back at exact source.

use std::rc::Rc;

use crate::lexer::Token;
use crate::position::SourceSpan;

/// One `if`/`elif` branch: its condition, its body, and whether the body was parsed
/// in block form (in which case the branch evaluates to `Number.null` regardless of
/// the body's own value).
#[derive(Debug, Clone)]
pub struct IfCase {
	pub condition: Expr,
	pub body: Expr,
	pub should_return_null: bool,
}

/// The closed variant of every node the parser produces. Expressions and statements
/// share one type because the grammar treats most statements as expressions: a
/// statement is just `'return' expr | 'continue' | 'break' | expression`.
#[derive(Debug, Clone)]
pub enum ExprKind {
	NumberLit(Token),
	StringLit(Token),
	Ident(String),
	Assign { name: String, value: Box<Expr> },
	BinOp { lhs: Box<Expr>, op: Token, rhs: Box<Expr> },
	UnaryOp { op: Token, operand: Box<Expr> },
	If { cases: Vec<IfCase>, else_branch: Option<(Box<Expr>, bool)> },
	For { var_name: String, start: Box<Expr>, end: Box<Expr>, step: Option<Box<Expr>>, body: Box<Expr>, should_return_null: bool },
	While { condition: Box<Expr>, body: Box<Expr>, should_return_null: bool },
	FuncDef { name: Option<String>, parameters: Vec<String>, body: Box<Expr>, should_auto_return: bool },
	Call { callee: Box<Expr>, args: Vec<Expr> },
	ListLit(Vec<Expr>),
	Return(Option<Box<Expr>>),
	Continue,
	Break,
	/// A sequence of statements, produced both for the whole program and for every
	/// block-form body. Evaluates to the list of its statements' values.
	Block(Vec<Expr>),
}

/// A node in the AST: its shape plus the span of source text it came from.
#[derive(Debug, Clone)]
pub struct Expr {
	pub kind: Rc<ExprKind>,
	pub span: SourceSpan,
}

impl Expr {
	#[must_use]
	pub fn new(kind: ExprKind, span: SourceSpan) -> Self {
		Self { kind: Rc::new(kind), span }
	}
}
