//! Recursive-descent parser with explicit precedence climbing. Consumes the flat
//! token vector the lexer produces and builds a single `Expr::Block` covering the
//! whole program.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! program      := { NEWLINE } statement { NEWLINE+ statement } { NEWLINE } EOF
//! statement    := 'return' [ expression ] ; 'continue' ; 'break' ; expression
//! expression   := 'set' IDENT '=' expression
//!               ; comparison { ('and'|'or') comparison }
//! comparison   := 'not' comparison ; arith { ('=='|'!='|'<'|'<='|'>'|'>=') arith }
//! arith        := term { ('+'|'-') term }
//! term         := factor { ('*'|'/'|'?') factor }
//! factor       := ('+'|'-') factor ; power
//! power        := call { '^' factor }           // right-assoc
//! call         := atom [ '(' [ expression {',' expression} ] ')' ]
//! atom         := INT ; FLOAT ; STRING ; IDENT ; '(' expression ')'
//!               ; if_expr ; for_expr ; while_expr ; func_def ; list_expr
//! ```

use crate::ast::{Expr, ExprKind, IfCase};
use crate::error::ParseError;
use crate::lexer::{Literal, Token, TokenKind};

/// Parses a full token vector (as produced by [`crate::lexer::tokenize`]) into one
/// `Expr::Block` covering the program's top-level statement sequence.
///
/// # Errors
/// Returns a [`ParseError`] at the first token that doesn't match the grammar.
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ParseError> {
	let mut parser = Parser { tokens, pos: 0 };
	parser.skip_newlines();
	let program = parser.statement_sequence(|token| token.kind == TokenKind::Eof)?;
	parser.skip_newlines();
	parser.expect_kind(TokenKind::Eof)?;
	Ok(program)
}

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
}

impl Parser {
	fn peek(&self) -> &Token {
		&self.tokens[self.pos]
	}

	fn advance(&mut self) -> Token {
		let token = self.tokens[self.pos].clone();
		if self.pos + 1 < self.tokens.len() {
			self.pos += 1;
		}
		token
	}

	fn skip_newlines(&mut self) {
		while self.peek().kind == TokenKind::Newline {
			self.advance();
		}
	}

	fn expect_kind(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
		if self.peek().kind == kind {
			Ok(self.advance())
		} else {
			Err(self.unexpected(&format!("{kind:?}")))
		}
	}

	fn expect_keyword(&mut self, word: &str) -> Result<Token, ParseError> {
		if self.peek().is_keyword(word) {
			Ok(self.advance())
		} else {
			Err(self.unexpected(&format!("'{word}'")))
		}
	}

	fn at_keyword(&self, word: &str) -> bool {
		self.peek().is_keyword(word)
	}

	fn unexpected(&self, expected: &str) -> ParseError {
		let token = self.peek();
		let found = if token.kind == TokenKind::Eof { "end of input".to_owned() } else { format!("{:?}", token.kind) };
		ParseError { detail: format!("expected {expected} but found {found}"), span: token.span.clone() }
	}

	/// Attempts `parse_fn` speculatively: on failure, the cursor is rewound to
	/// exactly where it started, so the caller can try an alternative production.
	/// This is the grammar's "speculative parse with rewind" mechanism, used by
	/// [`Self::statement_sequence`] to probe for "one more statement" after a run of
	/// newlines without committing to consuming it on failure.
	fn try_parse<T>(&mut self, parse_fn: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Option<T> {
		let checkpoint = self.pos;
		match parse_fn(self) {
			Ok(value) => Some(value),
			Err(_) => {
				self.pos = checkpoint;
				None
			},
		}
	}

	/// Parses one statement, then while at least one `NEWLINE` follows,
	/// speculatively tries to parse another; a failed speculative attempt rewinds
	/// and stops the sequence rather than propagating its error. `is_end` decides
	/// when the sequence may legitimately stop early (e.g. at `end`/`elif`/`else`/EOF).
	fn statement_sequence(&mut self, is_end: impl Fn(&Token) -> bool) -> Result<Expr, ParseError> {
		let start_span = self.peek().span.clone();
		let mut statements = vec![self.statement()?];

		loop {
			if self.peek().kind != TokenKind::Newline {
				break;
			}
			let mut newline_count = 0;
			while self.peek().kind == TokenKind::Newline {
				self.advance();
				newline_count += 1;
			}
			if newline_count == 0 || is_end(self.peek()) {
				break;
			}
			match self.try_parse(Self::statement) {
				Some(statement) => statements.push(statement),
				None => break,
			}
		}

		let end_span = statements.last().map_or_else(|| start_span.clone(), |s| s.span.clone());
		Ok(Expr::new(ExprKind::Block(statements), start_span.to(&end_span)))
	}

	fn statement(&mut self) -> Result<Expr, ParseError> {
		if self.at_keyword("return") {
			let token = self.advance();
			let can_have_value = !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) && !self.at_end_keyword();
			let value = if can_have_value { Some(Box::new(self.expression()?)) } else { None };
			let end = value.as_ref().map_or_else(|| token.span.clone(), |v| v.span.clone());
			return Ok(Expr::new(ExprKind::Return(value), token.span.to(&end)));
		}
		if self.at_keyword("continue") {
			let token = self.advance();
			return Ok(Expr::new(ExprKind::Continue, token.span));
		}
		if self.at_keyword("break") {
			let token = self.advance();
			return Ok(Expr::new(ExprKind::Break, token.span));
		}
		self.expression()
	}

	/// True when the next token is a keyword that can legally end a statement with
	/// no trailing expression (used so `return` followed immediately by `end` etc.
	/// doesn't try to parse `end` as a value expression).
	fn at_end_keyword(&self) -> bool {
		["end", "elif", "else"].iter().any(|word| self.at_keyword(word))
	}

	fn expression(&mut self) -> Result<Expr, ParseError> {
		if self.at_keyword("set") {
			let set_token = self.advance();
			let name_token = self.expect_kind(TokenKind::Ident)?;
			let name = name_token.ident_text().to_owned();
			self.expect_kind(TokenKind::Equals)?;
			let value = self.expression()?;
			let span = set_token.span.to(&value.span);
			return Ok(Expr::new(ExprKind::Assign { name, value: Box::new(value) }, span));
		}

		let mut lhs = self.comparison()?;
		while self.at_keyword("and") || self.at_keyword("or") {
			let op = self.advance();
			let rhs = self.comparison()?;
			let span = lhs.span.to(&rhs.span);
			lhs = Expr::new(ExprKind::BinOp { lhs: Box::new(lhs), op, rhs: Box::new(rhs) }, span);
		}
		Ok(lhs)
	}

	fn comparison(&mut self) -> Result<Expr, ParseError> {
		if self.at_keyword("not") {
			let op = self.advance();
			let operand = self.comparison()?;
			let span = op.span.to(&operand.span);
			return Ok(Expr::new(ExprKind::UnaryOp { op, operand: Box::new(operand) }, span));
		}

		let mut lhs = self.arith()?;
		while matches!(self.peek().kind, TokenKind::DoubleEquals | TokenKind::NotEquals | TokenKind::Less | TokenKind::LessEquals | TokenKind::Greater | TokenKind::GreaterEquals) {
			let op = self.advance();
			let rhs = self.arith()?;
			let span = lhs.span.to(&rhs.span);
			lhs = Expr::new(ExprKind::BinOp { lhs: Box::new(lhs), op, rhs: Box::new(rhs) }, span);
		}
		Ok(lhs)
	}

	fn arith(&mut self) -> Result<Expr, ParseError> {
		let mut lhs = self.term()?;
		while matches!(self.peek().kind, TokenKind::Plus | TokenKind::Minus) {
			let op = self.advance();
			let rhs = self.term()?;
			let span = lhs.span.to(&rhs.span);
			lhs = Expr::new(ExprKind::BinOp { lhs: Box::new(lhs), op, rhs: Box::new(rhs) }, span);
		}
		Ok(lhs)
	}

	fn term(&mut self) -> Result<Expr, ParseError> {
		let mut lhs = self.factor()?;
		while matches!(self.peek().kind, TokenKind::Mul | TokenKind::Div | TokenKind::QuestionMark) {
			let op = self.advance();
			let rhs = self.factor()?;
			let span = lhs.span.to(&rhs.span);
			lhs = Expr::new(ExprKind::BinOp { lhs: Box::new(lhs), op, rhs: Box::new(rhs) }, span);
		}
		Ok(lhs)
	}

	fn factor(&mut self) -> Result<Expr, ParseError> {
		if matches!(self.peek().kind, TokenKind::Plus | TokenKind::Minus) {
			let op = self.advance();
			let operand = self.factor()?;
			let span = op.span.to(&operand.span);
			return Ok(Expr::new(ExprKind::UnaryOp { op, operand: Box::new(operand) }, span));
		}
		self.power()
	}

	/// `^` is right-associative: the left operand is parsed at `call` precedence,
	/// and on seeing `^` we recurse back into `factor`, which itself admits a unary
	/// sign or another `^`.
	fn power(&mut self) -> Result<Expr, ParseError> {
		let base = self.call()?;
		if self.peek().kind == TokenKind::Pow {
			let op = self.advance();
			let exponent = self.factor()?;
			let span = base.span.to(&exponent.span);
			return Ok(Expr::new(ExprKind::BinOp { lhs: Box::new(base), op, rhs: Box::new(exponent) }, span));
		}
		Ok(base)
	}

	fn call(&mut self) -> Result<Expr, ParseError> {
		let mut callee = self.atom()?;
		if self.peek().kind == TokenKind::LParen {
			self.advance();
			let mut args = Vec::new();
			if self.peek().kind != TokenKind::RParen {
				args.push(self.expression()?);
				while self.peek().kind == TokenKind::Comma {
					self.advance();
					args.push(self.expression()?);
				}
			}
			let close = self.expect_kind(TokenKind::RParen)?;
			let span = callee.span.to(&close.span);
			callee = Expr::new(ExprKind::Call { callee: Box::new(callee), args }, span);
		}
		Ok(callee)
	}

	fn atom(&mut self) -> Result<Expr, ParseError> {
		let token = self.peek().clone();
		match token.kind {
			TokenKind::Int | TokenKind::Float => {
				self.advance();
				Ok(Expr::new(ExprKind::NumberLit(token.clone()), token.span))
			},
			TokenKind::String => {
				self.advance();
				Ok(Expr::new(ExprKind::StringLit(token.clone()), token.span))
			},
			TokenKind::Ident => {
				self.advance();
				Ok(Expr::new(ExprKind::Ident(token.ident_text().to_owned()), token.span))
			},
			TokenKind::LParen => {
				self.advance();
				let inner = self.expression()?;
				let close = self.expect_kind(TokenKind::RParen)?;
				Ok(Expr::new(inner.kind.as_ref().clone(), token.span.to(&close.span)))
			},
			TokenKind::LBracket => self.list_expr(),
			TokenKind::Keyword => self.keyword_atom(&token),
			_ => Err(self.unexpected("an expression")),
		}
	}

	fn keyword_atom(&mut self, token: &Token) -> Result<Expr, ParseError> {
		if token.is_keyword("if") {
			return self.if_expr();
		}
		if token.is_keyword("for") {
			return self.for_expr();
		}
		if token.is_keyword("while") {
			return self.while_expr();
		}
		if token.is_keyword("func") {
			return self.func_def();
		}
		Err(self.unexpected("an expression"))
	}

	/// Parses the shared block-vs-inline body shape used by `if`/`elif`/`else`,
	/// `for`, and `while`: if the next token is a `NEWLINE`, this is a block form —
	/// consume the newline, parse a statement sequence, require a terminating
	/// `end`/`elif`/`else` (left to the caller to consume); otherwise it's an inline
	/// form — parse exactly one statement. Returns the body plus whether it was
	/// block-form (`should_return_null`).
	fn block_or_inline_body(&mut self) -> Result<(Expr, bool), ParseError> {
		if self.peek().kind == TokenKind::Newline {
			self.advance();
			let body = self.statement_sequence(|token| token.is_keyword("end") || token.is_keyword("elif") || token.is_keyword("else"))?;
			Ok((body, true))
		} else {
			let body = self.statement()?;
			Ok((body, false))
		}
	}

	fn if_expr(&mut self) -> Result<Expr, ParseError> {
		let if_token = self.expect_keyword("if")?;
		let mut cases = Vec::new();
		let condition = self.expression()?;
		self.expect_keyword("then")?;
		let (body, should_return_null) = self.block_or_inline_body()?;
		cases.push(IfCase { condition, body, should_return_null });

		while self.at_keyword("elif") {
			self.advance();
			let condition = self.expression()?;
			self.expect_keyword("then")?;
			let (body, should_return_null) = self.block_or_inline_body()?;
			cases.push(IfCase { condition, body, should_return_null });
		}

		let mut else_branch = None;
		let mut end_span = cases.last().map(|case| case.body.span.clone()).unwrap_or_else(|| if_token.span.clone());
		if self.at_keyword("else") {
			self.advance();
			let (body, should_return_null) = self.block_or_inline_body()?;
			end_span = body.span.clone();
			else_branch = Some((Box::new(body), should_return_null));
		}

		let any_block_form = cases.iter().any(|case| case.should_return_null) || else_branch.as_ref().is_some_and(|(_, b)| *b);
		if any_block_form {
			let end_token = self.expect_keyword("end")?;
			end_span = end_token.span.clone();
		}

		Ok(Expr::new(ExprKind::If { cases, else_branch }, if_token.span.to(&end_span)))
	}

	fn for_expr(&mut self) -> Result<Expr, ParseError> {
		let for_token = self.expect_keyword("for")?;
		let var_token = self.expect_kind(TokenKind::Ident)?;
		self.expect_kind(TokenKind::Equals)?;
		let start = self.expression()?;
		self.expect_keyword("to")?;
		let end = self.expression()?;
		let step = if self.at_keyword("step") {
			self.advance();
			Some(Box::new(self.expression()?))
		} else {
			None
		};
		self.expect_keyword("then")?;
		let (body, should_return_null) = self.block_or_inline_body()?;
		let mut span = for_token.span.to(&body.span);
		if should_return_null {
			let end_token = self.expect_keyword("end")?;
			span = for_token.span.to(&end_token.span);
		}
		Ok(Expr::new(ExprKind::For { var_name: var_token.ident_text().to_owned(), start: Box::new(start), end: Box::new(end), step, body: Box::new(body), should_return_null }, span))
	}

	fn while_expr(&mut self) -> Result<Expr, ParseError> {
		let while_token = self.expect_keyword("while")?;
		let condition = self.expression()?;
		self.expect_keyword("then")?;
		let (body, should_return_null) = self.block_or_inline_body()?;
		let mut span = while_token.span.to(&body.span);
		if should_return_null {
			let end_token = self.expect_keyword("end")?;
			span = while_token.span.to(&end_token.span);
		}
		Ok(Expr::new(ExprKind::While { condition: Box::new(condition), body: Box::new(body), should_return_null }, span))
	}

	fn func_def(&mut self) -> Result<Expr, ParseError> {
		let func_token = self.expect_keyword("func")?;
		let name = if self.peek().kind == TokenKind::Ident { Some(self.advance().ident_text().to_owned()) } else { None };
		self.expect_kind(TokenKind::LParen)?;
		let mut parameters = Vec::new();
		if self.peek().kind != TokenKind::RParen {
			parameters.push(self.expect_kind(TokenKind::Ident)?.ident_text().to_owned());
			while self.peek().kind == TokenKind::Comma {
				self.advance();
				parameters.push(self.expect_kind(TokenKind::Ident)?.ident_text().to_owned());
			}
		}
		self.expect_kind(TokenKind::RParen)?;

		if self.peek().kind == TokenKind::Arrow {
			self.advance();
			let body = self.expression()?;
			let span = func_token.span.to(&body.span);
			return Ok(Expr::new(ExprKind::FuncDef { name, parameters, body: Box::new(body), should_auto_return: true }, span));
		}

		self.expect_kind(TokenKind::Newline)?;
		let body = self.statement_sequence(|token| token.is_keyword("end"))?;
		let end_token = self.expect_keyword("end")?;
		let span = func_token.span.to(&end_token.span);
		Ok(Expr::new(ExprKind::FuncDef { name, parameters, body: Box::new(body), should_auto_return: false }, span))
	}

	fn list_expr(&mut self) -> Result<Expr, ParseError> {
		let open = self.expect_kind(TokenKind::LBracket)?;
		let mut elements = Vec::new();
		if self.peek().kind != TokenKind::RBracket {
			elements.push(self.expression()?);
			while self.peek().kind == TokenKind::Comma {
				self.advance();
				elements.push(self.expression()?);
			}
		}
		let close = self.expect_kind(TokenKind::RBracket)?;
		Ok(Expr::new(ExprKind::ListLit(elements), open.span.to(&close.span)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lexer::tokenize;

	fn parse_source(source: &str) -> Expr {
		let tokens = tokenize("test", source).unwrap();
		parse(tokens).unwrap()
	}

	#[test]
	fn parses_arithmetic_with_precedence() {
		let program = parse_source("1 + 2 * 3");
		let ExprKind::Block(statements) = program.kind.as_ref() else { panic!("expected block") };
		assert_eq!(statements.len(), 1);
		let ExprKind::BinOp { op, .. } = statements[0].kind.as_ref() else { panic!("expected binop") };
		assert_eq!(op.kind, TokenKind::Plus);
	}

	#[test]
	fn power_is_right_associative() {
		// 2 ^ 3 ^ 2 should parse as 2 ^ (3 ^ 2), i.e. the rhs of the outer BinOp is
		// itself a BinOp, not a plain number.
		let program = parse_source("2 ^ 3 ^ 2");
		let ExprKind::Block(statements) = program.kind.as_ref() else { panic!("expected block") };
		let ExprKind::BinOp { rhs, .. } = statements[0].kind.as_ref() else { panic!("expected binop") };
		assert!(matches!(rhs.kind.as_ref(), ExprKind::BinOp { .. }));
	}

	#[test]
	fn block_if_requires_end() {
		assert!(parse(tokenize("test", "if 1 then\nlog(1)\nend").unwrap()).is_ok());
		assert!(parse(tokenize("test", "if 1 then\nlog(1)\n").unwrap()).is_err());
	}

	#[test]
	fn inline_if_does_not_require_end() {
		assert!(parse(tokenize("test", "if 1 then 2 else 3").unwrap()).is_ok());
	}

	#[test]
	fn statement_sequence_speculative_rewind_stops_before_end() {
		// The trailing "end" after the newline must NOT be consumed as a failed
		// statement attempt; it should stop the sequence and be left for the caller.
		let program = parse_source("func f()\n  1\n  2\nend");
		let ExprKind::Block(statements) = program.kind.as_ref() else { panic!("expected block") };
		assert_eq!(statements.len(), 1);
	}

	#[test]
	fn anonymous_function_requires_parens() {
		assert!(parse(tokenize("test", "func(x) -> x").unwrap()).is_ok());
	}
}
