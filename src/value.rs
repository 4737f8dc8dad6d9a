//! The value model: a closed tagged variant with per-operation dispatch for every
//! binary/unary operator the grammar exposes. There is no boolean type — truthiness
//! is value-dependent, and the shared sentinels `null`/`true`/`false` are all just
//! particular numbers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Expr;
use crate::context::Context;
use crate::lexer::TokenKind;
use crate::position::SourceSpan;

/// A user-defined function's fixed shape: its (optional) name, parameter list,
/// body, auto-return flag, and the [`Context`] it closes over.
#[derive(Clone)]
pub struct UserFunc {
	pub name: Option<String>,
	pub parameters: Vec<String>,
	pub body: Expr,
	pub should_auto_return: bool,
	pub defining_context: Context,
}

/// The closed value variant: `Number`, `String`, `List`, `UserFunc`, `BuiltinFunc`.
///
/// Lists are `Rc<RefCell<..>>` so two bindings can alias the same backing vector and
/// observe each other's in-place mutation through `append`/`pop`/`extend`; `set`
/// clones the vector (not the `Rc`) at assignment time (see [`Value::snapshot`]).
#[derive(Clone)]
pub enum Value {
	Number(f64),
	String(String),
	List(Rc<RefCell<Vec<Value>>>),
	UserFunc(Rc<UserFunc>),
	BuiltinFunc(String),
}

impl Value {
	/// Shorthand for building a number value; used pervasively by the evaluator and
	/// by builtins that hand back a computed number.
	#[must_use]
	pub fn number(value: f64) -> Self {
		Self::Number(value)
	}

	/// The shared `null`/`false` sentinel: `Number(0)`.
	#[must_use]
	pub fn null() -> Self {
		Self::Number(0.0)
	}

	/// The shared `true` sentinel: `Number(1)`.
	#[must_use]
	pub fn truth() -> Self {
		Self::Number(1.0)
	}

	/// Wraps an integer boolean result (`1` truthy, `0` falsy) the way comparison and
	/// logical operators do.
	#[must_use]
	pub fn from_bool(value: bool) -> Self {
		if value {
			Self::truth()
		} else {
			Self::null()
		}
	}

	/// Builds a new, independently-mutable list value from `elements`.
	#[must_use]
	pub fn list(elements: Vec<Self>) -> Self {
		Self::List(Rc::new(RefCell::new(elements)))
	}

	/// Value-dependent truthiness: numbers are truthy iff nonzero, strings iff
	/// nonempty, lists and functions are always truthy.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Number(n) => *n != 0.0,
			Self::String(s) => !s.is_empty(),
			Self::List(_) | Self::UserFunc(_) | Self::BuiltinFunc(_) => true,
		}
	}

	/// The name used in diagnostics and tracebacks: the function's name for
	/// functions, or a generic description otherwise.
	#[must_use]
	pub fn display_name(&self) -> String {
		match self {
			Self::UserFunc(func) => func.name.clone().unwrap_or_else(|| "<anonymous>".to_owned()),
			Self::BuiltinFunc(name) => name.clone(),
			other => other.type_name().to_owned(),
		}
	}

	/// The type name used in "illegal operation" error messages.
	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Number(_) => "Number",
			Self::String(_) => "String",
			Self::List(_) => "List",
			Self::UserFunc(_) | Self::BuiltinFunc(_) => "Function",
		}
	}

	/// At assignment time, a list-typed value is snapshotted: the element vector is
	/// cloned into a fresh, independent backing store, so future mutation of the
	/// binding doesn't alias the expression it was assigned from. Every other value
	/// kind is returned unchanged, since only lists carry reference identity.
	#[must_use]
	pub fn snapshot(self) -> Self {
		match self {
			Self::List(list) => Self::list(list.borrow().clone()),
			other => other,
		}
	}

	#[must_use]
	pub fn as_list(&self) -> Option<&Rc<RefCell<Vec<Self>>>> {
		match self {
			Self::List(list) => Some(list),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Self::Number(n) => Some(*n),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s.as_str()),
			_ => None,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number(n) => {
				if n.fract() == 0.0 && n.abs() < 1e15 {
					write!(f, "{}", *n as i64)
				} else {
					write!(f, "{n}")
				}
			},
			Self::String(s) => write!(f, "{s}"),
			Self::List(list) => {
				write!(f, "[")?;
				for (index, element) in list.borrow().iter().enumerate() {
					if index > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{element}")?;
				}
				write!(f, "]")
			},
			Self::UserFunc(func) => write!(f, "<function {}>", func.name.as_deref().unwrap_or("<anonymous>")),
			Self::BuiltinFunc(name) => write!(f, "<built-in function {name}>"),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{self}")
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::String(a), Self::String(b)) => a == b,
			(Self::List(a), Self::List(b)) => *a.borrow() == *b.borrow(),
			(Self::UserFunc(a), Self::UserFunc(b)) => Rc::ptr_eq(a, b),
			(Self::BuiltinFunc(a), Self::BuiltinFunc(b)) => a == b,
			_ => false,
		}
	}
}

/// The result of a binary/unary operator dispatch: either a value, or the detail
/// string for an `Illegal operation` / `Division by zero` runtime error. The
/// evaluator is responsible for attaching span and call-stack context.
pub type OpResult = Result<Value, String>;

fn illegal(op: &str, lhs: &Value, rhs: Option<&Value>) -> String {
	match rhs {
		Some(rhs) => format!("Illegal operation: {} {op} {}", lhs.type_name(), rhs.type_name()),
		None => format!("Illegal operation: {op}{}", lhs.type_name()),
	}
}

/// Dispatches a binary operator token against two already-evaluated operands. This
/// is an exhaustive match over (operator, lhs-kind, rhs-kind); any combination not
/// covered here falls through to an `Illegal operation` error.
pub fn binary_op(op: TokenKind, lhs: &Value, rhs: &Value) -> OpResult {
	use TokenKind::{Div, DoubleEquals, Greater, GreaterEquals, Less, LessEquals, Minus, Mul, NotEquals, Plus, Pow, QuestionMark};

	match (op, lhs, rhs) {
		(Plus, Value::Number(a), Value::Number(b)) => Ok(Value::number(a + b)),
		(Minus, Value::Number(a), Value::Number(b)) => Ok(Value::number(a - b)),
		(Mul, Value::Number(a), Value::Number(b)) => Ok(Value::number(a * b)),
		(Div, Value::Number(a), Value::Number(b)) => {
			if *b == 0.0 {
				Err("Division by zero".to_owned())
			} else {
				Ok(Value::number(a / b))
			}
		},
		(Pow, Value::Number(a), Value::Number(b)) => Ok(Value::number(a.powf(*b))),
		(DoubleEquals, Value::Number(a), Value::Number(b)) => Ok(Value::from_bool(a == b)),
		(NotEquals, Value::Number(a), Value::Number(b)) => Ok(Value::from_bool(a != b)),
		(Less, Value::Number(a), Value::Number(b)) => Ok(Value::from_bool(a < b)),
		(LessEquals, Value::Number(a), Value::Number(b)) => Ok(Value::from_bool(a <= b)),
		(Greater, Value::Number(a), Value::Number(b)) => Ok(Value::from_bool(a > b)),
		(GreaterEquals, Value::Number(a), Value::Number(b)) => Ok(Value::from_bool(a >= b)),

		(Plus, Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
		(Minus, Value::String(a), Value::String(b)) => Ok(Value::String(a.replace(b.as_str(), ""))),
		(Mul, Value::String(a), Value::Number(b)) => Ok(Value::String(a.repeat((*b).max(0.0) as usize))),
		(DoubleEquals, Value::String(a), Value::String(b)) => Ok(Value::from_bool(a == b)),
		(NotEquals, Value::String(a), Value::String(b)) => Ok(Value::from_bool(a != b)),

		(Plus, Value::List(list), value) => {
			let mut cloned = list.borrow().clone();
			cloned.push(value.clone());
			Ok(Value::list(cloned))
		},
		(Mul, Value::List(a), Value::List(b)) => {
			let mut cloned = a.borrow().clone();
			cloned.extend(b.borrow().iter().cloned());
			Ok(Value::list(cloned))
		},
		(Minus, Value::List(list), Value::Number(index)) => {
			let borrowed = list.borrow();
			let index = resolve_index(borrowed.len(), *index as i64)?;
			let mut cloned = borrowed.clone();
			cloned.remove(index);
			Ok(Value::list(cloned))
		},
		(QuestionMark, Value::List(list), Value::Number(index)) => {
			let borrowed = list.borrow();
			let index = resolve_index(borrowed.len(), *index as i64)?;
			Ok(borrowed[index].clone())
		},

		_ => Err(illegal(op_symbol(op), lhs, Some(rhs))),
	}
}

/// Resolves a (possibly negative, Python-style) list index against `len`, counting
/// from the end when negative. Out-of-range in either direction is an error.
fn resolve_index(len: usize, index: i64) -> Result<usize, String> {
	let resolved = if index < 0 { index + len as i64 } else { index };
	if resolved < 0 || resolved as usize >= len {
		Err("Index out of bounds".to_owned())
	} else {
		Ok(resolved as usize)
	}
}

/// `and`: `Number(1)` iff both operands are truthy, defined only for Number-Number
/// and String-String pairs; any other combination (including a list on either side)
/// is illegal, matching `binary_op`'s per-kind dispatch above.
pub fn and_op(lhs: &Value, rhs: &Value) -> OpResult {
	match (lhs, rhs) {
		(Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => Ok(Value::from_bool(lhs.is_truthy() && rhs.is_truthy())),
		_ => Err(illegal("and", lhs, Some(rhs))),
	}
}

/// `or`: `Number(1)` iff either operand is truthy, under the same Number-Number /
/// String-String restriction as [`and_op`].
pub fn or_op(lhs: &Value, rhs: &Value) -> OpResult {
	match (lhs, rhs) {
		(Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => Ok(Value::from_bool(lhs.is_truthy() || rhs.is_truthy())),
		_ => Err(illegal("or", lhs, Some(rhs))),
	}
}

/// Unary `-`/`not`. `not` is only defined for `Number`; any other operand kind is a
/// proper runtime error rather than a silent coercion.
pub fn unary_op(op: TokenKind, operand: &Value) -> OpResult {
	match (op, operand) {
		(TokenKind::Minus, Value::Number(n)) => Ok(Value::number(-n)),
		(TokenKind::Plus, Value::Number(n)) => Ok(Value::number(*n)),
		(TokenKind::Keyword, Value::Number(_)) => Ok(Value::from_bool(!operand.is_truthy())),
		(TokenKind::Keyword, _) => Err(illegal("not", operand, None)),
		_ => Err(illegal(op_symbol(op), operand, None)),
	}
}

fn op_symbol(op: TokenKind) -> &'static str {
	match op {
		TokenKind::Plus => "+",
		TokenKind::Minus => "-",
		TokenKind::Mul => "*",
		TokenKind::Div => "/",
		TokenKind::Pow => "^",
		TokenKind::DoubleEquals => "==",
		TokenKind::NotEquals => "!=",
		TokenKind::Less => "<",
		TokenKind::LessEquals => "<=",
		TokenKind::Greater => ">",
		TokenKind::GreaterEquals => ">=",
		TokenKind::QuestionMark => "?",
		_ => "?",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truthiness_is_value_dependent() {
		assert!(!Value::String(String::new()).is_truthy());
		assert!(Value::String("x".to_owned()).is_truthy());
		assert!(!Value::number(0.0).is_truthy());
		assert!(Value::number(1.0).is_truthy());
	}

	#[test]
	fn division_by_zero_is_an_error() {
		assert_eq!(binary_op(TokenKind::Div, &Value::number(1.0), &Value::number(0.0)), Err("Division by zero".to_owned()));
	}

	#[test]
	fn string_minus_removes_all_occurrences() {
		let result = binary_op(TokenKind::Minus, &Value::String("abcabc".to_owned()), &Value::String("b".to_owned())).unwrap();
		assert_eq!(result, Value::String("acac".to_owned()));
	}

	#[test]
	fn list_index_out_of_bounds_is_an_error() {
		let list = Value::list(vec![Value::number(1.0)]);
		assert!(binary_op(TokenKind::QuestionMark, &list, &Value::number(5.0)).is_err());
	}

	#[test]
	fn negative_list_index_counts_from_the_end() {
		let list = Value::list(vec![Value::number(1.0), Value::number(2.0), Value::number(3.0)]);
		assert_eq!(binary_op(TokenKind::QuestionMark, &list, &Value::number(-1.0)).unwrap(), Value::number(3.0));
		assert!(binary_op(TokenKind::QuestionMark, &list, &Value::number(-4.0)).is_err());
	}

	#[test]
	fn and_or_require_matching_number_or_string_operands() {
		assert_eq!(and_op(&Value::number(1.0), &Value::number(0.0)).unwrap(), Value::null());
		assert_eq!(or_op(&Value::String(String::new()), &Value::String("x".to_owned())).unwrap(), Value::truth());
		assert!(and_op(&Value::number(1.0), &Value::String("x".to_owned())).is_err());
		assert!(or_op(&Value::number(0.0), &Value::String(String::new())).is_err());
		assert!(and_op(&Value::list(vec![Value::number(1.0)]), &Value::list(vec![Value::number(2.0)])).is_err());
	}

	#[test]
	fn snapshot_clones_list_but_not_other_kinds() {
		let list = Value::list(vec![Value::number(1.0)]);
		let snapshot = list.clone().snapshot();
		if let (Value::List(original), Value::List(cloned)) = (&list, &snapshot) {
			assert!(!Rc::ptr_eq(original, cloned));
		} else {
			panic!("expected list values");
		}
	}

	#[test]
	fn cross_type_arithmetic_is_illegal() {
		assert!(binary_op(TokenKind::Plus, &Value::number(1.0), &Value::String("x".to_owned())).is_err());
	}
}
