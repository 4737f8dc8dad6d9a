//! The built-in function registry. Every name the language exposes without a user
//! definition — `log`, `len`, `append`, and so on — is looked up here by name, the
//! same `phf::Map` compile-time perfect-hash pattern this crate's interpreter
//! ancestor uses for its own reserved-word tables.

use std::io::Write as _;

use rand::Rng as _;

use crate::ast::Expr;
use crate::context::Context;
use crate::environment::Environment;
use crate::error::RtError;
use crate::evaluator::EvalOutcome;
use crate::value::Value;

type Handler = fn(&[Value], &Expr, &Context) -> Result<Value, RtError>;

/// One registry entry: how many arguments the builtin takes, and the function that
/// implements it.
pub struct BuiltinSpec {
	pub arity: usize,
	pub handler: Handler,
}

static BUILTINS: phf::Map<&'static str, BuiltinSpec> = phf::phf_map! {
	"log" => BuiltinSpec { arity: 1, handler: builtin_log },
	"str_input" => BuiltinSpec { arity: 1, handler: builtin_str_input },
	"num_input" => BuiltinSpec { arity: 1, handler: builtin_num_input },
	"clear" => BuiltinSpec { arity: 0, handler: builtin_clear },
	"is_number" => BuiltinSpec { arity: 1, handler: builtin_is_number },
	"is_string" => BuiltinSpec { arity: 1, handler: builtin_is_string },
	"is_list" => BuiltinSpec { arity: 1, handler: builtin_is_list },
	"is_function" => BuiltinSpec { arity: 1, handler: builtin_is_function },
	"append" => BuiltinSpec { arity: 2, handler: builtin_append },
	"pop" => BuiltinSpec { arity: 2, handler: builtin_pop },
	"len" => BuiltinSpec { arity: 1, handler: builtin_len },
	"extend" => BuiltinSpec { arity: 2, handler: builtin_extend },
	"random_int" => BuiltinSpec { arity: 2, handler: builtin_random_int },
	"str" => BuiltinSpec { arity: 1, handler: builtin_str },
	"int" => BuiltinSpec { arity: 1, handler: builtin_int },
	"float" => BuiltinSpec { arity: 1, handler: builtin_float },
	"is_digit" => BuiltinSpec { arity: 1, handler: builtin_is_digit },
};

/// Binds every registered builtin name to a `Value::BuiltinFunc` in `env`, so
/// ordinary identifier lookup and call syntax find them exactly like user functions.
/// Called once against the root environment when a new program starts.
pub fn install(env: &Environment) {
	for name in BUILTINS.keys() {
		env.set(*name, Value::BuiltinFunc((*name).to_owned()));
	}
}

/// Dispatches a call to the builtin named `name`.
///
/// # Errors
/// Returns an [`RtError`] if `name` isn't registered, the argument count doesn't
/// match the builtin's arity, or the builtin's own argument-type checks fail.
pub fn call(name: &str, args: Vec<Value>, call_expr: &Expr, context: &Context) -> Result<EvalOutcome, RtError> {
	let Some(spec) = BUILTINS.get(name) else {
		return Err(RtError::new(format!("'{name}' is not a registered built-in"), call_expr.span.clone(), context.clone()));
	};
	if spec.arity != args.len() {
		return Err(RtError::new(format!("{name} takes {} argument(s) but {} were given", spec.arity, args.len()), call_expr.span.clone(), context.clone()));
	}
	(spec.handler)(&args, call_expr, context).map(EvalOutcome::Value)
}

fn type_error(name: &str, expected: &str, found: &Value, call_expr: &Expr, context: &Context) -> RtError {
	RtError::new(format!("{name} expects {expected}, found {}", found.type_name()), call_expr.span.clone(), context.clone())
}

fn builtin_log(args: &[Value], _call_expr: &Expr, _context: &Context) -> Result<Value, RtError> {
	println!("{}", args[0]);
	Ok(Value::null())
}

fn read_line() -> String {
	let mut line = String::new();
	std::io::stdout().flush().ok();
	std::io::stdin().read_line(&mut line).ok();
	line.trim_end_matches(['\n', '\r']).to_owned()
}

fn print_prompt(prompt: &Value) {
	print!("{prompt}");
	std::io::stdout().flush().ok();
}

fn builtin_str_input(args: &[Value], _call_expr: &Expr, _context: &Context) -> Result<Value, RtError> {
	print_prompt(&args[0]);
	Ok(Value::String(read_line()))
}

fn builtin_num_input(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	print_prompt(&args[0]);
	let line = read_line();
	line.trim().parse::<i64>().map(|n| Value::number(n as f64)).map_err(|_| RtError::new("Expected number input", call_expr.span.clone(), context.clone()))
}

fn builtin_clear(_args: &[Value], _call_expr: &Expr, _context: &Context) -> Result<Value, RtError> {
	print!("\x1B[2J\x1B[1;1H");
	std::io::stdout().flush().ok();
	Ok(Value::null())
}

fn builtin_is_number(args: &[Value], _call_expr: &Expr, _context: &Context) -> Result<Value, RtError> {
	Ok(Value::from_bool(matches!(args[0], Value::Number(_))))
}

fn builtin_is_string(args: &[Value], _call_expr: &Expr, _context: &Context) -> Result<Value, RtError> {
	Ok(Value::from_bool(matches!(args[0], Value::String(_))))
}

fn builtin_is_list(args: &[Value], _call_expr: &Expr, _context: &Context) -> Result<Value, RtError> {
	Ok(Value::from_bool(matches!(args[0], Value::List(_))))
}

fn builtin_is_function(args: &[Value], _call_expr: &Expr, _context: &Context) -> Result<Value, RtError> {
	Ok(Value::from_bool(matches!(args[0], Value::UserFunc(_) | Value::BuiltinFunc(_))))
}

fn builtin_append(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	let list = args[0].as_list().ok_or_else(|| type_error("append", "a List as its first argument", &args[0], call_expr, context))?;
	list.borrow_mut().push(args[1].clone());
	Ok(args[0].clone())
}

fn builtin_pop(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	let list = args[0].as_list().ok_or_else(|| type_error("pop", "a List as its first argument", &args[0], call_expr, context))?;
	let index = args[1].as_number().ok_or_else(|| type_error("pop", "a Number as its second argument", &args[1], call_expr, context))?;
	let mut borrowed = list.borrow_mut();
	let index = index as i64;
	let resolved = if index < 0 { index + borrowed.len() as i64 } else { index };
	if resolved < 0 || resolved as usize >= borrowed.len() {
		return Err(RtError::new("Index out of bounds", call_expr.span.clone(), context.clone()));
	}
	Ok(borrowed.remove(resolved as usize))
}

fn builtin_len(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	match &args[0] {
		Value::List(list) => Ok(Value::number(list.borrow().len() as f64)),
		Value::String(s) => Ok(Value::number(s.chars().count() as f64)),
		other => Err(type_error("len", "a List or String", other, call_expr, context)),
	}
}

fn builtin_extend(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	let target = args[0].as_list().ok_or_else(|| type_error("extend", "a List as its first argument", &args[0], call_expr, context))?;
	let source = args[1].as_list().ok_or_else(|| type_error("extend", "a List as its second argument", &args[1], call_expr, context))?;
	if std::rc::Rc::ptr_eq(target, source) {
		let snapshot = source.borrow().clone();
		target.borrow_mut().extend(snapshot);
	} else {
		target.borrow_mut().extend(source.borrow().iter().cloned());
	}
	Ok(args[0].clone())
}

fn builtin_random_int(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	let min = args[0].as_number().ok_or_else(|| type_error("random_int", "a Number as its first argument", &args[0], call_expr, context))?;
	let max = args[1].as_number().ok_or_else(|| type_error("random_int", "a Number as its second argument", &args[1], call_expr, context))?;
	let (min, max) = (min as i64, max as i64);
	if min > max {
		return Err(RtError::new("random_int's first argument must not exceed its second", call_expr.span.clone(), context.clone()));
	}
	let value = rand::thread_rng().gen_range(min..=max);
	Ok(Value::number(value as f64))
}

fn builtin_str(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	match &args[0] {
		Value::Number(_) => Ok(Value::String(args[0].to_string())),
		other => Err(type_error("str", "a Number", other, call_expr, context)),
	}
}

fn builtin_int(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	match &args[0] {
		Value::String(s) => s.trim().parse::<i64>().map(|n| Value::number(n as f64)).map_err(|_| RtError::new(format!("'{s}' is not an integer"), call_expr.span.clone(), context.clone())),
		other => Err(type_error("int", "a String", other, call_expr, context)),
	}
}

fn builtin_float(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	match &args[0] {
		Value::String(s) => s.trim().parse::<f64>().map(Value::number).map_err(|_| RtError::new(format!("'{s}' is not a number"), call_expr.span.clone(), context.clone())),
		other => Err(type_error("float", "a String", other, call_expr, context)),
	}
}

fn builtin_is_digit(args: &[Value], call_expr: &Expr, context: &Context) -> Result<Value, RtError> {
	let s = args[0].as_str().ok_or_else(|| type_error("is_digit", "a String", &args[0], call_expr, context))?;
	Ok(Value::from_bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dummy_call_site() -> (Expr, Context) {
		use crate::ast::ExprKind;
		use crate::position::{Position, SourceSpan};
		use std::rc::Rc;
		let filename: Rc<str> = Rc::from("test");
		let source: Rc<str> = Rc::from("");
		let position = Position::start(filename, source);
		let span = SourceSpan::point(position);
		let expr = Expr::new(ExprKind::Block(Vec::new()), span);
		let context = Context::root(Environment::root());
		(expr, context)
	}

	#[test]
	fn append_mutates_shared_list_in_place() {
		let (expr, context) = dummy_call_site();
		let list = Value::list(vec![Value::number(1.0)]);
		builtin_append(&[list.clone(), Value::number(2.0)], &expr, &context).unwrap();
		assert_eq!(list.as_list().unwrap().borrow().len(), 2);
	}

	#[test]
	fn len_supports_lists_and_strings() {
		let (expr, context) = dummy_call_site();
		assert_eq!(builtin_len(&[Value::String("abc".to_owned())], &expr, &context).unwrap(), Value::number(3.0));
		assert_eq!(builtin_len(&[Value::list(vec![Value::number(1.0), Value::number(2.0)])], &expr, &context).unwrap(), Value::number(2.0));
	}

	#[test]
	fn pop_out_of_bounds_is_an_error() {
		let (expr, context) = dummy_call_site();
		let list = Value::list(vec![Value::number(1.0)]);
		assert!(builtin_pop(&[list, Value::number(5.0)], &expr, &context).is_err());
	}

	#[test]
	fn is_digit_rejects_empty_and_non_digit_strings() {
		let (expr, context) = dummy_call_site();
		assert_eq!(builtin_is_digit(&[Value::String("123".to_owned())], &expr, &context).unwrap(), Value::truth());
		assert_eq!(builtin_is_digit(&[Value::String(String::new())], &expr, &context).unwrap(), Value::null());
		assert_eq!(builtin_is_digit(&[Value::String("12a".to_owned())], &expr, &context).unwrap(), Value::null());
	}

	#[test]
	fn int_parses_strings_but_rejects_numbers() {
		let (expr, context) = dummy_call_site();
		assert_eq!(builtin_int(&[Value::String("42".to_owned())], &expr, &context).unwrap(), Value::number(42.0));
		assert!(builtin_int(&[Value::number(3.9)], &expr, &context).is_err());
	}

	#[test]
	fn str_accepts_only_numbers() {
		let (expr, context) = dummy_call_site();
		assert_eq!(builtin_str(&[Value::number(7.0)], &expr, &context).unwrap(), Value::String("7".to_owned()));
		assert!(builtin_str(&[Value::String("x".to_owned())], &expr, &context).is_err());
	}

	#[test]
	fn append_and_extend_return_the_mutated_list() {
		let (expr, context) = dummy_call_site();
		let list = Value::list(vec![Value::number(1.0)]);
		let returned = builtin_append(&[list.clone(), Value::number(2.0)], &expr, &context).unwrap();
		assert_eq!(returned, list);

		let other = Value::list(vec![Value::number(3.0)]);
		let returned = builtin_extend(&[list.clone(), other], &expr, &context).unwrap();
		assert_eq!(returned, list);
		assert_eq!(list.as_list().unwrap().borrow().len(), 3);
	}
}
