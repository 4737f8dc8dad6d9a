//! A small dynamically-typed, expression-oriented scripting language: a
//! hand-written lexer, a recursive-descent parser, and a tree-walking evaluator
//! over a closed value variant. See each module's doc comment for its piece of the
//! pipeline.

pub mod ast;
pub mod builtins;
pub mod context;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod value;

use context::Context;
use environment::Environment;
use error::Diagnostic;
use value::Value;

/// Runs `source` (named `filename` for diagnostics) in a fresh root environment
/// with the builtin registry installed, end to end: lex, parse, evaluate.
///
/// Returns the program's final value on success. On failure, returns the
/// [`Diagnostic`] describing the first lex, parse, or runtime error encountered;
/// `debug` currently only affects what the caller logs around this call, not the
/// result itself (see [`run_in`] for reusing an existing environment, e.g. across
/// REPL lines).
#[must_use]
pub fn run(filename: &str, source: &str, debug: bool) -> (Option<Value>, Option<Diagnostic>) {
	let environment = Environment::root();
	builtins::install(&environment);
	let context = Context::root(environment);
	run_in(filename, source, &context, debug)
}

/// Like [`run`], but evaluates against an existing `context` instead of a fresh
/// one — what the REPL uses so bindings from one line are visible in the next.
#[must_use]
pub fn run_in(filename: &str, source: &str, context: &Context, debug: bool) -> (Option<Value>, Option<Diagnostic>) {
	tracing::debug!(filename, debug, "tokenizing");
	let tokens = match lexer::tokenize(filename, source) {
		Ok(tokens) => tokens,
		Err(error) => return (None, Some(Diagnostic::from(error))),
	};

	tracing::debug!(?tokens, "tokenized");
	let program = match parser::parse(tokens) {
		Ok(program) => program,
		Err(error) => return (None, Some(Diagnostic::from(error))),
	};

	tracing::debug!("evaluating");
	match evaluator::eval(&program, context) {
		Ok(outcome) => {
			let value = match outcome {
				evaluator::EvalOutcome::Value(value) => value,
				evaluator::EvalOutcome::Signal(evaluator::Signal::Return(value)) => value,
				evaluator::EvalOutcome::Signal(evaluator::Signal::Break | evaluator::Signal::Continue) => Value::null(),
			};
			(Some(value), None)
		},
		Err(error) => (None, Some(Diagnostic::from(error))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn eval_ok(source: &str) -> Value {
		let (value, diagnostic) = run("test", source, false);
		assert!(diagnostic.is_none(), "unexpected diagnostic: {:?}", diagnostic.map(|d| d.render()));
		value.unwrap()
	}

	#[test]
	fn arithmetic_precedence() {
		assert_eq!(eval_ok("1 + 2 * 3"), Value::number(7.0));
	}

	#[test]
	fn exponentiation_is_right_associative() {
		assert_eq!(eval_ok("2 ^ 3 ^ 2"), Value::number(512.0));
	}

	#[test]
	fn list_indexing_and_len() {
		assert_eq!(eval_ok("[1, 2, 3] ? 0"), Value::number(1.0));
		assert_eq!(eval_ok("len([1, 2, 3])"), Value::number(3.0));
	}

	#[test]
	fn recursive_factorial() {
		let source = r"
func factorial(n)
  if n <= 1 then
    return 1
  end
  return n * factorial(n - 1)
end
factorial(5)
";
		assert_eq!(eval_ok(source), Value::number(120.0));
	}

	#[test]
	fn for_loop_block_form_has_exclusive_end_and_returns_null() {
		let source = r"
set total = 0
for i = 0 to 5 then
  set total = total + i
end
total
";
		assert_eq!(eval_ok(source), Value::number(10.0));
	}

	#[test]
	fn break_and_continue() {
		let source = r"
set seen = []
for i = 0 to 10 then
  if i == 5 then
    break
  end
  if i == 2 then
    continue
  end
  append(seen, i)
end
len(seen)
";
		assert_eq!(eval_ok(source), Value::number(4.0));
	}

	#[test]
	fn string_operators() {
		assert_eq!(eval_ok(r#""ab" + "cd""#), Value::String("abcd".to_owned()));
		assert_eq!(eval_ok(r#""abcabc" - "b""#), Value::String("acac".to_owned()));
	}

	#[test]
	fn division_by_zero_reports_a_one_frame_traceback() {
		let (value, diagnostic) = run("test", "1 / 0", false);
		assert!(value.is_none());
		let rendered = diagnostic.unwrap().render();
		assert!(rendered.contains("Division by zero"));
		assert_eq!(rendered.matches("File").count(), 2); // one traceback frame + the error header.
	}

	#[test]
	fn closures_capture_their_defining_environment() {
		let source = r"
func make_adder(n)
  func adder(x) -> x + n
  return adder
end
set add5 = make_adder(5)
add5(10)
";
		assert_eq!(eval_ok(source), Value::number(15.0));
	}

	#[test]
	fn assigning_a_list_snapshots_it() {
		let source = r"
set a = [1, 2]
set b = a
append(b, 3)
len(a)
";
		assert_eq!(eval_ok(source), Value::number(2.0));
	}
}
