//! End-to-end tests that run whole programs through `ember_lang::run` and check
//! either the resulting value or the rendered diagnostic, exercising the pipeline
//! the same way the CLI does rather than any single module in isolation.

use ember_lang::value::Value;

fn eval_ok(source: &str) -> Value {
	let (value, diagnostic) = ember_lang::run("test.em", source, false);
	assert!(diagnostic.is_none(), "unexpected diagnostic: {:?}", diagnostic.map(|d| d.render()));
	value.expect("program produced no value")
}

fn eval_err(source: &str) -> String {
	let (value, diagnostic) = ember_lang::run("test.em", source, false);
	assert!(value.is_none(), "expected a failure but got a value");
	diagnostic.expect("expected a diagnostic").render()
}

#[test]
fn list_builtins_compose() {
	let source = r"
set xs = []
append(xs, 1)
append(xs, 2)
extend(xs, [3, 4])
len(xs)
";
	assert_eq!(eval_ok(source), Value::number(4.0));
}

#[test]
fn while_loop_inline_form_collects_values() {
	let source = r"
set i = 0
set results = while i < 3 then set i = i + 1
results
";
	assert_eq!(eval_ok(source), Value::list(vec![Value::number(1.0), Value::number(2.0), Value::number(3.0)]));
}

#[test]
fn undefined_variable_is_a_runtime_error() {
	let rendered = eval_err("undefined_name + 1");
	assert!(rendered.contains("RuntimeError"));
	assert!(rendered.contains("is not defined"));
}

#[test]
fn illegal_syntax_is_reported_before_evaluation() {
	let rendered = eval_err("set = 1");
	assert!(rendered.contains("InvalidSyntax"));
}

#[test]
fn illegal_character_is_reported_before_parsing() {
	let rendered = eval_err("1 + @");
	assert!(rendered.contains("IllegalCharacter"));
}

#[test]
fn wrong_arity_call_is_a_runtime_error() {
	let source = r"
func add(a, b) -> a + b
add(1)
";
	let rendered = eval_err(source);
	assert!(rendered.contains("argument"));
}

#[test]
fn deep_recursion_is_caught_as_a_runtime_error_not_a_stack_overflow() {
	let source = r"
func recurse(n) -> recurse(n + 1)
recurse(0)
";
	let rendered = eval_err(source);
	assert!(rendered.contains("recursion depth"));
}

#[test]
fn logical_operators_use_truthiness_not_the_operand_value() {
	assert_eq!(eval_ok(r#"1 and 2"#), Value::truth());
	assert_eq!(eval_ok(r#"0 and 2"#), Value::null());
	assert_eq!(eval_ok(r#"0 or 0"#), Value::null());
	assert_eq!(eval_ok(r#""" or "x""#), Value::truth());
}

#[test]
fn logical_operators_reject_mixed_operand_kinds() {
	let rendered = eval_err(r#"1 and "x""#);
	assert!(rendered.contains("Illegal operation"));
}

#[test]
fn not_is_illegal_on_non_number_operands() {
	let rendered = eval_err(r#"not "x""#);
	assert!(rendered.contains("Illegal operation"));
}
