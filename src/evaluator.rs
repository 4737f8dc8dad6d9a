//! The tree-walking evaluator. Walks an `Expr` and either produces a `Value` or
//! propagates one of: a runtime error, or a control-flow signal (`return`/`break`/
//! `continue`) bubbling up to the nearest construct that consumes it. Control flow
//! is carried explicitly as data here, not thrown as an exception.

use crate::ast::{Expr, ExprKind};
use crate::context::Context;
use crate::environment::Environment;
use crate::error::RtError;
use crate::lexer::TokenKind;
use crate::value::{and_op, binary_op, or_op, unary_op, OpResult, UserFunc, Value};

/// How deep a call chain may go before the evaluator raises "Max recursion depth
/// exceeded" itself, rather than letting unbounded user recursion overflow the host
/// stack.
pub const MAX_CALL_DEPTH: usize = 1000;

/// A control-flow signal in flight: produced by `return`/`break`/`continue` and
/// consumed by the nearest function call / loop, respectively.
#[derive(Debug, Clone)]
pub enum Signal {
	Return(Value),
	Break,
	Continue,
}

/// What evaluating one `Expr` produces when it doesn't fail: either a plain value,
/// or a signal still propagating upward looking for something to consume it.
#[derive(Debug, Clone)]
pub enum EvalOutcome {
	Value(Value),
	Signal(Signal),
}

impl EvalOutcome {
	/// Unwraps a plain value, turning a stray `Signal` into the value it would
	/// otherwise discard. Used where a signal has nowhere left to propagate to other
	/// than being treated as `Number.null` (e.g. a `break` as the last statement of a
	/// function body with no enclosing loop still yields a value, just an inert one).
	fn into_value(self) -> Value {
		match self {
			Self::Value(value) => value,
			Self::Signal(Signal::Return(value)) => value,
			Self::Signal(Signal::Break | Signal::Continue) => Value::null(),
		}
	}
}

pub type EvalResult = Result<EvalOutcome, RtError>;

/// Evaluates `expr` in `context`, returning either its value, an in-flight signal,
/// or a runtime error.
///
/// # Errors
/// Returns an [`RtError`] for any illegal operation, unbound identifier, wrong-arity
/// call, or exceeded recursion depth, tagged with `context`'s call stack.
pub fn eval(expr: &Expr, context: &Context) -> EvalResult {
	match expr.kind.as_ref() {
		ExprKind::NumberLit(token) => Ok(EvalOutcome::Value(number_literal(token))),
		ExprKind::StringLit(token) => Ok(EvalOutcome::Value(string_literal(token))),
		ExprKind::Ident(name) => eval_ident(name, expr, context),
		ExprKind::Assign { name, value } => eval_assign(name, value, context),
		ExprKind::BinOp { lhs, op, rhs } => eval_binop(lhs, op, rhs, expr, context),
		ExprKind::UnaryOp { op, operand } => eval_unaryop(op.kind, operand, expr, context),
		ExprKind::If { cases, else_branch } => eval_if(cases, else_branch, context),
		ExprKind::For { var_name, start, end, step, body, should_return_null } => eval_for(var_name, start, end, step.as_deref(), body, *should_return_null, expr, context),
		ExprKind::While { condition, body, should_return_null } => eval_while(condition, body, *should_return_null, context),
		ExprKind::FuncDef { name, parameters, body, should_auto_return } => eval_func_def(name, parameters, body, *should_auto_return, context),
		ExprKind::Call { callee, args } => eval_call(callee, args, expr, context),
		ExprKind::ListLit(elements) => eval_list_lit(elements, context),
		ExprKind::Return(value) => eval_return(value.as_deref(), context),
		ExprKind::Continue => Ok(EvalOutcome::Signal(Signal::Continue)),
		ExprKind::Break => Ok(EvalOutcome::Signal(Signal::Break)),
		ExprKind::Block(statements) => eval_block(statements, context),
	}
}

fn number_literal(token: &crate::lexer::Token) -> Value {
	match &token.literal {
		Some(crate::lexer::Literal::Int(n)) => Value::number(*n as f64),
		Some(crate::lexer::Literal::Float(n)) => Value::number(*n),
		_ => unreachable!("NumberLit token without a numeric literal"),
	}
}

fn string_literal(token: &crate::lexer::Token) -> Value {
	match &token.literal {
		Some(crate::lexer::Literal::Text(text)) => Value::String(text.clone()),
		_ => unreachable!("StringLit token without a text literal"),
	}
}

fn eval_ident(name: &str, expr: &Expr, context: &Context) -> EvalResult {
	context.environment().get(name).map_or_else(|| Err(RtError::new(format!("'{name}' is not defined"), expr.span.clone(), context.clone())), |value| Ok(EvalOutcome::Value(value)))
}

fn eval_assign(name: &str, value_expr: &Expr, context: &Context) -> EvalResult {
	let value = require_value(eval(value_expr, context)?);
	context.environment().set(name, value.clone().snapshot());
	Ok(EvalOutcome::Value(value))
}

/// Evaluates an operand, turning an in-flight `Signal` into the plain value it
/// carries (or `Number.null` for `break`/`continue`) so arithmetic/comparison never
/// has to match on `EvalOutcome` directly. A signal that reaches an operand position
/// has already been "observed" here; it does not keep propagating past this point,
/// matching how the distilled source only ever checks for signals at block,
/// loop-body, and call-body boundaries.
fn require_value(outcome: EvalOutcome) -> Value {
	outcome.into_value()
}

fn eval_binop(lhs: &Expr, op: &crate::lexer::Token, rhs: &Expr, expr: &Expr, context: &Context) -> EvalResult {
	let lhs_outcome = eval(lhs, context)?;
	if let EvalOutcome::Signal(_) = lhs_outcome {
		return Ok(lhs_outcome);
	}
	let lhs_value = require_value(lhs_outcome);

	let rhs_outcome = eval(rhs, context)?;
	if let EvalOutcome::Signal(_) = rhs_outcome {
		return Ok(rhs_outcome);
	}
	let rhs_value = require_value(rhs_outcome);

	// `and`/`or` are keyword tokens, dispatched separately from the rest of the
	// operators since their truthiness-combine behavior isn't keyed off a `TokenKind`.
	let result: OpResult = if op.is_keyword("and") {
		and_op(&lhs_value, &rhs_value)
	} else if op.is_keyword("or") {
		or_op(&lhs_value, &rhs_value)
	} else {
		binary_op(op.kind, &lhs_value, &rhs_value)
	};
	result.map(EvalOutcome::Value).map_err(|detail| RtError::new(detail, expr.span.clone(), context.clone()))
}

fn eval_unaryop(op: TokenKind, operand: &Expr, expr: &Expr, context: &Context) -> EvalResult {
	let outcome = eval(operand, context)?;
	if let EvalOutcome::Signal(_) = outcome {
		return Ok(outcome);
	}
	let value = require_value(outcome);
	unary_op(op, &value).map(EvalOutcome::Value).map_err(|detail| RtError::new(detail, expr.span.clone(), context.clone()))
}

fn eval_if(cases: &[crate::ast::IfCase], else_branch: &Option<(Box<Expr>, bool)>, context: &Context) -> EvalResult {
	for case in cases {
		let condition_outcome = eval(&case.condition, context)?;
		if let EvalOutcome::Signal(_) = condition_outcome {
			return Ok(condition_outcome);
		}
		if require_value(condition_outcome).is_truthy() {
			let body_outcome = eval(&case.body, context)?;
			if let EvalOutcome::Signal(_) = body_outcome {
				return Ok(body_outcome);
			}
			let body_value = require_value(body_outcome);
			return Ok(EvalOutcome::Value(if case.should_return_null { Value::null() } else { body_value }));
		}
	}

	if let Some((body, should_return_null)) = else_branch {
		let body_outcome = eval(body, context)?;
		if let EvalOutcome::Signal(_) = body_outcome {
			return Ok(body_outcome);
		}
		let body_value = require_value(body_outcome);
		return Ok(EvalOutcome::Value(if *should_return_null { Value::null() } else { body_value }));
	}

	Ok(EvalOutcome::Value(Value::null()))
}

/// `for` collects each iteration's body value into a list, unless the body was
/// parsed in block form, in which case the whole loop evaluates to `null`, matching
/// `if`/`while`'s block-form rule. The end bound is exclusive; `step` defaults to
/// `1`.
fn eval_for(var_name: &str, start: &Expr, end: &Expr, step: Option<&Expr>, body: &Expr, should_return_null: bool, expr: &Expr, context: &Context) -> EvalResult {
	let start_outcome = eval(start, context)?;
	if let EvalOutcome::Signal(_) = start_outcome {
		return Ok(start_outcome);
	}
	let start_value = number_operand(require_value(start_outcome), &expr.span, context)?;

	let end_outcome = eval(end, context)?;
	if let EvalOutcome::Signal(_) = end_outcome {
		return Ok(end_outcome);
	}
	let end_value = number_operand(require_value(end_outcome), &expr.span, context)?;

	let step_value = match step {
		Some(step_expr) => {
			let step_outcome = eval(step_expr, context)?;
			if let EvalOutcome::Signal(_) = step_outcome {
				return Ok(step_outcome);
			}
			number_operand(require_value(step_outcome), &expr.span, context)?
		},
		None => 1.0,
	};

	let mut results = Vec::new();
	let mut current = start_value;
	loop {
		let continues = if step_value > 0.0 { current < end_value } else { current > end_value };
		if !continues {
			break;
		}

		let iteration_env = Environment::child_of(context.environment());
		iteration_env.set(var_name, Value::number(current));
		let iteration_context = context.with_environment(iteration_env);

		let body_outcome = eval(body, &iteration_context)?;
		match body_outcome {
			EvalOutcome::Signal(Signal::Break) => break,
			EvalOutcome::Signal(Signal::Continue) => {},
			EvalOutcome::Signal(Signal::Return(_)) => return Ok(body_outcome),
			EvalOutcome::Value(value) => results.push(value),
		}

		current += step_value;
	}

	Ok(EvalOutcome::Value(if should_return_null { Value::null() } else { Value::list(results) }))
}

fn eval_while(condition: &Expr, body: &Expr, should_return_null: bool, context: &Context) -> EvalResult {
	let mut results = Vec::new();
	loop {
		let condition_outcome = eval(condition, context)?;
		if let EvalOutcome::Signal(_) = condition_outcome {
			return Ok(condition_outcome);
		}
		if !require_value(condition_outcome).is_truthy() {
			break;
		}

		let body_outcome = eval(body, context)?;
		match body_outcome {
			EvalOutcome::Signal(Signal::Break) => break,
			EvalOutcome::Signal(Signal::Continue) => {},
			EvalOutcome::Signal(Signal::Return(_)) => return Ok(body_outcome),
			EvalOutcome::Value(value) => results.push(value),
		}
	}

	Ok(EvalOutcome::Value(if should_return_null { Value::null() } else { Value::list(results) }))
}

fn eval_func_def(name: &Option<String>, parameters: &[String], body: &Expr, should_auto_return: bool, context: &Context) -> EvalResult {
	let func = UserFunc { name: name.clone(), parameters: parameters.to_vec(), body: body.clone(), should_auto_return, defining_context: context.clone() };
	let value = Value::UserFunc(std::rc::Rc::new(func));
	if let Some(name) = name {
		context.environment().set(name.clone(), value.clone());
	}
	Ok(EvalOutcome::Value(value))
}

fn eval_list_lit(elements: &[Expr], context: &Context) -> EvalResult {
	let mut values = Vec::with_capacity(elements.len());
	for element in elements {
		let outcome = eval(element, context)?;
		if let EvalOutcome::Signal(_) = outcome {
			return Ok(outcome);
		}
		values.push(require_value(outcome));
	}
	Ok(EvalOutcome::Value(Value::list(values)))
}

fn eval_return(value: Option<&Expr>, context: &Context) -> EvalResult {
	let value = match value {
		Some(expr) => {
			let outcome = eval(expr, context)?;
			if let EvalOutcome::Signal(_) = outcome {
				return Ok(outcome);
			}
			require_value(outcome)
		},
		None => Value::null(),
	};
	Ok(EvalOutcome::Signal(Signal::Return(value)))
}

fn eval_block(statements: &[Expr], context: &Context) -> EvalResult {
	let mut last = Value::null();
	for statement in statements {
		let outcome = eval(statement, context)?;
		match outcome {
			EvalOutcome::Signal(_) => return Ok(outcome),
			EvalOutcome::Value(value) => last = value,
		}
	}
	Ok(EvalOutcome::Value(last))
}

fn eval_call(callee: &Expr, args: &[Expr], expr: &Expr, context: &Context) -> EvalResult {
	let callee_outcome = eval(callee, context)?;
	if let EvalOutcome::Signal(_) = callee_outcome {
		return Ok(callee_outcome);
	}
	let callee_value = require_value(callee_outcome);

	let mut arg_values = Vec::with_capacity(args.len());
	for arg in args {
		let outcome = eval(arg, context)?;
		if let EvalOutcome::Signal(_) = outcome {
			return Ok(outcome);
		}
		arg_values.push(require_value(outcome));
	}

	match &callee_value {
		Value::UserFunc(func) => call_user_func(func, arg_values, expr, context),
		Value::BuiltinFunc(name) => crate::builtins::call(name, arg_values, expr, context),
		other => Err(RtError::new(format!("'{}' is not callable", other.type_name()), expr.span.clone(), context.clone())),
	}
}

fn call_user_func(func: &std::rc::Rc<UserFunc>, args: Vec<Value>, call_expr: &Expr, caller_context: &Context) -> EvalResult {
	if func.parameters.len() != args.len() {
		return Err(RtError::new(format!("{} takes {} argument(s) but {} were given", func.name.as_deref().unwrap_or("<anonymous>"), func.parameters.len(), args.len()), call_expr.span.clone(), caller_context.clone()));
	}

	if caller_context.depth() + 1 >= MAX_CALL_DEPTH {
		return Err(RtError::new("Max recursion depth exceeded", call_expr.span.clone(), caller_context.clone()));
	}

	let call_env = Environment::child_of(func.defining_context.environment());
	for (parameter, value) in func.parameters.iter().zip(args) {
		call_env.set(parameter.clone(), value.snapshot());
	}

	let display_name = func.name.clone().unwrap_or_else(|| "<anonymous>".to_owned());
	let call_context = Context::call(display_name, caller_context, call_expr.span.start.clone(), call_env);

	let body_outcome = eval(&func.body, &call_context)?;
	let result = match body_outcome {
		EvalOutcome::Signal(Signal::Return(value)) => value,
		EvalOutcome::Signal(Signal::Break | Signal::Continue) => return Err(RtError::new("'break'/'continue' outside a loop", call_expr.span.clone(), call_context)),
		EvalOutcome::Value(value) if func.should_auto_return => value,
		EvalOutcome::Value(_) => Value::null(),
	};
	Ok(EvalOutcome::Value(result))
}

fn number_operand(value: Value, span: &crate::position::SourceSpan, context: &Context) -> Result<f64, RtError> {
	value.as_number().ok_or_else(|| RtError::new(format!("expected a Number, found {}", value.type_name()), span.clone(), context.clone()))
}
