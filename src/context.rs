//! The call-stack frame used for lexical scoping of user functions and for building
//! runtime-error tracebacks. A chain of `Context`s mirrors the chain of active calls;
//! a `UserFunc` value captures the `Context` active when it was defined (its
//! "defining context"), which is what gives the language closures.

use std::rc::Rc;

use crate::environment::Environment;
use crate::position::Position;

struct ContextData {
	display_name: String,
	parent: Option<Context>,
	/// Where, in the parent frame, this frame's call was made. `None` for the root
	/// frame, which was never called from anywhere.
	call_site: Option<Position>,
	environment: Environment,
}

/// A shared handle to a call frame. Cloning a `Context` clones the handle; the
/// frames it points to are immutable once created (a new call pushes a new
/// `Context`, it never mutates an existing one).
#[derive(Clone)]
pub struct Context(Rc<ContextData>);

impl Context {
	/// Creates the root frame ("<program>"), with a fresh root environment.
	#[must_use]
	pub fn root(environment: Environment) -> Self {
		Self(Rc::new(ContextData { display_name: "<program>".to_owned(), parent: None, call_site: None, environment }))
	}

	/// Creates a new frame for a call to `display_name`. `parent` is the *dynamic*
	/// caller's frame (used only for traceback rendering and recursion-depth
	/// counting); `environment` is separately built by the caller as a child of the
	/// callee's *lexical* closure, which is what actually gives the language proper
	/// lexical scoping independent of this call chain. `call_site` is the position of
	/// the call expression, used for traceback rendering.
	#[must_use]
	pub fn call(display_name: impl Into<String>, parent: &Self, call_site: Position, environment: Environment) -> Self {
		Self(Rc::new(ContextData { display_name: display_name.into(), parent: Some(parent.clone()), call_site: Some(call_site), environment }))
	}

	/// Creates a sibling of this frame with a different environment but the same
	/// display name, parent, and call site — used for per-iteration loop scoping,
	/// where each iteration needs its own child environment but isn't a new call and
	/// shouldn't add a frame to the traceback or count against recursion depth.
	#[must_use]
	pub fn with_environment(&self, environment: Environment) -> Self {
		Self(Rc::new(ContextData { display_name: self.0.display_name.clone(), parent: self.0.parent.clone(), call_site: self.0.call_site.clone(), environment }))
	}

	/// The environment active in this frame.
	#[must_use]
	pub fn environment(&self) -> &Environment {
		&self.0.environment
	}

	/// The frame's display name, as it should appear in a traceback line.
	#[must_use]
	pub fn display_name(&self) -> &str {
		&self.0.display_name
	}

	/// The lexically enclosing frame, if any.
	#[must_use]
	pub fn parent(&self) -> Option<&Self> {
		self.0.parent.as_ref()
	}

	/// How many calls deep this frame is (the root frame is depth 0). The evaluator
	/// checks this against `MAX_CALL_DEPTH` before pushing a new call frame, so
	/// unbounded user recursion raises a runtime error instead of overflowing the
	/// host stack.
	#[must_use]
	pub fn depth(&self) -> usize {
		self.parent().map_or(0, |parent| parent.depth() + 1)
	}

	/// Walks the frame chain from root to this frame, pairing each frame's display
	/// name with the position *in that frame* that the traceback should report: for
	/// every frame but the innermost, that's where it called into the next frame;
	/// for the innermost frame, it's `error_site`, the position of the expression
	/// that actually raised the error. Used by [`crate::error::Diagnostic`] to print
	/// one `File ..., line L:C, in NAME` line per frame, outermost first.
	#[must_use]
	pub fn frames(&self, error_site: &Position) -> Vec<(String, Position)> {
		let mut chain = Vec::new();
		let mut current = Some(self);
		while let Some(context) = current {
			chain.push(context);
			current = context.parent();
		}
		chain.reverse();

		let mut out = Vec::with_capacity(chain.len());
		for index in 0..chain.len() {
			let position = match chain.get(index + 1) {
				Some(inner) => inner.0.call_site.clone().unwrap_or_else(|| error_site.clone()),
				None => error_site.clone(),
			};
			out.push((chain[index].display_name().to_owned(), position));
		}
		out
	}
}
