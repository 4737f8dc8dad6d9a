//! The `ember` command-line entry point: runs a script file given as an argument,
//! or drops into a REPL when none is given.

use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser as _;
use colored::Colorize as _;
use ember_lang::context::Context;
use ember_lang::environment::Environment;
use ember_lang::{builtins, run, run_in};

/// Command-line arguments for the `ember` binary.
#[derive(clap::Parser)]
#[command(name = "ember", about = "A small dynamically-typed, expression-oriented scripting language.")]
struct Args {
	/// Path to a script to run. When omitted, starts an interactive REPL.
	path: Option<PathBuf>,

	/// Dump the token vector to stdout after lexing, and emit tokenize/parse/eval
	/// tracing spans to stderr.
	#[arg(long)]
	debug: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let filter = if args.debug { "debug" } else { "warn" };
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
	tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

	match args.path {
		Some(path) => run_file(&path, args.debug),
		None => {
			run_repl(args.debug);
			Ok(())
		},
	}
}

/// Runs a single script file. A missing path exits silently (status 0); anything
/// else that keeps `std::fs::read_to_string` from succeeding (permissions, a
/// directory, invalid UTF-8) is a genuine environment problem and is surfaced via
/// `anyhow`, not swallowed. A diagnostic *from the script itself*
/// (lex/parse/runtime error) is still reported on stderr with a clean exit, since
/// that's the language's own error channel, not the host's.
fn run_file(path: &PathBuf, debug: bool) -> anyhow::Result<()> {
	let source = match std::fs::read_to_string(path) {
		Ok(source) => source,
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
			tracing::debug!(?path, "script path does not exist, exiting silently");
			return Ok(());
		},
		Err(error) => return Err(anyhow::Error::new(error).context(format!("failed to read {}", path.display()))),
	};

	let filename = path.display().to_string();
	dump_tokens_if_debug(&filename, &source, debug);
	let (_, diagnostic) = run(&filename, &source, debug);
	if let Some(diagnostic) = diagnostic {
		eprint!("{}", diagnostic.render());
	}
	Ok(())
}

/// `--debug` dumps the token vector to stdout after lexing. This lexes `source` a
/// second time independently of `run`/`run_in`'s own internal pass, which keeps the
/// CLI's debug-dump concern out of the library entry point entirely.
fn dump_tokens_if_debug(filename: &str, source: &str, debug: bool) {
	if !debug {
		return;
	}
	match ember_lang::lexer::tokenize(filename, source) {
		Ok(tokens) => println!("{tokens:#?}"),
		Err(error) => println!("{error:#?}"),
	}
}

/// A plain line-buffered REPL: no history or line-editing, since nothing else in
/// this codebase depends on a line-editing crate. Bindings persist across lines by
/// reusing one root `Context` for the whole session.
fn run_repl(debug: bool) {
	let environment = Environment::root();
	builtins::install(&environment);
	let context = Context::root(environment);

	let stdin = std::io::stdin();
	loop {
		print!("{} ", "ember>".dimmed());
		std::io::stdout().flush().ok();

		let mut line = String::new();
		if stdin.read_line(&mut line).unwrap_or(0) == 0 {
			break; // EOF (Ctrl-D) or the terminal closed the stream.
		}
		if line.trim().is_empty() {
			continue;
		}

		dump_tokens_if_debug("<stdin>", &line, debug);
		let (value, diagnostic) = run_in("<stdin>", &line, &context, debug);
		if let Some(diagnostic) = diagnostic {
			eprint!("{}", diagnostic.render());
			continue;
		}
		if let Some(value) = value {
			print_repl_result(&value);
		}
	}
}

/// A single-element list prints as just that element; every other value (including
/// lists with zero or more-than-one elements) prints via its own `Display`.
fn print_repl_result(value: &ember_lang::value::Value) {
	if let Some(list) = value.as_list() {
		let borrowed = list.borrow();
		if borrowed.len() == 1 {
			println!("{}", borrowed[0]);
			return;
		}
	}
	println!("{value}");
}
