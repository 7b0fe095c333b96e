pub mod ast;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod program;
pub mod scanner;
pub mod token;
pub mod value;

mod builtins;
mod callable;
mod environment;
mod heap;
mod object;
mod operators;

pub use crate::error::{Error, Result};

use std::sync::Once;

/// Below this much remaining stack, recursion grows the stack first.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first moving to a fresh stack segment if the current one is
/// nearly exhausted. Wraps the recursive paths of the parser and evaluator.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

static TRACING_INIT: Once = Once::new();

/// Installs a `tracing` subscriber filtered by `RUST_LOG`, e.g.
/// `RUST_LOG=rtao=debug`. Does nothing when the variable is unset.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// Parses and runs `source`, returning what its entry point returns.
pub fn run(source: &str, config: config::Config) -> Result<value::Value> {
    let program = parser::parse(source)?;
    program.execute_with(config)
}

#[cfg(test)]
mod lib_tests {
    use crate::config::Config;
    use crate::value::Value;

    #[test]
    fn stack_grows_for_deep_nesting() {
        let depth = 5000;
        let source = format!(
            "function main() {{ return {}1{}; }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        assert!(matches!(crate::run(&source, Config::default()), Ok(Value::Number(1))));
    }

    /// Runs `f` on a thread whose stack fits dropping a very deep tree, which
    /// recurses without growing the stack.
    fn on_big_stack<F: FnOnce() + Send + 'static>(f: F) {
        std::thread::Builder::new()
            .stack_size(16 << 20)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap();
    }

    #[test]
    fn stack_grows_for_long_operator_chains() {
        on_big_stack(|| {
            let source = format!("function main() {{ return 0{}; }}", "+1".repeat(20000));
            assert!(matches!(crate::run(&source, Config::default()), Ok(Value::Number(20000))));
        });
    }

    #[test]
    fn stack_grows_for_nested_blocks() {
        on_big_stack(|| {
            let depth = 5000;
            let source = format!(
                "function main() {{ {}return 7;{} }}",
                "{ ".repeat(depth),
                " }".repeat(depth)
            );
            assert!(matches!(crate::run(&source, Config::default()), Ok(Value::Number(7))));
        });
    }

    #[test]
    fn run_reports_syntax_errors() {
        let err = crate::run("function main() { return 1 }", Config::default()).unwrap_err();
        assert!(err.is_syntax());
    }
}
