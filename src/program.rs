use crate::ast::Statement;
use crate::config::Config;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// A parsed source file: the top-level `let`, `function` and empty statements.
#[derive(Debug)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Program {
        Program { statements }
    }

    /// Runs the program with the default configuration, printing to stdout.
    pub fn execute(&self) -> Result<Value> {
        self.execute_with(Config::default())
    }

    pub fn execute_with(&self, config: Config) -> Result<Value> {
        Interpreter::new(config).run_program(self)
    }
}
