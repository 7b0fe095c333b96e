use crate::ast::FunctionLiteral;
use crate::environment::Scope;
use crate::error::{Error, Result};
use crate::heap::ScopeId;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// Native function: `(interpreter, receiver, active scope, arguments)`.
pub type NativeFn = fn(&mut Interpreter, &Value, ScopeId, Vec<Value>) -> Result<Value>;

/// Native constructor invoked by `new`.
pub type Constructor = fn(&mut Interpreter, Vec<Value>) -> Result<Value>;

/// A function literal closed over the scope it was evaluated in.
pub struct Function {
    pub literal: Rc<FunctionLiteral>,
    pub closure: ScopeId,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {} {:?}>", self.name(), self.closure)
    }
}

impl Function {
    pub fn new(literal: Rc<FunctionLiteral>, closure: ScopeId) -> Function {
        Function { literal, closure }
    }

    pub fn name(&self) -> &str {
        self.literal.name.as_deref().unwrap_or("<anonymous>")
    }

    pub fn arity(&self) -> usize {
        self.literal.params.len()
    }

    /// Runs the body in a fresh scope under the closure. Missing arguments
    /// bind to nil and extra ones are dropped.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        let limit = interpreter.config.max_call_depth;
        if interpreter.depth >= limit {
            return Err(Error::Recursion(limit));
        }
        let mut scope = Scope::new(Some(self.closure));
        let mut arguments = arguments.into_iter();
        for param in self.literal.params.iter() {
            scope.define(param, arguments.next().unwrap_or(Value::Nil))?;
        }
        let scope = interpreter.heap.alloc_scope(scope);

        tracing::trace!(
            function = self.name(),
            arity = self.arity(),
            depth = interpreter.depth,
            "call"
        );
        interpreter.depth += 1;
        let result =
            crate::ensure_sufficient_stack(|| interpreter.execute_block(&self.literal.body, scope));
        interpreter.depth -= 1;
        result?;

        let (_, value) = interpreter.heap.scope_mut(scope)?.take_signals();
        Ok(value.unwrap_or(Value::Nil))
    }
}

/// A native function registered on a receiver under a name.
pub struct Builtin {
    pub name: &'static str,
    pub receiver: Value,
    pub func: NativeFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

impl Builtin {
    pub fn new(name: &'static str, receiver: Value, func: NativeFn) -> Builtin {
        Builtin {
            name,
            receiver,
            func,
        }
    }

    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        scope: ScopeId,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        (self.func)(interpreter, &self.receiver, scope, arguments)
    }
}

/// A constructible type, only usable through `new`.
pub struct Class {
    pub name: &'static str,
    pub construct: Constructor,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

impl Class {
    pub fn new(name: &'static str, construct: Constructor) -> Class {
        Class { name, construct }
    }

    pub fn instantiate(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        (self.construct)(interpreter, arguments)
    }
}
