use crate::ast::{AstPrinter, Expression, Literal, Statement, SwitchCase, Visitor};
use crate::builtins;
use crate::callable::Function;
use crate::config::Config;
use crate::environment::Scope;
use crate::error::{Error, Result};
use crate::heap::{Heap, ScopeId};
use crate::object::{Array, Object};
use crate::operators;
use crate::program::Program;
use crate::token::TokenKind;
use crate::value::Value;
use std::io::{self, Write};
use std::rc::Rc;

/// Tree-walking evaluator. Owns the heap and tracks the active scope.
pub struct Interpreter {
    pub(crate) heap: Heap,
    pub(crate) scope: ScopeId,
    pub(crate) root: ScopeId,
    pub(crate) config: Config,
    pub(crate) out: Box<dyn Write>,
    pub(crate) depth: usize,
    // Scopes made inactive by `in_scope`, innermost last.
    frames: Vec<ScopeId>,
    // Values produced by statements still executing. Collection treats them
    // as roots alongside `frames`.
    temps: Vec<Value>,
    next_gc: usize,
}

/// An evaluated assignment target.
enum Place<'a> {
    Variable(&'a str),
    Slot(Value, Value),
}

impl Visitor<Expression, Result<Value>> for Interpreter {
    fn visit(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Literal(x) => Ok(match x {
                Literal::Nil => Value::Nil,
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expression::Variable(name) => self.heap.must_lookup(self.scope, name),
            Expression::Unary { operator, right } => {
                let value = self.evaluate(right)?;
                match operator {
                    TokenKind::Not => Ok(Value::Boolean(!value.is_truthy(&self.heap)?)),
                    _ => operators::unary(*operator, &value),
                }
            }
            Expression::Increment {
                operator,
                prefix,
                target,
            } => {
                let place = self.place(target)?;
                let old = match self.load(&place)? {
                    Value::Number(n) => n,
                    other => {
                        return Err(Error::Type(format!(
                            "bad operand type for `{}': {}",
                            operator,
                            other.type_name()
                        )))
                    }
                };
                let new = if *operator == TokenKind::Increment {
                    old.wrapping_add(1)
                } else {
                    old.wrapping_sub(1)
                };
                self.store(&place, Value::Number(new))?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expression::Binary {
                left,
                operator: TokenKind::AndAnd,
                right,
            } => {
                let truthy = self.evaluate(left)?.is_truthy(&self.heap)?
                    && self.evaluate(right)?.is_truthy(&self.heap)?;
                Ok(Value::Boolean(truthy))
            }
            Expression::Binary {
                left,
                operator: TokenKind::OrOr,
                right,
            } => {
                let truthy = self.evaluate(left)?.is_truthy(&self.heap)?
                    || self.evaluate(right)?.is_truthy(&self.heap)?;
                Ok(Value::Boolean(truthy))
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                operators::binary(*operator, &left, &right)
            }
            Expression::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy(&self.heap)? {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
            Expression::New { class, arguments } => {
                let class = self.evaluate(class)?;
                let arguments = self.evaluate_all(arguments)?;
                match class {
                    Value::Class(class) => class.instantiate(self, arguments),
                    other => Err(Error::NotCallable(other.type_name().to_string())),
                }
            }
            Expression::Assignment { target, value } => {
                let value = self.evaluate(value)?;
                let place = self.place(target)?;
                self.store(&place, value.clone())?;
                Ok(value)
            }
            Expression::Function(literal) => {
                let function = Value::Function(Rc::new(Function::new(literal.clone(), self.scope)));
                if let Some(name) = &literal.name {
                    self.heap.define(self.scope, name, function.clone())?;
                }
                Ok(function)
            }
            Expression::Index { target, key } => {
                let target = self.evaluate(target)?;
                let key = self.evaluate(key)?;
                self.index(&target, &key)
            }
            Expression::Call { callee, arguments } => {
                let callee = self.evaluate(callee)?;
                let arguments = self.evaluate_all(arguments)?;
                self.call_value(&callee, arguments)
            }
            Expression::Object(entries) => {
                let mut object = Object::new();
                for (key, value) in entries {
                    let value = self.evaluate(value)?;
                    object.set(key, value);
                }
                Ok(Value::Object(self.heap.alloc_object(object)))
            }
            Expression::Array(elements) => {
                let elements = self.evaluate_all(elements)?;
                Ok(Value::Array(self.heap.alloc_array(Array::new(elements))))
            }
        }
    }
}

impl Visitor<Statement, Result<()>> for Interpreter {
    fn visit(&mut self, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::Empty => Ok(()),
            Statement::Let { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                self.heap.define(self.scope, name, value)
            }
            Statement::Function(literal) => {
                self.evaluate(&Expression::Function(literal.clone()))?;
                Ok(())
            }
            Statement::Return(value) => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };
                self.heap.set_return(self.scope, value)
            }
            Statement::Block(statements) => self.execute_child(statements),
            Statement::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Statement::For {
                init,
                test,
                increment,
                body,
            } => self.execute_for(init.as_deref(), test.as_ref(), increment.as_ref(), body),
            Statement::Break => self.heap.set_break(self.scope),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy(&self.heap)? {
                    self.execute_child(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Statement::Switch {
                subject,
                cases,
                default,
            } => self.execute_switch(subject, cases, default.as_deref()),
        }
    }
}

impl Interpreter {
    pub fn new(config: Config) -> Interpreter {
        Interpreter::with_output(config, Box::new(io::stdout()))
    }

    /// Builds the root scope with the global object bound as `global`.
    pub fn with_output(config: Config, out: Box<dyn Write>) -> Interpreter {
        let mut heap = Heap::new();
        let global = builtins::global_object(&mut heap);
        let root = heap.alloc_scope(Scope::root(global));
        Interpreter {
            heap,
            scope: root,
            root,
            next_gc: config.gc_threshold,
            config,
            out,
            depth: 0,
            frames: Vec::new(),
            temps: Vec::new(),
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Runs the top-level statements in the root scope, then calls the
    /// configured entry point with no arguments.
    pub fn run_program(&mut self, program: &Program) -> Result<Value> {
        for stmt in program.statements.iter() {
            self.execute(stmt)?;
            self.maybe_collect();
        }
        let entry = self.heap.must_lookup(self.root, &self.config.entry_point)?;
        tracing::debug!(entry = %self.config.entry_point, "calling entry point");
        let result = self.call_value(&entry, Vec::new());
        self.out.flush()?;
        result
    }

    /// Collects garbage if the heap has outgrown its budget. Must only run
    /// between statements: every value a caller still needs is then either
    /// reachable from an active scope or held in `temps`.
    fn maybe_collect(&mut self) {
        if self.heap.live() <= self.next_gc {
            return;
        }
        let mut scopes = Vec::with_capacity(self.frames.len() + 2);
        scopes.push(self.root);
        scopes.push(self.scope);
        scopes.extend(self.frames.iter().copied());
        self.heap.collect(&scopes, &self.temps);
        self.next_gc = self.config.gc_threshold.max(self.heap.live() * 2);
    }

    /// Keeps `value` alive until the statement being executed finishes.
    pub(crate) fn root(&mut self, value: Value) {
        self.temps.push(value);
    }

    pub(crate) fn evaluate(&mut self, expr: &Expression) -> Result<Value> {
        let value = crate::ensure_sufficient_stack(|| expr.accept(&mut *self))?;
        self.temps.push(value.clone());
        Ok(value)
    }

    pub(crate) fn execute(&mut self, stmt: &Statement) -> Result<()> {
        let mark = self.temps.len();
        let result = crate::ensure_sufficient_stack(|| stmt.accept(&mut *self));
        self.temps.truncate(mark);
        result
    }

    fn evaluate_all(&mut self, exprs: &[Expression]) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.evaluate(expr)).collect()
    }

    /// Runs `f` with `scope` as the active scope, restoring the previous one
    /// afterwards even on error.
    fn in_scope<T>(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let previous = std::mem::replace(&mut self.scope, scope);
        self.frames.push(previous);
        let result = f(self);
        self.frames.pop();
        self.scope = previous;
        result
    }

    /// Executes statements in `scope`, stopping at the first break or return.
    pub(crate) fn execute_block(&mut self, statements: &[Statement], scope: ScopeId) -> Result<()> {
        self.in_scope(scope, |this| {
            for stmt in statements {
                this.execute(stmt)?;
                if this.heap.scope(scope)?.has_signal() {
                    break;
                }
                this.maybe_collect();
            }
            Ok(())
        })
    }

    /// Executes statements in a fresh child of the active scope and hands
    /// any break or return up to the active scope.
    fn execute_child(&mut self, statements: &[Statement]) -> Result<()> {
        let child = self.heap.alloc_scope(Scope::new(Some(self.scope)));
        self.execute_block(statements, child)?;
        let (broke, value) = self.heap.scope_mut(child)?.take_signals();
        if broke {
            self.heap.set_break(self.scope)
        } else if let Some(value) = value {
            self.heap.set_return(self.scope, value)
        } else {
            Ok(())
        }
    }

    fn execute_for(
        &mut self,
        init: Option<&Statement>,
        test: Option<&Expression>,
        increment: Option<&Expression>,
        body: &[Statement],
    ) -> Result<()> {
        let outer = self.scope;
        let loop_scope = self.heap.alloc_scope(Scope::new(Some(outer)));
        self.in_scope(loop_scope, |this| {
            if let Some(init) = init {
                this.execute(init)?;
            }
            let mark = this.temps.len();
            loop {
                if let Some(test) = test {
                    let passed = this.evaluate(test)?.is_truthy(&this.heap)?;
                    this.temps.truncate(mark);
                    if !passed {
                        break;
                    }
                }
                let iteration = this.heap.alloc_scope(Scope::new(Some(loop_scope)));
                this.execute_block(body, iteration)?;
                let (broke, value) = this.heap.scope_mut(iteration)?.take_signals();
                if let Some(value) = value {
                    return this.heap.set_return(outer, value);
                }
                if broke {
                    break;
                }
                if let Some(increment) = increment {
                    this.evaluate(increment)?;
                    this.temps.truncate(mark);
                }
                this.maybe_collect();
            }
            Ok(())
        })
    }

    fn execute_switch(
        &mut self,
        subject: &Expression,
        cases: &[SwitchCase],
        default: Option<&[Statement]>,
    ) -> Result<()> {
        let subject = self.evaluate(subject)?;
        let mut chosen = default;
        'cases: for case in cases {
            for label in case.labels.iter() {
                if self.evaluate(label)?.strict_equals(&subject) {
                    chosen = Some(case.body.as_slice());
                    break 'cases;
                }
            }
        }
        let body = match chosen {
            Some(body) => body,
            None => return Ok(()),
        };
        let child = self.heap.alloc_scope(Scope::new(Some(self.scope)));
        self.execute_block(body, child)?;
        let (_, value) = self.heap.scope_mut(child)?.take_signals();
        match value {
            Some(value) => self.heap.set_return(self.scope, value),
            None => Ok(()),
        }
    }

    /// Invokes anything callable with already evaluated arguments.
    pub fn call_value(&mut self, callee: &Value, arguments: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Function(function) => function.call(self, arguments),
            Value::Builtin(builtin) => {
                let scope = self.scope;
                builtin.call(self, scope, arguments)
            }
            other => Err(Error::NotCallable(other.type_name().to_string())),
        }
    }

    fn index(&mut self, target: &Value, key: &Value) -> Result<Value> {
        match (target, key) {
            (Value::Object(id), Value::String(key)) => {
                Ok(self.heap.object(*id)?.get(key).cloned().unwrap_or(Value::Nil))
            }
            (Value::Array(id), Value::Number(index)) => self.heap.array(*id)?.get(*index),
            (Value::Array(id), Value::String(key)) => builtins::array_member(&self.heap, *id, key),
            (Value::String(s), Value::Number(index)) => string_char(s, *index),
            (Value::String(s), Value::String(key)) => Ok(builtins::string_member(s, key)),
            (Value::Object(_), key) | (Value::Array(_), key) | (Value::String(_), key) => {
                Err(Error::KeyType(key.type_name().to_string()))
            }
            (other, _) => Err(Error::NotIndexable(other.type_name().to_string())),
        }
    }

    /// Evaluates the parts of an assignable expression exactly once.
    fn place<'a>(&mut self, target: &'a Expression) -> Result<Place<'a>> {
        match target {
            Expression::Variable(name) => Ok(Place::Variable(name)),
            Expression::Index { target, key } => {
                let target = self.evaluate(target)?;
                let key = self.evaluate(key)?;
                Ok(Place::Slot(target, key))
            }
            other => Err(Error::NotAssignable(describe(other))),
        }
    }

    fn load(&mut self, place: &Place) -> Result<Value> {
        match place {
            Place::Variable(name) => self.heap.must_lookup(self.scope, name),
            Place::Slot(target, key) => self.index(target, key),
        }
    }

    fn store(&mut self, place: &Place, value: Value) -> Result<()> {
        let (target, key) = match place {
            Place::Variable(name) => return self.heap.assign(self.scope, name, value),
            Place::Slot(target, key) => (target, key),
        };
        match (target, key) {
            (Value::Object(id), Value::String(key)) => {
                self.heap.object_mut(*id)?.set(key, value);
                Ok(())
            }
            (Value::Array(id), Value::Number(index)) => {
                self.heap.array_mut(*id)?.set(*index, value)
            }
            (Value::Array(id), Value::String(key)) => {
                if builtins::is_array_member(key) {
                    return Err(Error::NotAssignable(format!("array.{}", key)));
                }
                self.heap.array_mut(*id)?.set_prop(key, value);
                Ok(())
            }
            (Value::String(_), _) => Err(Error::NotAssignable("string".to_string())),
            (Value::Object(_), key) | (Value::Array(_), key) => {
                Err(Error::KeyType(key.type_name().to_string()))
            }
            (other, _) => Err(Error::NotIndexable(other.type_name().to_string())),
        }
    }
}

fn string_char(s: &str, index: i64) -> Result<Value> {
    let length = s.chars().count();
    if index >= 0 {
        if let Some(c) = s.chars().nth(index as usize) {
            return Ok(Value::from(c.to_string()));
        }
    }
    Err(Error::Range(format!(
        "index {} out of range [0, {})",
        index, length
    )))
}

fn describe(expr: &Expression) -> String {
    expr.accept(&mut AstPrinter {})
}
