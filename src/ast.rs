use crate::token::TokenKind;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Number(i64),
    String(Rc<str>),
}

/// A parsed `function` (or lambda). Shared between the tree and every
/// runtime closure created from it.
#[derive(Debug, PartialEq)]
pub struct FunctionLiteral {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Variable(String),
    Unary {
        operator: TokenKind,
        right: Box<Expression>,
    },
    /// `++`/`--`, either before or after the target.
    Increment {
        operator: TokenKind,
        prefix: bool,
        target: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: TokenKind,
        right: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    New {
        class: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Assignment {
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Function(Rc<FunctionLiteral>),
    /// `a.b` and `a[b]`; the dot form carries its key as a string literal.
    Index {
        target: Box<Expression>,
        key: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Object(Vec<(String, Expression)>),
    Array(Vec<Expression>),
}

#[derive(Debug, PartialEq)]
pub struct SwitchCase {
    pub labels: Vec<Expression>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq)]
pub enum Statement {
    Empty,
    Let {
        name: String,
        initializer: Option<Expression>,
    },
    Function(Rc<FunctionLiteral>),
    Return(Option<Expression>),
    Block(Vec<Statement>),
    Expression(Expression),
    For {
        init: Option<Box<Statement>>,
        test: Option<Expression>,
        increment: Option<Expression>,
        body: Vec<Statement>,
    },
    Break,
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        /// Either a `Block` or a chained `If`.
        else_branch: Option<Box<Statement>>,
    },
    Switch {
        subject: Expression,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Statement>>,
    },
}

pub trait Visitor<T, Output> {
    fn visit(&mut self, n: &T) -> Output;
}

impl Expression {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Expression, T>) -> T {
        v.visit(self)
    }

    /// Only variables and index expressions can appear left of `=`.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expression::Variable(_) | Expression::Index { .. })
    }
}

impl Statement {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Statement, T>) -> T {
        v.visit(self)
    }
}

/// Renders trees as s-expressions, e.g. `(* (- 123) (+ 45 6))`.
pub struct AstPrinter {}

impl AstPrinter {
    pub fn print_program(&mut self, statements: &[Statement]) -> String {
        statements
            .iter()
            .map(|stmt| stmt.accept(self))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn parenthesize(&mut self, name: &str, args: Vec<&Expression>) -> String {
        let mut x = String::from("(");
        x.push_str(name);
        for arg in args {
            x.push(' ');
            x.push_str(arg.accept(self).as_str());
        }
        x.push(')');
        x
    }

    fn block(&mut self, statements: &[Statement]) -> String {
        let mut x = String::from("(block");
        for stmt in statements {
            x.push(' ');
            x.push_str(stmt.accept(self).as_str());
        }
        x.push(')');
        x
    }

    fn function(&mut self, function: &FunctionLiteral) -> String {
        format!(
            "(function {} ({}) {})",
            function.name.as_deref().unwrap_or("_"),
            function.params.join(" "),
            self.block(&function.body)
        )
    }
}

impl Visitor<Expression, String> for AstPrinter {
    fn visit(&mut self, n: &Expression) -> String {
        match n {
            Expression::Literal(x) => match x {
                Literal::Nil => String::from("nil"),
                Literal::Boolean(y) => y.to_string(),
                Literal::Number(y) => y.to_string(),
                Literal::String(y) => format!("{:?}", y),
            },
            Expression::Variable(name) => name.clone(),
            Expression::Unary { operator, right } => {
                self.parenthesize(&operator.to_string(), vec![&**right])
            }
            Expression::Increment {
                operator,
                prefix,
                target,
            } => {
                let name = if *prefix {
                    format!("pre{}", operator)
                } else {
                    format!("post{}", operator)
                };
                self.parenthesize(&name, vec![&**target])
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => self.parenthesize(&operator.to_string(), vec![&**left, &**right]),
            Expression::Ternary {
                condition,
                then_branch,
                else_branch,
            } => self.parenthesize("?:", vec![&**condition, &**then_branch, &**else_branch]),
            Expression::New { class, arguments } => {
                let mut args = vec![&**class];
                args.extend(arguments.iter());
                self.parenthesize("new", args)
            }
            Expression::Assignment { target, value } => {
                self.parenthesize("=", vec![&**target, &**value])
            }
            Expression::Function(function) => self.function(function),
            Expression::Index { target, key } => {
                self.parenthesize("index", vec![&**target, &**key])
            }
            Expression::Call { callee, arguments } => {
                let mut args = vec![&**callee];
                args.extend(arguments.iter());
                self.parenthesize("call", args)
            }
            Expression::Object(entries) => {
                let mut x = String::from("(object");
                for (key, value) in entries {
                    x.push_str(&format!(" ({} {})", key, value.accept(self)));
                }
                x.push(')');
                x
            }
            Expression::Array(elements) => self.parenthesize("array", elements.iter().collect()),
        }
    }
}

impl Visitor<Statement, String> for AstPrinter {
    fn visit(&mut self, n: &Statement) -> String {
        match n {
            Statement::Empty => String::from("(;)"),
            Statement::Let { name, initializer } => match initializer {
                Some(init) => format!("(let {} {})", name, init.accept(self)),
                None => format!("(let {})", name),
            },
            Statement::Function(function) => self.function(function),
            Statement::Return(value) => match value {
                Some(value) => self.parenthesize("return", vec![value]),
                None => String::from("(return)"),
            },
            Statement::Block(statements) => self.block(statements),
            Statement::Expression(expr) => expr.accept(self),
            Statement::For {
                init,
                test,
                increment,
                body,
            } => {
                let init = match init {
                    Some(init) => init.accept(self),
                    None => String::from("_"),
                };
                let test = match test {
                    Some(test) => test.accept(self),
                    None => String::from("_"),
                };
                let increment = match increment {
                    Some(increment) => increment.accept(self),
                    None => String::from("_"),
                };
                format!("(for {} {} {} {})", init, test, increment, self.block(body))
            }
            Statement::Break => String::from("(break)"),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut x = format!("(if {} {}", condition.accept(self), self.block(then_branch));
                if let Some(else_branch) = else_branch {
                    x.push(' ');
                    x.push_str(&else_branch.accept(self));
                }
                x.push(')');
                x
            }
            Statement::Switch {
                subject,
                cases,
                default,
            } => {
                let mut x = format!("(switch {}", subject.accept(self));
                for case in cases {
                    let labels: Vec<String> =
                        case.labels.iter().map(|label| label.accept(self)).collect();
                    let body = self.block(&case.body);
                    x.push_str(&format!(" (case ({}) {})", labels.join(" "), body));
                }
                if let Some(default) = default {
                    x.push_str(&format!(" (default {})", self.block(default)));
                }
                x.push(')');
                x
            }
        }
    }
}

#[cfg(test)]
mod ast_tests {
    use crate::ast::{AstPrinter, Expression, FunctionLiteral, Literal, Statement, Visitor};
    use crate::token::TokenKind;
    use std::rc::Rc;

    #[test]
    fn basic_ast_test() {
        let expression = Expression::Binary {
            left: Box::new(Expression::Unary {
                operator: TokenKind::Minus,
                right: Box::new(Expression::Literal(Literal::Number(123))),
            }),
            operator: TokenKind::Star,
            right: Box::new(Expression::Binary {
                left: Box::new(Expression::Literal(Literal::Number(45))),
                operator: TokenKind::Plus,
                right: Box::new(Expression::Literal(Literal::Number(6))),
            }),
        };
        let mut visitor = AstPrinter {};
        assert_eq!(visitor.visit(&expression), "(* (- 123) (+ 45 6))");
    }

    #[test]
    fn statements_print_as_blocks() {
        let function = Rc::new(FunctionLiteral {
            name: Some("main".to_string()),
            params: vec!["a".to_string(), "b".to_string()],
            body: vec![
                Statement::Let {
                    name: "s".to_string(),
                    initializer: Some(Expression::Literal(Literal::String("x".into()))),
                },
                Statement::Return(None),
            ],
        });
        let mut visitor = AstPrinter {};
        assert_eq!(
            visitor.print_program(&[Statement::Function(function), Statement::Empty]),
            "(function main (a b) (block (let s \"x\") (return)))\n(;)"
        );
    }

    #[test]
    fn assignable_targets() {
        assert!(Expression::Variable("x".to_string()).is_assignable());
        let index = Expression::Index {
            target: Box::new(Expression::Variable("o".to_string())),
            key: Box::new(Expression::Literal(Literal::String("k".into()))),
        };
        assert!(index.is_assignable());
        assert!(!Expression::Literal(Literal::Nil).is_assignable());
    }
}
