use crate::ast::{Expression, FunctionLiteral, Literal, Statement, SwitchCase};
use crate::error::{Error, Result};
use crate::program::Program;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use num_enum::TryFromPrimitive;
use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::rc::Rc;
use strum_macros::Display;

#[derive(Debug, TryFromPrimitive, Display, PartialEq, PartialOrd, Clone, Copy)]
#[repr(u8)]
enum Precedence {
    None,
    Assignment,       // = += -= ...
    Conditional,      // ?:
    LogicalOr,        // ||
    LogicalAnd,       // &&
    Bitwise,          // & | ^ &^
    Equality,         // == !=
    Comparison,       // < <= > >=
    Shift,            // << >>
    Additive,         // + -
    Multiplicative,   // * / %
    Exponentiation,   // **
    Unary,            // ! + - ^
    PrefixIncrement,  // ++x --x
    PostfixIncrement, // x++ x--
    Indexing,         // . [] () new
}

impl Precedence {
    fn next(self) -> Precedence {
        Precedence::try_from(self as u8 + 1).unwrap_or(Precedence::Indexing)
    }

    fn of_infix(kind: TokenKind) -> Precedence {
        use TokenKind::*;
        match kind {
            Assign => Precedence::Assignment,
            kind if kind.is_compound_assign() => Precedence::Assignment,
            Question => Precedence::Conditional,
            OrOr => Precedence::LogicalOr,
            AndAnd => Precedence::LogicalAnd,
            BitAnd | BitOr | BitXor | BitAndNot => Precedence::Bitwise,
            EqualEqual | BangEqual => Precedence::Equality,
            Greater | GreaterEqual | Less | LessEqual => Precedence::Comparison,
            LeftShift | RightShift => Precedence::Shift,
            Plus | Minus => Precedence::Additive,
            Star | Slash | Percent => Precedence::Multiplicative,
            StarStar => Precedence::Exponentiation,
            Increment | Decrement => Precedence::PostfixIncrement,
            LeftParen | LeftBracket | Dot => Precedence::Indexing,
            _ => Precedence::None,
        }
    }
}

/// Parses a complete source text.
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(source).parse()
}

pub struct Parser {
    scanner: Scanner,
    // Enclosing loops and switches in the current function body.
    breakable: usize,
}

impl Parser {
    pub fn new(source: &str) -> Parser {
        Parser {
            scanner: Scanner::new(source),
            breakable: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        loop {
            let start = self.peek()?;
            if start.kind == TokenKind::EOF {
                break;
            }
            match self.statement()? {
                stmt @ Statement::Let { .. }
                | stmt @ Statement::Function(_)
                | stmt @ Statement::Empty => statements.push(stmt),
                _ => {
                    return Err(error(
                        &start,
                        "only let, function and empty statements are allowed at global scope",
                    ))
                }
            }
        }
        tracing::debug!(statements = statements.len(), "parsed program");
        Ok(Program::new(statements))
    }

    fn statement(&mut self) -> Result<Statement> {
        crate::ensure_sufficient_stack(|| {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Semicolon => Ok(Statement::Empty),
                TokenKind::Let => self.let_statement(),
                TokenKind::Function if self.check(TokenKind::Identifier)? => {
                    Ok(Statement::Function(self.function_literal()?))
                }
                TokenKind::Return => self.return_statement(),
                TokenKind::LeftBrace => Ok(Statement::Block(self.block()?)),
                TokenKind::For => self.for_statement(),
                TokenKind::Break => {
                    if self.breakable == 0 {
                        return Err(error(&token, "break is only allowed inside a loop or switch"));
                    }
                    self.consume(TokenKind::Semicolon)?;
                    Ok(Statement::Break)
                }
                TokenKind::If => self.if_statement(),
                TokenKind::Switch => self.switch_statement(),
                _ => {
                    self.scanner.undo(token);
                    self.expression_statement()
                }
            }
        })
    }

    fn let_statement(&mut self) -> Result<Statement> {
        let name = self.consume(TokenKind::Identifier)?.text;
        let initializer = if self.advance_if(TokenKind::Assign)? {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Let { name, initializer })
    }

    fn return_statement(&mut self) -> Result<Statement> {
        if self.advance_if(TokenKind::Semicolon)? {
            return Ok(Statement::Return(None));
        }
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Return(Some(value)))
    }

    fn expression_statement(&mut self) -> Result<Statement> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Expression(expr))
    }

    /// Statements up to the closing `}`; the opening brace is already consumed.
    fn block(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        while !self.advance_if(TokenKind::RightBrace)? {
            if self.check(TokenKind::EOF)? {
                let token = self.peek()?;
                return Err(unexpected(&token, Some(TokenKind::RightBrace)));
            }
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn breakable_block(&mut self) -> Result<Vec<Statement>> {
        self.consume(TokenKind::LeftBrace)?;
        self.breakable += 1;
        let body = self.block();
        self.breakable -= 1;
        body
    }

    fn for_statement(&mut self) -> Result<Statement> {
        let paren = match self.advance()? {
            token if token.kind == TokenKind::LeftParen => {
                let next = self.peek()?;
                if next.kind == TokenKind::Let || next.kind == TokenKind::Semicolon {
                    true
                } else {
                    self.scanner.undo(token);
                    false
                }
            }
            token => {
                self.scanner.undo(token);
                false
            }
        };

        let (mut init, mut test, mut increment) = (None, None, None);
        if paren || self.check(TokenKind::Let)? || self.check(TokenKind::Semicolon)? {
            if self.advance_if(TokenKind::Let)? {
                init = Some(Box::new(self.let_statement()?));
            } else {
                self.consume(TokenKind::Semicolon)?;
            }
            if !self.check(TokenKind::Semicolon)? {
                test = Some(self.expression()?);
            }
            self.consume(TokenKind::Semicolon)?;
            let end = if paren {
                TokenKind::RightParen
            } else {
                TokenKind::LeftBrace
            };
            if !self.check(end)? {
                increment = Some(self.expression()?);
            }
            if paren {
                self.consume(TokenKind::RightParen)?;
            }
        } else if !self.check(TokenKind::LeftBrace)? {
            test = Some(self.expression()?);
        }

        let body = self.breakable_block()?;
        Ok(Statement::For {
            init,
            test,
            increment,
            body,
        })
    }

    fn if_statement(&mut self) -> Result<Statement> {
        let condition = self.expression()?;
        self.consume(TokenKind::LeftBrace)?;
        let then_branch = self.block()?;
        let else_branch = if self.advance_if(TokenKind::Else)? {
            if self.advance_if(TokenKind::If)? {
                Some(Box::new(self.if_statement()?))
            } else {
                self.consume(TokenKind::LeftBrace)?;
                Some(Box::new(Statement::Block(self.block()?)))
            }
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn switch_statement(&mut self) -> Result<Statement> {
        let subject = self.expression()?;
        self.consume(TokenKind::LeftBrace)?;
        let mut cases = Vec::new();
        let mut default = None;
        self.breakable += 1;
        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::RightBrace => break,
                TokenKind::Case => {
                    let mut labels = vec![self.expression()?];
                    while self.advance_if(TokenKind::Comma)? {
                        labels.push(self.expression()?);
                    }
                    self.consume(TokenKind::Colon)?;
                    let body = self.case_body()?;
                    cases.push(SwitchCase { labels, body });
                }
                TokenKind::Default => {
                    if default.is_some() {
                        return Err(error(&token, "multiple defaults in switch"));
                    }
                    self.consume(TokenKind::Colon)?;
                    default = Some(self.case_body()?);
                }
                _ => return Err(unexpected(&token, Some(TokenKind::Case))),
            }
        }
        self.breakable -= 1;
        Ok(Statement::Switch {
            subject,
            cases,
            default,
        })
    }

    fn case_body(&mut self) -> Result<Vec<Statement>> {
        let mut body = Vec::new();
        loop {
            match self.peek()?.kind {
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace => return Ok(body),
                _ => body.push(self.statement()?),
            }
        }
    }

    /// Parses the rest of a function after the `function` keyword.
    fn function_literal(&mut self) -> Result<Rc<FunctionLiteral>> {
        let name = if self.check(TokenKind::Identifier)? {
            Some(self.advance()?.text)
        } else {
            None
        };
        self.consume(TokenKind::LeftParen)?;
        let mut params: Vec<Token> = Vec::new();
        while !self.advance_if(TokenKind::RightParen)? {
            params.push(self.consume(TokenKind::Identifier)?);
            if !self.advance_if(TokenKind::Comma)? {
                self.consume(TokenKind::RightParen)?;
                break;
            }
        }
        let params = unique_params(params)?;
        self.consume(TokenKind::LeftBrace)?;
        let body = self.function_body()?;
        Ok(Rc::new(FunctionLiteral { name, params, body }))
    }

    fn function_body(&mut self) -> Result<Vec<Statement>> {
        let outer = self.breakable;
        self.breakable = 0;
        let body = self.block();
        self.breakable = outer;
        body
    }

    pub fn expression(&mut self) -> Result<Expression> {
        self.parse_precedence(Precedence::Assignment)
    }

    fn parse_precedence(&mut self, precedence: Precedence) -> Result<Expression> {
        crate::ensure_sufficient_stack(|| {
            let mut left = self.prefix()?;
            loop {
                let token = self.peek()?;
                let infix = Precedence::of_infix(token.kind);
                if infix == Precedence::None || infix < precedence {
                    break;
                }
                self.advance()?;
                left = self.infix(left, token, infix)?;
            }
            Ok(left)
        })
    }

    fn prefix(&mut self) -> Result<Expression> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Not | TokenKind::Plus | TokenKind::Minus | TokenKind::BitXor => {
                let right = self.parse_precedence(Precedence::PrefixIncrement)?;
                Ok(Expression::Unary {
                    operator: token.kind,
                    right: Box::new(right),
                })
            }
            TokenKind::Increment | TokenKind::Decrement => {
                let target = self.parse_precedence(Precedence::PrefixIncrement)?;
                Ok(Expression::Increment {
                    operator: token.kind,
                    prefix: true,
                    target: Box::new(target),
                })
            }
            TokenKind::New => self.new_expression(),
            _ => {
                self.scanner.undo(token);
                self.primary()
            }
        }
    }

    fn infix(
        &mut self,
        left: Expression,
        token: Token,
        precedence: Precedence,
    ) -> Result<Expression> {
        match token.kind {
            TokenKind::Assign => {
                let value = self.parse_precedence(Precedence::Conditional)?;
                Ok(Expression::Assignment {
                    target: Box::new(left),
                    value: Box::new(value),
                })
            }
            kind if kind.is_compound_assign() => {
                let right = self.parse_precedence(Precedence::Conditional)?;
                let operator = kind
                    .compound_operator()
                    .ok_or_else(|| unexpected(&token, None))?;
                Ok(Expression::Assignment {
                    target: Box::new(left.clone()),
                    value: Box::new(Expression::Binary {
                        left: Box::new(left),
                        operator,
                        right: Box::new(right),
                    }),
                })
            }
            TokenKind::Question => {
                let then_branch = self.ternary_branch()?;
                self.consume(TokenKind::Colon)?;
                let else_branch = self.ternary_branch()?;
                Ok(Expression::Ternary {
                    condition: Box::new(left),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                })
            }
            TokenKind::Increment | TokenKind::Decrement => Ok(Expression::Increment {
                operator: token.kind,
                prefix: false,
                target: Box::new(left),
            }),
            TokenKind::LeftParen => {
                let arguments = self.arguments(TokenKind::RightParen)?;
                Ok(Expression::Call {
                    callee: Box::new(left),
                    arguments,
                })
            }
            TokenKind::LeftBracket | TokenKind::Dot => self.index(left, token),
            kind => {
                let next = if kind == TokenKind::StarStar {
                    precedence
                } else {
                    precedence.next()
                };
                let right = self.parse_precedence(next)?;
                Ok(Expression::Binary {
                    left: Box::new(left),
                    operator: kind,
                    right: Box::new(right),
                })
            }
        }
    }

    fn ternary_branch(&mut self) -> Result<Expression> {
        let branch = self.parse_precedence(Precedence::Conditional.next())?;
        let token = self.peek()?;
        if token.kind == TokenKind::Question {
            return Err(error(&token, "nested ?: is not allowed"));
        }
        Ok(branch)
    }

    fn index(&mut self, target: Expression, token: Token) -> Result<Expression> {
        let key = if token.kind == TokenKind::Dot {
            let name = self.consume(TokenKind::Identifier)?;
            Expression::Literal(Literal::String(name.text.into()))
        } else {
            let key = self.expression()?;
            self.consume(TokenKind::RightBracket)?;
            key
        };
        Ok(Expression::Index {
            target: Box::new(target),
            key: Box::new(key),
        })
    }

    /// `new C`, `new C(args)`, `new a.b[c](args)`.
    fn new_expression(&mut self) -> Result<Expression> {
        let mut class = self.primary()?;
        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Dot | TokenKind::LeftBracket => class = self.index(class, token)?,
                _ => {
                    self.scanner.undo(token);
                    break;
                }
            }
        }
        let arguments = if self.advance_if(TokenKind::LeftParen)? {
            self.arguments(TokenKind::RightParen)?
        } else {
            Vec::new()
        };
        Ok(Expression::New {
            class: Box::new(class),
            arguments,
        })
    }

    /// Comma separated expressions up to `end`; a trailing comma is allowed.
    fn arguments(&mut self, end: TokenKind) -> Result<Vec<Expression>> {
        let mut arguments = Vec::new();
        while !self.advance_if(end)? {
            arguments.push(self.expression()?);
            if !self.advance_if(TokenKind::Comma)? {
                self.consume(end)?;
                break;
            }
        }
        Ok(arguments)
    }

    fn primary(&mut self) -> Result<Expression> {
        let token = self.advance()?;
        let expr = match token.kind {
            TokenKind::Nil => Expression::Literal(Literal::Nil),
            TokenKind::True => Expression::Literal(Literal::Boolean(true)),
            TokenKind::False => Expression::Literal(Literal::Boolean(false)),
            TokenKind::Number => Expression::Literal(Literal::Number(token.number)),
            TokenKind::String => Expression::Literal(Literal::String(token.text.into())),
            TokenKind::Identifier => {
                if self.advance_if(TokenKind::Lambda)? {
                    self.lambda(vec![token])?
                } else {
                    Expression::Variable(token.text)
                }
            }
            TokenKind::LeftParen => match self.lambda_params()? {
                Some(params) => self.lambda(params)?,
                None => {
                    let expr = self.expression()?;
                    self.consume(TokenKind::RightParen)?;
                    expr
                }
            },
            TokenKind::Function => Expression::Function(self.function_literal()?),
            TokenKind::LeftBrace => self.object_literal()?,
            TokenKind::LeftBracket => Expression::Array(self.arguments(TokenKind::RightBracket)?),
            _ => return Err(unexpected(&token, None)),
        };
        Ok(expr)
    }

    /// After `(`: reads `a, b) =>` and returns the parameters, or puts every
    /// token back and returns `None` when this is not a lambda.
    fn lambda_params(&mut self) -> Result<Option<Vec<Token>>> {
        let mut consumed = Vec::new();
        let mut params = Vec::new();
        let mut want_name = true;
        let is_lambda = loop {
            let token = self.advance()?;
            let kind = token.kind;
            consumed.push(token.clone());
            match kind {
                TokenKind::RightParen => break self.check(TokenKind::Lambda)?,
                TokenKind::Identifier if want_name => params.push(token),
                TokenKind::Comma if !want_name => {}
                _ => break false,
            }
            want_name = !want_name;
        };
        if is_lambda {
            self.advance()?;
            return Ok(Some(params));
        }
        for token in consumed.into_iter().rev() {
            self.scanner.undo(token);
        }
        Ok(None)
    }

    fn lambda(&mut self, params: Vec<Token>) -> Result<Expression> {
        let params = unique_params(params)?;
        let body = if self.advance_if(TokenKind::LeftBrace)? {
            self.function_body()?
        } else {
            vec![Statement::Return(Some(self.expression()?))]
        };
        Ok(Expression::Function(Rc::new(FunctionLiteral {
            name: None,
            params,
            body,
        })))
    }

    fn object_literal(&mut self) -> Result<Expression> {
        let mut entries: Vec<(String, Expression)> = Vec::new();
        let mut keys = BTreeSet::new();
        while !self.advance_if(TokenKind::RightBrace)? {
            let key = self.advance()?;
            if key.kind != TokenKind::String && key.kind != TokenKind::Identifier {
                return Err(unexpected(&key, Some(TokenKind::Identifier)));
            }
            if !keys.insert(key.text.clone()) {
                return Err(error(
                    &key,
                    &format!("duplicate key {:?} in object literal", key.text),
                ));
            }
            self.consume(TokenKind::Colon)?;
            entries.push((key.text, self.expression()?));
            if !self.advance_if(TokenKind::Comma)? {
                self.consume(TokenKind::RightBrace)?;
                break;
            }
        }
        Ok(Expression::Object(entries))
    }

    fn advance(&mut self) -> Result<Token> {
        self.scanner.next_token()
    }

    fn peek(&mut self) -> Result<Token> {
        self.scanner.peek()
    }

    fn check(&mut self, kind: TokenKind) -> Result<bool> {
        Ok(self.peek()?.kind == kind)
    }

    fn advance_if(&mut self, kind: TokenKind) -> Result<bool> {
        let token = self.advance()?;
        if token.kind == kind {
            Ok(true)
        } else {
            self.scanner.undo(token);
            Ok(false)
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token> {
        let token = self.advance()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(&token, Some(kind)))
        }
    }
}

fn unique_params(params: Vec<Token>) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(params.len());
    for param in params {
        if names.contains(&param.text) {
            return Err(error(
                &param,
                &format!("duplicate parameter `{}'", param.text),
            ));
        }
        names.push(param.text);
    }
    Ok(names)
}

fn error(token: &Token, message: &str) -> Error {
    Error::syntax(message, token.line, token.column)
}

fn unexpected(token: &Token, expected: Option<TokenKind>) -> Error {
    let message = match expected {
        Some(kind) => format!("unexpected {}, expected `{}'", token, kind),
        None => format!("unexpected {}", token),
    };
    error(token, &message)
}

#[cfg(test)]
mod parser_tests {
    use crate::ast::{AstPrinter, Statement, Visitor};
    use crate::parser::{self, Precedence};
    use pretty_assertions::assert_eq;

    /// Parses `source` as the only statement of `main` and prints it.
    fn print_stmt(source: &str) -> String {
        let program = parser::parse(&format!("function main() {{ {} }}", source)).unwrap();
        match &program.statements[0] {
            Statement::Function(main) => {
                let mut printer = AstPrinter {};
                printer.visit(&main.body[0])
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    fn print_expr(source: &str) -> String {
        print_stmt(&format!("{};", source))
    }

    fn parse_err(source: &str) -> String {
        let err = parser::parse(source).unwrap_err();
        assert!(err.is_syntax(), "{}", err);
        err.to_string()
    }

    #[test]
    fn precedence_tiers_are_ordered() {
        assert!(Precedence::Assignment < Precedence::Conditional);
        assert!(Precedence::Bitwise < Precedence::Equality);
        assert!(Precedence::Exponentiation < Precedence::Unary);
        assert_eq!(Precedence::Additive.next(), Precedence::Multiplicative);
        assert_eq!(Precedence::Indexing.next(), Precedence::Indexing);
    }

    #[test]
    fn binary_precedence_and_associativity() {
        assert_eq!(print_expr("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(print_expr("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(print_expr("2 ** 3 ** 2"), "(** 2 (** 3 2))");
        assert_eq!(print_expr("a || b && c"), "(|| a (&& b c))");
        assert_eq!(print_expr("a && b || c"), "(|| (&& a b) c)");
        assert_eq!(print_expr("a & b == c"), "(& a (== b c))");
        assert_eq!(print_expr("1 << 2 + 3 < 4"), "(< (<< 1 (+ 2 3)) 4)");
        assert_eq!(print_expr("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    }

    #[test]
    fn prefix_and_postfix() {
        assert_eq!(print_expr("-a.b[1](2)"), "(- (call (index (index a \"b\") 1) 2))");
        assert_eq!(print_expr("x++ + ++y"), "(+ (post++ x) (pre++ y))");
        assert_eq!(print_expr("!^-x"), "(! (^ (- x)))");
        assert_eq!(print_expr("-a ** 2"), "(** (- a) 2)");
    }

    #[test]
    fn assignments() {
        assert_eq!(print_expr("x = 3 + 4 * 2"), "(= x (+ 3 (* 4 2)))");
        assert_eq!(print_expr("x += 2"), "(= x (+ x 2))");
        assert_eq!(print_expr("o.k &^= 1"), "(= (index o \"k\") (&^ (index o \"k\") 1))");
    }

    #[test]
    fn ternaries() {
        assert_eq!(print_expr("c ? 1 : 2"), "(?: c 1 2)");
        assert_eq!(print_expr("x = a || b ? 1 : 2"), "(= x (?: (|| a b) 1 2))");
        assert_eq!(print_expr("c ? (d ? 1 : 2) : 3"), "(?: c (?: d 1 2) 3)");
        assert!(parse_err("function main() { c ? d ? 1 : 2 : 3; }").contains("nested ?:"));
        assert!(parse_err("function main() { c ? 1 : d ? 2 : 3; }").contains("nested ?:"));
    }

    #[test]
    fn literals() {
        assert_eq!(print_expr("[1, \"a\", nil,]"), "(array 1 \"a\" nil)");
        assert_eq!(
            print_stmt("let o = {a: 1, \"b\": true,};"),
            "(let o (object (a 1) (b true)))"
        );
        assert!(parse_err("let o = {\"a\": 1, \"a\": 2};").contains("duplicate key"));
        assert!(parse_err("let o = {a: 1, \"a\": 2};").contains("duplicate key"));
    }

    #[test]
    fn functions_and_lambdas() {
        assert_eq!(
            print_expr("x => x + 1"),
            "(function _ (x) (block (return (+ x 1))))"
        );
        assert_eq!(print_expr("(a, b) => a"), "(function _ (a b) (block (return a)))");
        assert_eq!(
            print_expr("() => { return 1; }"),
            "(function _ () (block (return 1)))"
        );
        assert_eq!(print_expr("(a)"), "a");
        assert!(parse_err("function main() { (a, b); }").contains("expected `)'"));
    }

    #[test]
    fn named_function_expression() {
        assert_eq!(
            print_stmt("let f = function fact(n) { return n; }(1);"),
            "(let f (call (function fact (n) (block (return n))) 1))"
        );
        assert!(parse_err("function f(a, a) {}").contains("duplicate parameter"));
        assert!(parse_err("let f = (a, a) => 1;").contains("duplicate parameter"));
    }

    #[test]
    fn new_expressions() {
        assert_eq!(print_expr("new Object()"), "(new Object)");
        assert_eq!(print_expr("new Array(3).length"), "(index (new Array 3) \"length\")");
        assert_eq!(print_expr("new global.Array"), "(new (index global \"Array\"))");
    }

    #[test]
    fn for_forms() {
        assert_eq!(print_stmt("for { break; }"), "(for _ _ _ (block (break)))");
        assert_eq!(print_stmt("for x < 3 { }"), "(for _ (< x 3) _ (block))");
        assert_eq!(
            print_stmt("for let i = 0; i < 3; i++ { }"),
            "(for (let i 0) (< i 3) (post++ i) (block))"
        );
        assert_eq!(
            print_stmt("for (let i = 0; i < 3; i++) { if (i == 1) { break; } }"),
            "(for (let i 0) (< i 3) (post++ i) (block (if (== i 1) (block (break)))))"
        );
        assert_eq!(print_stmt("for ;; { }"), "(for _ _ _ (block))");
        assert_eq!(print_stmt("for (x) { }"), "(for _ x _ (block))");
    }

    #[test]
    fn if_chains() {
        assert_eq!(
            print_stmt("if a { 1; } else if b { 2; } else { 3; }"),
            "(if a (block 1) (if b (block 2) (block 3)))"
        );
    }

    #[test]
    fn switch_statements() {
        assert_eq!(
            print_stmt("switch x { case 1, 2: a; break; default: b; }"),
            "(switch x (case (1 2) (block a (break))) (default (block b)))"
        );
        assert!(parse_err("function main() { switch x { default: default: } }")
            .contains("multiple defaults"));
    }

    #[test]
    fn break_placement() {
        assert!(parse_err("function main() { break; }").contains("break is only allowed"));
        assert!(
            parse_err("function main() { for { let f = function() { break; }; } }")
                .contains("break is only allowed")
        );
        assert_eq!(
            print_stmt("for { switch 1 { case 1: break; } }"),
            "(for _ _ _ (block (switch 1 (case (1) (block (break))))))"
        );
    }

    #[test]
    fn global_statement_restriction() {
        assert!(parser::parse("let x = 1; ; function main() {}").is_ok());
        assert!(parse_err("x = 1;").contains("global scope"));
        assert!(parse_err("if x { }").contains("global scope"));
        assert!(parse_err("function() {}();").contains("global scope"));
    }

    #[test]
    fn syntax_errors_name_tokens() {
        assert_eq!(
            parse_err("let x = 1"),
            "[line 1, col 10] SyntaxError: unexpected `EOF', expected `;'"
        );
        assert_eq!(
            parse_err("function main() {\n  1 + ;\n}"),
            "[line 2, col 7] SyntaxError: unexpected `;'"
        );
        assert!(parse_err("function main() {").contains("expected `}'"));
    }
}
