use crate::error::{Error, Result};
use crate::token::{Token, TokenKind};
use phf::phf_map;
use std::collections::VecDeque;

/// Lazy tokenizer with a pushback buffer.
///
/// Tokens handed back through [`Scanner::undo`] are replayed before any new
/// input is read, most recently undone first, so undoing several tokens in
/// reverse order restores the original stream.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    // Column reached at the end of each finished line, for rewinding.
    line_widths: Vec<usize>,
    buffer: VecDeque<Token>,
}

/// Tokenizes the whole source, including the trailing EOF token.
pub fn scan_tokens(source: &str) -> Result<Vec<Token>> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token()?;
        let done = token.kind == TokenKind::EOF;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl Scanner {
    pub fn new(source: &str) -> Scanner {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            line_widths: Vec::new(),
            buffer: VecDeque::new(),
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        match self.buffer.pop_front() {
            Some(token) => Ok(token),
            None => self.scan_token(),
        }
    }

    pub fn peek(&mut self) -> Result<Token> {
        let token = self.next_token()?;
        self.undo(token.clone());
        Ok(token)
    }

    pub fn undo(&mut self, token: Token) {
        self.buffer.push_front(token);
    }

    fn scan_token(&mut self) -> Result<Token> {
        loop {
            let (line, column) = (self.line, self.column);
            let c = match self.read() {
                None => return Ok(Token::new(TokenKind::EOF, line, column)),
                Some(c) => c,
            };
            let kind = match c {
                ' ' | '\t' | '\r' | '\n' => continue,
                '0'..='9' => {
                    self.unread();
                    let mut token = Token::new(TokenKind::Number, line, column);
                    token.number = self.number(line, column)?;
                    self.check_follow()?;
                    return Ok(token);
                }
                'a'..='z' | 'A'..='Z' | '_' => {
                    self.unread();
                    return self.identifier(line, column);
                }
                '"' => {
                    let mut token = Token::new(TokenKind::String, line, column);
                    token.text = self.string(line, column)?;
                    self.check_follow()?;
                    return Ok(token);
                }
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '{' => TokenKind::LeftBrace,
                '}' => TokenKind::RightBrace,
                '[' => TokenKind::LeftBracket,
                ']' => TokenKind::RightBracket,
                '.' => TokenKind::Dot,
                ',' => TokenKind::Comma,
                ':' => TokenKind::Colon,
                '?' => TokenKind::Question,
                ';' => TokenKind::Semicolon,
                '+' => {
                    use TokenKind::{Increment, Plus, PlusAssign};
                    self.iiif('+', '=', Increment, PlusAssign, Plus)
                }
                '-' => {
                    use TokenKind::{Decrement, Minus, MinusAssign};
                    self.iiif('-', '=', Decrement, MinusAssign, Minus)
                }
                '*' => {
                    if self.next_if('*') {
                        self.iif('=', TokenKind::StarStarAssign, TokenKind::StarStar)
                    } else {
                        self.iif('=', TokenKind::StarAssign, TokenKind::Star)
                    }
                }
                '/' => {
                    if self.next_if('/') {
                        self.skip_comment();
                        continue;
                    }
                    self.iif('=', TokenKind::SlashAssign, TokenKind::Slash)
                }
                '%' => self.iif('=', TokenKind::PercentAssign, TokenKind::Percent),
                '=' => {
                    self.iiif('=', '>', TokenKind::EqualEqual, TokenKind::Lambda, TokenKind::Assign)
                }
                '>' => {
                    if self.next_if('>') {
                        self.iif('=', TokenKind::RightShiftAssign, TokenKind::RightShift)
                    } else {
                        self.iif('=', TokenKind::GreaterEqual, TokenKind::Greater)
                    }
                }
                '<' => {
                    if self.next_if('<') {
                        self.iif('=', TokenKind::LeftShiftAssign, TokenKind::LeftShift)
                    } else {
                        self.iif('=', TokenKind::LessEqual, TokenKind::Less)
                    }
                }
                '!' => self.iif('=', TokenKind::BangEqual, TokenKind::Not),
                '&' => {
                    if self.next_if('&') {
                        TokenKind::AndAnd
                    } else if self.next_if('^') {
                        self.iif('=', TokenKind::AndNotAssign, TokenKind::BitAndNot)
                    } else {
                        self.iif('=', TokenKind::AndAssign, TokenKind::BitAnd)
                    }
                }
                '|' => self.iiif('|', '=', TokenKind::OrOr, TokenKind::OrAssign, TokenKind::BitOr),
                '^' => self.iif('=', TokenKind::XorAssign, TokenKind::BitXor),
                _ => {
                    return Err(Error::syntax(
                        format!("unexpected character `{}'", c),
                        line,
                        column,
                    ))
                }
            };
            return Ok(Token::new(kind, line, column));
        }
    }

    fn read(&mut self) -> Option<char> {
        let c = *self.chars.get(self.pos)?;
        self.pos += 1;
        if c == '\n' {
            self.line_widths.push(self.column);
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn unread(&mut self) {
        if self.pos == 0 {
            return;
        }
        self.pos -= 1;
        if self.chars[self.pos] == '\n' {
            self.line -= 1;
            self.column = self.line_widths.pop().unwrap_or(1);
        } else {
            self.column -= 1;
        }
    }

    fn next_if(&mut self, expected: char) -> bool {
        match self.read() {
            Some(c) if c == expected => true,
            Some(_) => {
                self.unread();
                false
            }
            None => false,
        }
    }

    fn iif(&mut self, c: char, matched: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.next_if(c) {
            matched
        } else {
            otherwise
        }
    }

    fn iiif(
        &mut self,
        c1: char,
        c2: char,
        first: TokenKind,
        second: TokenKind,
        otherwise: TokenKind,
    ) -> TokenKind {
        if self.next_if(c1) {
            first
        } else if self.next_if(c2) {
            second
        } else {
            otherwise
        }
    }

    /// Rejects tokens glued to a following word or string, like `1abc`.
    fn check_follow(&mut self) -> Result<()> {
        let (line, column) = (self.line, self.column);
        if let Some(c) = self.read() {
            self.unread();
            if c.is_ascii_alphanumeric() || c == '_' || c == '"' {
                return Err(Error::syntax(
                    format!("unexpected follow character `{}'", c),
                    line,
                    column,
                ));
            }
        }
        Ok(())
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.read() {
            if c == '\n' {
                break;
            }
        }
    }

    fn number(&mut self, line: usize, column: usize) -> Result<i64> {
        let mut value: i64 = 0;
        while let Some(c) = self.read() {
            let digit = match c.to_digit(10) {
                Some(digit) => digit,
                None => {
                    self.unread();
                    break;
                }
            };
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(digit)))
                .ok_or_else(|| Error::syntax("integer literal is too large", line, column))?;
        }
        Ok(value)
    }

    fn identifier(&mut self, line: usize, column: usize) -> Result<Token> {
        let mut name = String::new();
        while let Some(c) = self.read() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
            } else {
                self.unread();
                break;
            }
        }
        self.check_follow()?;
        let token = match KEYWORDS.get(name.as_str()) {
            Some(kind) => Token::new(*kind, line, column),
            None => {
                let mut token = Token::new(TokenKind::Identifier, line, column);
                token.text = name;
                token
            }
        };
        Ok(token)
    }

    fn string(&mut self, line: usize, column: usize) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.read() {
                None => {
                    return Err(Error::syntax("unterminated string literal", line, column));
                }
                Some('"') => return Ok(text),
                Some('\\') => {
                    let (esc_line, esc_column) = (self.line, self.column);
                    let escaped = match self.read() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => {
                            return Err(Error::syntax(
                                format!("unknown escape sequence `\\{}'", other),
                                esc_line,
                                esc_column,
                            ));
                        }
                        None => {
                            return Err(Error::syntax(
                                "unterminated string literal",
                                line,
                                column,
                            ));
                        }
                    };
                    text.push(escaped);
                }
                Some(c) => text.push(c),
            }
        }
    }
}

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "break" => TokenKind::Break,
    "case" => TokenKind::Case,
    "default" => TokenKind::Default,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "function" => TokenKind::Function,
    "if" => TokenKind::If,
    "let" => TokenKind::Let,
    "new" => TokenKind::New,
    "nil" => TokenKind::Nil,
    "return" => TokenKind::Return,
    "switch" => TokenKind::Switch,
    "true" => TokenKind::True,
};

#[cfg(test)]
mod scanner_tests {
    use crate::scanner::{self, Scanner};
    use crate::token::TokenKind;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scanner::scan_tokens(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn basic_scanner_test() {
        let tokens = scanner::scan_tokens("x = 2").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "x");
        assert_eq!(tokens[1].kind, TokenKind::Assign);
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].number, 2);
        assert_eq!(tokens[3].kind, TokenKind::EOF);
    }

    #[test]
    fn number_parsing() {
        let tokens = scanner::scan_tokens("1+23").unwrap();
        assert_eq!(tokens[0].number, 1);
        assert_eq!(tokens[1].kind, TokenKind::Plus);
        assert_eq!(tokens[2].number, 23);
        assert!(scanner::scan_tokens("99999999999999999999").is_err());
    }

    #[test]
    fn operators_use_longest_match() {
        use TokenKind::*;
        assert_eq!(
            kinds("+ ++ += * ** *= **= < <= << <<= > >= >> >>="),
            vec![
                Plus, Increment, PlusAssign, Star, StarStar, StarAssign, StarStarAssign, Less,
                LessEqual, LeftShift, LeftShiftAssign, Greater, GreaterEqual, RightShift,
                RightShiftAssign, EOF
            ]
        );
        assert_eq!(
            kinds("& && &= &^ &^= | || |= ^ ^= = == => ! != - -- -= / /= % %="),
            vec![
                BitAnd, AndAnd, AndAssign, BitAndNot, AndNotAssign, BitOr, OrOr, OrAssign,
                BitXor, XorAssign, Assign, EqualEqual, Lambda, Not, BangEqual, Minus,
                Decrement, MinusAssign, Slash, SlashAssign, Percent, PercentAssign, EOF
            ]
        );
    }

    #[test]
    fn keywords_win_over_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("let letter function new nil true false _x"),
            vec![Let, Identifier, Function, New, Nil, True, False, Identifier, EOF]
        );
    }

    #[test]
    fn comments_are_skipped() {
        use TokenKind::*;
        assert_eq!(kinds("a // b c\n d"), vec![Identifier, Identifier, EOF]);
        assert_eq!(kinds("// only a comment"), vec![EOF]);
    }

    #[test]
    fn strings_and_escapes() {
        let tokens = scanner::scan_tokens(r#""a\tb\n\"c\"" "x\\y""#).unwrap();
        assert_eq!(tokens[0].text, "a\tb\n\"c\"");
        assert_eq!(tokens[1].text, "x\\y");
        assert!(scanner::scan_tokens(r#""bad \q""#).is_err());
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = scanner::scan_tokens("let a;\n  b = 10;").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
        assert_eq!((tokens[5].line, tokens[5].column), (2, 7));
    }

    #[test]
    fn lexical_errors() {
        for source in ["1abc", "abc\"x\"", "\"abc", "@", "a # b"].iter() {
            let err = scanner::scan_tokens(source).unwrap_err();
            assert!(err.is_syntax(), "{}: {}", source, err);
        }
        let err = scanner::scan_tokens("a\n  $").unwrap_err();
        assert_eq!(err.to_string(), "[line 2, col 3] SyntaxError: unexpected character `$'");
    }

    #[test]
    fn undo_restores_peek() {
        let mut scanner = Scanner::new("foo ( 1 ) bar");
        let before = scanner.peek().unwrap();
        let token = scanner.next_token().unwrap();
        assert_eq!(token, before);
        scanner.undo(token);
        assert_eq!(scanner.peek().unwrap(), before);

        let first = scanner.next_token().unwrap();
        let second = scanner.next_token().unwrap();
        let third = scanner.next_token().unwrap();
        scanner.undo(third);
        scanner.undo(second);
        scanner.undo(first.clone());
        assert_eq!(scanner.next_token().unwrap(), first);
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::LeftParen);
        assert_eq!(scanner.next_token().unwrap().number, 1);
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::RightParen);
    }
}
