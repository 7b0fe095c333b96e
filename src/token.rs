use std::fmt;
use strum_macros::{Display, EnumIter};

/// Token kinds. The declaration order matters: the compound assignment kinds
/// must stay contiguous, see [`TokenKind::is_compound_assign`].
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum TokenKind {
    #[strum(to_string = "EOF")] EOF,

    // Braces.
    #[strum(to_string = "(")] LeftParen,
    #[strum(to_string = ")")] RightParen,
    #[strum(to_string = "{")] LeftBrace,
    #[strum(to_string = "}")] RightBrace,
    #[strum(to_string = "[")] LeftBracket,
    #[strum(to_string = "]")] RightBracket,

    // Separators.
    #[strum(to_string = ".")] Dot,
    #[strum(to_string = ",")] Comma,
    #[strum(to_string = ";")] Semicolon,
    #[strum(to_string = ":")] Colon,
    #[strum(to_string = "=>")] Lambda,

    // Assignment.
    #[strum(to_string = "=")] Assign,
    #[strum(to_string = "+=")] PlusAssign,
    #[strum(to_string = "-=")] MinusAssign,
    #[strum(to_string = "**=")] StarStarAssign,
    #[strum(to_string = "*=")] StarAssign,
    #[strum(to_string = "/=")] SlashAssign,
    #[strum(to_string = "%=")] PercentAssign,
    #[strum(to_string = "<<=")] LeftShiftAssign,
    #[strum(to_string = ">>=")] RightShiftAssign,
    #[strum(to_string = "&=")] AndAssign,
    #[strum(to_string = "^=")] XorAssign,
    #[strum(to_string = "|=")] OrAssign,
    #[strum(to_string = "&^=")] AndNotAssign,

    // Conditional.
    #[strum(to_string = "?")] Question,

    // Logical.
    #[strum(to_string = "!")] Not,
    #[strum(to_string = "&&")] AndAnd,
    #[strum(to_string = "||")] OrOr,

    // Bitwise.
    #[strum(to_string = "&")] BitAnd,
    #[strum(to_string = "|")] BitOr,
    #[strum(to_string = "^")] BitXor,
    #[strum(to_string = "&^")] BitAndNot,

    // Equality and comparison.
    #[strum(to_string = "==")] EqualEqual,
    #[strum(to_string = "!=")] BangEqual,
    #[strum(to_string = ">")] Greater,
    #[strum(to_string = ">=")] GreaterEqual,
    #[strum(to_string = "<")] Less,
    #[strum(to_string = "<=")] LessEqual,

    // Shift.
    #[strum(to_string = "<<")] LeftShift,
    #[strum(to_string = ">>")] RightShift,

    // Arithmetic.
    #[strum(to_string = "+")] Plus,
    #[strum(to_string = "-")] Minus,
    #[strum(to_string = "*")] Star,
    #[strum(to_string = "/")] Slash,
    #[strum(to_string = "%")] Percent,
    #[strum(to_string = "**")] StarStar,

    #[strum(to_string = "++")] Increment,
    #[strum(to_string = "--")] Decrement,

    // Literals.
    #[strum(to_string = "identifier")] Identifier,
    #[strum(to_string = "string")] String,
    #[strum(to_string = "number")] Number,

    // Keywords.
    #[strum(to_string = "nil")] Nil,
    #[strum(to_string = "true")] True,
    #[strum(to_string = "false")] False,
    #[strum(to_string = "break")] Break,
    #[strum(to_string = "case")] Case,
    #[strum(to_string = "default")] Default,
    #[strum(to_string = "else")] Else,
    #[strum(to_string = "for")] For,
    #[strum(to_string = "function")] Function,
    #[strum(to_string = "if")] If,
    #[strum(to_string = "let")] Let,
    #[strum(to_string = "new")] New,
    #[strum(to_string = "return")] Return,
    #[strum(to_string = "switch")] Switch,
}

impl TokenKind {
    /// `+=`, `*=`, ... but not plain `=`.
    pub fn is_compound_assign(self) -> bool {
        let kind = self as u8;
        kind >= TokenKind::PlusAssign as u8 && kind <= TokenKind::AndNotAssign as u8
    }

    /// The binary operator a compound assignment desugars into.
    pub fn compound_operator(self) -> Option<TokenKind> {
        match self {
            TokenKind::PlusAssign => Some(TokenKind::Plus),
            TokenKind::MinusAssign => Some(TokenKind::Minus),
            TokenKind::StarStarAssign => Some(TokenKind::StarStar),
            TokenKind::StarAssign => Some(TokenKind::Star),
            TokenKind::SlashAssign => Some(TokenKind::Slash),
            TokenKind::PercentAssign => Some(TokenKind::Percent),
            TokenKind::LeftShiftAssign => Some(TokenKind::LeftShift),
            TokenKind::RightShiftAssign => Some(TokenKind::RightShift),
            TokenKind::AndAssign => Some(TokenKind::BitAnd),
            TokenKind::XorAssign => Some(TokenKind::BitXor),
            TokenKind::OrAssign => Some(TokenKind::BitOr),
            TokenKind::AndNotAssign => Some(TokenKind::BitAndNot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Identifier name or string contents; empty for other kinds.
    pub text: String,
    pub number: i64,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Token {
        Token {
            kind,
            text: String::new(),
            number: 0,
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "`{}'", self.text),
            TokenKind::String => write!(f, "\"{}\"", self.text),
            TokenKind::Number => write!(f, "{}", self.number),
            kind => write!(f, "`{}'", kind),
        }
    }
}
