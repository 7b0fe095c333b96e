use thiserror::Error;

/// Every failure the lexer, parser or evaluator can raise.
///
/// Errors unwind to the caller; nothing inside the interpreter recovers from
/// one, so a failure aborts the statement chain that was executing.
#[derive(Debug, Error)]
pub enum Error {
    /// `line` is zero for operator type errors found while evaluating.
    #[error("{}SyntaxError: {message}", position(.line, .column))]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("NameError: {0}")]
    Name(String),
    #[error("TypeError: {0}")]
    Type(String),
    #[error("NotCallableError: {0} is not callable")]
    NotCallable(String),
    #[error("NotIndexableError: {0} is not indexable")]
    NotIndexable(String),
    #[error("NotAssignableError: {0} is not assignable")]
    NotAssignable(String),
    #[error("RangeError: {0}")]
    Range(String),
    #[error("KeyTypeError: cannot use {0} as key")]
    KeyType(String),
    #[error("RecursionError: maximum call depth of {0} exceeded")]
    Recursion(usize),
    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),
    #[error("InternalError: {0}")]
    Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn position(line: &usize, column: &usize) -> String {
    if *line == 0 {
        String::new()
    } else {
        format!("[line {}, col {}] ", line, column)
    }
}

impl Error {
    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Error {
        Error::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    /// The user-facing class name of the error.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Syntax { .. } => "SyntaxError",
            Error::Name(_) => "NameError",
            Error::Type(_) => "TypeError",
            Error::NotCallable(_) => "NotCallableError",
            Error::NotIndexable(_) => "NotIndexableError",
            Error::NotAssignable(_) => "NotAssignableError",
            Error::Range(_) => "RangeError",
            Error::KeyType(_) => "KeyTypeError",
            Error::Recursion(_) => "RecursionError",
            Error::Io(_) => "IOError",
            Error::Internal(_) => "InternalError",
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }
}

#[cfg(test)]
mod error_tests {
    use super::Error;

    #[test]
    fn syntax_errors_carry_position() {
        let err = Error::syntax("unexpected token `)'", 3, 7);
        assert!(err.is_syntax());
        assert_eq!(
            err.to_string(),
            "[line 3, col 7] SyntaxError: unexpected token `)'"
        );
    }

    #[test]
    fn runtime_syntax_errors_have_no_position() {
        let err = Error::syntax("unsupported operator `+'", 0, 0);
        assert_eq!(err.to_string(), "SyntaxError: unsupported operator `+'");
    }

    #[test]
    fn kind_names() {
        assert_eq!(Error::Name("x".into()).kind_name(), "NameError");
        assert_eq!(Error::Range("x".into()).kind_name(), "RangeError");
        assert_eq!(Error::Recursion(10).kind_name(), "RecursionError");
        assert!(!Error::Type("x".into()).is_syntax());
    }
}
