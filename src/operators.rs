use crate::error::{Error, Result};
use crate::token::TokenKind;
use crate::value::Value;

/// `+x`, `-x` and `^x`. Logical not is handled by the evaluator since it
/// accepts any operand.
pub fn unary(operator: TokenKind, operand: &Value) -> Result<Value> {
    let n = match operand {
        Value::Number(n) => *n,
        other => {
            return Err(Error::Type(format!(
                "bad operand type for unary `{}': {}",
                operator,
                other.type_name()
            )))
        }
    };
    match operator {
        TokenKind::Plus => Ok(Value::Number(n)),
        TokenKind::Minus => Ok(Value::Number(n.wrapping_neg())),
        TokenKind::BitXor => Ok(Value::Number(!n)),
        _ => Err(unsupported(operator, operand, operand)),
    }
}

/// Applies an eagerly evaluated binary operator. Both operands must share a
/// runtime type that supports the operator.
pub fn binary(operator: TokenKind, left: &Value, right: &Value) -> Result<Value> {
    use TokenKind::*;
    let value = match (left, right) {
        (Value::Nil, Value::Nil) => match operator {
            EqualEqual => Value::Boolean(true),
            BangEqual => Value::Boolean(false),
            _ => return Err(unsupported(operator, left, right)),
        },
        (Value::Boolean(l), Value::Boolean(r)) => match operator {
            EqualEqual => Value::Boolean(l == r),
            BangEqual => Value::Boolean(l != r),
            _ => return Err(unsupported(operator, left, right)),
        },
        (Value::String(l), Value::String(r)) => match operator {
            Plus => {
                let mut joined = l.to_string();
                joined.push_str(r);
                Value::String(joined.into())
            }
            EqualEqual => Value::Boolean(l == r),
            BangEqual => Value::Boolean(l != r),
            _ => return Err(unsupported(operator, left, right)),
        },
        (Value::Number(l), Value::Number(r)) => number(operator, *l, *r)?,
        _ => return Err(unsupported(operator, left, right)),
    };
    Ok(value)
}

fn number(operator: TokenKind, l: i64, r: i64) -> Result<Value> {
    use TokenKind::*;
    let n = match operator {
        Plus => l.wrapping_add(r),
        Minus => l.wrapping_sub(r),
        Star => l.wrapping_mul(r),
        Slash => {
            if r == 0 {
                return Err(Error::Type("division by zero".to_string()));
            }
            l.wrapping_div(r)
        }
        Percent => {
            if r == 0 {
                return Err(Error::Type("modulo by zero".to_string()));
            }
            l.wrapping_rem(r)
        }
        StarStar => {
            if r < 0 || r > i64::from(u32::MAX) {
                return Err(Error::Type(format!("exponent {} out of range", r)));
            }
            l.wrapping_pow(r as u32)
        }
        LeftShift => {
            let count = shift_count(r)?;
            if count >= 64 {
                0
            } else {
                l << count
            }
        }
        RightShift => {
            let count = shift_count(r)?;
            if count >= 64 {
                if l < 0 {
                    -1
                } else {
                    0
                }
            } else {
                l >> count
            }
        }
        BitAnd => l & r,
        BitOr => l | r,
        BitXor => l ^ r,
        BitAndNot => l & !r,
        EqualEqual => return Ok(Value::Boolean(l == r)),
        BangEqual => return Ok(Value::Boolean(l != r)),
        Less => return Ok(Value::Boolean(l < r)),
        LessEqual => return Ok(Value::Boolean(l <= r)),
        Greater => return Ok(Value::Boolean(l > r)),
        GreaterEqual => return Ok(Value::Boolean(l >= r)),
        _ => return Err(unsupported(operator, &Value::Number(l), &Value::Number(r))),
    };
    Ok(Value::Number(n))
}

fn shift_count(r: i64) -> Result<u32> {
    if r < 0 {
        return Err(Error::Type(format!("negative shift count {}", r)));
    }
    Ok(r.min(64) as u32)
}

fn unsupported(operator: TokenKind, left: &Value, right: &Value) -> Error {
    Error::syntax(
        format!(
            "unsupported operator `{}' for operand types {} and {}",
            operator,
            left.type_name(),
            right.type_name()
        ),
        0,
        0,
    )
}

#[cfg(test)]
mod operators_tests {
    use super::{binary, unary};
    use crate::error::Error;
    use crate::token::TokenKind;
    use crate::value::Value;

    fn num(operator: TokenKind, l: i64, r: i64) -> Result<i64, Error> {
        match binary(operator, &Value::Number(l), &Value::Number(r))? {
            Value::Number(n) => Ok(n),
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn division_matches_native_truncation() {
        let samples = [-7i64, -3, -1, 1, 2, 5, 13, i64::MAX, i64::MIN];
        for &a in samples.iter() {
            for &b in samples.iter() {
                assert_eq!(num(TokenKind::Slash, a, b).unwrap(), a.wrapping_div(b));
                assert_eq!(num(TokenKind::Percent, a, b).unwrap(), a.wrapping_rem(b));
            }
            assert!(matches!(num(TokenKind::Slash, a, 0), Err(Error::Type(_))));
            assert!(matches!(num(TokenKind::Percent, a, 0), Err(Error::Type(_))));
        }
        assert_eq!(num(TokenKind::Slash, -7, 2).unwrap(), -3);
        assert_eq!(num(TokenKind::Percent, -7, 2).unwrap(), -1);
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(num(TokenKind::Plus, i64::MAX, 1).unwrap(), i64::MIN);
        assert_eq!(num(TokenKind::Star, i64::MAX, 2).unwrap(), -2);
        assert_eq!(num(TokenKind::StarStar, 2, 10).unwrap(), 1024);
        assert_eq!(num(TokenKind::StarStar, 2, 64).unwrap(), 0);
        assert!(matches!(num(TokenKind::StarStar, 2, -1), Err(Error::Type(_))));
    }

    #[test]
    fn bitwise_and_shifts() {
        assert_eq!(num(TokenKind::BitAndNot, 0b1111, 0b0101).unwrap(), 0b1010);
        assert_eq!(num(TokenKind::BitXor, 6, 3).unwrap(), 5);
        assert_eq!(num(TokenKind::LeftShift, 1, 4).unwrap(), 16);
        assert_eq!(num(TokenKind::LeftShift, 1, 64).unwrap(), 0);
        assert_eq!(num(TokenKind::RightShift, -16, 2).unwrap(), -4);
        assert_eq!(num(TokenKind::RightShift, -16, 100).unwrap(), -1);
        assert!(matches!(num(TokenKind::LeftShift, 1, -1), Err(Error::Type(_))));
    }

    #[test]
    fn operand_pairs() {
        let ab = binary(TokenKind::Plus, &Value::from("a"), &Value::from("b")).unwrap();
        assert!(ab.strict_equals(&Value::from("ab")));
        let eq = binary(TokenKind::EqualEqual, &Value::Nil, &Value::Nil).unwrap();
        assert!(eq.strict_equals(&Value::from(true)));
        let err = binary(TokenKind::Plus, &Value::from(1), &Value::from("a")).unwrap_err();
        assert!(err.is_syntax());
        assert!(err
            .to_string()
            .contains("unsupported operator `+' for operand types number and string"));
        assert!(binary(TokenKind::Less, &Value::from("a"), &Value::from("b")).is_err());
        assert!(binary(TokenKind::Plus, &Value::from(true), &Value::from(true)).is_err());
    }

    #[test]
    fn unary_requires_numbers() {
        assert!(unary(TokenKind::Minus, &Value::from(5))
            .unwrap()
            .strict_equals(&Value::from(-5)));
        assert!(unary(TokenKind::BitXor, &Value::from(0))
            .unwrap()
            .strict_equals(&Value::from(-1)));
        assert!(matches!(
            unary(TokenKind::Minus, &Value::from("x")),
            Err(Error::Type(_))
        ));
    }
}
