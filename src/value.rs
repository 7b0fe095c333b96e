use crate::callable::{Builtin, Class, Function};
use crate::error::Result;
use crate::heap::{ArrayId, Heap, ObjectId};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(i64),
    String(Rc<str>),
    Object(ObjectId),
    Array(ArrayId),
    Function(Rc<Function>),
    Builtin(Rc<Builtin>),
    Class(Rc<Class>),
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s.into())
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Class(_) => "class",
        }
    }

    pub fn is_truthy(&self, heap: &Heap) -> Result<bool> {
        let truthy = match self {
            Value::Nil => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            Value::Object(id) => !heap.object(*id)?.is_empty(),
            Value::Array(id) => !heap.array(*id)?.is_empty(),
            Value::Function(_) | Value::Builtin(_) | Value::Class(_) => true,
        };
        Ok(truthy)
    }

    /// Same type and same value; containers and callables by identity.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Text as `print` shows it: strings are written raw at the top level and
    /// quoted inside arrays and objects.
    pub fn to_display(&self, heap: &Heap) -> Result<String> {
        let mut out = String::new();
        self.write_display(heap, false, &mut out, &mut Vec::new())?;
        Ok(out)
    }

    fn write_display(
        &self,
        heap: &Heap,
        nested: bool,
        out: &mut String,
        open: &mut Vec<Value>,
    ) -> Result<()> {
        match self {
            Value::Nil => out.push_str("nil"),
            Value::Boolean(b) => out.push_str(&b.to_string()),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::String(s) if nested => out.push_str(&format!("{:?}", s)),
            Value::String(s) => out.push_str(s),
            Value::Function(function) => {
                out.push_str(&format!("function({})", function.name()))
            }
            Value::Builtin(builtin) => out.push_str(&format!("builtin({})", builtin.name)),
            Value::Class(class) => out.push_str(&format!("class({})", class.name)),
            Value::Array(id) => {
                if open.iter().any(|seen| seen.strict_equals(self)) {
                    out.push_str("[...]");
                    return Ok(());
                }
                open.push(self.clone());
                out.push('[');
                for (i, element) in heap.array(*id)?.elements().iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    element.write_display(heap, true, out, open)?;
                }
                out.push(']');
                open.pop();
            }
            Value::Object(id) => {
                if open.iter().any(|seen| seen.strict_equals(self)) {
                    out.push_str("{...}");
                    return Ok(());
                }
                open.push(self.clone());
                out.push('{');
                for (i, (key, value)) in heap.object(*id)?.props().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(key);
                    out.push(':');
                    value.write_display(heap, true, out, open)?;
                }
                out.push('}');
                open.pop();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod value_tests {
    use super::Value;
    use crate::heap::Heap;
    use crate::object::{Array, Object};

    #[test]
    fn truthiness() {
        let mut heap = Heap::new();
        let empty = Value::Array(heap.alloc_array(Array::default()));
        let full = Value::Array(heap.alloc_array(Array::new(vec![Value::Nil])));
        let object = Value::Object(heap.alloc_object(Object::new()));
        assert!(!Value::Nil.is_truthy(&heap).unwrap());
        assert!(!Value::from(0).is_truthy(&heap).unwrap());
        assert!(Value::from(-3).is_truthy(&heap).unwrap());
        assert!(!Value::from("").is_truthy(&heap).unwrap());
        assert!(Value::from("a").is_truthy(&heap).unwrap());
        assert!(!empty.is_truthy(&heap).unwrap());
        assert!(full.is_truthy(&heap).unwrap());
        assert!(!object.is_truthy(&heap).unwrap());
    }

    #[test]
    fn strict_equality() {
        let mut heap = Heap::new();
        let a = Value::Object(heap.alloc_object(Object::new()));
        let b = Value::Object(heap.alloc_object(Object::new()));
        assert!(a.strict_equals(&a.clone()));
        assert!(!a.strict_equals(&b));
        assert!(Value::from("x").strict_equals(&Value::from("x")));
        assert!(!Value::from(1).strict_equals(&Value::from("1")));
        assert!(!Value::Nil.strict_equals(&Value::from(false)));
    }

    #[test]
    fn display_nested_values() {
        let mut heap = Heap::new();
        let inner = heap.alloc_array(Array::new(vec![Value::from(1), Value::from("s")]));
        let mut object = Object::new();
        object.set("b", Value::Array(inner));
        object.set("a", Value::Nil);
        let object = Value::Object(heap.alloc_object(object));
        assert_eq!(object.to_display(&heap).unwrap(), "{a:nil,b:[1,\"s\"]}");
        assert_eq!(Value::from("raw").to_display(&heap).unwrap(), "raw");
    }

    #[test]
    fn display_survives_cycles() {
        let mut heap = Heap::new();
        let id = heap.alloc_array(Array::default());
        heap.array_mut(id).unwrap().push(Value::Array(id));
        assert_eq!(Value::Array(id).to_display(&heap).unwrap(), "[[...]]");
    }
}
