use crate::callable::{Builtin, Class, NativeFn};
use crate::error::{Error, Result};
use crate::heap::{ArrayId, Heap, ObjectId, ScopeId};
use crate::interpreter::Interpreter;
use crate::object::{Array, Object};
use crate::value::Value;
use std::convert::TryFrom;
use std::io::Write;
use std::rc::Rc;

/// Largest size `new Array(n)` accepts.
const MAX_ARRAY_SIZE: usize = 1 << 24;

const ARRAY_METHODS: [(&str, NativeFn); 9] = [
    ("push", array_push),
    ("pop", array_pop),
    ("join", array_join),
    ("each", array_each),
    ("map", array_map),
    ("filter", array_filter),
    ("where", array_filter),
    ("find", array_find),
    ("reduce", array_reduce),
];

const STRING_METHODS: [(&str, NativeFn); 3] = [
    ("len", string_len),
    ("lower", string_lower),
    ("upper", string_upper),
];

/// Allocates the object bound to `global` in the root scope.
pub fn global_object(heap: &mut Heap) -> ObjectId {
    let mut global = Object::new();
    let functions: [(&'static str, NativeFn); 3] =
        [("print", print), ("println", println), ("len", len)];
    for (name, func) in functions.iter() {
        global.set(name, Value::Builtin(Rc::new(Builtin::new(*name, Value::Nil, *func))));
    }
    global.set("Object", Value::Class(Rc::new(Class::new("Object", new_object))));
    global.set("Array", Value::Class(Rc::new(Class::new("Array", new_array))));
    heap.alloc_object(global)
}

/// Names that string keys on an array resolve to before extra properties.
pub fn is_array_member(key: &str) -> bool {
    key == "length" || ARRAY_METHODS.iter().any(|(name, _)| *name == key)
}

/// `array.key`: the length, a method bound to the array, an extra property
/// or nil.
pub fn array_member(heap: &Heap, id: ArrayId, key: &str) -> Result<Value> {
    let array = heap.array(id)?;
    if key == "length" {
        return Ok(Value::Number(array.len() as i64));
    }
    if let Some((name, func)) = ARRAY_METHODS.iter().find(|(name, _)| *name == key) {
        return Ok(Value::Builtin(Rc::new(Builtin::new(*name, Value::Array(id), *func))));
    }
    Ok(array.prop(key).cloned().unwrap_or(Value::Nil))
}

/// `string.key`: a method bound to the string or nil.
pub fn string_member(s: &Rc<str>, key: &str) -> Value {
    match STRING_METHODS.iter().find(|(name, _)| *name == key) {
        Some((name, func)) => {
            Value::Builtin(Rc::new(Builtin::new(*name, Value::String(s.clone()), *func)))
        }
        None => Value::Nil,
    }
}

fn write_values(interpreter: &mut Interpreter, arguments: &[Value]) -> Result<()> {
    let mut line = String::new();
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&argument.to_display(&interpreter.heap)?);
    }
    interpreter.out.write_all(line.as_bytes())?;
    Ok(())
}

fn print(
    interpreter: &mut Interpreter,
    _: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    write_values(interpreter, &arguments)?;
    Ok(Value::Nil)
}

fn println(
    interpreter: &mut Interpreter,
    _: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    write_values(interpreter, &arguments)?;
    interpreter.out.write_all(b"\n")?;
    Ok(Value::Nil)
}

fn len(
    interpreter: &mut Interpreter,
    _: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    let length = match arguments.first() {
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(id)) => interpreter.heap.array(*id)?.len(),
        Some(Value::Object(id)) => interpreter.heap.object(*id)?.len(),
        Some(other) => {
            return Err(Error::Type(format!(
                "len() takes a string, array or object, not {}",
                other.type_name()
            )))
        }
        None => return Err(Error::Type("len() takes one argument".to_string())),
    };
    Ok(Value::Number(length as i64))
}

fn new_object(interpreter: &mut Interpreter, _: Vec<Value>) -> Result<Value> {
    Ok(Value::Object(interpreter.heap.alloc_object(Object::new())))
}

fn new_array(interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
    let size = match arguments.first() {
        None => 0,
        Some(Value::Number(n)) if *n < 0 => {
            return Err(Error::Range(format!("negative array size {}", n)))
        }
        Some(Value::Number(n)) => match usize::try_from(*n) {
            Ok(size) if size <= MAX_ARRAY_SIZE => size,
            _ => {
                return Err(Error::Range(format!(
                    "array size {} exceeds {}",
                    n, MAX_ARRAY_SIZE
                )))
            }
        },
        Some(other) => {
            return Err(Error::Type(format!(
                "array size must be a number, not {}",
                other.type_name()
            )))
        }
    };
    let array = Array::new(vec![Value::Nil; size]);
    Ok(Value::Array(interpreter.heap.alloc_array(array)))
}

fn receiver_array(receiver: &Value) -> Result<ArrayId> {
    match receiver {
        Value::Array(id) => Ok(*id),
        other => Err(Error::Internal(format!(
            "array method bound to {}",
            other.type_name()
        ))),
    }
}

fn receiver_string(receiver: &Value) -> Result<&str> {
    match receiver {
        Value::String(s) => Ok(s),
        other => Err(Error::Internal(format!(
            "string method bound to {}",
            other.type_name()
        ))),
    }
}

fn callback(arguments: &[Value], method: &str) -> Result<Value> {
    match arguments.first() {
        Some(f @ Value::Function(_)) | Some(f @ Value::Builtin(_)) => Ok(f.clone()),
        Some(other) => Err(Error::NotCallable(other.type_name().to_string())),
        None => Err(Error::Type(format!("{}() takes a function", method))),
    }
}

fn array_push(
    interpreter: &mut Interpreter,
    receiver: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    let array = interpreter.heap.array_mut(receiver_array(receiver)?)?;
    for argument in arguments {
        array.push(argument);
    }
    Ok(Value::Number(array.len() as i64))
}

fn array_pop(
    interpreter: &mut Interpreter,
    receiver: &Value,
    _: ScopeId,
    _: Vec<Value>,
) -> Result<Value> {
    let array = interpreter.heap.array_mut(receiver_array(receiver)?)?;
    Ok(array.pop().unwrap_or(Value::Nil))
}

fn array_join(
    interpreter: &mut Interpreter,
    receiver: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    let separator = match arguments.first() {
        None => ",".to_string(),
        Some(Value::String(s)) => s.to_string(),
        Some(other) => {
            return Err(Error::Type(format!(
                "join() separator must be a string, not {}",
                other.type_name()
            )))
        }
    };
    let heap = &interpreter.heap;
    let parts = heap
        .array(receiver_array(receiver)?)?
        .elements()
        .iter()
        .map(|element| element.to_display(heap))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::from(parts.join(separator.as_str())))
}

fn element_at(heap: &Heap, id: ArrayId, index: usize) -> Result<Option<Value>> {
    Ok(heap.array(id)?.elements().get(index).cloned())
}

/// Calls `f(element, index, array)` for each element present when the
/// iteration reaches it, stopping early when `visit` returns false. The
/// element and the result stay rooted until the calling statement ends.
fn for_each_element(
    interpreter: &mut Interpreter,
    receiver: &Value,
    f: &Value,
    mut visit: impl FnMut(&mut Interpreter, Value, Value) -> Result<bool>,
) -> Result<()> {
    let id = receiver_array(receiver)?;
    let mut index = 0;
    while let Some(element) = element_at(&interpreter.heap, id, index)? {
        let arguments = vec![element.clone(), Value::Number(index as i64), receiver.clone()];
        let result = interpreter.call_value(f, arguments)?;
        interpreter.root(element.clone());
        interpreter.root(result.clone());
        if !visit(interpreter, element, result)? {
            break;
        }
        index += 1;
    }
    Ok(())
}

fn array_each(
    interpreter: &mut Interpreter,
    receiver: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    let f = callback(&arguments, "each")?;
    for_each_element(interpreter, receiver, &f, |_, _, _| Ok(true))?;
    Ok(Value::Nil)
}

fn array_map(
    interpreter: &mut Interpreter,
    receiver: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    let f = callback(&arguments, "map")?;
    let mut mapped = Vec::new();
    for_each_element(interpreter, receiver, &f, |_, _, result| {
        mapped.push(result);
        Ok(true)
    })?;
    Ok(Value::Array(interpreter.heap.alloc_array(Array::new(mapped))))
}

fn array_filter(
    interpreter: &mut Interpreter,
    receiver: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    let f = callback(&arguments, "filter")?;
    let mut kept = Vec::new();
    for_each_element(interpreter, receiver, &f, |interpreter, element, result| {
        if result.is_truthy(&interpreter.heap)? {
            kept.push(element);
        }
        Ok(true)
    })?;
    Ok(Value::Array(interpreter.heap.alloc_array(Array::new(kept))))
}

fn array_find(
    interpreter: &mut Interpreter,
    receiver: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    let f = callback(&arguments, "find")?;
    let mut found = Value::Nil;
    for_each_element(interpreter, receiver, &f, |interpreter, element, result| {
        if result.is_truthy(&interpreter.heap)? {
            found = element;
            return Ok(false);
        }
        Ok(true)
    })?;
    Ok(found)
}

fn array_reduce(
    interpreter: &mut Interpreter,
    receiver: &Value,
    _: ScopeId,
    arguments: Vec<Value>,
) -> Result<Value> {
    let f = callback(&arguments, "reduce")?;
    let mut memo = arguments.get(1).cloned().unwrap_or(Value::Nil);
    let id = receiver_array(receiver)?;
    let mut index = 0;
    while let Some(element) = element_at(&interpreter.heap, id, index)? {
        let arguments = vec![memo, element, Value::Number(index as i64), receiver.clone()];
        memo = interpreter.call_value(&f, arguments)?;
        interpreter.root(memo.clone());
        index += 1;
    }
    Ok(memo)
}

fn string_len(_: &mut Interpreter, receiver: &Value, _: ScopeId, _: Vec<Value>) -> Result<Value> {
    Ok(Value::Number(receiver_string(receiver)?.chars().count() as i64))
}

fn string_lower(_: &mut Interpreter, receiver: &Value, _: ScopeId, _: Vec<Value>) -> Result<Value> {
    Ok(Value::from(receiver_string(receiver)?.to_lowercase()))
}

fn string_upper(_: &mut Interpreter, receiver: &Value, _: ScopeId, _: Vec<Value>) -> Result<Value> {
    Ok(Value::from(receiver_string(receiver)?.to_uppercase()))
}

#[cfg(test)]
mod builtins_tests {
    use crate::config::Config;
    use crate::error::Error;
    use crate::interpreter::Interpreter;
    use crate::parser;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs `body` inside `main` and returns everything it printed.
    fn printed(body: &str) -> Result<String, Error> {
        let captured = Captured::default();
        let mut interpreter =
            Interpreter::with_output(Config::default(), Box::new(captured.clone()));
        let program = parser::parse(&format!("function main() {{ {} }}", body))?;
        interpreter.run_program(&program)?;
        let bytes = captured.0.borrow().clone();
        Ok(String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn print_and_println() {
        assert_eq!(printed("print(\"a\", 1); print(\"b\");").unwrap(), "a 1b");
        assert_eq!(printed("println(nil, false, [\"q\"]);").unwrap(), "nil false [\"q\"]\n");
        assert_eq!(printed("global.println(\"via global\");").unwrap(), "via global\n");
    }

    #[test]
    fn len_of_each_container() {
        assert_eq!(
            printed("println(len(\"héllo\"), len([1, 2]), len({a: 1, b: 2, c: 3}));").unwrap(),
            "5 2 3\n"
        );
        assert!(matches!(printed("len(1);"), Err(Error::Type(_))));
        assert!(matches!(printed("len();"), Err(Error::Type(_))));
    }

    #[test]
    fn push_pop_and_length() {
        let body = "let a = []; println(a.push(1, 2, 3), a.length, a.pop(), a); println([].pop());";
        assert_eq!(printed(body).unwrap(), "3 3 3 [1,2]\nnil\n");
    }

    #[test]
    fn join_uses_display_text() {
        assert_eq!(
            printed("println([1, \"b\", nil].join(\"-\"), [1, 2].join());").unwrap(),
            "1-b-nil 1,2\n"
        );
        assert!(matches!(printed("[1].join(2);"), Err(Error::Type(_))));
    }

    #[test]
    fn callbacks_receive_element_index_and_array() {
        assert_eq!(
            printed("[\"x\", \"y\"].each((e, i, a) => println(e, i, a.length));").unwrap(),
            "x 0 2\ny 1 2\n"
        );
        assert_eq!(
            printed("println([1, 2, 3].map(x => x * x), [1, 2, 3, 4].filter((x, i) => i % 2));")
                .unwrap(),
            "[1,4,9] [2,4]\n"
        );
        assert_eq!(
            printed("println([5, 8, 9].find(x => x > 6), [1].find(x => false));").unwrap(),
            "8 nil\n"
        );
        assert_eq!(
            printed("println([1, 2, 3].reduce((memo, x, i) => memo + x * i, 10));").unwrap(),
            "18\n"
        );
    }

    #[test]
    fn where_is_filter() {
        assert_eq!(
            printed("println([1, 2, 3, 4].where(x => x % 2 == 0), [1].where);").unwrap(),
            "[2,4] builtin(where)\n"
        );
    }

    #[test]
    fn callbacks_must_be_callable() {
        assert!(matches!(printed("[1].map(3);"), Err(Error::NotCallable(_))));
        assert!(matches!(printed("[1].each();"), Err(Error::Type(_))));
        assert_eq!(printed("println([\"a\"].map(len));").unwrap(), "[1]\n");
    }

    #[test]
    fn array_members_are_read_only() {
        assert!(matches!(printed("let a = []; a.length = 3;"), Err(Error::NotAssignable(_))));
        assert!(matches!(printed("let a = []; a.push = 3;"), Err(Error::NotAssignable(_))));
        assert_eq!(printed("let a = []; println(a.missing);").unwrap(), "nil\n");
    }

    #[test]
    fn string_methods() {
        assert_eq!(
            printed("let s = \"MiXed\"; println(s.len(), s.lower(), s.upper(), s.other);").unwrap(),
            "5 mixed MIXED nil\n"
        );
    }

    #[test]
    fn classes() {
        assert_eq!(
            printed("println(new Array(2), new Array(), new Object(), Array);").unwrap(),
            "[nil,nil] [] {} class(Array)\n"
        );
        assert!(matches!(printed("new Array(\"x\");"), Err(Error::Type(_))));
    }

    #[test]
    fn array_size_is_bounded() {
        assert!(matches!(printed("new Array(4611686018427387904);"), Err(Error::Range(_))));
        assert!(matches!(printed("new Array(-1);"), Err(Error::Range(_))));
        assert_eq!(printed("println(new Array(0).length);").unwrap(), "0\n");
    }

    #[test]
    fn builtins_are_values() {
        let mut interpreter = Interpreter::with_output(Config::default(), Box::new(io::sink()));
        let program = parser::parse("function main() { let p = println; return p; }").unwrap();
        let value = interpreter.run_program(&program).unwrap();
        assert!(matches!(value, Value::Builtin(_)));
    }
}
