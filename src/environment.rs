use crate::error::{Error, Result};
use crate::heap::{Heap, ObjectId, ScopeId};
use crate::value::Value;

/// Name under which the root scope holds the global object.
pub const GLOBAL: &str = "global";

/// One lexical scope: bindings in definition order plus the two control
/// signals raised by `break` and `return`.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: Vec<(String, Value)>,
    parent: Option<ScopeId>,
    pub broke: bool,
    pub return_value: Option<Value>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Scope {
        Scope {
            parent,
            ..Scope::default()
        }
    }

    /// The outermost scope. Its only binding is the global object.
    pub fn root(global: ObjectId) -> Scope {
        Scope {
            bindings: vec![(GLOBAL.to_string(), Value::Object(global))],
            ..Scope::default()
        }
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn define(&mut self, name: &str, value: Value) -> Result<()> {
        if self.get(name).is_some() {
            return Err(Error::Name(format!("`{}' is already defined", name)));
        }
        self.bindings.push((name.to_string(), value));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.bindings
            .iter_mut()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Clears and returns `(broke, return_value)`.
    pub fn take_signals(&mut self) -> (bool, Option<Value>) {
        let broke = std::mem::replace(&mut self.broke, false);
        (broke, self.return_value.take())
    }

    pub fn has_signal(&self) -> bool {
        self.broke || self.return_value.is_some()
    }

    /// Every value this scope keeps alive.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.bindings
            .iter()
            .map(|(_, value)| value)
            .chain(self.return_value.iter())
    }
}

/// Scope chain operations. They live on the heap because walking to a
/// parent means following a handle.
impl Heap {
    pub fn define(&mut self, scope: ScopeId, name: &str, value: Value) -> Result<()> {
        self.scope_mut(scope)?.define(name, value)
    }

    /// Resolves `name` in `scope`, or along the whole chain and then on the
    /// global object when `cross_scopes` is set.
    pub fn lookup(&self, scope: ScopeId, name: &str, cross_scopes: bool) -> Result<Option<Value>> {
        let mut current = self.scope(scope)?;
        loop {
            if let Some(value) = current.get(name) {
                return Ok(Some(value.clone()));
            }
            if !cross_scopes {
                return Ok(None);
            }
            match current.parent() {
                Some(parent) => current = self.scope(parent)?,
                None => break,
            }
        }
        match current.get(GLOBAL) {
            Some(Value::Object(global)) => Ok(self.object(*global)?.get(name).cloned()),
            Some(other) => Err(Error::Type(format!(
                "`{}' must be an object, not {}",
                GLOBAL,
                other.type_name()
            ))),
            None => Ok(None),
        }
    }

    pub fn must_lookup(&self, scope: ScopeId, name: &str) -> Result<Value> {
        self.lookup(scope, name, true)?
            .ok_or_else(|| Error::Name(format!("`{}' is not defined", name)))
    }

    /// Rebinds `name` in the nearest scope that defines it.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Value) -> Result<()> {
        let mut current = scope;
        loop {
            let found = self.scope(current)?.get(name).is_some();
            if found {
                if let Some(slot) = self.scope_mut(current)?.get_mut(name) {
                    *slot = value;
                }
                return Ok(());
            }
            match self.scope(current)?.parent() {
                Some(parent) => current = parent,
                None => {
                    return Err(Error::Name(format!(
                        "cannot assign to undefined `{}'",
                        name
                    )))
                }
            }
        }
    }

    pub fn set_return(&mut self, scope: ScopeId, value: Value) -> Result<()> {
        self.scope_mut(scope)?.return_value = Some(value);
        Ok(())
    }

    pub fn set_break(&mut self, scope: ScopeId) -> Result<()> {
        self.scope_mut(scope)?.broke = true;
        Ok(())
    }
}

#[cfg(test)]
mod environment_tests {
    use super::{Scope, GLOBAL};
    use crate::error::Error;
    use crate::heap::Heap;
    use crate::object::Object;
    use crate::value::Value;

    #[test]
    fn define_rejects_duplicates_in_same_scope_only() {
        let mut heap = Heap::new();
        let root = heap.alloc_scope(Scope::new(None));
        let child = heap.alloc_scope(Scope::new(Some(root)));
        heap.define(root, "x", Value::Number(1)).unwrap();
        assert!(matches!(
            heap.define(root, "x", Value::Number(2)),
            Err(Error::Name(_))
        ));
        heap.define(child, "x", Value::Number(3)).unwrap();
        assert!(matches!(heap.must_lookup(child, "x"), Ok(Value::Number(3))));
        assert!(matches!(heap.must_lookup(root, "x"), Ok(Value::Number(1))));
    }

    #[test]
    fn lookup_walks_parents_only_when_asked() {
        let mut heap = Heap::new();
        let root = heap.alloc_scope(Scope::new(None));
        let child = heap.alloc_scope(Scope::new(Some(root)));
        heap.define(root, "x", Value::Boolean(true)).unwrap();
        assert!(heap.lookup(child, "x", false).unwrap().is_none());
        assert!(matches!(
            heap.lookup(child, "x", true),
            Ok(Some(Value::Boolean(true)))
        ));
        assert!(matches!(heap.must_lookup(child, "y"), Err(Error::Name(_))));
    }

    #[test]
    fn lookup_falls_back_to_global_object() {
        let mut heap = Heap::new();
        let root = heap.alloc_scope(Scope::new(None));
        let mut global = Object::new();
        global.set("answer", Value::Number(42));
        let global = heap.alloc_object(global);
        heap.define(root, GLOBAL, Value::Object(global)).unwrap();
        let child = heap.alloc_scope(Scope::new(Some(root)));
        assert!(matches!(
            heap.must_lookup(child, "answer"),
            Ok(Value::Number(42))
        ));
        assert!(heap.lookup(child, "missing", true).unwrap().is_none());

        let other = heap.alloc_scope(Scope::new(None));
        heap.define(other, GLOBAL, Value::Number(1)).unwrap();
        assert!(matches!(heap.lookup(other, "x", true), Err(Error::Type(_))));
    }

    #[test]
    fn assign_updates_nearest_definition() {
        let mut heap = Heap::new();
        let root = heap.alloc_scope(Scope::new(None));
        let child = heap.alloc_scope(Scope::new(Some(root)));
        heap.define(root, "x", Value::Number(1)).unwrap();
        heap.assign(child, "x", Value::Number(5)).unwrap();
        assert!(matches!(heap.must_lookup(root, "x"), Ok(Value::Number(5))));
        assert!(heap.scope(child).unwrap().get("x").is_none());
        assert!(matches!(
            heap.assign(child, "nope", Value::Nil),
            Err(Error::Name(_))
        ));
    }

    #[test]
    fn signals_are_local() {
        let mut heap = Heap::new();
        let root = heap.alloc_scope(Scope::new(None));
        let child = heap.alloc_scope(Scope::new(Some(root)));
        heap.set_break(child).unwrap();
        heap.set_return(child, Value::Number(1)).unwrap();
        assert!(!heap.scope(root).unwrap().has_signal());
        let (broke, value) = heap.scope_mut(child).unwrap().take_signals();
        assert!(broke);
        assert!(matches!(value, Some(Value::Number(1))));
        assert!(!heap.scope(child).unwrap().has_signal());
    }
}
