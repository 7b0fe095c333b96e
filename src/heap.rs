use crate::environment::Scope;
use crate::error::{Error, Result};
use crate::object::{Array, Object};
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A generation-checked index into an [`Arena`].
///
/// Slots are reused after a collection; the generation distinguishes the new
/// occupant from whatever a stale handle used to point at.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

pub type ScopeId = Handle<Scope>;
pub type ObjectId = Handle<Object>;
pub type ArrayId = Handle<Array>;

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.live += 1;
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].value = Some(value);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                (self.slots.len() - 1) as u32
            }
        };
        Handle {
            index,
            generation: self.slots[index as usize].generation,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        match self.slots.get(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation => slot.value.as_ref(),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation => slot.value.as_mut(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Frees every occupied slot whose mark is unset and returns the count.
    fn sweep(&mut self, marks: &[bool]) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.is_some() && !marks[index] {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        freed
    }
}

enum Node {
    Scope(ScopeId),
    Object(ObjectId),
    Array(ArrayId),
}

/// Owns every scope, object and array created while running a program.
#[derive(Default)]
pub struct Heap {
    scopes: Arena<Scope>,
    objects: Arena<Object>,
    arrays: Arena<Array>,
}

impl Heap {
    pub fn new() -> Heap {
        Heap::default()
    }

    pub fn alloc_scope(&mut self, scope: Scope) -> ScopeId {
        self.scopes.insert(scope)
    }

    pub fn alloc_object(&mut self, object: Object) -> ObjectId {
        self.objects.insert(object)
    }

    pub fn alloc_array(&mut self, array: Array) -> ArrayId {
        self.arrays.insert(array)
    }

    pub fn scope(&self, id: ScopeId) -> Result<&Scope> {
        self.scopes.get(id).ok_or_else(|| stale("scope", id))
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> Result<&mut Scope> {
        self.scopes.get_mut(id).ok_or_else(|| stale("scope", id))
    }

    pub fn object(&self, id: ObjectId) -> Result<&Object> {
        self.objects.get(id).ok_or_else(|| stale("object", id))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(id).ok_or_else(|| stale("object", id))
    }

    pub fn array(&self, id: ArrayId) -> Result<&Array> {
        self.arrays.get(id).ok_or_else(|| stale("array", id))
    }

    pub fn array_mut(&mut self, id: ArrayId) -> Result<&mut Array> {
        self.arrays.get_mut(id).ok_or_else(|| stale("array", id))
    }

    /// Number of occupied slots across all arenas.
    pub fn live(&self) -> usize {
        self.scopes.len() + self.objects.len() + self.arrays.len()
    }

    /// Mark and sweep from the root scopes and values. Only sound when every
    /// handle held outside the heap is reachable from one of them.
    pub fn collect(&mut self, roots: &[ScopeId], values: &[Value]) -> usize {
        let mut scope_marks = vec![false; self.scopes.capacity()];
        let mut object_marks = vec![false; self.objects.capacity()];
        let mut array_marks = vec![false; self.arrays.capacity()];
        let mut pending: Vec<Node> = roots.iter().map(|id| Node::Scope(*id)).collect();
        for value in values {
            trace(value, &mut pending);
        }

        while let Some(node) = pending.pop() {
            match node {
                Node::Scope(id) => {
                    let scope = match self.scopes.get(id) {
                        Some(scope) if !scope_marks[id.index as usize] => scope,
                        _ => continue,
                    };
                    scope_marks[id.index as usize] = true;
                    if let Some(parent) = scope.parent() {
                        pending.push(Node::Scope(parent));
                    }
                    for value in scope.values() {
                        trace(value, &mut pending);
                    }
                }
                Node::Object(id) => {
                    let object = match self.objects.get(id) {
                        Some(object) if !object_marks[id.index as usize] => object,
                        _ => continue,
                    };
                    object_marks[id.index as usize] = true;
                    for (_, value) in object.props() {
                        trace(value, &mut pending);
                    }
                }
                Node::Array(id) => {
                    let array = match self.arrays.get(id) {
                        Some(array) if !array_marks[id.index as usize] => array,
                        _ => continue,
                    };
                    array_marks[id.index as usize] = true;
                    for value in array.elements() {
                        trace(value, &mut pending);
                    }
                    for (_, value) in array.props() {
                        trace(value, &mut pending);
                    }
                }
            }
        }

        let freed = self.scopes.sweep(&scope_marks)
            + self.objects.sweep(&object_marks)
            + self.arrays.sweep(&array_marks);
        tracing::debug!(freed, live = self.live(), "collected heap");
        freed
    }
}

fn trace(value: &Value, pending: &mut Vec<Node>) {
    match value {
        Value::Object(id) => pending.push(Node::Object(*id)),
        Value::Array(id) => pending.push(Node::Array(*id)),
        Value::Function(function) => pending.push(Node::Scope(function.closure)),
        Value::Builtin(builtin) => trace(&builtin.receiver, pending),
        Value::Nil | Value::Boolean(_) | Value::Number(_) | Value::String(_) | Value::Class(_) => {}
    }
}

fn stale<T>(what: &str, id: Handle<T>) -> Error {
    Error::Internal(format!("stale {} handle {:?}", what, id))
}
