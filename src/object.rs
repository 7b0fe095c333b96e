use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::BTreeMap;

/// A string-keyed property bag. Keys iterate in sorted order.
#[derive(Debug, Default)]
pub struct Object {
    props: BTreeMap<String, Value>,
}

impl Object {
    pub fn new() -> Object {
        Object::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.props.insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn props(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.props.iter()
    }
}

/// A growable sequence of values. String keys other than the built-in
/// methods land in a side table of extra properties.
#[derive(Debug, Default)]
pub struct Array {
    elements: Vec<Value>,
    props: BTreeMap<String, Value>,
}

impl Array {
    pub fn new(elements: Vec<Value>) -> Array {
        Array {
            elements,
            props: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn get(&self, index: i64) -> Result<Value> {
        let slot = self.slot(index)?;
        Ok(self.elements[slot].clone())
    }

    pub fn set(&mut self, index: i64, value: Value) -> Result<()> {
        let slot = self.slot(index)?;
        self.elements[slot] = value;
        Ok(())
    }

    pub fn push(&mut self, value: Value) {
        self.elements.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.elements.pop()
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn set_prop(&mut self, key: &str, value: Value) {
        self.props.insert(key.to_string(), value);
    }

    pub fn props(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.props.iter()
    }

    fn slot(&self, index: i64) -> Result<usize> {
        if index < 0 || index as u64 >= self.elements.len() as u64 {
            return Err(Error::Range(format!(
                "index {} out of range [0, {})",
                index,
                self.elements.len()
            )));
        }
        Ok(index as usize)
    }
}
