//! Paths into property value trees.
//!
//! A [`PropertyPath`] addresses a node inside a [`PropertyValue`] by object key
//! and array index. It is the value-side counterpart of
//! [`SchemaPath`](crate::walk::SchemaPath) and renders as `a.b[0].c`.

use crate::value::{PropertyMap, PropertyValue};
use std::fmt;

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathElement {
    /// Descend into an object by key.
    Key(String),
    /// Descend into an array by index.
    Index(usize),
}

/// A path into a property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct PropertyPath(Vec<PathElement>);

impl PropertyPath {
    /// The empty path addressing the root.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A path starting at a top-level property.
    pub fn root(key: impl Into<String>) -> Self {
        Self(vec![PathElement::Key(key.into())])
    }

    /// Return a new path extended by an object key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(PathElement::Key(key.into()));
        next
    }

    /// Return a new path extended by an array index.
    pub fn index(&self, i: usize) -> Self {
        let mut next = self.clone();
        next.0.push(PathElement::Index(i));
        next
    }

    /// The steps of this path.
    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The path without its last step, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Look up the value at this path, seeing through secrets and known outputs.
    pub fn get<'a>(&self, root: &'a PropertyValue) -> Option<&'a PropertyValue> {
        let mut current = root;
        for step in &self.0 {
            current = match (step, current.unwrap_markers()) {
                (PathElement::Key(k), PropertyValue::Object(m)) => m.get(k)?,
                (PathElement::Index(i), PropertyValue::Array(a)) => a.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Look up the value at this path inside a property map.
    pub fn get_from_map<'a>(&self, map: &'a PropertyMap) -> Option<&'a PropertyValue> {
        let (first, rest) = self.0.split_first()?;
        let PathElement::Key(k) = first else {
            return None;
        };
        Self(rest.to_vec()).get(map.get(k)?)
    }

    /// Replace the value at this path, creating intermediate objects as needed.
    ///
    /// Returns false if an intermediate node has the wrong shape or an array
    /// index is out of bounds.
    pub fn set(&self, root: &mut PropertyValue, value: PropertyValue) -> bool {
        let Some((last, init)) = self.0.split_last() else {
            *root = value;
            return true;
        };
        let mut current = root;
        for step in init {
            current = match (step, current) {
                (PathElement::Key(k), PropertyValue::Object(m)) => m
                    .entry(k.clone())
                    .or_insert_with(|| PropertyValue::Object(PropertyMap::new())),
                (PathElement::Index(i), PropertyValue::Array(a)) => match a.get_mut(*i) {
                    Some(v) => v,
                    None => return false,
                },
                _ => return false,
            };
        }
        match (last, current) {
            (PathElement::Key(k), PropertyValue::Object(m)) => {
                m.insert(k.clone(), value);
                true
            },
            (PathElement::Index(i), PropertyValue::Array(a)) if *i < a.len() => {
                a[*i] = value;
                true
            },
            _ => false,
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathElement::Index(idx) => write!(f, "[{}]", idx)?,
                PathElement::Key(k) if is_plain_key(k) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", k)?;
                },
                PathElement::Key(k) => write!(f, "[{:?}]", k)?,
            }
        }
        Ok(())
    }
}

fn is_plain_key(k: &str) -> bool {
    !k.is_empty()
        && !k
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '"' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PropertyValue {
        PropertyValue::object([(
            "rules",
            PropertyValue::Array(vec![PropertyValue::object([(
                "port",
                PropertyValue::Number(80.0),
            )])]),
        )])
    }

    #[test]
    fn test_display() {
        let p = PropertyPath::root("rules").index(0).key("port");
        assert_eq!(p.to_string(), "rules[0].port");

        let p = PropertyPath::root("tags").key("kubernetes.io/name");
        assert_eq!(p.to_string(), "tags[\"kubernetes.io/name\"]");
    }

    #[test]
    fn test_get() {
        let v = sample();
        let p = PropertyPath::root("rules").index(0).key("port");
        assert_eq!(p.get(&v), Some(&PropertyValue::Number(80.0)));
        assert_eq!(PropertyPath::root("rules").index(3).get(&v), None);
        assert_eq!(PropertyPath::root("rules").key("x").get(&v), None);
    }

    #[test]
    fn test_get_through_secret() {
        let v = PropertyValue::object([(
            "a",
            PropertyValue::make_secret(PropertyValue::object([("b", true.into())])),
        )]);
        assert_eq!(
            PropertyPath::root("a").key("b").get(&v),
            Some(&PropertyValue::Bool(true))
        );
    }

    #[test]
    fn test_set() {
        let mut v = sample();
        let p = PropertyPath::root("rules").index(0).key("port");
        assert!(p.set(&mut v, PropertyValue::Number(443.0)));
        assert_eq!(p.get(&v), Some(&PropertyValue::Number(443.0)));

        let p = PropertyPath::root("meta").key("name");
        assert!(p.set(&mut v, "x".into()));
        assert_eq!(p.get(&v), Some(&PropertyValue::from("x")));

        assert!(!PropertyPath::root("rules").index(9).set(&mut v, PropertyValue::Null));
    }

    #[test]
    fn test_parent() {
        let p = PropertyPath::root("a").index(1);
        assert_eq!(p.parent(), Some(PropertyPath::root("a")));
        assert_eq!(PropertyPath::new().parent(), None);
    }
}
