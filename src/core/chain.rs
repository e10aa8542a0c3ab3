//! Persistent field lineage for derived loggers
//!
//! Each `with`/`group` derivation appends one immutable node pointing at its
//! parent. Siblings share every ancestor by reference and never observe each
//! other's nodes, so derivation is O(new fields) and never copies lineage.

use super::field::Field;
use std::sync::Arc;

/// One unit of accumulated context
#[derive(Debug, Clone)]
pub enum ContextItem {
    /// A top-level field
    Field(Field),
    /// Fields sealed under a named sub-object at derivation time
    Group { key: String, fields: Vec<Field> },
}

#[derive(Debug)]
struct Node {
    parent: Option<Arc<Node>>,
    items: Vec<ContextItem>,
}

/// Immutable, structurally shared list of context items
#[derive(Debug, Clone, Default)]
pub struct FieldChain {
    head: Option<Arc<Node>>,
}

impl FieldChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new chain with `items` appended. Empty input returns a clone
    /// sharing the same head.
    #[must_use]
    pub fn extend(&self, items: Vec<ContextItem>) -> Self {
        if items.is_empty() {
            return self.clone();
        }
        Self {
            head: Some(Arc::new(Node {
                parent: self.head.clone(),
                items,
            })),
        }
    }

    #[must_use]
    pub fn with_fields(&self, fields: &[Field]) -> Self {
        self.extend(fields.iter().cloned().map(ContextItem::Field).collect())
    }

    #[must_use]
    pub fn with_group(&self, key: impl Into<String>, fields: &[Field]) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        self.extend(vec![ContextItem::Group {
            key: key.into(),
            fields: fields.to_vec(),
        }])
    }

    /// Items in derivation order, oldest first
    pub fn items(&self) -> impl Iterator<Item = &ContextItem> {
        let mut nodes = Vec::new();
        let mut cur = self.head.as_deref();
        while let Some(node) = cur {
            nodes.push(node);
            cur = node.parent.as_deref();
        }
        nodes.into_iter().rev().flat_map(|node| node.items.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.items().count()
    }

    /// Identity comparison: both chains end at the same node
    #[must_use]
    pub fn ptr_eq(&self, other: &FieldChain) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
