//! Reassembly of flat category documents into a tree or a parent-keyed grouping.
//!
//! The tree is built in a single pass over the documents sorted by `(level, position)`: every
//! node is placed in an arena and indexed by id, a child is attached only when its parent was
//! placed before it, and the nested structure is produced afterwards by folding the arena from
//! the back.

use catalog_common::{value_as_f64, Document, Dropped};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    pub id: String,
    pub parent_id: Option<i64>,
    pub level: i64,
    pub position: i64,
    pub document: Document,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn from_document(document: Document) -> Result<Self, String> {
        let id = document
            .get_string("id")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "Category document without id".to_string())?;
        Ok(Self {
            id,
            parent_id: int_field(&document, "parent_id"),
            level: int_field(&document, "level").unwrap_or_default(),
            position: int_field(&document, "position").unwrap_or_default(),
            document,
            children: Vec::new(),
        })
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::count).sum::<usize>()
    }

    /// Projected fields of the node with a nested `children` list.
    pub fn to_value<F>(&self, project: &F) -> Value
    where
        F: Fn(&Document) -> Map<String, Value>,
    {
        let mut fields = project(&self.document);
        fields.insert(
            "children".to_string(),
            Value::Array(self.children.iter().map(|c| c.to_value(project)).collect()),
        );
        Value::Object(fields)
    }
}

fn int_field(document: &Document, name: &str) -> Option<i64> {
    document
        .get(name)
        .and_then(value_as_f64)
        .map(|value| value as i64)
}

/// Merges documents sharing an id. The first value seen for a field wins, later documents only
/// fill fields that are still missing. Documents without an id are dropped.
pub fn merge_documents(documents: Vec<Document>) -> (Vec<Document>, Vec<Dropped>) {
    let mut merged: IndexMap<String, Map<String, Value>> = IndexMap::new();
    let mut dropped = Vec::new();
    for document in documents {
        let Some(id) = document.get_string("id").filter(|id| !id.is_empty()) else {
            dropped.push(Dropped::new("category", "Category document without id"));
            continue;
        };
        let fields = merged.entry(id).or_default();
        for (name, value) in document.into_fields() {
            fields.entry(name).or_insert(value);
        }
    }
    let documents = merged.into_values().map(Document::from_fields).collect();
    (documents, dropped)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTree {
    roots: Vec<CategoryNode>,
    dropped: Vec<Dropped>,
}

impl CategoryTree {
    /// Builds the tree for the requested `levels` (empty means no level bound).
    ///
    /// A node hangs under its parent when the parent was placed. Otherwise it becomes a root if
    /// its `parent_id` is at most `root_parent_max`, and is dropped if not.
    pub fn assemble(documents: Vec<Document>, levels: &[i64], root_parent_max: i64) -> Self {
        let (documents, mut dropped) = merge_documents(documents);
        let max_level = levels.iter().copied().max();

        let mut nodes: Vec<CategoryNode> = Vec::with_capacity(documents.len());
        for document in documents {
            match CategoryNode::from_document(document) {
                Ok(node) if max_level.is_some_and(|max| node.level > max) => {
                    dropped.push(Dropped::new(
                        &node.id,
                        format!("Level {} is above the requested levels", node.level),
                    ));
                }
                Ok(node) => nodes.push(node),
                Err(reason) => dropped.push(Dropped::new("category", reason)),
            }
        }
        nodes.sort_by_key(|node| (node.level, node.position));

        let mut slots: Vec<Option<CategoryNode>> = Vec::with_capacity(nodes.len());
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(nodes.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for node in nodes {
            let placement = match node.parent_id {
                None => Ok(None),
                Some(parent) if parent.to_string() == node.id => {
                    Err("Category is its own parent".to_string())
                }
                Some(parent) => match index.get(&parent.to_string()) {
                    Some(slot) => Ok(Some(*slot)),
                    None if parent <= root_parent_max => Ok(None),
                    None => Err(format!("Parent {} was not fetched or was dropped", parent)),
                },
            };
            match placement {
                Ok(parent_slot) => {
                    index.insert(node.id.clone(), slots.len());
                    parents.push(parent_slot);
                    slots.push(Some(node));
                }
                Err(reason) => {
                    tracing::debug!(id = %node.id, %reason, "category dropped");
                    dropped.push(Dropped::new(&node.id, reason));
                }
            }
        }

        // Children always sit after their parent in the arena, so folding from the back
        // completes every subtree before it is moved into its parent.
        let mut roots = Vec::new();
        for slot in (0..slots.len()).rev() {
            let Some(mut node) = slots[slot].take() else {
                continue;
            };
            node.children.reverse();
            match parents[slot].and_then(|parent| slots[parent].as_mut()) {
                Some(parent) => parent.children.push(node),
                None => roots.push(node),
            }
        }
        roots.reverse();

        Self { roots, dropped }
    }

    pub fn roots(&self) -> &[CategoryNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<CategoryNode> {
        self.roots
    }

    pub fn dropped(&self) -> &[Dropped] {
        &self.dropped
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.roots.iter().map(CategoryNode::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Groups documents under the requested parent ids, ordered by position. Parents without
/// children map to an empty list.
pub fn group_by_parent(documents: &[Document], parent_ids: &[i64]) -> IndexMap<i64, Vec<Document>> {
    let mut groups: IndexMap<i64, Vec<Document>> = parent_ids
        .iter()
        .map(|parent| (*parent, Vec::new()))
        .collect();
    for document in documents {
        if let Some(children) = int_field(document, "parent_id").and_then(|p| groups.get_mut(&p)) {
            children.push(document.clone());
        }
    }
    for children in groups.values_mut() {
        children.sort_by_key(|doc| int_field(doc, "position").unwrap_or_default());
    }
    groups
}

/// Sorts documents by `(level, position)` for flat category lists.
pub fn sort_by_level(documents: &mut [Document]) {
    documents.sort_by_key(|doc| {
        (
            int_field(doc, "level").unwrap_or_default(),
            int_field(doc, "position").unwrap_or_default(),
        )
    });
}
