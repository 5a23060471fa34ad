use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::error::{LibError, Result};

/// Depth bound used when a caller does not ask for one.
pub const DEFAULT_MAX_DEPTH: u32 = 100;
/// Upper clamp for caller-supplied depth bounds.
pub const MAX_DEPTH_LIMIT: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        i64::from_str(s).map(Self)
    }
}

impl From<i64> for CategoryId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(pub i64);

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DepartmentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        i64::from_str(s).map(Self)
    }
}

impl From<i64> for DepartmentId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One row of an ancestry lookup, as delivered by a row source.
///
/// `department_id` is the row's nominal department. Only the first row of a
/// sequence keeps it; every other node inherits from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub department_id: Option<DepartmentId>,
    pub name: String,
    pub depth: u32,
}

impl CategoryRow {
    pub fn new(
        id: CategoryId,
        parent_id: Option<CategoryId>,
        department_id: Option<DepartmentId>,
        name: impl Into<String>,
        depth: u32,
    ) -> Self {
        Self {
            id,
            parent_id,
            department_id,
            name: name.into(),
            depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    /// Effective department after inheritance.
    pub department_id: Option<DepartmentId>,
    pub name: String,
    pub depth: u32,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Pre-order walk: this node first, then each child subtree in order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    pub fn find(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.iter().find(|node| node.id == id)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a CategoryNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CategoryNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl<'a> IntoIterator for &'a CategoryNode {
    type Item = &'a CategoryNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A category as stored in an adjacency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub department_id: Option<DepartmentId>,
    pub name: String,
}

impl NewCategory {
    pub fn normalize(self) -> Result<NewCategory> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LibError::invalid(
                "Category name is required",
                anyhow!("category {} had empty name", self.id),
            ));
        }
        if self.parent_id == Some(self.id) {
            return Err(LibError::invalid(
                "A category cannot be its own parent",
                anyhow!("category {} references itself as parent", self.id),
            ));
        }

        Ok(NewCategory { name, ..self })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTreeQuery {
    pub max_depth: Option<u32>,
}

impl CategoryTreeQuery {
    pub fn max_depth(&self) -> u32 {
        self.max_depth
            .unwrap_or(DEFAULT_MAX_DEPTH)
            .min(MAX_DEPTH_LIMIT)
    }
}
