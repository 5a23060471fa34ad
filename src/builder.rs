//! Assembly of a category tree from a parent-before-child row sequence.
//!
//! The first row is the root and keeps its own department. Every later row
//! joins the already-built node named by its `parent_id` and takes that
//! node's effective department, whatever its own row says.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CategoryId, CategoryNode, CategoryRow, DepartmentId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeBuildViolation {
    EmptyInput,
    OrderingViolation {
        row_index: usize,
        category_id: CategoryId,
        parent_id: Option<CategoryId>,
    },
}

impl TreeBuildViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            TreeBuildViolation::EmptyInput => "category_tree_empty",
            TreeBuildViolation::OrderingViolation { .. } => "category_tree_ordering_violation",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            TreeBuildViolation::EmptyInput => "No category rows were found for this root",
            TreeBuildViolation::OrderingViolation { .. } => {
                "Category row references a parent that was not delivered before it"
            }
        }
    }
}

/// A node waiting in the arena. Children are arena indices, always greater
/// than the parent's own index.
#[derive(Debug)]
struct Slot {
    id: CategoryId,
    parent_id: Option<CategoryId>,
    department_id: Option<DepartmentId>,
    name: String,
    depth: u32,
    children: Vec<usize>,
}

impl Slot {
    fn from_row(row: CategoryRow, department_id: Option<DepartmentId>) -> Self {
        Self {
            id: row.id,
            parent_id: row.parent_id,
            department_id,
            name: row.name,
            depth: row.depth,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
enum BuildState {
    NotStarted {
        capacity: usize,
    },
    Building {
        arena: Vec<Slot>,
        index: HashMap<CategoryId, usize>,
    },
}

impl Default for BuildState {
    fn default() -> Self {
        BuildState::NotStarted { capacity: 0 }
    }
}

/// Incremental tree builder.
///
/// Feed rows with [`TreeBuilder::push`] in the order the row source produced
/// them, then call [`TreeBuilder::finish`]. A rejected row is not attached
/// anywhere; the tree built so far stays intact.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    state: BuildState,
    rows_seen: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: BuildState::NotStarted { capacity },
            rows_seen: 0,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self.state, BuildState::Building { .. })
    }

    pub fn len(&self) -> usize {
        match &self.state {
            BuildState::NotStarted { .. } => 0,
            BuildState::Building { arena, .. } => arena.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, row: CategoryRow) -> std::result::Result<(), TreeBuildViolation> {
        let row_index = self.rows_seen;
        self.rows_seen += 1;

        match &mut self.state {
            BuildState::NotStarted { capacity } => {
                // The first row is the root whatever its parent_id says.
                let mut arena = Vec::with_capacity(*capacity);
                let mut index = HashMap::with_capacity(*capacity);
                let department_id = row.department_id;
                index.insert(row.id, 0);
                arena.push(Slot::from_row(row, department_id));
                self.state = BuildState::Building { arena, index };
            }
            BuildState::Building { arena, index } => {
                let parent_slot = row
                    .parent_id
                    .and_then(|parent_id| index.get(&parent_id).copied());
                let Some(parent_slot) = parent_slot else {
                    return Err(TreeBuildViolation::OrderingViolation {
                        row_index,
                        category_id: row.id,
                        parent_id: row.parent_id,
                    });
                };

                let department_id = arena[parent_slot].department_id;
                let slot = arena.len();
                index.insert(row.id, slot);
                arena.push(Slot::from_row(row, department_id));
                arena[parent_slot].children.push(slot);
            }
        }

        Ok(())
    }

    pub fn finish(self) -> std::result::Result<CategoryNode, TreeBuildViolation> {
        let BuildState::Building { arena, .. } = self.state else {
            return Err(TreeBuildViolation::EmptyInput);
        };

        // Children always sit after their parent, so walking backwards means
        // every child subtree is complete before its parent is assembled.
        let mut built: Vec<Option<CategoryNode>> = Vec::with_capacity(arena.len());
        built.resize_with(arena.len(), || None);
        for (position, slot) in arena.into_iter().enumerate().rev() {
            let children = slot
                .children
                .iter()
                .filter_map(|child| built[*child].take())
                .collect();
            built[position] = Some(CategoryNode {
                id: slot.id,
                parent_id: slot.parent_id,
                department_id: slot.department_id,
                name: slot.name,
                depth: slot.depth,
                children,
            });
        }

        built
            .into_iter()
            .next()
            .flatten()
            .ok_or(TreeBuildViolation::EmptyInput)
    }
}

/// Builds the tree for a full row sequence in one pass.
pub fn build_tree<I>(rows: I) -> Result<CategoryNode>
where
    I: IntoIterator<Item = CategoryRow>,
{
    let rows = rows.into_iter();
    let mut builder = TreeBuilder::with_capacity(rows.size_hint().0);
    for row in rows {
        builder.push(row)?;
    }
    Ok(builder.finish()?)
}
