use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;

use crate::algorithms::breadth_first_rows;
use crate::error::{LibError, Result};
use crate::models::{CategoryId, CategoryRow, NewCategory};

/// Produces the ancestry rows for a root category.
///
/// Implementations must return rows in parent-before-child order, starting
/// with the root itself, and no deeper than `max_depth` levels below it.
pub trait CategoryRowSource: Send + Sync {
    fn category_rows(
        &self,
        root_id: CategoryId,
        max_depth: u32,
    ) -> impl Future<Output = Result<Vec<CategoryRow>>> + Send;
}

impl<S: CategoryRowSource> CategoryRowSource for Arc<S> {
    fn category_rows(
        &self,
        root_id: CategoryId,
        max_depth: u32,
    ) -> impl Future<Output = Result<Vec<CategoryRow>>> + Send {
        self.as_ref().category_rows(root_id, max_depth)
    }
}

/// Adjacency list held in memory, walked breadth-first on each lookup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCategorySource {
    categories: Vec<NewCategory>,
}

impl InMemoryCategorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_categories(categories: Vec<NewCategory>) -> Result<Self> {
        let mut source = Self {
            categories: Vec::with_capacity(categories.len()),
        };
        for category in categories {
            source.insert(category)?;
        }
        Ok(source)
    }

    pub fn insert(&mut self, category: NewCategory) -> Result<()> {
        let category = category.normalize()?;
        if self.categories.iter().any(|known| known.id == category.id) {
            return Err(LibError::invalid(
                "Category IDs must be unique",
                anyhow!("duplicate category id {}", category.id),
            ));
        }
        self.categories.push(category);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl CategoryRowSource for InMemoryCategorySource {
    fn category_rows(
        &self,
        root_id: CategoryId,
        max_depth: u32,
    ) -> impl Future<Output = Result<Vec<CategoryRow>>> + Send {
        let rows = breadth_first_rows(&self.categories, root_id, max_depth);
        async move { Ok(rows) }
    }
}
