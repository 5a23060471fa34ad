use std::sync::Arc;

use crate::builder::build_tree;
use crate::error::Result;
use crate::models::{CategoryId, CategoryNode, CategoryTreeQuery};
use crate::source::CategoryRowSource;

/// Fetches the rows under `root_id` and assembles them into a tree.
///
/// Row source failures come back untouched. An empty row set is
/// `ErrorKind::EmptyInput`; rows out of parent-first order are
/// `ErrorKind::OrderingViolation`.
pub async fn category_tree<S>(
    source: &S,
    root_id: CategoryId,
    max_depth: u32,
) -> Result<CategoryNode>
where
    S: CategoryRowSource,
{
    let rows = source.category_rows(root_id, max_depth).await?;
    tracing::debug!(
        root_id = %root_id,
        max_depth,
        row_count = rows.len(),
        "fetched category rows"
    );

    build_tree(rows).inspect_err(|err| {
        tracing::warn!(
            root_id = %root_id,
            code = err.code,
            error = %err.source,
            "category rows could not be assembled"
        );
    })
}

/// Shared handle around a row source.
#[derive(Debug)]
pub struct CategoryTrees<S> {
    source: Arc<S>,
}

impl<S> Clone for CategoryTrees<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: CategoryRowSource> CategoryTrees<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub fn from_source(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn source(&self) -> Arc<S> {
        Arc::clone(&self.source)
    }

    pub async fn category_tree(&self, root_id: CategoryId, max_depth: u32) -> Result<CategoryNode> {
        category_tree(self.source.as_ref(), root_id, max_depth).await
    }

    pub async fn category_tree_with_query(
        &self,
        root_id: CategoryId,
        query: &CategoryTreeQuery,
    ) -> Result<CategoryNode> {
        self.category_tree(root_id, query.max_depth()).await
    }
}
