pub mod algorithms;
#[cfg(feature = "api")]
pub mod api;
pub mod builder;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod operations;
pub mod source;

pub mod prelude {
    pub use crate::algorithms::{adjacency_map, breadth_first_rows, flatten_tree};
    #[cfg(feature = "api")]
    pub use crate::api::{CategoryTreeApp, HasCategorySource};
    pub use crate::builder::{TreeBuildViolation, TreeBuilder, build_tree};
    #[cfg(feature = "sqlx")]
    pub use crate::db::{
        PgCategorySource, category_exists, category_rows, create_category, create_category_tables,
        create_department,
    };
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::models::{
        CategoryId, CategoryNode, CategoryRow, CategoryTreeQuery, DEFAULT_MAX_DEPTH, DepartmentId,
        MAX_DEPTH_LIMIT, NewCategory,
    };
    pub use crate::operations::{CategoryTrees, category_tree};
    pub use crate::source::{CategoryRowSource, InMemoryCategorySource};
}
