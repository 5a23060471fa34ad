use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use once_cell::sync::Lazy;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::{FromRow, PgPool};

use crate::error::{LibError, Result};
use crate::models::{CategoryId, CategoryRow, DepartmentId, NewCategory};
use crate::source::CategoryRowSource;

pub static MIGRATOR: Lazy<Migrator> = Lazy::new(|| {
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
});

pub async fn create_category_tables(pool: &PgPool) -> std::result::Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[derive(Debug, Clone, FromRow)]
struct CategoryTreeRow {
    id: i64,
    parent_id: Option<i64>,
    department_id: Option<i64>,
    name: String,
    depth: i32,
}

impl TryFrom<CategoryTreeRow> for CategoryRow {
    type Error = LibError;

    fn try_from(value: CategoryTreeRow) -> Result<Self> {
        let depth = u32::try_from(value.depth).map_err(|_| {
            LibError::invalid(
                "Category tree returned a negative depth",
                anyhow!("category {} had depth {}", value.id, value.depth),
            )
        })?;

        Ok(CategoryRow {
            id: CategoryId(value.id),
            parent_id: value.parent_id.map(CategoryId),
            department_id: value.department_id.map(DepartmentId),
            name: value.name,
            depth,
        })
    }
}

fn db_err(public: &'static str, err: sqlx::Error) -> LibError {
    LibError::database(public, anyhow!(err))
}

/// Runs `category.category_tree(root_id, max_depth)`.
pub async fn category_rows(
    pool: &PgPool,
    root_id: CategoryId,
    max_depth: u32,
) -> Result<Vec<CategoryRow>> {
    let max_depth = i32::try_from(max_depth).unwrap_or(i32::MAX);
    let rows = sqlx::query_as::<_, CategoryTreeRow>(
        r#"
        SELECT id, parent_id, department_id, name, depth
        FROM category.category_tree($1, $2)
        "#,
    )
    .bind(root_id.0)
    .bind(max_depth)
    .fetch_all(pool)
    .await
    .map_err(|err| db_err("Failed to query category tree", err))?;

    rows.into_iter().map(CategoryRow::try_from).collect()
}

pub async fn create_department(pool: &PgPool, name: &str) -> Result<DepartmentId> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LibError::invalid(
            "Department name is required",
            anyhow!("empty department name"),
        ));
    }

    let id: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO category.departments (name)
        VALUES ($1)
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|err| db_err("Failed to create department", err))?;

    Ok(DepartmentId(id.0))
}

pub async fn category_exists(pool: &PgPool, id: CategoryId) -> Result<bool> {
    let exists: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1
            FROM category.categories
            WHERE id = $1
        )
        "#,
    )
    .bind(id.0)
    .fetch_one(pool)
    .await
    .map_err(|err| db_err("Failed to query category", err))?;

    Ok(exists.0)
}

pub async fn create_category(pool: &PgPool, category: NewCategory) -> Result<()> {
    let category = category.normalize()?;

    if let Some(parent_id) = category.parent_id {
        if !category_exists(pool, parent_id).await? {
            return Err(LibError::not_found(
                "Parent category not found",
                anyhow!("category {} references missing parent {}", category.id, parent_id),
            ));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO category.categories (id, parent_id, department_id, name)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(category.id.0)
    .bind(category.parent_id.map(|id| id.0))
    .bind(category.department_id.map(|id| id.0))
    .bind(&category.name)
    .execute(pool)
    .await
    .map_err(|err| db_err("Failed to create category", err))?;

    Ok(())
}

/// Row source backed by the `category.category_tree` SQL function.
#[derive(Debug, Clone)]
pub struct PgCategorySource {
    pool: Arc<PgPool>,
}

impl PgCategorySource {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn from_pool(pool: &PgPool) -> Self {
        Self {
            pool: Arc::new(pool.clone()),
        }
    }

    pub fn pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }
}

impl CategoryRowSource for PgCategorySource {
    fn category_rows(
        &self,
        root_id: CategoryId,
        max_depth: u32,
    ) -> impl Future<Output = Result<Vec<CategoryRow>>> + Send {
        let pool = Arc::clone(&self.pool);
        async move {
            let rows = category_rows(&pool, root_id, max_depth).await?;
            tracing::debug!(root_id = %root_id, row_count = rows.len(), "queried category tree");
            Ok(rows)
        }
    }
}
