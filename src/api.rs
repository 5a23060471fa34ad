use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::error::{ErrorKind, LibError};
use crate::models::{CategoryId, CategoryTreeQuery, MAX_DEPTH_LIMIT};
use crate::operations;
use crate::source::CategoryRowSource;

#[derive(Debug)]
pub struct AppError(pub LibError);

impl From<LibError> for AppError {
    fn from(value: LibError) -> Self {
        Self(value)
    }
}

impl From<PathRejection> for AppError {
    fn from(value: PathRejection) -> Self {
        Self(LibError::invalid(
            "Category id must be an integer",
            anyhow!(value.body_text()),
        ))
    }
}

impl From<QueryRejection> for AppError {
    fn from(value: QueryRejection) -> Self {
        Self(LibError::invalid(
            "maxDepth must be a non-negative integer",
            anyhow!(value.body_text()),
        ))
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.kind {
            ErrorKind::Database => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::EmptyInput => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::OrderingViolation => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                kind = ?self.0.kind,
                error = %self.0.source,
                "category api request failed"
            );
        } else {
            tracing::debug!(
                kind = ?self.0.kind,
                error = %self.0.source,
                "category api request rejected"
            );
        }

        let body = Json(json!({
            "error": {
                "code": self.0.code,
                "message": self.0.public,
            }
        }));
        (status, body).into_response()
    }
}

pub trait HasCategorySource {
    type Source: CategoryRowSource + 'static;

    fn category_source(&self) -> Arc<Self::Source>;
}

pub trait CategoryTreeApp: HasCategorySource {
    /// Deepest `maxDepth` this app will serve. Larger requests are clamped.
    fn max_depth_limit(&self) -> u32 {
        MAX_DEPTH_LIMIT
    }
}

async fn category_tree_handler<S>(
    State(app): State<S>,
    category_id: Result<Path<CategoryId>, PathRejection>,
    query: Result<Query<CategoryTreeQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError>
where
    S: CategoryTreeApp + Clone + Send + Sync + 'static,
{
    let Path(category_id) = category_id?;
    let Query(query) = query?;
    let max_depth = query.max_depth().min(app.max_depth_limit());

    let source = app.category_source();
    let tree = operations::category_tree(source.as_ref(), category_id, max_depth).await?;
    Ok(Json(tree))
}

pub fn routes<S>() -> Router<S>
where
    S: CategoryTreeApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /category/{{category_id}}/tree [GET]");

    Router::new().route(
        "/category/{category_id}/tree",
        get(category_tree_handler::<S>),
    )
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::error::Result;
    use crate::models::{CategoryRow, DepartmentId, NewCategory};
    use crate::source::InMemoryCategorySource;

    struct TestApp<S> {
        source: Arc<S>,
        depth_limit: u32,
    }

    impl<S> Clone for TestApp<S> {
        fn clone(&self) -> Self {
            Self {
                source: Arc::clone(&self.source),
                depth_limit: self.depth_limit,
            }
        }
    }

    impl<S: CategoryRowSource + 'static> HasCategorySource for TestApp<S> {
        type Source = S;

        fn category_source(&self) -> Arc<S> {
            Arc::clone(&self.source)
        }
    }

    impl<S: CategoryRowSource + 'static> CategoryTreeApp for TestApp<S> {
        fn max_depth_limit(&self) -> u32 {
            self.depth_limit
        }
    }

    struct FailingSource;

    impl CategoryRowSource for FailingSource {
        fn category_rows(
            &self,
            _root_id: CategoryId,
            _max_depth: u32,
        ) -> impl Future<Output = Result<Vec<CategoryRow>>> + Send {
            async { Err(LibError::database("Failed to query category tree", anyhow!("timeout"))) }
        }
    }

    struct FixedRows(Vec<CategoryRow>);

    impl CategoryRowSource for FixedRows {
        fn category_rows(
            &self,
            _root_id: CategoryId,
            _max_depth: u32,
        ) -> impl Future<Output = Result<Vec<CategoryRow>>> + Send {
            let rows = self.0.clone();
            async move { Ok(rows) }
        }
    }

    fn category(id: i64, parent: Option<i64>, department: Option<i64>, name: &str) -> NewCategory {
        NewCategory {
            id: CategoryId(id),
            parent_id: parent.map(CategoryId),
            department_id: department.map(DepartmentId),
            name: name.to_string(),
        }
    }

    fn catalog() -> InMemoryCategorySource {
        InMemoryCategorySource::from_categories(vec![
            category(1, None, Some(10), "Root"),
            category(2, Some(1), None, "Shoes"),
            category(3, Some(2), Some(99), "Sneakers"),
        ])
        .expect("categories should load")
    }

    fn app_with<S: CategoryRowSource + 'static>(source: S, depth_limit: u32) -> Router {
        routes::<TestApp<S>>().with_state(TestApp {
            source: Arc::new(source),
            depth_limit,
        })
    }

    fn app() -> Router {
        app_with(catalog(), MAX_DEPTH_LIMIT)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let body = serde_json::from_slice(&bytes).expect("body should be json");
        (status, body)
    }

    #[tokio::test]
    async fn returns_tree_with_inherited_departments() {
        let (status, body) = get_json(app(), "/category/1/tree").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["departmentId"], 10);
        assert_eq!(body["children"][0]["id"], 2);
        assert_eq!(body["children"][0]["children"][0]["departmentId"], 10);
    }

    #[tokio::test]
    async fn max_depth_query_limits_tree() {
        let (status, body) = get_json(app(), "/category/1/tree?maxDepth=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["children"][0]["children"], json!([]));
    }

    #[tokio::test]
    async fn app_depth_limit_clamps_requested_depth() {
        let (status, body) =
            get_json(app_with(catalog(), 1), "/category/1/tree?maxDepth=50").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["children"][0]["id"], 2);
        assert_eq!(body["children"][0]["children"], json!([]));
    }

    #[tokio::test]
    async fn unknown_root_is_not_found() {
        let (status, body) = get_json(app(), "/category/404/tree").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "category_tree_empty");
    }

    #[tokio::test]
    async fn negative_max_depth_is_bad_request_with_json_body() {
        let (status, body) = get_json(app(), "/category/1/tree?maxDepth=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_input");
        assert_eq!(
            body["error"]["message"],
            "maxDepth must be a non-negative integer"
        );
    }

    #[tokio::test]
    async fn non_numeric_category_id_is_bad_request_with_json_body() {
        let (status, body) = get_json(app(), "/category/abc/tree").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_input");
        assert_eq!(body["error"]["message"], "Category id must be an integer");
    }

    #[tokio::test]
    async fn misordered_source_rows_are_server_errors() {
        let source = FixedRows(vec![
            CategoryRow::new(CategoryId(1), None, None, "Root", 0),
            CategoryRow::new(CategoryId(3), Some(CategoryId(2)), None, "Early", 2),
        ]);
        let (status, body) =
            get_json(app_with(source, MAX_DEPTH_LIMIT), "/category/1/tree").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "category_tree_ordering_violation");
    }

    #[tokio::test]
    async fn source_failure_is_server_error() {
        let (status, body) =
            get_json(app_with(FailingSource, MAX_DEPTH_LIMIT), "/category/1/tree").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "database_error");
        assert_eq!(body["error"]["message"], "Failed to query category tree");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError(LibError::not_found("Parent category not found", anyhow!("missing")));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
