//! HTTP API for the signature service.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/signature", post(handlers::signature))
        .route("/report", post(handlers::report))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::{HealthResponse, SignatureErrorResponse, SignatureResponse};
    use crate::types::SignatureConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(AppState {
            config: SignatureConfig::default(),
        }))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    fn define(name: &str, value: i64) -> serde_json::Value {
        json!({
            "nodeType": "Stmt_Expression",
            "expr": {
                "nodeType": "Expr_FuncCall",
                "name": {"nodeType": "Name", "parts": ["define"]},
                "args": [
                    {"nodeType": "Arg", "value": {"nodeType": "Scalar_String", "value": name}},
                    {"nodeType": "Arg", "value": {"nodeType": "Scalar_LNumber", "value": value}}
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.parser_command, "php-parse");
    }

    #[tokio::test]
    async fn test_signature() {
        let response = app()
            .oneshot(post_json(
                "/signature",
                json!({"path": "a.php", "ast": [define("LIMIT", 10)]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: SignatureResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.path, "a.php");
        assert_eq!(body.signature, "define LIMIT  = 10;");
    }

    #[tokio::test]
    async fn test_signature_unsupported_member() {
        let class = json!({
            "nodeType": "Stmt_Class",
            "flags": 0,
            "name": {"nodeType": "Identifier", "name": "A"},
            "extends": null,
            "implements": [],
            "stmts": [{
                "nodeType": "Stmt_TraitUse",
                "traits": [],
                "adaptations": [],
                "attributes": {"startLine": 4}
            }]
        });
        let response = app()
            .oneshot(post_json("/signature", json!({"path": "a.php", "ast": [class]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: SignatureErrorResponse =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.line, 4);
        assert_eq!(body.error, "Unsupported class member: Stmt_TraitUse");
    }

    #[tokio::test]
    async fn test_report_ordered_by_path() {
        let response = app()
            .oneshot(post_json(
                "/report",
                json!({"files": [
                    {"path": "b.php", "ast": [define("B", 2)]},
                    {"path": "a.php", "ast": [define("A", 1)]}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(
            text,
            "# a.php\n\ndefine A  = 1;\n\n# b.php\n\ndefine B  = 2;\n\n"
        );
    }

    #[tokio::test]
    async fn test_report_keeps_duplicate_paths() {
        let response = app()
            .oneshot(post_json(
                "/report",
                json!({"files": [
                    {"path": "a.php", "ast": [define("FIRST", 1)]},
                    {"path": "a.php", "ast": [define("SECOND", 2)]}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(
            text,
            "# a.php\n\ndefine FIRST  = 1;\n\n# a.php\n\ndefine SECOND  = 2;\n\n"
        );
    }

    #[tokio::test]
    async fn test_signature_accepts_deep_trees() {
        let mut tree = define("DEEP", 1);
        for _ in 0..100 {
            tree = json!({
                "nodeType": "Stmt_If",
                "cond": {"nodeType": "Expr_Variable", "name": "x"},
                "stmts": [],
                "elseifs": [],
                "else": {"nodeType": "Stmt_Else", "stmts": [tree]}
            });
        }
        let response = app()
            .oneshot(post_json("/signature", json!({"path": "deep.php", "ast": [tree]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: SignatureResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.signature, "define DEEP  = 1;");
    }

    #[tokio::test]
    async fn test_signature_rejects_malformed_body() {
        let response = app()
            .oneshot(post_json("/signature", json!({"path": "a.php"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
