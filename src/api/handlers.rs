//! HTTP request handlers for the signature service.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ast_engine::{parser::from_json_unbounded, Node};
use crate::processing::render_signature;
use crate::types::{render_report, FileReport, SignatureConfig};

/// Application state shared across handlers.
pub struct AppState {
    pub config: SignatureConfig,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub parser_command: String,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        parser_command: state.config.parser_command.clone(),
    })
}

/// One file's syntax tree, as dumped by PHP-Parser.
#[derive(Debug, Deserialize)]
pub struct FileAst {
    pub path: String,
    pub ast: Vec<Node>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub path: String,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignatureErrorResponse {
    pub path: String,
    pub error: String,
    pub line: u32,
}

/// Render the signature of a single uploaded syntax tree.
///
/// The body is decoded without a nesting limit, since real trees nest deeper
/// than the default JSON extractor allows.
pub async fn signature(
    body: Bytes,
) -> Result<Json<SignatureResponse>, (StatusCode, Json<SignatureErrorResponse>)> {
    let request: FileAst = from_json_unbounded(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(SignatureErrorResponse {
                path: String::new(),
                error: format!("invalid request body: {}", e),
                line: 0,
            }),
        )
    })?;

    info!(path = %request.path, statements = request.ast.len(), "Received signature request");

    match render_signature(&request.ast) {
        Ok(signature) => Ok(Json(SignatureResponse {
            path: request.path,
            signature,
        })),
        Err(e) => {
            warn!(path = %request.path, error = %e, "Signature failed");
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(SignatureErrorResponse {
                    line: e.line().unwrap_or(0),
                    error: e.to_string(),
                    path: request.path,
                }),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub files: Vec<FileAst>,
}

/// Render a plain-text report for several files, ordered by path. Files
/// sharing a path keep their request order.
pub async fn report(body: Bytes) -> Result<String, (StatusCode, String)> {
    let request: ReportRequest = from_json_unbounded(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid request body: {}", e)))?;

    info!(files = request.files.len(), "Received report request");

    let mut reports: Vec<FileReport> = request
        .files
        .into_iter()
        .map(|file| match render_signature(&file.ast) {
            Ok(signature) => FileReport::success(file.path, signature),
            Err(e) => FileReport::failure(file.path, e),
        })
        .collect();
    reports.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(render_report(&reports))
}
