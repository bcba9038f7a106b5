//! # GET/DELETE /{content|setting}/{identifier}/files
//!
//! フィールドのバケットにある管理対象ファイルの一覧と削除。

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use media_types::StoredObject;

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::schema::FieldableKind;

/// 対象フィールドを指定するクエリ。
#[derive(Debug, Deserialize)]
pub struct FieldQuery {
    #[serde(alias = "fieldPath", alias = "field_path")]
    pub field: String,
}

async fn list_files(
    state: &GatewayState,
    kind: FieldableKind,
    identifier: &str,
    field: &str,
) -> Result<Json<Vec<StoredObject>>, GatewayError> {
    let fieldable = state.registry.get(kind, identifier)?;
    let files = state.gateway.list_files(field, fieldable).await?;
    Ok(Json(files))
}

async fn delete_file(
    state: &GatewayState,
    kind: FieldableKind,
    identifier: &str,
    uuid: &str,
    filename: &str,
    field: &str,
) -> Result<StatusCode, GatewayError> {
    let fieldable = state.registry.get(kind, identifier)?;
    state
        .gateway
        .delete_file(uuid, filename, field, fieldable)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /content/{content_type}/files?field= — ファイル一覧。
pub async fn handle_list_content_files(
    State(state): State<Arc<GatewayState>>,
    Path(content_type): Path<String>,
    Query(query): Query<FieldQuery>,
) -> Result<Json<Vec<StoredObject>>, GatewayError> {
    list_files(&state, FieldableKind::ContentType, &content_type, &query.field).await
}

/// GET /setting/{setting_type}/files?field= — ファイル一覧。
pub async fn handle_list_setting_files(
    State(state): State<Arc<GatewayState>>,
    Path(setting_type): Path<String>,
    Query(query): Query<FieldQuery>,
) -> Result<Json<Vec<StoredObject>>, GatewayError> {
    list_files(&state, FieldableKind::SettingType, &setting_type, &query.field).await
}

/// DELETE /content/{content_type}/files/{uuid}/{filename}?field= — ファイル削除。
pub async fn handle_delete_content_file(
    State(state): State<Arc<GatewayState>>,
    Path((content_type, uuid, filename)): Path<(String, String, String)>,
    Query(query): Query<FieldQuery>,
) -> Result<StatusCode, GatewayError> {
    delete_file(
        &state,
        FieldableKind::ContentType,
        &content_type,
        &uuid,
        &filename,
        &query.field,
    )
    .await
}

/// DELETE /setting/{setting_type}/files/{uuid}/{filename}?field= — ファイル削除。
pub async fn handle_delete_setting_file(
    State(state): State<Arc<GatewayState>>,
    Path((setting_type, uuid, filename)): Path<(String, String, String)>,
    Query(query): Query<FieldQuery>,
) -> Result<StatusCode, GatewayError> {
    delete_file(
        &state,
        FieldableKind::SettingType,
        &setting_type,
        &uuid,
        &filename,
        &query.field,
    )
    .await
}
