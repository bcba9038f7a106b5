//! # POST /{content|setting}/{identifier}/validate-file
//!
//! CMSの保存処理から呼ばれるファイル記述子の検証。
//! 違反があっても200で返し、違反リストで結果を伝える。
//! 有効な記述子には公開URLを添える。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use media_types::{ValidateFileRequest, ValidateFileResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::schema::FieldableKind;

fn validate_file(
    state: &GatewayState,
    kind: FieldableKind,
    identifier: &str,
    body: &ValidateFileRequest,
) -> Result<Json<ValidateFileResponse>, GatewayError> {
    let fieldable = state.registry.get(kind, identifier)?;
    let response = state.gateway.validate_file(
        &body.field,
        fieldable,
        body.data.as_ref(),
        body.group.as_deref(),
    )?;
    Ok(Json(response))
}

/// POST /content/{content_type}/validate-file
pub async fn handle_validate_content_file(
    State(state): State<Arc<GatewayState>>,
    Path(content_type): Path<String>,
    Json(body): Json<ValidateFileRequest>,
) -> Result<Json<ValidateFileResponse>, GatewayError> {
    validate_file(&state, FieldableKind::ContentType, &content_type, &body)
}

/// POST /setting/{setting_type}/validate-file
pub async fn handle_validate_setting_file(
    State(state): State<Arc<GatewayState>>,
    Path(setting_type): Path<String>,
    Json(body): Json<ValidateFileRequest>,
) -> Result<Json<ValidateFileResponse>, GatewayError> {
    validate_file(&state, FieldableKind::SettingType, &setting_type, &body)
}
