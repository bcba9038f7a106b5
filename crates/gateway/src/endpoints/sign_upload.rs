//! # POST /{content|setting}/{identifier}/sign-upload
//!
//! アップロードウィジェットから呼ばれる署名付きURL発行。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use media_types::{PreSignedUpload, SignUploadRequest};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::schema::FieldableKind;

async fn sign_upload(
    state: &GatewayState,
    kind: FieldableKind,
    identifier: &str,
    body: SignUploadRequest,
) -> Result<Json<PreSignedUpload>, GatewayError> {
    let fieldable = state.registry.get(kind, identifier)?;
    let upload = state
        .gateway
        .sign_upload(&body.filename, &body.field, fieldable)
        .await?;
    Ok(Json(upload))
}

/// POST /content/{content_type}/sign-upload — 署名付きURL発行。
pub async fn handle_sign_content_upload(
    State(state): State<Arc<GatewayState>>,
    Path(content_type): Path<String>,
    Json(body): Json<SignUploadRequest>,
) -> Result<Json<PreSignedUpload>, GatewayError> {
    sign_upload(&state, FieldableKind::ContentType, &content_type, body).await
}

/// POST /setting/{setting_type}/sign-upload — 署名付きURL発行。
pub async fn handle_sign_setting_upload(
    State(state): State<Arc<GatewayState>>,
    Path(setting_type): Path<String>,
    Json(body): Json<SignUploadRequest>,
) -> Result<Json<PreSignedUpload>, GatewayError> {
    sign_upload(&state, FieldableKind::SettingType, &setting_type, body).await
}
