//! # Gateway エラー型
//!
//! 全エンドポイント・サービスで共通のエラー型。

use axum::http::StatusCode;
use axum::Json;
use media_types::Violation;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正な引数（拡張子なし、未許可の拡張子、解決できないフィールドパス、バケット設定の欠落）
    #[error("不正なリクエスト: {0}")]
    InvalidArgument(String),
    /// バケット・フィールド設定の検証違反（全件をまとめて報告する）
    #[error("設定の検証に失敗: {} 件の違反", .0.len())]
    Validation(Vec<Violation>),
    /// ファイル記述子のチェックサム不一致
    #[error("チェックサムが一致しません: {0}")]
    ChecksumMismatch(String),
    /// オブジェクトストレージ操作に失敗
    #[error("ストレージ操作に失敗: {0}")]
    Storage(String),
    /// コンテンツタイプ・設定タイプが存在しない
    #[error("見つかりません: {0}")]
    NotFound(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::InvalidArgument(_)
            | GatewayError::Validation(_)
            | GatewayError::Storage(_) => StatusCode::BAD_REQUEST,
            GatewayError::ChecksumMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match self {
            GatewayError::Validation(violations) => (status, Json(violations)).into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

impl From<media_crypto::CryptoError> for GatewayError {
    fn from(e: media_crypto::CryptoError) -> Self {
        GatewayError::Internal(format!("チェックサム処理に失敗: {e}"))
    }
}
