//! # Media Storage Gateway
//!
//! CMSのファイルフィールドとS3互換バケットを仲介するGateway。
//!
//! ## 役割
//! - フィールドパスからファイルフィールドとバケット設定を解決
//! - 署名付きアップロードURLの発行（拡張子チェック、uuid付きキー、チェックサム付与）
//! - バケット内の管理対象ファイルの一覧（全ページ取得、表示用URL付与）
//! - 管理対象ファイルの削除
//! - 保存時のファイル記述子の検証
//!
//! ## API エンドポイント
//! - `POST /content/{content_type}/sign-upload` — 署名付きURL発行
//! - `GET /content/{content_type}/files?field=` — ファイル一覧
//! - `DELETE /content/{content_type}/files/{uuid}/{filename}?field=` — ファイル削除
//! - `POST /content/{content_type}/validate-file` — ファイル記述子の検証
//! - `/setting/{setting_type}/...` — 設定タイプ向けの同じ操作
//! - `GET /health` — 死活監視

mod bucket;
mod checksum;
mod config;
mod descriptor;
mod endpoints;
mod error;
mod gateway;
mod resolver;
mod schema;
mod services;
mod storage;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use tracing_subscriber::EnvFilter;

use config::{GatewayConfig, GatewayState};
use endpoints::*;
use schema::SchemaRegistry;

fn router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route("/health", get(handle_health))
        .route(
            "/content/{content_type}/sign-upload",
            post(handle_sign_content_upload),
        )
        .route(
            "/content/{content_type}/files",
            get(handle_list_content_files),
        )
        .route(
            "/content/{content_type}/files/{uuid}/{filename}",
            delete(handle_delete_content_file),
        )
        .route(
            "/content/{content_type}/validate-file",
            post(handle_validate_content_file),
        )
        .route(
            "/setting/{setting_type}/sign-upload",
            post(handle_sign_setting_upload),
        )
        .route(
            "/setting/{setting_type}/files",
            get(handle_list_setting_files),
        )
        .route(
            "/setting/{setting_type}/files/{uuid}/{filename}",
            delete(handle_delete_setting_file),
        )
        .route(
            "/setting/{setting_type}/validate-file",
            post(handle_validate_setting_file),
        )
        .with_state(state)
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;

    let registry = match SchemaRegistry::load(&config.schema_path) {
        Ok(registry) => registry,
        Err(error::GatewayError::Validation(violations)) => {
            for v in &violations {
                tracing::error!(path = %v.path, message = %v.message, "フィールド設定の違反");
            }
            anyhow::bail!("スキーマに {} 件の設定違反があります", violations.len());
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(
        schema_path = %config.schema_path.display(),
        schemas = registry.len(),
        "スキーマを読み込みました"
    );

    let connector = storage::default_connector()?;
    let state = Arc::new(GatewayState::new(&config, registry, connector));
    let app = router(state);

    tracing::info!("Gatewayを {} で起動します", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
