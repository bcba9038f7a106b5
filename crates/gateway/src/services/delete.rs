//! # 削除サービス
//!
//! 管理対象オブジェクトを1回の削除呼び出しで取り除く。リトライはしない。

use crate::bucket::BucketConfig;
use crate::error::GatewayError;
use crate::services::listing::is_uuid_shaped;
use crate::storage::ObjectStore;

/// `key`（prefixを除いた相対キー）のオブジェクトを削除する。
pub async fn delete(
    store: &dyn ObjectStore,
    config: &BucketConfig,
    key: &str,
) -> Result<(), GatewayError> {
    let full_key = config.prefixed_key(key.trim_start_matches('/'));
    store.delete_object(&full_key).await?;
    tracing::info!(bucket = %config.bucket_name, key = %full_key, "オブジェクトを削除");
    Ok(())
}

/// uuidとファイル名から管理対象オブジェクトを削除する。
pub async fn delete_file(
    store: &dyn ObjectStore,
    config: &BucketConfig,
    uuid: &str,
    filename: &str,
) -> Result<(), GatewayError> {
    if !is_uuid_shaped(uuid) {
        return Err(GatewayError::InvalidArgument(format!(
            "不正なuuidです: \"{uuid}\""
        )));
    }
    if filename.is_empty() || filename.contains('/') {
        return Err(GatewayError::InvalidArgument(format!(
            "不正なファイル名です: \"{filename}\""
        )));
    }
    delete(store, config, &format!("{uuid}/{filename}")).await
}
