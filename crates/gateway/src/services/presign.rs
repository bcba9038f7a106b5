//! # アップロード署名サービス
//!
//! 有効期限付きの署名付きPUT URLを発行する。
//!
//! ## 処理フロー
//! 1. ファイル名を最後の "." で分割し、拡張子を取り出す
//! 2. 許可拡張子リスト（カンマ区切り、`*` は全許可）と大文字小文字を区別せず照合
//! 3. 時系列UUID（v7）を生成
//! 4. キー `[prefix/]uuid/filename` に対する署名付きPUT URLを生成（有効期限5分）
//!
//! 共有状態を持たないため、同じフィールドへの並行リクエストも互いに独立する。

use std::time::{SystemTime, UNIX_EPOCH};

use media_types::PreSignedUpload;

use crate::bucket::BucketConfig;
use crate::checksum::ChecksumService;
use crate::error::GatewayError;
use crate::storage::ObjectStore;

/// 署名付きURLの有効期限（秒）
pub const PRESIGN_EXPIRY_SECS: u32 = 300;

/// ファイル名から拡張子を取り出す。拡張子がない場合はInvalidArgument。
pub fn file_extension(filename: &str) -> Result<&str, GatewayError> {
    if filename.trim().is_empty() || filename.contains('/') {
        return Err(GatewayError::InvalidArgument(format!(
            "不正なファイル名です: \"{filename}\""
        )));
    }
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .ok_or_else(|| {
            GatewayError::InvalidArgument(
                "ファイル名には拡張子が含まれている必要があります".to_string(),
            )
        })
}

/// 拡張子が許可リストに含まれるか判定する。
///
/// リストはカンマ区切りで、空白は全て除去してから比較する。
pub fn is_extension_allowed(extension: &str, allowed: &str) -> bool {
    let compact: String = allowed.chars().filter(|c| !c.is_whitespace()).collect();
    let extension = extension.to_lowercase();
    compact
        .split(',')
        .any(|pattern| pattern == "*" || pattern.to_lowercase() == extension)
}

/// アップロード署名サービス。
#[derive(Debug, Clone)]
pub struct PreSignService {
    checksum: ChecksumService,
}

impl PreSignService {
    pub fn new(checksum: ChecksumService) -> Self {
        Self { checksum }
    }

    /// 署名付きアップロードURLを発行する。
    pub async fn issue(
        &self,
        store: &dyn ObjectStore,
        filename: &str,
        config: &BucketConfig,
        allowed_extensions: &str,
    ) -> Result<PreSignedUpload, GatewayError> {
        let extension = file_extension(filename)?;
        if !is_extension_allowed(extension, allowed_extensions) {
            tracing::warn!(filename, "許可されていないファイル形式のアップロード要求");
            return Err(GatewayError::InvalidArgument(format!(
                "ファイル形式 \"{extension}\" はサポートされていません"
            )));
        }

        let uuid = uuid::Uuid::now_v7().to_string();
        let key = config.object_key(&uuid, filename);

        let url = store.presign_put(&key, PRESIGN_EXPIRY_SECS).await?;
        let checksum = self.checksum.sign_file(&uuid, filename)?;

        let expires_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GatewayError::Internal(format!("時刻取得失敗: {e}")))?
            .as_secs()
            + PRESIGN_EXPIRY_SECS as u64;

        tracing::info!(bucket = %config.bucket_name, key = %key, "署名付きアップロードURLを発行");

        Ok(PreSignedUpload {
            url,
            uuid,
            filename: filename.to_string(),
            checksum,
            expires_at,
        })
    }
}
