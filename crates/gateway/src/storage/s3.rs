//! # S3互換 オブジェクトストレージ実装
//!
//! AWS S3, MinIO, Cloudflare R2 等のS3互換APIを使用する実装。
//! パススタイルのアドレッシングで接続する。

use super::{ObjectEntry, ObjectPage, ObjectStore, ObjectStoreConnector};
use crate::bucket::BucketConfig;
use crate::error::GatewayError;

/// リクエストごとにS3互換バケットへ接続するコネクタ。
pub struct S3Connector;

impl ObjectStoreConnector for S3Connector {
    fn connect(&self, config: &BucketConfig) -> Result<Box<dyn ObjectStore>, GatewayError> {
        Ok(Box::new(S3ObjectStore::new(init_bucket(config)?)))
    }
}

/// バケット設定からS3互換バケットを初期化する。
fn init_bucket(config: &BucketConfig) -> Result<s3::Bucket, GatewayError> {
    let region = s3::Region::Custom {
        region: config.region.clone(),
        endpoint: config.endpoint.clone(),
    };

    let credentials = s3::creds::Credentials::new(
        Some(config.access_key.as_str()),
        Some(config.access_secret.as_str()),
        None,
        None,
        None,
    )
    .map_err(|e| GatewayError::InvalidArgument(format!("資格情報が不正です: {e}")))?;

    let bucket = s3::Bucket::new(&config.bucket_name, region, credentials)
        .map_err(|e| GatewayError::InvalidArgument(format!("バケットの初期化に失敗: {e}")))?
        .with_path_style();

    Ok(*bucket)
}

/// S3互換ストレージによる実装。
pub struct S3ObjectStore {
    bucket: s3::Bucket,
}

impl S3ObjectStore {
    pub fn new(bucket: s3::Bucket) -> Self {
        Self { bucket }
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn presign_put(&self, key: &str, expiry_secs: u32) -> Result<String, GatewayError> {
        self.bucket
            .presign_put(key, expiry_secs, None, None)
            .await
            .map_err(|e| GatewayError::Storage(format!("署名付きアップロードURL生成失敗: {e}")))
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, GatewayError> {
        let (result, status) = self
            .bucket
            .list_page(prefix.to_string(), None, continuation_token, None, None)
            .await
            .map_err(|e| GatewayError::Storage(format!("オブジェクト一覧の取得に失敗: {e}")))?;

        if !is_success(status) {
            return Err(GatewayError::Storage(format!(
                "オブジェクト一覧の取得に失敗: HTTP {status}"
            )));
        }

        let entries = result
            .contents
            .into_iter()
            .map(|object| ObjectEntry {
                key: object.key,
                size: object.size,
            })
            .collect();

        let next_token = if result.is_truncated {
            result.next_continuation_token
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            next_token,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), GatewayError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| GatewayError::Storage(format!("オブジェクトの削除に失敗: {e}")))?;

        let status = response.status_code();
        if !is_success(status) {
            return Err(GatewayError::Storage(format!(
                "オブジェクトの削除に失敗: HTTP {status}"
            )));
        }
        Ok(())
    }
}
