//! # バケット設定
//!
//! フィールド設定の `bucket` マップを検証し、接続パラメータへ変換する。
//!
//! ## 検証ルール（前のルールで違反があれば後続はスキップ）
//! 1. 許可されたキー以外は `additional_data`
//! 2. 必須キーの欠落は `required`
//! 3. endpointが `http://` または `https://` で始まらない場合は `storage.absolute_url`

use serde::Deserialize;
use serde_json::{Map, Value};

use media_types::Violation;

use crate::error::GatewayError;

/// バケット設定で許可されるキー
pub const ALLOWED_BUCKET_KEYS: [&str; 6] = ["endpoint", "key", "secret", "bucket", "path", "region"];

/// バケット設定の必須キー
pub const REQUIRED_BUCKET_KEYS: [&str; 4] = ["endpoint", "key", "secret", "bucket"];

/// regionが省略された場合のデフォルト
pub const DEFAULT_REGION: &str = "us-east-1";

/// パス接頭辞の前後から取り除く文字
const PREFIX_TRIM_CHARS: &[char] = &['/', ' ', '\t', '\n', '\r', '\0', '\x0B'];

/// 1バケット分の検証済み接続パラメータ。
///
/// リクエストごとにフィールド設定から構築され、変更されない。
#[derive(Clone, PartialEq, Eq)]
pub struct BucketConfig {
    pub endpoint: String,
    pub bucket_name: String,
    pub access_key: String,
    pub access_secret: String,
    pub region: String,
    /// 前後のスラッシュ・空白を取り除いたパス接頭辞。空の場合はNone。
    pub path_prefix: Option<String>,
}

impl std::fmt::Debug for BucketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket_name", &self.bucket_name)
            .field("access_key", &self.access_key)
            .field("access_secret", &"***")
            .field("region", &self.region)
            .field("path_prefix", &self.path_prefix)
            .finish()
    }
}

#[derive(Deserialize)]
struct RawBucketSettings {
    endpoint: String,
    key: String,
    secret: String,
    bucket: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

impl BucketConfig {
    /// 生のバケット設定を検証して構築する。
    pub fn from_settings(raw: &Map<String, Value>) -> Result<Self, GatewayError> {
        let violations = validate_bucket_settings(raw);
        if !violations.is_empty() {
            return Err(GatewayError::Validation(violations));
        }

        let settings: RawBucketSettings = serde_json::from_value(Value::Object(raw.clone()))
            .map_err(|e| GatewayError::InvalidArgument(format!("不正なバケット設定: {e}")))?;

        let region = settings
            .region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            bucket_name: settings.bucket,
            access_key: settings.key,
            access_secret: settings.secret,
            region,
            path_prefix: settings.path.as_deref().and_then(normalize_prefix),
        })
    }

    /// 接頭辞を付与したオブジェクトキーを返す。
    pub fn prefixed_key(&self, key: &str) -> String {
        match &self.path_prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_string(),
        }
    }

    /// 管理対象オブジェクトのキー `[prefix/]uuid/filename` を返す。
    pub fn object_key(&self, uuid: &str, filename: &str) -> String {
        self.prefixed_key(&format!("{uuid}/{filename}"))
    }

    /// パススタイルでの公開エンドポイント `{endpoint}/{bucket}[/{prefix}]`。
    pub fn public_endpoint(&self) -> String {
        let base = format!("{}/{}", self.endpoint, self.bucket_name);
        match &self.path_prefix {
            Some(prefix) => format!("{base}/{prefix}"),
            None => base,
        }
    }

    /// 保存済みファイルの公開URL `{endpoint}/{bucket}[/{prefix}]/{uuid}/{filename}`。
    pub fn public_url(&self, uuid: &str, filename: &str) -> String {
        format!("{}/{uuid}/{filename}", self.public_endpoint())
    }

    /// 一覧取得時に使うprefix。接頭辞がない場合は空文字列。
    pub fn list_prefix(&self) -> String {
        self.path_prefix.clone().unwrap_or_default()
    }
}

/// パス接頭辞から前後のスラッシュ・空白を取り除く。
pub fn normalize_prefix(path: &str) -> Option<String> {
    let trimmed = path.trim_matches(PREFIX_TRIM_CHARS);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// バケット設定を検証し、全ての違反を返す。
pub fn validate_bucket_settings(raw: &Map<String, Value>) -> Vec<Violation> {
    let mut violations: Vec<Violation> = raw
        .keys()
        .filter(|k| !ALLOWED_BUCKET_KEYS.contains(&k.as_str()))
        .map(|k| Violation::new(format!("bucket.{k}"), "additional_data"))
        .collect();
    if !violations.is_empty() {
        return violations;
    }

    violations = REQUIRED_BUCKET_KEYS
        .iter()
        .filter(|k| raw.get(**k).map_or(true, Value::is_null))
        .map(|k| Violation::new(format!("bucket.{k}"), "required"))
        .collect();
    if !violations.is_empty() {
        return violations;
    }

    let endpoint = raw.get("endpoint").and_then(Value::as_str).unwrap_or_default();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        violations.push(Violation::new("bucket.endpoint", "storage.absolute_url"));
    }

    violations
}
