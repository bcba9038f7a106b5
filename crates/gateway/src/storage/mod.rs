//! # オブジェクトストレージ
//!
//! Gatewayが利用するオブジェクトストレージの抽象インターフェース。
//! S3互換ストレージ実装は `s3` サブモジュールを参照。
//!
//! 署名付きURL生成・ページ単位の一覧取得・削除の3操作のみを要求する。
//! 拡張子チェック、キー導出、管理対象フィルタ等のロジックはサービス層にあり、
//! このトレイトの実装を差し替えることで実バケットなしにテストできる。

#[cfg(feature = "vendor-aws")]
pub mod s3;

#[cfg(feature = "vendor-aws")]
pub use s3::S3Connector;

use crate::bucket::BucketConfig;
use crate::error::GatewayError;

/// 一覧取得で返される1オブジェクト。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// バケット内のキー（prefix込み）
    pub key: String,
    /// サイズ（バイト）
    pub size: u64,
}

/// 一覧取得の1ページ。
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub entries: Vec<ObjectEntry>,
    /// 次ページの継続トークン。最終ページではNone。
    pub next_token: Option<String>,
}

/// 1バケットに対するオブジェクトストレージ操作。
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// 署名付きアップロードURL（PUT）を生成する。
    ///
    /// 資格情報によるローカルな署名計算であり、ストレージへの通信は発生しない。
    async fn presign_put(&self, key: &str, expiry_secs: u32) -> Result<String, GatewayError>;

    /// prefix配下のオブジェクトを1ページ分取得する。
    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, GatewayError>;

    /// オブジェクトを削除する。存在しないキーの削除は成功として扱われる。
    async fn delete_object(&self, key: &str) -> Result<(), GatewayError>;
}

/// バケット設定からストレージへの接続を構築する。
///
/// バケット設定はリクエストごとにフィールド設定から決まるため、
/// 接続もリクエストごとに構築する。
pub trait ObjectStoreConnector: Send + Sync {
    fn connect(&self, config: &BucketConfig) -> Result<Box<dyn ObjectStore>, GatewayError>;
}

/// 有効化されたストレージバックエンドのコネクタを返す。
pub fn default_connector() -> anyhow::Result<Box<dyn ObjectStoreConnector>> {
    #[cfg(feature = "vendor-aws")]
    {
        Ok(Box::new(S3Connector))
    }
    #[cfg(not(feature = "vendor-aws"))]
    {
        anyhow::bail!("ストレージバックエンドが有効化されていません（feature: vendor-aws）")
    }
}
