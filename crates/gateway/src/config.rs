//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//! プロセス全体で共有する値（チェックサム秘密鍵、画像プロキシURL）は
//! ここで読み込み、サービスへ明示的に渡す。

use std::path::PathBuf;
use std::time::Duration;

use rand::RngCore;

use crate::checksum::ChecksumService;
use crate::gateway::StorageGateway;
use crate::schema::SchemaRegistry;
use crate::services::ImageUrlBuilder;
use crate::storage::ObjectStoreConnector;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_IMAGE_PROXY_URL: &str = "http://localhost:8080";
const DEFAULT_SCHEMA_PATH: &str = "schema.json";
const DEFAULT_LIST_TIMEOUT_SECS: u64 = 30;

/// 環境変数から読み込んだGateway設定。
pub struct GatewayConfig {
    /// HTTPの待ち受けアドレス
    pub listen_addr: String,
    /// チェックサム用HMAC秘密鍵
    pub checksum_secret: String,
    /// 画像変換プロキシのベースURL
    pub image_proxy_url: String,
    /// コンテンツタイプ・設定タイプを記述したスキーマファイル
    pub schema_path: PathBuf,
    /// 1回の一覧取得の期限
    pub list_timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("checksum_secret", &"***")
            .field("image_proxy_url", &self.image_proxy_url)
            .field("schema_path", &self.schema_path)
            .field("list_timeout", &self.list_timeout)
            .finish()
    }
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let listen_addr =
            lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let checksum_secret = match lookup("CHECKSUM_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                // 開発環境用: 再起動で既存のチェックサムは全て無効になる
                tracing::warn!("CHECKSUM_SECRETが未設定です。ランダムな秘密鍵を生成します（開発環境用）");
                let mut bytes = [0u8; 32];
                rand::rngs::OsRng.fill_bytes(&mut bytes);
                hex::encode(bytes)
            }
        };

        let image_proxy_url =
            lookup("IMAGE_PROXY_URL").unwrap_or_else(|| DEFAULT_IMAGE_PROXY_URL.to_string());
        let schema_path = PathBuf::from(
            lookup("SCHEMA_PATH").unwrap_or_else(|| DEFAULT_SCHEMA_PATH.to_string()),
        );

        let list_timeout_secs = match lookup("LIST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                anyhow::anyhow!("LIST_TIMEOUT_SECSは正の整数である必要があります: {e}")
            })?,
            None => DEFAULT_LIST_TIMEOUT_SECS,
        };
        if list_timeout_secs == 0 {
            anyhow::bail!("LIST_TIMEOUT_SECSは1以上である必要があります");
        }

        Ok(Self {
            listen_addr,
            checksum_secret,
            image_proxy_url,
            schema_path,
            list_timeout: Duration::from_secs(list_timeout_secs),
        })
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// ファイル操作のファサード
    pub gateway: StorageGateway,
    /// CMSスキーマ
    pub registry: SchemaRegistry,
}

impl GatewayState {
    pub fn new(
        config: &GatewayConfig,
        registry: SchemaRegistry,
        connector: Box<dyn ObjectStoreConnector>,
    ) -> Self {
        let gateway = StorageGateway::new(
            connector,
            ChecksumService::new(config.checksum_secret.clone()),
            ImageUrlBuilder::new(config.image_proxy_url.clone()),
            config.list_timeout,
        );
        Self { gateway, registry }
    }
}
