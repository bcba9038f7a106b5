//! # テスト用共通ヘルパー
//!
//! 実バケットの代わりに使うインメモリのオブジェクトストレージとサンプルスキーマ。

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::bucket::BucketConfig;
use crate::error::GatewayError;
use crate::storage::{ObjectEntry, ObjectPage, ObjectStore, ObjectStoreConnector};

#[derive(Default)]
struct Inner {
    objects: BTreeMap<String, u64>,
    page_size: usize,
    fail_list_on_page: Option<usize>,
    page_delay: Option<Duration>,
    fail_deletes: bool,
    list_calls: usize,
    presign_count: usize,
    deleted: Vec<String>,
}

/// インメモリのオブジェクトストレージ。クローンは状態を共有する。
#[derive(Clone)]
pub struct MemoryStore {
    bucket: String,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            bucket: "media".to_string(),
            inner: Arc::new(Mutex::new(Inner {
                page_size,
                ..Default::default()
            })),
        }
    }

    pub fn insert(&self, key: &str, size: u64) {
        self.inner.lock().unwrap().objects.insert(key.to_string(), size);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().unwrap().objects.contains_key(key)
    }

    /// n番目（1始まり）のページ取得を失敗させる。
    pub fn fail_list_on_page(&self, page: usize) {
        self.inner.lock().unwrap().fail_list_on_page = Some(page);
    }

    pub fn set_page_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().page_delay = Some(delay);
    }

    pub fn fail_deletes(&self) {
        self.inner.lock().unwrap().fail_deletes = true;
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    pub fn presign_count(&self) -> usize {
        self.inner.lock().unwrap().presign_count
    }

    pub fn deleted(&self) -> Vec<String> {
        self.inner.lock().unwrap().deleted.clone()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn presign_put(&self, key: &str, expiry_secs: u32) -> Result<String, GatewayError> {
        self.inner.lock().unwrap().presign_count += 1;
        Ok(format!(
            "http://memory-storage/{}/{key}?expires={expiry_secs}",
            self.bucket
        ))
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, GatewayError> {
        let (delay, page_no) = {
            let mut inner = self.inner.lock().unwrap();
            inner.list_calls += 1;
            (inner.page_delay, inner.list_calls)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock().unwrap();
        if inner.fail_list_on_page == Some(page_no) {
            return Err(GatewayError::Storage("simulated list failure".to_string()));
        }

        // 継続トークンは前ページ最後のキー
        let matching: Vec<ObjectEntry> = inner
            .objects
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| continuation_token.as_ref().map_or(true, |t| k.as_str() > t.as_str()))
            .map(|(k, size)| ObjectEntry {
                key: k.clone(),
                size: *size,
            })
            .collect();

        let has_more = matching.len() > inner.page_size;
        let entries: Vec<ObjectEntry> = matching.into_iter().take(inner.page_size).collect();
        let next_token = if has_more {
            entries.last().map(|e| e.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            next_token,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_deletes {
            return Err(GatewayError::Storage("simulated delete failure".to_string()));
        }
        inner.objects.remove(key);
        inner.deleted.push(key.to_string());
        Ok(())
    }
}

/// 常に同じMemoryStoreを返すコネクタ。接続されたバケット設定を記録する。
#[derive(Clone)]
pub struct MemoryConnector {
    pub store: MemoryStore,
    pub connected: Arc<Mutex<Vec<BucketConfig>>>,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            connected: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ObjectStoreConnector for MemoryConnector {
    fn connect(&self, config: &BucketConfig) -> Result<Box<dyn ObjectStore>, GatewayError> {
        self.connected.lock().unwrap().push(config.clone());
        let mut store = self.store.clone();
        store.bucket = config.bucket_name.clone();
        Ok(Box::new(store))
    }
}

/// バケット "media" のテスト用設定。
pub fn bucket_config(path: Option<&str>) -> BucketConfig {
    let mut raw = serde_json::Map::new();
    raw.insert("endpoint".into(), json!("http://localhost:9000"));
    raw.insert("key".into(), json!("minioadmin"));
    raw.insert("secret".into(), json!("minioadmin"));
    raw.insert("bucket".into(), json!("media"));
    if let Some(path) = path {
        raw.insert("path".into(), json!(path));
    }
    BucketConfig::from_settings(&raw).unwrap()
}

/// コンテンツタイプ "article" と設定タイプ "website" を持つサンプルスキーマ。
///
/// - article.title: 文字列
/// - article.cover: media-image（prefix "covers"、png/jpg）
/// - article.gallery: collection（image: media、prefix "gallery"）
/// - website.logo: media（prefixなし）
pub fn sample_schema_json() -> String {
    let bucket = |path: Option<&str>| {
        let mut b = json!({
            "endpoint": "http://localhost:9000",
            "key": "minioadmin",
            "secret": "minioadmin",
            "bucket": "media"
        });
        if let Some(p) = path {
            b["path"] = json!(p);
        }
        b
    };

    json!({
        "content_types": [{
            "identifier": "article",
            "fields": [
                {"identifier": "title", "type": "text"},
                {
                    "identifier": "cover",
                    "type": "media-image",
                    "settings": {"bucket": bucket(Some("covers")), "file_types": "png,jpg"}
                },
                {
                    "identifier": "gallery",
                    "type": "collection",
                    "settings": {"fields": [
                        {"identifier": "caption", "type": "text"},
                        {"identifier": "image", "type": "media", "settings": {"bucket": bucket(Some("/gallery/"))}}
                    ]}
                }
            ]
        }],
        "setting_types": [{
            "identifier": "website",
            "fields": [
                {"identifier": "logo", "type": "media", "settings": {"bucket": bucket(None)}}
            ]
        }]
    })
    .to_string()
}
