//! # オブジェクト一覧サービス
//!
//! バケットの全ページを取得し、このGatewayが管理するオブジェクト
//! （`[prefix/]uuid/filename` の形式）だけを返す。
//!
//! ## 処理フロー
//! 1. 継続トークンを辿って全ページを取得（期限を過ぎたら失敗）
//! 2. prefixを除いたキーが `uuid/filename` 形式のものだけを残す
//! 3. チェックサムと表示用URLを付与
//!
//! 1ページでも取得に失敗した場合は一覧全体をStorageエラーとする。

use tokio::time::Instant;

use media_types::StoredObject;

use crate::bucket::BucketConfig;
use crate::checksum::ChecksumService;
use crate::error::GatewayError;
use crate::services::image_urls::ImageUrlBuilder;
use crate::storage::{ObjectEntry, ObjectStore};

/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` 形式（16進、大文字小文字不問）か判定する。
pub fn is_uuid_shaped(s: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == GROUPS.len()
        && parts
            .iter()
            .zip(GROUPS)
            .all(|(part, len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// 管理対象オブジェクトのキーを `(uuid, filename)` に分解する。
///
/// prefixを除いた残りが `uuid/filename` でない場合はNone。
pub fn split_managed_key<'a>(key: &'a str, prefix: Option<&str>) -> Option<(&'a str, &'a str)> {
    let relative = match prefix {
        Some(prefix) => key.strip_prefix(prefix)?.strip_prefix('/')?,
        None => key,
    };
    let (uuid, filename) = relative.split_once('/')?;
    if !is_uuid_shaped(uuid) || filename.is_empty() || filename.contains('/') {
        return None;
    }
    Some((uuid, filename))
}

/// 最初の "." 以降を拡張子とする。"." がなければ空文字列。
fn listing_extension(filename: &str) -> &str {
    filename.split_once('.').map_or("", |(_, ext)| ext)
}

/// オブジェクト一覧サービス。
#[derive(Debug, Clone)]
pub struct ObjectListingService {
    checksum: ChecksumService,
    image_urls: ImageUrlBuilder,
}

impl ObjectListingService {
    pub fn new(checksum: ChecksumService, image_urls: ImageUrlBuilder) -> Self {
        Self {
            checksum,
            image_urls,
        }
    }

    /// prefix配下の管理対象オブジェクトを列挙する。
    pub async fn list(
        &self,
        store: &dyn ObjectStore,
        config: &BucketConfig,
        deadline: Instant,
    ) -> Result<Vec<StoredObject>, GatewayError> {
        let entries = drain_pages(store, &config.list_prefix(), deadline).await?;
        let total = entries.len();

        let mut objects = Vec::new();
        for entry in entries {
            if let Some(object) = self.to_stored_object(config, entry)? {
                objects.push(object);
            }
        }

        tracing::info!(
            bucket = %config.bucket_name,
            total,
            managed = objects.len(),
            "オブジェクト一覧を取得"
        );
        Ok(objects)
    }

    fn to_stored_object(
        &self,
        config: &BucketConfig,
        entry: ObjectEntry,
    ) -> Result<Option<StoredObject>, GatewayError> {
        let Some((uuid, filename)) = split_managed_key(&entry.key, config.path_prefix.as_deref())
        else {
            tracing::debug!(key = %entry.key, "管理対象外のオブジェクトをスキップ");
            return Ok(None);
        };

        let checksum = self.checksum.sign_file(uuid, filename)?;
        let urls = self.image_urls.urls_for(config, &entry.key)?;
        let (uuid, filename) = (uuid.to_string(), filename.to_string());

        Ok(Some(StoredObject {
            extension: listing_extension(&filename).to_string(),
            uuid,
            filename,
            size: entry.size,
            checksum,
            urls,
            key: entry.key,
        }))
    }
}

/// 継続トークンを辿って全ページのエントリを取得する。
async fn drain_pages(
    store: &dyn ObjectStore,
    prefix: &str,
    deadline: Instant,
) -> Result<Vec<ObjectEntry>, GatewayError> {
    let mut entries = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = tokio::time::timeout_at(deadline, store.list_page(prefix, token.take()))
            .await
            .map_err(|_| {
                tracing::warn!(pages, "一覧取得が期限内に完了しませんでした");
                GatewayError::Storage(format!(
                    "一覧取得が期限内に完了しませんでした（{pages} ページ取得済み）"
                ))
            })??;
        pages += 1;
        tracing::debug!(page = pages, entries = page.entries.len(), "一覧ページを取得");

        entries.extend(page.entries);
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::test_helpers::{bucket_config, MemoryStore};

    const UUID: &str = "123e4567-e89b-12d3-a456-426614174000";

    fn service() -> ObjectListingService {
        ObjectListingService::new(
            ChecksumService::new("s3cret"),
            ImageUrlBuilder::new("https://img.example.com"),
        )
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[test]
    fn test_uuid_shape() {
        assert!(is_uuid_shaped(UUID));
        assert!(is_uuid_shaped("123E4567-E89B-12D3-A456-426614174000"));
        assert!(!is_uuid_shaped("not-a-uuid"));
        assert!(!is_uuid_shaped("123e4567e89b12d3a456426614174000"));
        assert!(!is_uuid_shaped("123e4567-e89b-12d3-a456-42661417400g"));
    }

    #[test]
    fn test_managed_key_filter() {
        assert_eq!(split_managed_key("readme.txt", Some("prefix")), None);
        assert_eq!(split_managed_key("prefix/not-a-uuid/file.txt", Some("prefix")), None);
        assert_eq!(
            split_managed_key(&format!("prefix/{UUID}/photo.png"), Some("prefix")),
            Some((UUID, "photo.png"))
        );
        // prefixなし
        assert_eq!(
            split_managed_key(&format!("{UUID}/photo.png"), None),
            Some((UUID, "photo.png"))
        );
        assert_eq!(split_managed_key("readme.txt", None), None);
        // 別のprefix配下・フォルダマーカー・深すぎるキー
        assert_eq!(split_managed_key(&format!("prefixed/{UUID}/a.png"), Some("prefix")), None);
        assert_eq!(split_managed_key(&format!("{UUID}/"), None), None);
        assert_eq!(split_managed_key(&format!("{UUID}/a/b.png"), None), None);
    }

    /// キーを組み立ててから分解すると元のuuidとファイル名に戻ることを確認
    #[test]
    fn test_key_roundtrip() {
        for prefix in [None, Some("media"), Some("a/b")] {
            let mut raw = serde_json::Map::new();
            raw.insert("endpoint".into(), "http://s3".into());
            raw.insert("key".into(), "k".into());
            raw.insert("secret".into(), "s".into());
            raw.insert("bucket".into(), "b".into());
            if let Some(p) = prefix {
                raw.insert("path".into(), p.into());
            }
            let cfg = BucketConfig::from_settings(&raw).unwrap();
            let key = cfg.object_key(UUID, "photo.final.png");
            assert_eq!(
                split_managed_key(&key, cfg.path_prefix.as_deref()),
                Some((UUID, "photo.final.png"))
            );
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_enriches() {
        let store = MemoryStore::new();
        store.insert("uploads/readme.txt", 10);
        store.insert("uploads/not-a-uuid/file.txt", 10);
        store.insert(&format!("uploads/{UUID}/photo.tar.gz"), 2048);
        store.insert(&format!("other/{UUID}/photo.png"), 1);

        let cfg = bucket_config(Some("uploads"));
        let objects = service().list(&store, &cfg, far_deadline()).await.unwrap();

        assert_eq!(objects.len(), 1);
        let obj = &objects[0];
        assert_eq!(obj.key, format!("uploads/{UUID}/photo.tar.gz"));
        assert_eq!(obj.uuid, UUID);
        assert_eq!(obj.filename, "photo.tar.gz");
        assert_eq!(obj.extension, "tar.gz");
        assert_eq!(obj.size, 2048);
        assert!(ChecksumService::new("s3cret").verify_file(&obj.checksum, UUID, "photo.tar.gz"));
        assert!(obj.urls.original.starts_with("https://img.example.com/"));
        assert_ne!(obj.urls.original, obj.urls.thumbnail);
    }

    /// 複数ページを全て取得することを確認
    #[tokio::test]
    async fn test_list_drains_all_pages() {
        let store = MemoryStore::with_page_size(2);
        for i in 0..7 {
            store.insert(&format!("123e4567-e89b-12d3-a456-42661417400{i}/f{i}.png"), i);
        }
        let cfg = bucket_config(None);
        let objects = service().list(&store, &cfg, far_deadline()).await.unwrap();
        assert_eq!(objects.len(), 7);
        assert_eq!(store.list_calls(), 4);
    }

    /// 途中のページ取得失敗で一覧全体が失敗することを確認
    #[tokio::test]
    async fn test_page_failure_aborts_listing() {
        let store = MemoryStore::with_page_size(1);
        for i in 0..3 {
            store.insert(&format!("123e4567-e89b-12d3-a456-42661417400{i}/f.png"), 1);
        }
        store.fail_list_on_page(2);
        let cfg = bucket_config(None);
        let result = service().list(&store, &cfg, far_deadline()).await;
        assert!(matches!(result, Err(GatewayError::Storage(_))));
    }

    /// 期限切れでページ取得を中断することを確認
    #[tokio::test]
    async fn test_deadline_stops_pagination() {
        let store = MemoryStore::with_page_size(1);
        for i in 0..5 {
            store.insert(&format!("123e4567-e89b-12d3-a456-42661417400{i}/f.png"), 1);
        }
        store.set_page_delay(Duration::from_millis(40));
        let cfg = bucket_config(None);
        let deadline = Instant::now() + Duration::from_millis(60);

        let result = service().list(&store, &cfg, deadline).await;
        match result {
            Err(GatewayError::Storage(msg)) => assert!(msg.contains("期限"), "{msg}"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(store.list_calls() < 5);
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let store = MemoryStore::new();
        let cfg = bucket_config(None);
        let objects = service().list(&store, &cfg, far_deadline()).await.unwrap();
        assert!(objects.is_empty());
        assert_eq!(store.list_calls(), 1);
    }
}
