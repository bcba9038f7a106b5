//! # Storage Gateway
//!
//! CMSから見た3つのファイル操作（アップロード署名・一覧・削除）と
//! 保存時の記述子検証をまとめたファサード。
//!
//! いずれの操作もまずフィールドパスをファイルフィールドへ解決し、
//! そのフィールドのバケット設定でストレージに接続する。
//! 解決できない場合・バケット設定がない場合は InvalidArgument。

use std::time::Duration;

use media_types::{FileDescriptor, PreSignedUpload, StoredObject, ValidateFileResponse};

use crate::bucket::BucketConfig;
use crate::checksum::ChecksumService;
use crate::descriptor::{is_complete, validate_file_data, verify_descriptor};
use crate::error::GatewayError;
use crate::resolver::resolve_file_field;
use crate::schema::{allowed_file_types, bucket_config_of, FieldNode, FieldableNode};
use crate::services::{delete, ImageUrlBuilder, ObjectListingService, PreSignService};
use crate::storage::{ObjectStore, ObjectStoreConnector};

pub struct StorageGateway {
    connector: Box<dyn ObjectStoreConnector>,
    presign: PreSignService,
    listing: ObjectListingService,
    checksum: ChecksumService,
    list_timeout: Duration,
}

impl StorageGateway {
    pub fn new(
        connector: Box<dyn ObjectStoreConnector>,
        checksum: ChecksumService,
        image_urls: ImageUrlBuilder,
        list_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            presign: PreSignService::new(checksum.clone()),
            listing: ObjectListingService::new(checksum.clone(), image_urls),
            checksum,
            list_timeout,
        }
    }

    fn resolve<'a>(
        &self,
        field_path: &str,
        fieldable: &'a dyn FieldableNode,
    ) -> Result<&'a dyn FieldNode, GatewayError> {
        resolve_file_field(fieldable, field_path).ok_or_else(|| {
            tracing::warn!(field_path, "ファイルフィールドを解決できません");
            GatewayError::InvalidArgument(format!("フィールド \"{field_path}\" が見つかりません"))
        })
    }

    fn connect(
        &self,
        field: &dyn FieldNode,
    ) -> Result<(BucketConfig, Box<dyn ObjectStore>), GatewayError> {
        let config = bucket_config_of(field)?;
        let store = self.connector.connect(&config)?;
        Ok((config, store))
    }

    /// アップロード用の署名付きURLを発行する。
    pub async fn sign_upload(
        &self,
        filename: &str,
        field_path: &str,
        fieldable: &dyn FieldableNode,
    ) -> Result<PreSignedUpload, GatewayError> {
        let field = self.resolve(field_path, fieldable)?;
        let allowed = allowed_file_types(field)?;
        let (config, store) = self.connect(field)?;
        self.presign
            .issue(store.as_ref(), filename, &config, &allowed)
            .await
    }

    /// フィールドのバケットにある管理対象オブジェクトを一覧する。
    pub async fn list_files(
        &self,
        field_path: &str,
        fieldable: &dyn FieldableNode,
    ) -> Result<Vec<StoredObject>, GatewayError> {
        let field = self.resolve(field_path, fieldable)?;
        let (config, store) = self.connect(field)?;
        let deadline = tokio::time::Instant::now() + self.list_timeout;
        self.listing.list(store.as_ref(), &config, deadline).await
    }

    pub async fn delete_file(
        &self,
        uuid: &str,
        filename: &str,
        field_path: &str,
        fieldable: &dyn FieldableNode,
    ) -> Result<(), GatewayError> {
        let field = self.resolve(field_path, fieldable)?;
        let (config, store) = self.connect(field)?;
        delete::delete_file(store.as_ref(), &config, uuid, filename).await
    }

    /// 保存されようとしているファイル記述子を検証する。
    ///
    /// 記述子が揃っていてチェックサムも検証できた場合は公開URLも返す。
    pub fn validate_file(
        &self,
        field_path: &str,
        fieldable: &dyn FieldableNode,
        data: Option<&FileDescriptor>,
        group: Option<&str>,
    ) -> Result<ValidateFileResponse, GatewayError> {
        let field = self.resolve(field_path, fieldable)?;
        let violations = validate_file_data(&self.checksum, field_path, data, group);

        let url = match data {
            Some(descriptor)
                if violations.is_empty()
                    && is_complete(descriptor)
                    && verify_descriptor(&self.checksum, descriptor).is_ok() =>
            {
                Some(bucket_config_of(field)?.public_url(&descriptor.id, &descriptor.name))
            }
            _ => None,
        };
        Ok(ValidateFileResponse { violations, url })
    }
}
