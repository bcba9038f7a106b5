//! # ファイル記述子の検証
//!
//! CMSがコンテンツ保存時に送ってくる `{id, name, size, checksum}` を検証する。
//!
//! ## 検証ルール
//! 1. 検証グループが `DELETE` の場合は何もしない
//! 2. 記述子が未設定（null）の場合は何もしない（フィールドが空のまま）
//! 3. いずれかの項目が欠けている場合は `storage.missing_file_definition`
//! 4. チェックサムが検証できない場合は `storage.invalid_checksum`

use media_types::{FileDescriptor, Violation};

use crate::checksum::ChecksumService;
use crate::error::GatewayError;

/// 削除時の検証グループ
pub const DELETE_GROUP: &str = "DELETE";

pub const MISSING_FILE_DEFINITION: &str = "storage.missing_file_definition";
pub const INVALID_CHECKSUM: &str = "storage.invalid_checksum";

/// id・name・checksum・sizeが全て揃っているか。
pub fn is_complete(descriptor: &FileDescriptor) -> bool {
    !descriptor.id.trim().is_empty()
        && !descriptor.name.trim().is_empty()
        && !descriptor.checksum.trim().is_empty()
        && descriptor.size > 0
}

/// 記述子のチェックサムを検証する。
pub fn verify_descriptor(
    checksum: &ChecksumService,
    descriptor: &FileDescriptor,
) -> Result<(), GatewayError> {
    if checksum.verify_file(&descriptor.checksum, &descriptor.id, &descriptor.name) {
        Ok(())
    } else {
        Err(GatewayError::ChecksumMismatch(format!(
            "{}/{}",
            descriptor.id, descriptor.name
        )))
    }
}

/// フィールド `path` に保存される記述子を検証し、違反を返す。
pub fn validate_file_data(
    checksum: &ChecksumService,
    path: &str,
    data: Option<&FileDescriptor>,
    group: Option<&str>,
) -> Vec<Violation> {
    if group.is_some_and(|g| g.trim().eq_ignore_ascii_case(DELETE_GROUP)) {
        return Vec::new();
    }
    let Some(descriptor) = data else {
        return Vec::new();
    };

    if !is_complete(descriptor) {
        return vec![Violation::new(path, MISSING_FILE_DEFINITION)];
    }

    match verify_descriptor(checksum, descriptor) {
        Ok(()) => Vec::new(),
        Err(e) => {
            tracing::warn!(field = path, error = %e, "ファイル記述子のチェックサム検証に失敗");
            vec![Violation::new(path, INVALID_CHECKSUM)]
        }
    }
}
