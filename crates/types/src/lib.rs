//! # メディアストレージ 共有型定義
//!
//! Storage GatewayとCMS（およびアップロードウィジェット）の間でやり取りする
//! データ構造をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - UUID: ハイフン区切りの小文字16進表記
//! - checksum: URLセーフBase64（パディングなし）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// アップロード署名
// ---------------------------------------------------------------------------

/// アップロード署名リクエスト。アップロードウィジェットから送信される。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUploadRequest {
    /// 拡張子を含むファイル名
    pub filename: String,
    /// 対象フィールドのパス（例: "gallery/image"）
    #[serde(alias = "fieldPath", alias = "field_path")]
    pub field: String,
}

/// 署名付きアップロードURLの発行結果。
///
/// クライアントに一度だけ渡され、サーバー側には保存されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSignedUpload {
    /// 署名付きPUT URL
    pub url: String,
    /// 発行時に生成された時系列UUID
    #[serde(alias = "id")]
    pub uuid: String,
    /// クライアントが指定したファイル名
    #[serde(alias = "name")]
    pub filename: String,
    /// uuid + ファイル名に対するチェックサム
    pub checksum: String,
    /// URL有効期限（UNIXタイムスタンプ）
    pub expires_at: u64,
}

// ---------------------------------------------------------------------------
// オブジェクト一覧
// ---------------------------------------------------------------------------

/// 画像変換プロキシ経由の表示用URL。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrls {
    /// 元画像
    pub original: String,
    /// 300x300に収まるJPEGサムネイル
    pub thumbnail: String,
}

/// 一覧リクエストごとに生成される管理対象オブジェクト。キャッシュしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// バケット内のオブジェクトキー（prefix込み）
    pub key: String,
    /// キーのUUIDセグメント
    pub uuid: String,
    /// キーのファイル名セグメント
    pub filename: String,
    /// 最初の "." 以降の拡張子（存在しない場合は空文字列）
    pub extension: String,
    /// オブジェクトサイズ（バイト）
    pub size: u64,
    /// uuid + ファイル名に対するチェックサム
    pub checksum: String,
    /// 表示用URL
    pub urls: ImageUrls,
}

// ---------------------------------------------------------------------------
// ファイル記述子の検証
// ---------------------------------------------------------------------------

/// CMSのコンテンツに保存されるファイル記述子。
///
/// 空のフォームから送られてくる値も受け付けるため、全フィールドを省略可能とする。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// アップロード時に発行されたUUID
    #[serde(default)]
    pub id: String,
    /// ファイル名
    #[serde(default)]
    pub name: String,
    /// ファイルサイズ（バイト）
    #[serde(default)]
    pub size: u64,
    /// 発行時のチェックサム
    #[serde(default)]
    pub checksum: String,
}

/// ファイル記述子の検証リクエスト。CMSの保存処理から呼ばれる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateFileRequest {
    /// 対象フィールドのパス
    #[serde(alias = "fieldPath", alias = "field_path")]
    pub field: String,
    /// 保存されようとしている記述子（未設定ならnull）
    #[serde(default)]
    pub data: Option<FileDescriptor>,
    /// 検証グループ（"DELETE" の場合は検証をスキップ）
    #[serde(default)]
    pub group: Option<String>,
}

/// 設定・データ検証で見つかった違反。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// 違反箇所のパス（例: "bucket.endpoint"）。フィールド全体の場合は空文字列。
    pub path: String,
    /// 違反の識別子（例: "required", "storage.invalid_checksum"）
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// 記述子検証の結果。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateFileResponse {
    pub violations: Vec<Violation>,
    /// 記述子が有効な場合の公開URL `{endpoint}/{bucket}[/{path}]/{id}/{name}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
