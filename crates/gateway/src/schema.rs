//! # フィールドスキーマ
//!
//! CMSのフィールド定義（コンテンツタイプ・設定タイプ）のモデル。
//! フィールドパスの解決は `FieldableNode` / `FieldNode` トレイト越しに行い、
//! CMS側の実体に依存しない。
//!
//! ## スキーマファイル形式
//! ```json
//! {
//!   "content_types": [{"identifier": "article", "fields": [...]}],
//!   "setting_types": [{"identifier": "website", "fields": [...]}]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use media_types::Violation;

use crate::bucket::{validate_bucket_settings, BucketConfig};
use crate::error::GatewayError;

/// ファイルフィールドの型
pub const MEDIA_TYPE: &str = "media";
/// 画像ファイルフィールドの型
pub const MEDIA_IMAGE_TYPE: &str = "media-image";
/// 旧名称
const MEDIA_IMAGE_TYPE_ALIAS: &str = "mediaimage";
/// サブスキーマを持つフィールドの型
pub const COLLECTION_TYPE: &str = "collection";

/// サブスキーマを解釈できない
pub const INVALID_SCHEMA: &str = "invalid_schema";
/// 設定値の型が不正
pub const INVALID_TYPE: &str = "invalid_type";

/// フィールドを持つノード（コンテンツタイプ、設定タイプ、コレクションの行）。
pub trait FieldableNode: Send + Sync {
    /// 識別子でフィールドを取得する。
    fn field(&self, identifier: &str) -> Option<&dyn FieldNode>;
}

/// 1フィールドの定義。
pub trait FieldNode: Send + Sync {
    fn identifier(&self) -> &str;
    fn field_type(&self) -> &str;
    fn settings(&self) -> &Map<String, Value>;
    /// ネスト可能なフィールドの場合はサブスキーマを返す。
    fn nested(&self) -> Option<&dyn FieldableNode>;

    fn is_nestable(&self) -> bool {
        self.nested().is_some()
    }

    fn is_file_field(&self) -> bool {
        is_file_field_type(self.field_type())
    }
}

/// media / media-image 型かどうか。
pub fn is_file_field_type(field_type: &str) -> bool {
    matches!(
        field_type,
        MEDIA_TYPE | MEDIA_IMAGE_TYPE | MEDIA_IMAGE_TYPE_ALIAS
    )
}

// ---------------------------------------------------------------------------
// スキーマファイルの具象型
// ---------------------------------------------------------------------------

/// コンテンツタイプ・設定タイプ。
#[derive(Debug, Clone, Deserialize)]
pub struct Fieldable {
    pub identifier: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// フィールド定義。
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    pub identifier: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// collection型のサブスキーマ（settings.fields から構築）
    #[serde(skip)]
    children: Option<Vec<Field>>,
}

impl Field {
    pub fn new(identifier: &str, field_type: &str, settings: Map<String, Value>) -> Self {
        let mut field = Self {
            identifier: identifier.to_string(),
            field_type: field_type.to_string(),
            settings,
            children: None,
        };
        for v in field.build_children() {
            tracing::warn!(field = identifier, path = %v.path, message = %v.message, "サブスキーマの定義が不正です");
        }
        field
    }

    /// collection型の settings.fields をサブスキーマとして展開する。
    ///
    /// 解釈できない定義は `fields` に対する違反として返す（パスはこのフィールドからの相対）。
    fn build_children(&mut self) -> Vec<Violation> {
        if self.field_type != COLLECTION_TYPE {
            return Vec::new();
        }
        let raw = match self.settings.get("fields") {
            Some(Value::Null) | None => Value::Array(Vec::new()),
            Some(v) => v.clone(),
        };
        let children = match serde_json::from_value::<Vec<Field>>(raw) {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!(field = %self.identifier, error = %e, "サブスキーマのパースに失敗");
                self.children = Some(Vec::new());
                return vec![Violation::new("fields", INVALID_SCHEMA)];
            }
        };

        let mut violations = Vec::new();
        let mut built = Vec::with_capacity(children.len());
        for mut child in children {
            violations.extend(
                child
                    .build_children()
                    .into_iter()
                    .map(|v| Violation::new(format!("{}.{}", child.identifier, v.path), v.message)),
            );
            built.push(child);
        }
        self.children = Some(built);
        violations
    }
}

impl FieldableNode for Vec<Field> {
    fn field(&self, identifier: &str) -> Option<&dyn FieldNode> {
        self.iter()
            .find(|f| f.identifier == identifier)
            .map(|f| f as &dyn FieldNode)
    }
}

impl FieldableNode for Fieldable {
    fn field(&self, identifier: &str) -> Option<&dyn FieldNode> {
        self.fields.field(identifier)
    }
}

impl FieldNode for Field {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn field_type(&self) -> &str {
        &self.field_type
    }

    fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    fn nested(&self) -> Option<&dyn FieldableNode> {
        self.children.as_ref().map(|c| c as &dyn FieldableNode)
    }
}

/// フィールド設定から許可拡張子リストを取得する。
///
/// 未設定・空文字列なら `*`。文字列以外が設定されている場合はInvalidArgument。
pub fn allowed_file_types(field: &dyn FieldNode) -> Result<String, GatewayError> {
    match field.settings().get("file_types") {
        None | Some(Value::Null) => Ok("*".to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok("*".to_string()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(GatewayError::InvalidArgument(format!(
            "フィールド \"{}\" の file_types は文字列である必要があります",
            field.identifier()
        ))),
    }
}

/// ファイルフィールドのバケット設定を取得・検証する。
pub fn bucket_config_of(field: &dyn FieldNode) -> Result<BucketConfig, GatewayError> {
    match field.settings().get("bucket") {
        Some(Value::Object(raw)) if !raw.is_empty() => BucketConfig::from_settings(raw),
        _ => Err(GatewayError::InvalidArgument(format!(
            "フィールド \"{}\" のバケット設定が不正です",
            field.identifier()
        ))),
    }
}

// ---------------------------------------------------------------------------
// フィールド設定の検証
// ---------------------------------------------------------------------------

fn allowed_settings(field_type: &str) -> &'static [&'static str] {
    if field_type == MEDIA_TYPE {
        &["bucket", "file_types"]
    } else {
        &["bucket", "file_types", "thumbnail_url"]
    }
}

/// ファイルフィールドの設定を検証する。
///
/// フィールド自体の許可・必須設定を確認し、違反がなければバケット設定の検証に進む。
pub fn validate_field_settings(field: &dyn FieldNode) -> Vec<Violation> {
    let settings = field.settings();
    let allowed = allowed_settings(field.field_type());

    let mut violations: Vec<Violation> = settings
        .keys()
        .filter(|k| !allowed.contains(&k.as_str()))
        .map(|k| Violation::new(k.clone(), "additional_data"))
        .collect();
    if !violations.is_empty() {
        return violations;
    }

    if !matches!(
        settings.get("file_types"),
        None | Some(Value::Null) | Some(Value::String(_))
    ) {
        violations.push(Violation::new("file_types", INVALID_TYPE));
    }

    match settings.get("bucket") {
        Some(Value::Object(raw)) => violations.extend(validate_bucket_settings(raw)),
        Some(Value::Null) | None => violations.push(Violation::new("bucket", "required")),
        Some(_) => violations.push(Violation::new("bucket", INVALID_TYPE)),
    }
    violations
}

// ---------------------------------------------------------------------------
// スキーマレジストリ
// ---------------------------------------------------------------------------

/// フィールドを持つノードの種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldableKind {
    ContentType,
    SettingType,
}

impl std::fmt::Display for FieldableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldableKind::ContentType => f.write_str("content"),
            FieldableKind::SettingType => f.write_str("setting"),
        }
    }
}

#[derive(Deserialize)]
struct SchemaFile {
    #[serde(default)]
    content_types: Vec<Fieldable>,
    #[serde(default)]
    setting_types: Vec<Fieldable>,
}

/// CMSのスキーマ（コンテンツタイプ・設定タイプ）を識別子で引けるようにしたもの。
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    content_types: HashMap<String, Fieldable>,
    setting_types: HashMap<String, Fieldable>,
}

impl SchemaRegistry {
    /// JSON文字列から構築し、全ファイルフィールドの設定を検証する。
    pub fn from_json(json: &str) -> Result<Self, GatewayError> {
        let file: SchemaFile = serde_json::from_str(json)
            .map_err(|e| GatewayError::InvalidArgument(format!("スキーマのパースに失敗: {e}")))?;
        Self::from_fieldables(file.content_types, file.setting_types)
    }

    /// スキーマファイルを読み込む。
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Internal(format!("スキーマファイルの読み込みに失敗 ({}): {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn from_fieldables(
        content_types: Vec<Fieldable>,
        setting_types: Vec<Fieldable>,
    ) -> Result<Self, GatewayError> {
        let mut violations = Vec::new();
        let mut registry = Self::default();

        for (kind, list) in [
            (FieldableKind::ContentType, content_types),
            (FieldableKind::SettingType, setting_types),
        ] {
            for mut fieldable in list {
                let base = format!("{kind}.{}", fieldable.identifier);
                for field in fieldable.fields.iter_mut() {
                    let path = format!("{base}.{}", field.identifier);
                    violations.extend(
                        field
                            .build_children()
                            .into_iter()
                            .map(|v| Violation::new(format!("{path}.{}", v.path), v.message)),
                    );
                }
                collect_file_field_violations(
                    &base,
                    &fieldable.fields,
                    &mut violations,
                );
                let map = match kind {
                    FieldableKind::ContentType => &mut registry.content_types,
                    FieldableKind::SettingType => &mut registry.setting_types,
                };
                map.insert(fieldable.identifier.clone(), fieldable);
            }
        }

        if !violations.is_empty() {
            return Err(GatewayError::Validation(violations));
        }
        Ok(registry)
    }

    /// 識別子でコンテンツタイプ・設定タイプを取得する。
    pub fn get(&self, kind: FieldableKind, identifier: &str) -> Result<&Fieldable, GatewayError> {
        let map = match kind {
            FieldableKind::ContentType => &self.content_types,
            FieldableKind::SettingType => &self.setting_types,
        };
        map.get(identifier)
            .ok_or_else(|| GatewayError::NotFound(format!("{kind} type \"{identifier}\"")))
    }

    pub fn len(&self) -> usize {
        self.content_types.len() + self.setting_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// ファイルフィールドの設定違反を、スキーマ内のパスを付けて収集する。
fn collect_file_field_violations(base: &str, fields: &[Field], out: &mut Vec<Violation>) {
    for field in fields {
        let path = format!("{base}.{}", field.identifier);
        if field.is_file_field() {
            out.extend(
                validate_field_settings(field)
                    .into_iter()
                    .map(|v| Violation::new(format!("{path}.{}", v.path), v.message)),
            );
        } else if let Some(children) = &field.children {
            collect_file_field_violations(&path, children, out);
        }
    }
}
