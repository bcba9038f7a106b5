//! # フィールドパス解決
//!
//! `gallery/image` のようなパスをスキーマに沿って辿り、ファイルフィールドを見つける。
//! I/Oを伴わない純粋な木の探索で、見つからない場合は `None` を返す。

use crate::schema::{FieldNode, FieldableNode};

/// ネストの最大深さ。循環したスキーマでも探索が停止する。
pub const MAX_NESTING_DEPTH: usize = 16;

/// パスを区切り文字（`/` または `.`）で分割する。空のセグメントは無視する。
fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '.'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// フィールドパスをファイルフィールドへ解決する。
///
/// - ファイルフィールドはパスの最後のセグメントである必要がある
/// - ネスト可能なフィールドでは残りのパスでサブスキーマを探索する
/// - それ以外（未定義・ファイルでもネスト可能でもない）は `None`
pub fn resolve_file_field<'a>(root: &'a dyn FieldableNode, path: &str) -> Option<&'a dyn FieldNode> {
    let parts = segments(path);
    if parts.is_empty() {
        return None;
    }
    resolve_segments(root, &parts, 0)
}

fn resolve_segments<'a>(
    node: &'a dyn FieldableNode,
    parts: &[&str],
    depth: usize,
) -> Option<&'a dyn FieldNode> {
    if depth >= MAX_NESTING_DEPTH {
        tracing::warn!(depth, "フィールドパスのネストが上限に達しました");
        return None;
    }

    let (head, rest) = parts.split_first()?;
    let field = node.field(head)?;

    if field.is_file_field() {
        return rest.is_empty().then_some(field);
    }

    match field.nested() {
        Some(child) if !rest.is_empty() => resolve_segments(child, rest, depth + 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use crate::schema::{Fieldable, FieldableKind};
    use crate::test_helpers::sample_schema_json;
    use serde_json::{Map, Value};

    fn article() -> Fieldable {
        let registry = SchemaRegistry::from_json(&sample_schema_json()).unwrap();
        registry
            .get(FieldableKind::ContentType, "article")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_resolves_top_level_file_field() {
        let article = article();
        let field = resolve_file_field(&article, "cover").unwrap();
        assert_eq!(field.identifier(), "cover");
        assert_eq!(field.field_type(), "media-image");
    }

    #[test]
    fn test_resolves_nested_with_slash_or_dot() {
        let article = article();
        for path in ["gallery/image", "gallery.image", "/gallery/image/"] {
            let field = resolve_file_field(&article, path).unwrap();
            assert_eq!(field.identifier(), "image", "path: {path}");
        }
    }

    #[test]
    fn test_not_found_cases() {
        let article = article();
        // 存在しないフィールド
        assert!(resolve_file_field(&article, "missing").is_none());
        // ファイルでもネスト可能でもないフィールド
        assert!(resolve_file_field(&article, "title").is_none());
        // ネスト可能なフィールドで終わる
        assert!(resolve_file_field(&article, "gallery").is_none());
        // ファイルフィールドの先にセグメントが続く
        assert!(resolve_file_field(&article, "cover/extra").is_none());
        // サブスキーマに存在しない
        assert!(resolve_file_field(&article, "gallery/caption").is_none());
        assert!(resolve_file_field(&article, "").is_none());
    }

    /// 自分自身をサブスキーマとして返す病的なノード
    struct Cyclic {
        settings: Map<String, Value>,
    }

    impl FieldableNode for Cyclic {
        fn field(&self, _identifier: &str) -> Option<&dyn FieldNode> {
            Some(self)
        }
    }

    impl FieldNode for Cyclic {
        fn identifier(&self) -> &str {
            "loop"
        }
        fn field_type(&self) -> &str {
            "collection"
        }
        fn settings(&self) -> &Map<String, Value> {
            &self.settings
        }
        fn nested(&self) -> Option<&dyn FieldableNode> {
            Some(self)
        }
    }

    #[test]
    fn test_cyclic_schema_is_depth_bounded() {
        let node = Cyclic {
            settings: Map::new(),
        };
        let path = vec!["loop"; MAX_NESTING_DEPTH * 2].join("/");
        assert!(resolve_file_field(&node, &path).is_none());
    }
}
