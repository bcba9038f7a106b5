//! # 表示用URLの導出
//!
//! 外部の画像変換プロキシに渡す指示をJSON化・Base64化し、
//! 元画像とサムネイルのURLを組み立てる。通信は発生しない。

use base64::Engine;
use serde::Serialize;

use media_types::ImageUrls;

use crate::bucket::BucketConfig;
use crate::error::GatewayError;

/// サムネイルのJPEG品質
pub const THUMBNAIL_QUALITY: u8 = 77;
/// サムネイルの最大辺（ピクセル）
pub const THUMBNAIL_SIZE: u32 = 300;

#[derive(Serialize)]
struct ImageRequest<'a> {
    bucket: &'a str,
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    edits: Option<Edits>,
}

#[derive(Serialize)]
struct Edits {
    #[serde(rename = "toFormat")]
    to_format: &'static str,
    jpeg: JpegOptions,
    resize: ResizeOptions,
}

#[derive(Serialize)]
struct JpegOptions {
    quality: u8,
}

#[derive(Serialize)]
struct ResizeOptions {
    fit: &'static str,
    width: u32,
    height: u32,
}

fn thumbnail_edits() -> Edits {
    Edits {
        to_format: "jpeg",
        jpeg: JpegOptions {
            quality: THUMBNAIL_QUALITY,
        },
        resize: ResizeOptions {
            fit: "inside",
            width: THUMBNAIL_SIZE,
            height: THUMBNAIL_SIZE,
        },
    }
}

/// 画像変換プロキシのURLビルダー。
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    proxy_base: String,
}

impl ImageUrlBuilder {
    pub fn new(proxy_base: impl Into<String>) -> Self {
        let proxy_base: String = proxy_base.into();
        Self {
            proxy_base: proxy_base.trim_end_matches('/').to_string(),
        }
    }

    fn encode(&self, request: &ImageRequest<'_>) -> Result<String, GatewayError> {
        let json = serde_json::to_vec(request)
            .map_err(|e| GatewayError::Internal(format!("画像変換指示のシリアライズに失敗: {e}")))?;
        Ok(format!(
            "{}/{}",
            self.proxy_base,
            base64::engine::general_purpose::STANDARD.encode(json)
        ))
    }

    /// オブジェクトキー（prefix込み）に対する元画像・サムネイルURL。
    pub fn urls_for(&self, config: &BucketConfig, key: &str) -> Result<ImageUrls, GatewayError> {
        let original = self.encode(&ImageRequest {
            bucket: &config.bucket_name,
            key,
            edits: None,
        })?;
        let thumbnail = self.encode(&ImageRequest {
            bucket: &config.bucket_name,
            key,
            edits: Some(thumbnail_edits()),
        })?;
        Ok(ImageUrls {
            original,
            thumbnail,
        })
    }
}
