//! # Gatewayサービス
//!
//! 署名付きURL発行・一覧取得・削除・表示用URL導出。
//! いずれも共有可変状態を持たず、ストレージ接続は呼び出し側から渡される。

pub mod delete;
pub mod image_urls;
pub mod listing;
pub mod presign;

pub use image_urls::ImageUrlBuilder;
pub use listing::ObjectListingService;
pub use presign::PreSignService;
