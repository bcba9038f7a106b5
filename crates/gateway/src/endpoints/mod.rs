//! # Gatewayエンドポイント
//!
//! コンテンツタイプ（`/content/{content_type}`）と設定タイプ（`/setting/{setting_type}`）の
//! 両方に同じ操作を公開する。フィールドは `field` クエリまたはボディで指定する。

pub mod files;
pub mod health;
pub mod sign_upload;
pub mod validate;


pub use files::{
    handle_delete_content_file, handle_delete_setting_file, handle_list_content_files,
    handle_list_setting_files,
};
pub use health::handle_health;
pub use sign_upload::{handle_sign_content_upload, handle_sign_setting_upload};
pub use validate::{handle_validate_content_file, handle_validate_setting_file};
