//! # チェックサムサービス
//!
//! ファイル記述子がこのGatewayで発行されたものであることを示すトークンを生成・検証する。
//! メッセージは `"{uuid}/{filename}"` とし、同名ファイルでもuuidが異なれば別のトークンになる。

use media_crypto::{checksum_sign, checksum_verify};

use crate::error::GatewayError;

/// サーバーが保持する秘密鍵を束縛したチェックサムサービス。
#[derive(Clone)]
pub struct ChecksumService {
    secret: String,
}

impl ChecksumService {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// 任意のメッセージに対するトークン。
    pub fn sign(&self, message: &str) -> Result<String, GatewayError> {
        Ok(checksum_sign(message, &self.secret)?)
    }

    pub fn verify(&self, token: &str, message: &str) -> bool {
        checksum_verify(token, message, &self.secret)
    }

    /// ファイル識別子（uuid + ファイル名）に対するトークン。
    pub fn sign_file(&self, uuid: &str, filename: &str) -> Result<String, GatewayError> {
        self.sign(&file_message(uuid, filename))
    }

    pub fn verify_file(&self, token: &str, uuid: &str, filename: &str) -> bool {
        self.verify(token, &file_message(uuid, filename))
    }
}

impl std::fmt::Debug for ChecksumService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumService").finish_non_exhaustive()
    }
}

fn file_message(uuid: &str, filename: &str) -> String {
    format!("{}/{filename}", uuid.to_ascii_lowercase())
}
