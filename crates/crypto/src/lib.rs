//! # メディアストレージ 暗号処理
//!
//! ファイル記述子の改ざん検知に使うチェックサムの生成と検証。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | MAC | HMAC-SHA256 |
//! | トークン表現 | URLセーフBase64（パディングなし） |
//!
//! チェックサムはサーバーが保持する秘密鍵とメッセージの組に束縛される。
//! ファイル内容のハッシュではない。

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// HMAC鍵の初期化に失敗
    #[error("HMAC鍵の初期化に失敗しました")]
    InvalidKey,
    /// トークンのBase64デコードに失敗
    #[error("チェックサムのデコードに失敗しました: {0}")]
    MalformedToken(String),
}

/// URLセーフBase64エンジン（パディングなし）
pub fn token_engine() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
}

fn new_mac(secret: &[u8]) -> Result<HmacSha256, CryptoError> {
    HmacSha256::new_from_slice(secret).map_err(|_| CryptoError::InvalidKey)
}

/// HMAC-SHA256の計算。
pub fn hmac_sha256(secret: &[u8], message: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut mac = new_mac(secret)?;
    mac.update(message);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    Ok(out)
}

/// チェックサムトークンを生成する。
///
/// `token = URL_SAFE_NO_PAD(HMAC-SHA256(key=secret, message))`
pub fn checksum_sign(message: &str, secret: &str) -> Result<String, CryptoError> {
    let mac = hmac_sha256(secret.as_bytes(), message.as_bytes())?;
    Ok(token_engine().encode(mac))
}

/// トークンをデコードする。
pub fn checksum_decode(token: &str) -> Result<Vec<u8>, CryptoError> {
    token_engine()
        .decode(token)
        .map_err(|e| CryptoError::MalformedToken(e.to_string()))
}

/// チェックサムトークンを定数時間で検証する。
///
/// デコードできないトークンは不一致として扱う。
pub fn checksum_verify(token: &str, message: &str, secret: &str) -> bool {
    let Ok(expected) = checksum_decode(token) else {
        return false;
    };
    let Ok(mut mac) = new_mac(secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RFC 4231 テストケース2
    #[test]
    fn test_hmac_sha256_rfc4231() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?").unwrap();
        let expected = [
            0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95,
            0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9,
            0x64, 0xec, 0x38, 0x43,
        ];
        assert_eq!(mac, expected);
    }

    #[test]
    fn test_checksum_is_deterministic_and_url_safe() {
        let a = checksum_sign("cat.png", "s3cret").unwrap();
        let b = checksum_sign("cat.png", "s3cret").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 43);
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }

    #[test]
    fn test_checksum_verify_roundtrip() {
        let token = checksum_sign("cat.png", "s3cret").unwrap();
        assert!(checksum_verify(&token, "cat.png", "s3cret"));
        assert!(!checksum_verify(&token, "dog.png", "s3cret"));
        assert!(!checksum_verify(&token, "cat.png", "other"));
    }

    #[test]
    fn test_checksum_verify_rejects_malformed_token() {
        assert!(!checksum_verify("not base64 !!", "cat.png", "s3cret"));
        assert!(!checksum_verify("", "cat.png", "s3cret"));
        assert!(checksum_decode("%%%").is_err());
    }
}
