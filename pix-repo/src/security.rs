//! Security utilities: API key hashing and the signed pix key codec.

use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use pix_types::{DecodedKey, KeyError, PixId, PixKeyCodec, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Generates a fresh raw API key (`sk_` + 32 alphanumerics).
pub fn generate_api_key() -> String {
    let secret: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("sk_{}", secret)
}

/// Hashes an API key using SHA-256.
pub fn hash_api_key(key: &str) -> String {
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(hash)
}

/// Verifies an API key against a stored hash using constant-time comparison.
pub fn verify_api_key(input: &str, stored_hash: &str) -> bool {
    let input_hash = hash_api_key(input);
    input_hash.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

/// Pix key codec that signs the payload with HMAC-SHA256.
///
/// Key layout: `hex("{user_id}:{value}:{pix_id}") "." hex(tag)`.
pub struct HmacKeyCodec {
    secret: Vec<u8>,
}

impl HmacKeyCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn tag(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

impl PixKeyCodec for HmacKeyCodec {
    fn encode(&self, user_id: UserId, value: i64, register_id: PixId) -> String {
        let payload = format!("{}:{}:{}", user_id, value, register_id);
        let tag = self.tag(payload.as_bytes());
        format!("{}.{}", hex::encode(payload), hex::encode(tag))
    }

    fn decode(&self, key: &str) -> Result<DecodedKey, KeyError> {
        let (payload_hex, tag_hex) = key.trim().split_once('.').ok_or(KeyError::Malformed)?;
        let payload = hex::decode(payload_hex).map_err(|_| KeyError::Malformed)?;
        let tag = hex::decode(tag_hex).map_err(|_| KeyError::Malformed)?;

        let expected = self.tag(&payload);
        if !bool::from(expected.ct_eq(&tag)) {
            return Err(KeyError::BadSignature);
        }

        let payload = String::from_utf8(payload).map_err(|_| KeyError::Malformed)?;
        let mut parts = payload.splitn(3, ':');
        let (Some(user_id), Some(value), Some(register_id)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(KeyError::Malformed);
        };

        Ok(DecodedKey {
            user_id: user_id.parse().map_err(|_| KeyError::Malformed)?,
            value: value.parse().map_err(|_| KeyError::Malformed)?,
            register_id: register_id.parse().map_err(|_| KeyError::Malformed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_hashing() {
        let key = "sk_test_abc123";
        let hash = hash_api_key(key);

        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_api_key(key));
    }

    #[test]
    fn test_api_key_verification() {
        let key = generate_api_key();
        let hash = hash_api_key(&key);

        assert!(key.starts_with("sk_"));
        assert_eq!(key.len(), 35);
        assert!(verify_api_key(&key, &hash));
        assert!(!verify_api_key("wrong_key", &hash));
    }

    #[test]
    fn test_key_carries_request_fields() {
        let codec = HmacKeyCodec::new("pix_secret");
        let user_id = UserId::new();
        let register_id = PixId::new();

        let key = codec.encode(user_id, 2500, register_id);
        let decoded = codec.decode(&key).unwrap();

        assert_eq!(decoded.user_id, user_id);
        assert_eq!(decoded.value, 2500);
        assert_eq!(decoded.register_id, register_id);
    }

    #[test]
    fn test_negative_value_survives_encoding() {
        let codec = HmacKeyCodec::new("pix_secret");
        let key = codec.encode(UserId::new(), -300, PixId::new());
        assert_eq!(codec.decode(&key).unwrap().value, -300);
    }

    #[test]
    fn test_key_from_other_secret_rejected() {
        let key = HmacKeyCodec::new("one").encode(UserId::new(), 100, PixId::new());
        let result = HmacKeyCodec::new("two").decode(&key);
        assert!(matches!(result, Err(KeyError::BadSignature)));
    }

    #[test]
    fn test_tampered_value_rejected() {
        let codec = HmacKeyCodec::new("pix_secret");
        let user_id = UserId::new();
        let register_id = PixId::new();
        let key = codec.encode(user_id, 100, register_id);

        let (_, tag) = key.split_once('.').unwrap();
        let forged_payload = hex::encode(format!("{}:{}:{}", user_id, 1, register_id));
        let forged = format!("{}.{}", forged_payload, tag);

        assert!(matches!(
            codec.decode(&forged),
            Err(KeyError::BadSignature)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = HmacKeyCodec::new("pix_secret");
        assert!(matches!(codec.decode("not-a-key"), Err(KeyError::Malformed)));
        assert!(matches!(codec.decode("zz.zz"), Err(KeyError::Malformed)));
    }
}
