use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{SubsecRound, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: String,
    exp: i64,
    iat: i64,
    nbf: i64,
}

/// RS256 JWT engine. Holds no state; keys are parsed on every call.
#[derive(Debug, Default)]
pub struct RsaJwtTokenService;

impl RsaJwtTokenService {
    pub fn new() -> Self {
        Self
    }
}

/// Key material arrives as base64 of a PEM file, possibly line-wrapped.
fn decode_pem(material: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = material.split_whitespace().collect();
    STANDARD.decode(compact)
}

fn creation_failed(tag: &'static str, cause: impl std::fmt::Display) -> TokenError {
    error!(tag, error = %cause, "token creation failed");
    TokenError::Creation
}

fn validation_failed(tag: &'static str, cause: impl std::fmt::Display) -> TokenError {
    warn!(tag, error = %cause, "token validation failed");
    TokenError::Validation
}

impl TokenService for RsaJwtTokenService {
    fn create_token(
        &self,
        user_id: &UserId,
        ttl: Duration,
        private_key: &str,
    ) -> Result<Token, TokenError> {
        if user_id.as_str().is_empty() {
            return Err(creation_failed("token.create.input", "empty user id"));
        }
        if ttl.is_zero() {
            return Err(creation_failed("token.create.input", "zero ttl"));
        }

        let token_id = TokenId::new();
        let now = Utc::now().trunc_subsecs(0);
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| creation_failed("token.create.ttl", e))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| creation_failed("token.create.ttl", "expiry overflows"))?;

        let pem = decode_pem(private_key).map_err(|e| creation_failed("token.create.decode_key", e))?;
        let key =
            EncodingKey::from_rsa_pem(&pem).map_err(|e| creation_failed("token.create.parse_key", e))?;

        let claims = Claims {
            sub: user_id.0.clone(),
            jti: token_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };
        let signed_value = encode(&Header::new(SIGNING_ALGORITHM), &claims, &key)
            .map_err(|e| creation_failed("token.create.sign", e))?;

        Ok(Token {
            token_id,
            user_id: user_id.clone(),
            signed_value,
            expires_at,
        })
    }

    fn validate_token(
        &self,
        signed_value: &str,
        public_key: &str,
    ) -> Result<TokenDetails, TokenError> {
        let pem = decode_pem(public_key).map_err(|e| {
            error!(tag = "token.validate.decode_key", error = %e, "public key unreadable");
            TokenError::Validation
        })?;
        let key = DecodingKey::from_rsa_pem(&pem).map_err(|e| {
            error!(tag = "token.validate.parse_key", error = %e, "public key unparsable");
            TokenError::Validation
        })?;

        // Anything but RSA is refused before the signature is looked at.
        let header =
            decode_header(signed_value).map_err(|e| validation_failed("token.validate.parse", e))?;
        if header.alg != SIGNING_ALGORITHM {
            return Err(validation_failed(
                "token.validate.algorithm",
                format!("unexpected signing method {:?}", header.alg),
            ));
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        let data = decode::<Claims>(signed_value, &key, &validation)
            .map_err(|e| validation_failed("token.validate.verify", e))?;

        let token_id = data
            .claims
            .jti
            .parse::<TokenId>()
            .map_err(|e| validation_failed("token.validate.jti", e))?;
        if data.claims.sub.is_empty() {
            return Err(validation_failed("token.validate.sub", "empty subject"));
        }

        Ok(TokenDetails {
            token_id,
            user_id: UserId(data.claims.sub),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const ACCESS_PRIVATE_PEM: &str = include_str!("../../tests/fixtures/access_private.pem");
    const ACCESS_PUBLIC_PEM: &str = include_str!("../../tests/fixtures/access_public.pem");
    const STRANGER_PUBLIC_PEM: &str = include_str!("../../tests/fixtures/stranger_public.pem");

    fn b64(pem: &str) -> String {
        STANDARD.encode(pem)
    }

    fn mint(claims: &Claims) -> String {
        let key = EncodingKey::from_rsa_pem(ACCESS_PRIVATE_PEM.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
    }

    #[test]
    fn created_token_validates_with_matching_key() {
        let service = RsaJwtTokenService::new();
        let before = Utc::now().timestamp();

        let token = service
            .create_token(&UserId::from("u-1"), Duration::from_secs(3600), &b64(ACCESS_PRIVATE_PEM))
            .unwrap();

        assert!(!token.signed_value.is_empty());
        assert_eq!(token.token_id.0.get_version_num(), 7);
        assert!((token.expires_at.timestamp() - (before + 3600)).abs() <= 5);

        let details = service
            .validate_token(&token.signed_value, &b64(ACCESS_PUBLIC_PEM))
            .unwrap();
        assert_eq!(details.token_id, token.token_id);
        assert_eq!(details.user_id, UserId::from("u-1"));
    }

    #[test]
    fn subject_is_written_under_sub() {
        let service = RsaJwtTokenService::new();
        let token = service
            .create_token(&UserId::from("u-1"), Duration::from_secs(60), &b64(ACCESS_PRIVATE_PEM))
            .unwrap();

        let payload = token.signed_value.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(json["sub"], "u-1");
        assert!(json.get("subs").is_none());
        assert_eq!(json["jti"], token.token_id.to_string());
        assert_eq!(json["iat"], json["nbf"]);
    }

    #[test]
    fn every_token_gets_a_fresh_id() {
        let service = RsaJwtTokenService::new();
        let key = b64(ACCESS_PRIVATE_PEM);
        let a = service.create_token(&UserId::from("u-1"), Duration::from_secs(60), &key).unwrap();
        let b = service.create_token(&UserId::from("u-1"), Duration::from_secs(60), &key).unwrap();
        assert_ne!(a.token_id, b.token_id);
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let token = mint(&Claims {
            sub: "u-1".into(),
            jti: TokenId::new().to_string(),
            exp: now - 10,
            iat: now - 70,
            nbf: now - 70,
        });

        let err = RsaJwtTokenService::new()
            .validate_token(&token, &b64(ACCESS_PUBLIC_PEM))
            .unwrap_err();
        assert_eq!(err, TokenError::Validation);
    }

    #[test]
    fn token_used_before_nbf_is_rejected() {
        let now = Utc::now().timestamp();
        let token = mint(&Claims {
            sub: "u-1".into(),
            jti: TokenId::new().to_string(),
            exp: now + 3600,
            iat: now,
            nbf: now + 600,
        });

        let err = RsaJwtTokenService::new()
            .validate_token(&token, &b64(ACCESS_PUBLIC_PEM))
            .unwrap_err();
        assert_eq!(err, TokenError::Validation);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let service = RsaJwtTokenService::new();
        let token = service
            .create_token(&UserId::from("u-1"), Duration::from_secs(60), &b64(ACCESS_PRIVATE_PEM))
            .unwrap();

        let (signed_part, signature) = token.signed_value.rsplit_once('.').unwrap();
        let mut bytes = signature.as_bytes().to_vec();
        let mid = bytes.len() / 2;
        bytes[mid] = if bytes[mid] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{}.{}", signed_part, String::from_utf8(bytes).unwrap());

        assert_eq!(
            service.validate_token(&tampered, &b64(ACCESS_PUBLIC_PEM)),
            Err(TokenError::Validation)
        );
    }

    #[test]
    fn mismatched_public_key_is_rejected() {
        let service = RsaJwtTokenService::new();
        let token = service
            .create_token(&UserId::from("u-1"), Duration::from_secs(60), &b64(ACCESS_PRIVATE_PEM))
            .unwrap();

        assert_eq!(
            service.validate_token(&token.signed_value, &b64(STRANGER_PUBLIC_PEM)),
            Err(TokenError::Validation)
        );
    }

    #[test]
    fn symmetric_token_keyed_with_public_key_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "u-1".into(),
            jti: TokenId::new().to_string(),
            exp: now + 3600,
            iat: now,
            nbf: now,
        };
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(ACCESS_PUBLIC_PEM.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            RsaJwtTokenService::new().validate_token(&forged, &b64(ACCESS_PUBLIC_PEM)),
            Err(TokenError::Validation)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let service = RsaJwtTokenService::new();
        for raw in ["", "garbage", "a.b.c", "...."] {
            assert_eq!(
                service.validate_token(raw, &b64(ACCESS_PUBLIC_PEM)),
                Err(TokenError::Validation)
            );
        }
    }

    #[test]
    fn creation_failures_are_opaque() {
        let service = RsaJwtTokenService::new();
        let user = UserId::from("u-1");
        let ttl = Duration::from_secs(60);

        assert_eq!(
            service.create_token(&user, ttl, "%%% not base64 %%%").unwrap_err(),
            TokenError::Creation
        );
        assert_eq!(
            service.create_token(&user, ttl, &b64("not a pem")).unwrap_err(),
            TokenError::Creation
        );
        assert_eq!(
            service.create_token(&user, ttl, &b64(ACCESS_PUBLIC_PEM)).unwrap_err(),
            TokenError::Creation
        );
        assert_eq!(
            service
                .create_token(&UserId::from(""), ttl, &b64(ACCESS_PRIVATE_PEM))
                .unwrap_err(),
            TokenError::Creation
        );
        assert_eq!(
            service
                .create_token(&user, Duration::ZERO, &b64(ACCESS_PRIVATE_PEM))
                .unwrap_err(),
            TokenError::Creation
        );
    }

    #[test]
    fn line_wrapped_key_material_is_accepted() {
        let service = RsaJwtTokenService::new();
        let wrapped: String = b64(ACCESS_PRIVATE_PEM)
            .as_bytes()
            .chunks(64)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        assert!(
            service
                .create_token(&UserId::from("u-1"), Duration::from_secs(60), &wrapped)
                .is_ok()
        );
    }
}
