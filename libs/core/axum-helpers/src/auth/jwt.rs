use super::config::JwtConfig;
use crate::extractors::Principal;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtClaims {
    /// Principal identifier.
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Principal {
            user_id: claims.sub,
            roles: claims.roles,
        }
    }
}

/// HS256 verifier shared by every request.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, jsonwebtoken::errors::Error> {
        decode::<JwtClaims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    /// Signs claims with the shared secret. Used by tests and local tooling.
    pub fn sign(&self, claims: &JwtClaims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(&JwtConfig::new("this-is-a-valid-secret-with-32-chars!").unwrap())
    }

    fn claims(exp_offset: i64) -> JwtClaims {
        let now = Utc::now().timestamp();
        JwtClaims {
            sub: "user_123".to_string(),
            roles: vec!["member".to_string()],
            exp: now + exp_offset,
            iat: now,
            iss: None,
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let v = verifier();
        let token = v.sign(&claims(600)).unwrap();
        let decoded = v.verify(&token).unwrap();
        assert_eq!(decoded.sub, "user_123");

        let principal = Principal::from(decoded);
        assert!(principal.has_role("member"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let v = verifier();
        let token = v.sign(&claims(-3600)).unwrap();
        assert!(v.verify(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = verifier().sign(&claims(600)).unwrap();
        let other =
            JwtVerifier::new(&JwtConfig::new("another-secret-that-is-32-chars-long!").unwrap());
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_issuer_enforced() {
        let config = JwtConfig::new("this-is-a-valid-secret-with-32-chars!")
            .unwrap()
            .with_issuer("https://id.example.com");
        let v = JwtVerifier::new(&config);
        let token = v.sign(&claims(600)).unwrap();
        assert!(v.verify(&token).is_err());

        let mut issued = claims(600);
        issued.iss = Some("https://id.example.com".to_string());
        let token = v.sign(&issued).unwrap();
        assert!(v.verify(&token).is_ok());
    }
}
