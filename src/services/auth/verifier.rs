use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::{error::Error as StdError, fmt};

use crate::context::ServiceClaims;
use crate::services::auth::Role;

// Errors returned by token verification + strict claim validation.
#[derive(Debug)]
pub enum VerifyError {
    Jwt(jsonwebtoken::errors::Error),
    EmptyClaim(&'static str),
    MissingAudience,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
            Self::MissingAudience => write!(f, "missing or empty 'aud' claim"),
        }
    }
}

impl StdError for VerifyError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn into_vec(self) -> Vec<String> {
        match self {
            Audience::One(s) => vec![s],
            Audience::Many(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceTokenBody {
    iss: String,
    #[serde(default)]
    aud: Option<Audience>,
}

/// Claims of a verified end-user token, before identity parsing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserTokenClaims {
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(rename = "sid", default)]
    pub session_id: String,
    #[serde(default)]
    pub verified: bool,
    pub role: Role,
}

/// Trusted verification boundary for signed tokens.
///
/// Implementations check signature and expiry and return typed claims.
/// Audience membership is checked by the caller, not here.
pub trait ClaimVerifier: Send + Sync {
    fn verify_service_token(&self, token: &str) -> Result<ServiceClaims, VerifyError>;

    fn verify_user_token(&self, token: &str) -> Result<UserTokenClaims, VerifyError>;
}

/// HS256 verifier with separate secrets for service and user tokens.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtClaimVerifier {
    service_key: DecodingKey,
    user_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtClaimVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtClaimVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtClaimVerifier {
    pub fn new(service_secret: &[u8], user_secret: &[u8], leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        // Audience is enforced by the service authenticator against its own identity.
        validation.validate_aud = false;

        Self {
            service_key: DecodingKey::from_secret(service_secret),
            user_key: DecodingKey::from_secret(user_secret),
            validation,
        }
    }
}

impl ClaimVerifier for JwtClaimVerifier {
    fn verify_service_token(&self, token: &str) -> Result<ServiceClaims, VerifyError> {
        let data =
            jsonwebtoken::decode::<ServiceTokenBody>(token, &self.service_key, &self.validation)?;
        let claims = data.claims;

        if claims.iss.trim().is_empty() {
            return Err(VerifyError::EmptyClaim("iss"));
        }

        let audience: Vec<String> = claims
            .aud
            .map(Audience::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect();
        if audience.is_empty() {
            return Err(VerifyError::MissingAudience);
        }

        Ok(ServiceClaims {
            issuer: claims.iss,
            audience,
        })
    }

    fn verify_user_token(&self, token: &str) -> Result<UserTokenClaims, VerifyError> {
        let data =
            jsonwebtoken::decode::<UserTokenClaims>(token, &self.user_key, &self.validation)?;

        if data.claims.subject.trim().is_empty() {
            return Err(VerifyError::EmptyClaim("sub"));
        }

        Ok(data.claims)
    }
}
