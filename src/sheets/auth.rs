use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Claims of the service-account assertion exchanged for an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(service_account_email: &str) -> Self {
        let now = Utc::now();
        Self {
            iss: service_account_email.to_string(),
            scope: SHEETS_SCOPE.to_string(),
            aud: TOKEN_URL.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        }
    }
}

pub fn encode_assertion(claims: &AssertionClaims, private_key_pem: &str) -> Result<String, String> {
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| format!("Invalid private key: {e}"))?;
    encode(&Header::new(Algorithm::RS256), claims, &key)
        .map_err(|e| format!("JWT encode failed: {e}"))
}

/// Keys pasted into `.env` files usually carry literal `\n` sequences.
pub fn normalize_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}
