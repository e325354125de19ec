//! Identity collaborator
//!
//! Holds the access token issued by the identity provider and exposes the
//! permission set carried in it. Tokens are only decoded here, never verified;
//! the API checks signatures on its side.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::debug;
use reqwest::Url;
use serde::Deserialize;

use crate::error::MenuError;

/// Permissions granted by the drinks API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    GetDrinksDetail,
    PostDrinks,
    PatchDrinks,
    DeleteDrinks,
}

impl Permission {
    /// Claim string as it appears in the token's `permissions` array
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::GetDrinksDetail => "get:drinks-detail",
            Permission::PostDrinks => "post:drinks",
            Permission::PatchDrinks => "patch:drinks",
            Permission::DeleteDrinks => "delete:drinks",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Claims {
    #[serde(default)]
    permissions: Vec<String>,
    exp: Option<u64>,
}

/// The current identity: either anonymous or a decoded access token
#[derive(Debug, Clone, Default)]
pub struct AuthService {
    token: Option<String>,
    claims: Claims,
}

impl AuthService {
    /// No token, no permissions. Only public endpoints are usable.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Decode an access token (JWT) and keep it for outgoing requests
    pub fn from_token(token: impl Into<String>) -> Result<Self, MenuError> {
        let token = token.into();
        let claims = decode_claims(&token)?;
        debug!("Loaded token with {} permissions", claims.permissions.len());
        Ok(AuthService {
            token: Some(token),
            claims,
        })
    }

    /// Pick up the token from the login redirect, e.g. `http://localhost:8100/#access_token=...`
    pub fn from_callback_url(url: &str) -> Result<Self, MenuError> {
        let url = Url::parse(url).map_err(|e| MenuError::InvalidUrl(e.to_string()))?;
        let fragment = url
            .fragment()
            .ok_or_else(|| MenuError::InvalidToken("callback URL has no fragment".to_string()))?;

        let token = fragment
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "access_token")
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| {
                MenuError::InvalidToken("access_token missing from callback".to_string())
            })?;

        Self::from_token(token)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the token grants `permission`
    pub fn can(&self, permission: Permission) -> bool {
        self.claims
            .permissions
            .iter()
            .any(|p| p == permission.as_str())
    }

    /// Raw permission claims, in token order
    pub fn permissions(&self) -> &[String] {
        &self.claims.permissions
    }

    /// Whether the token expired at or before `now` (seconds since the epoch).
    /// Tokens without an `exp` claim never expire.
    pub fn is_expired(&self, now: u64) -> bool {
        self.claims.exp.map(|exp| exp <= now).unwrap_or(false)
    }
}

fn decode_claims(token: &str) -> Result<Claims, MenuError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
        _ => {
            return Err(MenuError::InvalidToken(
                "expected three dot-separated segments".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| MenuError::InvalidToken(e.to_string()))?;
    let claims = serde_json::from_slice(&bytes)?;
    Ok(claims)
}
