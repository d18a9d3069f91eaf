// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Google Sign-In ID token verification.
//!
//! The frontend obtains an ID token from Google Identity Services and posts
//! it to `/auth/google`. This module verifies the token signature against
//! Google's published JWKS (discovered and cached with the advertised
//! Cache-Control TTL) and checks the claims the login flow depends on.

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const FALLBACK_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Identity extracted from a valid Google ID token.
#[derive(Debug, Clone)]
pub struct VerifiedGoogleUser {
    /// Google subject claim; stable per account, used as our user ID
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verification error categories.
#[derive(Debug, Clone)]
pub enum IdentityError {
    /// The token is missing/invalid or its claims do not match expectations.
    Rejected(String),
    /// A transient infrastructure failure (JWKS unreachable etc.).
    Transient(String),
}

#[derive(Clone)]
enum KeySource {
    Google,
    /// Fixed key for deterministic local/integration tests.
    Static {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

struct CachedKeys {
    by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Google Sign-In ID tokens.
pub struct GoogleIdentityVerifier {
    http_client: reqwest::Client,
    /// Our OAuth client ID; ID tokens must carry it as their audience
    expected_audience: String,
    source: KeySource,
    keys: RwLock<Option<CachedKeys>>,
    refresh_lock: Mutex<()>,
}

impl GoogleIdentityVerifier {
    /// Create a production verifier that discovers and caches Google's keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building identity HTTP client")?;

        tracing::info!(
            audience = %config.google_client_id,
            "Initialized Google identity verifier"
        );

        Ok(Self {
            http_client,
            expected_audience: config.google_client_id.clone(),
            source: KeySource::Google,
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Create a verifier with a static RSA public key for tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static kid must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building identity HTTP client")?;

        Ok(Self {
            http_client,
            expected_audience: config.google_client_id.clone(),
            source: KeySource::Static {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify a raw ID token and extract the signed-in user.
    pub async fn verify_id_token(&self, token: &str) -> Result<VerifiedGoogleUser, IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::Rejected("empty ID token".to_string()));
        }

        let header = decode_header(token)
            .map_err(|e| IdentityError::Rejected(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| IdentityError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&["https://accounts.google.com", "accounts.google.com"]);
        validation.set_audience(&[self.expected_audience.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let token_data = decode::<GoogleIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| IdentityError::Rejected(format!("JWT validation failed: {e}")))?;

        let claims = token_data.claims;
        validate_iat(claims.iat)?;

        let email = claims
            .email
            .ok_or_else(|| IdentityError::Rejected("missing email claim".to_string()))?;

        if claims.email_verified != Some(true) {
            return Err(IdentityError::Rejected(
                "email_verified claim is not true".to_string(),
            ));
        }

        tracing::debug!(
            subject = %claims.sub,
            email = %email,
            "Google ID token verified"
        );

        Ok(VerifiedGoogleUser {
            subject: claims.sub,
            email,
            name: claims.name,
            picture: claims.picture,
        })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, IdentityError> {
        if let KeySource::Static {
            kid: static_kid,
            decoding_key,
        } = &self.source
        {
            if kid == static_kid {
                return Ok(decoding_key.clone());
            }
            return Err(IdentityError::Rejected(format!(
                "unknown JWT kid for static verifier: {kid}"
            )));
        }

        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        // A miss can mean an expired cache or a key rotation; refresh once
        // normally, then once more forced.
        for force in [false, true] {
            self.refresh_keys(force).await?;
            if let Some(key) = self.cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(IdentityError::Rejected(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.keys.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > Instant::now())
            .and_then(|entry| entry.by_kid.get(kid))
            .cloned()
    }

    async fn refresh_keys(&self, force: bool) -> Result<(), IdentityError> {
        let _guard = self.refresh_lock.lock().await;

        if !force {
            let cache = self.keys.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        let jwks_uri = self.discover_jwks_uri().await;
        tracing::debug!(jwks_uri = %jwks_uri, "Refreshing Google JWKS cache");

        let response = self
            .http_client
            .get(&jwks_uri)
            .send()
            .await
            .map_err(|e| IdentityError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IdentityError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers()).unwrap_or(DEFAULT_KEY_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| IdentityError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let mut by_kid: HashMap<String, Arc<DecodingKey>> = HashMap::new();
        for jwk in jwks.keys {
            if !jwk.is_rs256_signing_key() {
                continue;
            }
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    by_kid.insert(jwk.kid, Arc::new(key));
                }
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                }
            }
        }

        if by_kid.is_empty() {
            return Err(IdentityError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.keys.write().await = Some(CachedKeys {
            by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Google JWKS cache refreshed");
        Ok(())
    }

    /// Resolve the JWKS endpoint via OIDC discovery, falling back to the
    /// well-known URL when discovery is unavailable.
    async fn discover_jwks_uri(&self) -> String {
        let response = self.http_client.get(DISCOVERY_URL).send().await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<OpenIdConfig>().await {
                    Ok(discovery) => discovery.jwks_uri,
                    Err(e) => {
                        tracing::warn!(error = %e, "Invalid discovery JSON; using fallback JWKS URI");
                        FALLBACK_JWKS_URL.to_string()
                    }
                }
            }
            Ok(resp) => {
                tracing::warn!(
                    status = %resp.status(),
                    "OIDC discovery returned non-success status; using fallback JWKS URI"
                );
                FALLBACK_JWKS_URL.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "OIDC discovery request failed; using fallback JWKS URI");
                FALLBACK_JWKS_URL.to_string()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenIdConfig {
    jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

impl Jwk {
    fn is_rs256_signing_key(&self) -> bool {
        if self.kty != "RSA" || self.kid.trim().is_empty() {
            return false;
        }
        if self.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            return false;
        }
        if self.use_.as_deref().is_some_and(|u| u != "sig") {
            return false;
        }
        true
    }
}

#[derive(Debug, Deserialize)]
struct GoogleIdTokenClaims {
    sub: String,
    iat: Option<usize>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

fn validate_iat(iat: Option<usize>) -> Result<(), IdentityError> {
    let Some(iat) = iat else {
        return Err(IdentityError::Rejected("missing iat claim".to_string()));
    };

    if iat as u64 > now_unix_secs() + CLOCK_SKEW_SECS {
        return Err(IdentityError::Rejected(
            "iat claim is in the future".to_string(),
        ));
    }

    Ok(())
}

/// Extract a `max-age` TTL from a Cache-Control response header.
fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let value = headers
        .get(reqwest::header::CACHE_CONTROL)?
        .to_str()
        .ok()?;

    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .filter_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
        .next()
        .map(Duration::from_secs)
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
