use crate::domain_model::{Uid, UserAuth};
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const JWKS_TTL: Duration = Duration::from_secs(60 * 60);
const JWKS_REFETCH_INTERVAL: Duration = Duration::from_secs(60);
const MAX_UID_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_base: String,
    /// OAuth2 bearer token sent with admin requests.
    pub access_token: Option<String>,
    pub jwks_url: String,
    /// Minimum age of the cached key set before an unknown `kid` triggers a refetch.
    pub jwks_refetch_interval: Duration,
}

impl FirebaseConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        FirebaseConfig {
            project_id: project_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            access_token: None,
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            jwks_refetch_interval: JWKS_REFETCH_INTERVAL,
        }
    }

    fn accounts_url(&self, action: &str) -> String {
        format!(
            "{}/v1/projects/{}/accounts{}",
            self.api_base.trim_end_matches('/'),
            self.project_id,
            action
        )
    }

    fn token_issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    email: [&'a str; 1],
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    iat: i64,
    auth_time: i64,
}

/// Identity provider backed by the Identity Toolkit REST API. ID tokens are
/// verified locally against the published JWK set.
pub struct FirebaseIdentityProvider {
    http: reqwest::Client,
    cfg: FirebaseConfig,
    jwks: RwLock<Option<(JwkSet, Instant)>>,
}

impl FirebaseIdentityProvider {
    pub fn new(cfg: FirebaseConfig) -> Self {
        FirebaseIdentityProvider {
            http: reqwest::Client::new(),
            cfg,
            jwks: RwLock::new(None),
        }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<R, IdentityProviderError> {
        let mut request = self.http.post(url).json(body);
        if let Some(token) = &self.cfg.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdentityProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let envelope: ErrorEnvelope = response.json().await.map_err(|_| {
                IdentityProviderError::Internal(format!("unexpected status {status}"))
            })?;
            return Err(map_api_error(&envelope.error.message));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityProviderError::Internal(format!("malformed response: {e}")))
    }

    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, IdentityProviderError> {
        {
            let cached = self.jwks.read().await;
            if let Some((set, fetched_at)) = cached.as_ref() {
                let age = fetched_at.elapsed();
                if age < JWKS_TTL {
                    if let Some(jwk) = set.find(kid) {
                        return decoding_key(jwk);
                    }
                    // rotated-in keys are picked up at most once per interval
                    if age < self.cfg.jwks_refetch_interval {
                        return Err(unknown_key(kid));
                    }
                }
            }
        }

        let set = self.fetch_jwks().await?;
        let key = set.find(kid).map(decoding_key);
        *self.jwks.write().await = Some((set, Instant::now()));
        key.unwrap_or_else(|| Err(unknown_key(kid)))
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, IdentityProviderError> {
        debug!(url = %self.cfg.jwks_url, "fetching token signing keys");
        self.http
            .get(&self.cfg.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| IdentityProviderError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| IdentityProviderError::Internal(format!("malformed key set: {e}")))
    }
}

fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, IdentityProviderError> {
    DecodingKey::from_jwk(jwk).map_err(|e| IdentityProviderError::Internal(e.to_string()))
}

fn unknown_key(kid: &str) -> IdentityProviderError {
    IdentityProviderError::InvalidToken(format!("unknown key id {kid}"))
}

/// Map an Identity Toolkit error message such as
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
fn map_api_error(message: &str) -> IdentityProviderError {
    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };
    match code {
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => IdentityProviderError::EmailExists,
        "INVALID_EMAIL" => IdentityProviderError::InvalidEmail,
        "WEAK_PASSWORD" => IdentityProviderError::WeakPassword(detail.to_string()),
        "USER_NOT_FOUND" | "EMAIL_NOT_FOUND" => IdentityProviderError::NotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            IdentityProviderError::InvalidCredentials
        }
        _ => IdentityProviderError::Internal(message.to_string()),
    }
}

fn validate_id_token(
    token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
    cfg: &FirebaseConfig,
    now: DateTime<Utc>,
) -> Result<Uid, IdentityProviderError> {
    let mut validation = Validation::new(algorithm);
    validation.set_audience(&[&cfg.project_id]);
    validation.set_issuer(&[cfg.token_issuer()]);
    validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

    let claims = decode::<IdTokenClaims>(token, key, &validation)
        .map_err(|e| IdentityProviderError::InvalidToken(e.to_string()))?
        .claims;

    if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
        return Err(IdentityProviderError::InvalidToken(
            "subject must be a non-empty uid".to_string(),
        ));
    }
    let now = now.timestamp();
    if claims.iat > now || claims.auth_time > now {
        return Err(IdentityProviderError::InvalidToken(
            "token issued in the future".to_string(),
        ));
    }

    Ok(Uid(claims.sub))
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn create_identity(&self, user_auth: &UserAuth) -> Result<Uid, IdentityProviderError> {
        let request = SignUpRequest {
            email: &user_auth.email,
            password: &user_auth.password,
            display_name: user_auth.display_name(),
        };
        let response: SignUpResponse = self.post(self.cfg.accounts_url(""), &request).await?;
        Ok(Uid(response.local_id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Uid, IdentityProviderError> {
        let request = LookupRequest { email: [email] };
        let response: LookupResponse = self
            .post(self.cfg.accounts_url(":lookup"), &request)
            .await?;
        response
            .users
            .into_iter()
            .next()
            .map(|u| Uid(u.local_id))
            .ok_or(IdentityProviderError::NotFound)
    }

    async fn verify_token(&self, token: &str) -> Result<Uid, IdentityProviderError> {
        let header =
            decode_header(token).map_err(|e| IdentityProviderError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityProviderError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityProviderError::InvalidToken("missing key id".to_string()))?;

        let key = self.signing_key(&kid).await?;
        validate_id_token(token, &key, Algorithm::RS256, &self.cfg, Utc::now())
    }
}
