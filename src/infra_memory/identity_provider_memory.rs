use crate::domain_model::{Uid, UserAuth};
use crate::domain_port::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ISSUER: &str = "profile-service.memory";
const UID_LEN: usize = 28;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct IdentityRecord {
    pub uid: Uid,
    pub email: String,
    pub display_name: String,
    password_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// Identity provider kept in process memory. Issues HS256 tokens signed with
/// `signing_key` and accepts only tokens whose subject still exists.
pub struct MemoryIdentityProvider {
    // keyed by lowercased email
    identities: DashMap<String, IdentityRecord>,
    emails_by_uid: DashMap<Uid, String>,
    signing_key: Vec<u8>,
}

impl MemoryIdentityProvider {
    pub fn new(signing_key: Vec<u8>) -> Self {
        MemoryIdentityProvider {
            identities: DashMap::new(),
            emails_by_uid: DashMap::new(),
            signing_key,
        }
    }

    pub fn get(&self, uid: &Uid) -> Option<IdentityRecord> {
        let email = self.emails_by_uid.get(uid)?.value().clone();
        self.identities.get(&email).map(|r| r.value().clone())
    }

    /// Drop an identity. Tokens already issued for it stop verifying.
    pub fn remove_identity(&self, uid: &Uid) -> bool {
        match self.emails_by_uid.remove(uid) {
            Some((_, email)) => self.identities.remove(&email).is_some(),
            None => false,
        }
    }

    pub fn issue_token(&self, uid: &Uid, ttl: Duration) -> Result<String, IdentityProviderError> {
        let record = self.get(uid).ok_or(IdentityProviderError::NotFound)?;
        self.sign(&record, Utc::now(), ttl)
    }

    /// Check an email/password pair and issue a token for the matching identity.
    pub fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
        ttl: Duration,
    ) -> Result<String, IdentityProviderError> {
        let record = self
            .identities
            .get(&email.to_lowercase())
            .map(|r| r.value().clone())
            .ok_or(IdentityProviderError::NotFound)?;

        let parsed = PasswordHash::new(&record.password_hash)
            .map_err(|e| IdentityProviderError::Internal(format!("invalid PHC hash: {e}")))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => self.sign(&record, Utc::now(), ttl),
            Err(argon2::password_hash::Error::Password) => {
                Err(IdentityProviderError::InvalidCredentials)
            }
            Err(e) => Err(IdentityProviderError::Internal(format!("verify error: {e}"))),
        }
    }

    fn sign(
        &self,
        record: &IdentityRecord,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, IdentityProviderError> {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or_else(|| {
                IdentityProviderError::Internal(format!("token ttl out of range: {ttl:?}"))
            })?;
        let claims = Claims {
            sub: record.uid.0.clone(),
            email: record.email.clone(),
            iss: ISSUER.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| IdentityProviderError::Internal(e.to_string()))
    }
}

fn validate_email(email: &str) -> Result<(), IdentityProviderError> {
    let (local, domain) = email
        .split_once('@')
        .ok_or(IdentityProviderError::InvalidEmail)?;
    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    if well_formed {
        Ok(())
    } else {
        Err(IdentityProviderError::InvalidEmail)
    }
}

fn hash_password(password: &str) -> Result<String, IdentityProviderError> {
    let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| IdentityProviderError::Internal(e.to_string()))
}

#[async_trait::async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_identity(&self, user_auth: &UserAuth) -> Result<Uid, IdentityProviderError> {
        validate_email(&user_auth.email)?;
        if user_auth.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityProviderError::WeakPassword(format!(
                "password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = hash_password(&user_auth.password)?;
        let key = user_auth.email.to_lowercase();
        match self.identities.entry(key.clone()) {
            Entry::Occupied(_) => Err(IdentityProviderError::EmailExists),
            Entry::Vacant(slot) => {
                let uid = Uid(nanoid!(UID_LEN));
                slot.insert(IdentityRecord {
                    uid: uid.clone(),
                    email: user_auth.email.clone(),
                    display_name: user_auth.display_name(),
                    password_hash,
                });
                self.emails_by_uid.insert(uid.clone(), key);
                Ok(uid)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Uid, IdentityProviderError> {
        self.identities
            .get(&email.to_lowercase())
            .map(|r| r.uid.clone())
            .ok_or(IdentityProviderError::NotFound)
    }

    async fn verify_token(&self, token: &str) -> Result<Uid, IdentityProviderError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.signing_key),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                IdentityProviderError::InvalidToken("token expired".to_string())
            }
            _ => IdentityProviderError::InvalidToken(e.to_string()),
        })?;

        let uid = Uid(data.claims.sub);
        if !self.emails_by_uid.contains_key(&uid) {
            return Err(IdentityProviderError::InvalidToken(
                "identity revoked".to_string(),
            ));
        }
        Ok(uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn provider() -> MemoryIdentityProvider {
        MemoryIdentityProvider::new(b"test-signing-key".to_vec())
    }

    fn user_auth(email: &str, password: &str) -> UserAuth {
        UserAuth {
            email: email.to_string(),
            password: password.to_string(),
            last_name: "generic".to_string(),
            name: "Generic".to_string(),
            national_id: "88888888888".to_string(),
            postal_code: "47800000".to_string(),
            address: "generic address".to_string(),
        }
    }

    #[tokio::test]
    async fn created_identity_is_found_by_email() {
        let p = provider();
        let uid = p
            .create_identity(&user_auth("generic@generic.com.br", "123456789"))
            .await
            .unwrap();

        assert_eq!(uid.as_str().len(), UID_LEN);
        assert_eq!(p.find_by_email("generic@generic.com.br").await.unwrap(), uid);
        assert_eq!(p.find_by_email("GENERIC@generic.com.br").await.unwrap(), uid);
        assert_eq!(p.get(&uid).unwrap().display_name, "Generic generic");
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let p = provider();
        p.create_identity(&user_auth("generic@generic.com.br", "123456789"))
            .await
            .unwrap();

        let err = p
            .create_identity(&user_auth("Generic@generic.com.br", "abcdefgh"))
            .await
            .unwrap_err();
        assert_eq!(err, IdentityProviderError::EmailExists);
    }

    #[tokio::test]
    async fn rejects_malformed_email_and_weak_password() {
        let p = provider();

        for email in ["generic", "@generic.com", "generic@com", "gen eric@generic.com"] {
            let err = p
                .create_identity(&user_auth(email, "123456789"))
                .await
                .unwrap_err();
            assert_eq!(err, IdentityProviderError::InvalidEmail, "{email}");
        }

        let err = p
            .create_identity(&user_auth("generic@generic.com", "12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityProviderError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let err = provider()
            .find_by_email("nobody@generic.com")
            .await
            .unwrap_err();
        assert_eq!(err, IdentityProviderError::NotFound);
    }

    #[tokio::test]
    async fn issued_token_verifies_to_uid() {
        let p = provider();
        let uid = p
            .create_identity(&user_auth("generic@generic.com.br", "123456789"))
            .await
            .unwrap();

        let token = p.issue_token(&uid, HOUR).unwrap();
        assert_eq!(p.verify_token(&token).await.unwrap(), uid);

        let token = p
            .sign_in_with_password("generic@generic.com.br", "123456789", HOUR)
            .unwrap();
        assert_eq!(p.verify_token(&token).await.unwrap(), uid);
    }

    #[tokio::test]
    async fn sign_in_rejects_wrong_password() {
        let p = provider();
        p.create_identity(&user_auth("generic@generic.com.br", "123456789"))
            .await
            .unwrap();

        let err = p
            .sign_in_with_password("generic@generic.com.br", "987654321", HOUR)
            .unwrap_err();
        assert_eq!(err, IdentityProviderError::InvalidCredentials);
    }

    #[tokio::test]
    async fn oversized_ttl_is_an_error() {
        let p = provider();
        let uid = p
            .create_identity(&user_auth("generic@generic.com.br", "123456789"))
            .await
            .unwrap();

        // the first does not fit a chrono duration, the second overflows the date
        for ttl in [Duration::MAX, Duration::from_secs(9_000_000_000_000_000)] {
            let err = p.issue_token(&uid, ttl).unwrap_err();
            assert!(matches!(err, IdentityProviderError::Internal(_)), "{ttl:?}");
        }
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let p = provider();
        let uid = p
            .create_identity(&user_auth("generic@generic.com.br", "123456789"))
            .await
            .unwrap();
        let record = p.get(&uid).unwrap();

        let token = p
            .sign(&record, Utc::now() - chrono::Duration::hours(2), HOUR)
            .unwrap();

        assert_eq!(
            p.verify_token(&token).await.unwrap_err(),
            IdentityProviderError::InvalidToken("token expired".to_string())
        );
    }

    #[tokio::test]
    async fn rejects_token_signed_with_other_key() {
        let p = provider();
        let other = MemoryIdentityProvider::new(b"other-key".to_vec());
        let uid = other
            .create_identity(&user_auth("generic@generic.com.br", "123456789"))
            .await
            .unwrap();
        let token = other.issue_token(&uid, HOUR).unwrap();

        assert!(matches!(
            p.verify_token(&token).await.unwrap_err(),
            IdentityProviderError::InvalidToken(_)
        ));
        assert!(p.verify_token("jwt Token").await.is_err());
    }

    #[tokio::test]
    async fn removed_identity_tokens_are_rejected() {
        let p = provider();
        let uid = p
            .create_identity(&user_auth("generic@generic.com.br", "123456789"))
            .await
            .unwrap();
        let token = p.issue_token(&uid, HOUR).unwrap();

        assert!(p.remove_identity(&uid));
        assert_eq!(
            p.verify_token(&token).await.unwrap_err(),
            IdentityProviderError::InvalidToken("identity revoked".to_string())
        );
        assert_eq!(
            p.find_by_email("generic@generic.com.br").await.unwrap_err(),
            IdentityProviderError::NotFound
        );
    }
}
