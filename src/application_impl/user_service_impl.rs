use crate::application_port::{USERS_COLLECTION, UserError, UserService};
use crate::domain_model::{Document, DocumentId, Uid, User, UserAuth};
use crate::domain_port::{DocumentStore, IdentityProvider};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RealUserService {
    document_store: Arc<dyn DocumentStore>,
    identity_provider: Arc<dyn IdentityProvider>,
    users_collection: String,
}

impl RealUserService {
    pub fn new(
        document_store: Arc<dyn DocumentStore>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> RealUserService {
        RealUserService {
            document_store,
            identity_provider,
            users_collection: USERS_COLLECTION.to_string(),
        }
    }

    pub fn with_users_collection(mut self, name: impl Into<String>) -> Self {
        self.users_collection = name.into();
        self
    }
}

fn to_document(user: &User) -> Result<Document, UserError> {
    match serde_json::to_value(user).map_err(|e| UserError::Serialization(e.to_string()))? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(UserError::Serialization(format!(
            "expected an object, got {other}"
        ))),
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn create_user(&self, user: &User) -> Result<DocumentId, UserError> {
        let document = to_document(user)?;

        let id = self
            .document_store
            .collection(&self.users_collection)
            .add(document)
            .await
            .inspect_err(|e| warn!(collection = %self.users_collection, error = %e, "insert user failed"))?;

        debug!(collection = %self.users_collection, %id, "user created");
        Ok(id)
    }

    async fn create_user_auth(&self, user_auth: &UserAuth) -> Result<Uid, UserError> {
        let uid = self
            .identity_provider
            .create_identity(user_auth)
            .await
            .inspect_err(|e| warn!(email = %user_auth.email, error = %e, "create identity failed"))?;

        debug!(email = %user_auth.email, %uid, "identity created");
        Ok(uid)
    }

    async fn get_user_auth_instance_by_email(&self, email: &str) -> Result<Uid, UserError> {
        self.identity_provider
            .find_by_email(email)
            .await
            .map_err(|e| {
                debug!(email, error = %e, "identity lookup failed");
                UserError::NotFound(Some(e.to_string()))
            })
    }

    async fn authorization(&self, token: &str) -> Result<Uid, UserError> {
        self.identity_provider
            .verify_token(token)
            .await
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                UserError::Unauthorized(Some(e.to_string()))
            })
    }
}
