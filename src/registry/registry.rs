use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_firebase::*;
use crate::infra_memory::*;
use crate::infra_mongo::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use std::sync::Arc;

/// The user service together with the collaborators it was built on.
pub struct ServiceRegistry {
    pub user_service: Arc<dyn UserService>,
    pub document_store: Arc<dyn DocumentStore>,
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl ServiceRegistry {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let document_store: Arc<dyn DocumentStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryDocumentStore::new()),
            "mongo" => {
                let mongo = settings
                    .store
                    .mongo
                    .as_ref()
                    .ok_or_else(|| anyhow!("store.mongo section is required for the mongo backend"))?;
                Arc::new(MongoDocumentStore::connect(&mongo.uri, &mongo.database).await?)
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let identity_provider: Arc<dyn IdentityProvider> =
            match settings.identity.backend.as_str() {
                "memory" => {
                    let memory = settings.identity.memory.as_ref().ok_or_else(|| {
                        anyhow!("identity.memory section is required for the memory backend")
                    })?;
                    Arc::new(MemoryIdentityProvider::new(
                        memory.signing_key.clone().into_bytes(),
                    ))
                }
                "firebase" => {
                    let firebase = settings.identity.firebase.as_ref().ok_or_else(|| {
                        anyhow!("identity.firebase section is required for the firebase backend")
                    })?;
                    let mut cfg = FirebaseConfig::new(firebase.project_id.clone());
                    if let Some(api_base) = &firebase.api_base {
                        cfg.api_base = api_base.clone();
                    }
                    if let Some(jwks_url) = &firebase.jwks_url {
                        cfg.jwks_url = jwks_url.clone();
                    }
                    cfg.access_token = firebase.access_token.clone();
                    Arc::new(FirebaseIdentityProvider::new(cfg))
                }
                other => return Err(anyhow!("Unknown identity backend: {}", other)),
            };

        info!(
            store = %settings.store.backend,
            identity = %settings.identity.backend,
            collection = %settings.user.collection,
            "user service ready"
        );

        Ok(Self::from_parts(
            document_store,
            identity_provider,
            &settings.user.collection,
        ))
    }

    pub fn from_parts(
        document_store: Arc<dyn DocumentStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        users_collection: &str,
    ) -> Self {
        let user_service: Arc<dyn UserService> = Arc::new(
            RealUserService::new(document_store.clone(), identity_provider.clone())
                .with_users_collection(users_collection),
        );

        ServiceRegistry {
            user_service,
            document_store,
            identity_provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::parse_settings_str;

    fn settings(store: &str, identity: &str) -> Settings {
        parse_settings_str(&format!(
            r#"
[log]
filter = "info"

[store]
backend = "{store}"

[identity]
backend = "{identity}"
"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_unknown_backends() {
        let err = ServiceRegistry::try_new(&settings("sqlite", "memory"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Unknown store backend: sqlite");

        let err = ServiceRegistry::try_new(&settings("memory", "ldap"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Unknown identity backend: ldap");
    }

    #[tokio::test]
    async fn backend_sections_are_required() {
        assert!(ServiceRegistry::try_new(&settings("memory", "memory")).await.is_err());
        assert!(ServiceRegistry::try_new(&settings("memory", "firebase")).await.is_err());
        assert!(ServiceRegistry::try_new(&settings("mongo", "memory")).await.is_err());
    }
}
