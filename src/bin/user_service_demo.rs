/// Runs every user service operation against the in-memory backends.
///
/// $ cargo run --bin user_service_demo
use profile_service::application_impl::RealUserService;
use profile_service::application_port::*;
use profile_service::domain_model::*;
use profile_service::infra_memory::*;
use profile_service::logger::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "debug".to_string(),
    })?;

    let store = Arc::new(MemoryDocumentStore::new());
    let identities = Arc::new(MemoryIdentityProvider::new(b"demo-signing-key".to_vec()));
    let service = RealUserService::new(store.clone(), identities.clone());

    let user_auth = UserAuth {
        email: "generic@generic.com.br".to_string(),
        password: "123456789".to_string(),
        last_name: "generic".to_string(),
        name: "Generic".to_string(),
        national_id: "88888888888".to_string(),
        postal_code: "47800000".to_string(),
        address: "generic address".to_string(),
    };

    let uid = service.create_user_auth(&user_auth).await?;
    info!(%uid, "identity created");

    let id = service.create_user(&user_auth.to_user(uid.0.clone())).await?;
    info!(%id, record = ?store.get(USERS_COLLECTION, &id), "profile created");

    let found = service
        .get_user_auth_instance_by_email(&user_auth.email)
        .await?;
    info!(%found, "lookup by email");

    let token = identities.sign_in_with_password(
        &user_auth.email,
        &user_auth.password,
        Duration::from_secs(3600),
    )?;
    let authorized = service.authorization(&token).await?;
    info!(%authorized, "token verified");

    // expected failures
    if let Err(e) = service.create_user_auth(&user_auth).await {
        warn!(error = %e, kind = ?e.kind(), "duplicate registration");
    }
    if let Err(e) = service.get_user_auth_instance_by_email("nobody@generic.com").await {
        warn!(error = %e, kind = ?e.kind(), "unknown email");
    }
    if let Err(e) = service.authorization("jwt Token").await {
        warn!(error = %e, kind = ?e.kind(), "bad token");
    }

    Ok(())
}
