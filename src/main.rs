use profile_service::domain_model::{User, UserAuth};
use profile_service::logger::*;
use profile_service::registry::ServiceRegistry;
use profile_service::settings::*;

fn user_auth(profile: ProfileArgs, password: String) -> UserAuth {
    UserAuth {
        email: profile.email,
        password,
        last_name: profile.last_name,
        name: profile.name,
        national_id: profile.national_id,
        postal_code: profile.postal_code,
        address: profile.address,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let registry = ServiceRegistry::try_new(&project_settings).await?;
    let service = registry.user_service;

    match cli.command {
        Command::CreateUser {
            profile,
            user_auth_id,
        } => {
            let user = User {
                email: profile.email,
                last_name: profile.last_name,
                name: profile.name,
                national_id: profile.national_id,
                postal_code: profile.postal_code,
                address: profile.address,
                user_auth_id,
            };
            println!("{}", service.create_user(&user).await?);
        }
        Command::CreateUserAuth { profile, password } => {
            let uid = service
                .create_user_auth(&user_auth(profile, password))
                .await?;
            println!("{uid}");
        }
        Command::Register { profile, password } => {
            let user_auth = user_auth(profile, password);
            let uid = service.create_user_auth(&user_auth).await?;
            let id = service.create_user(&user_auth.to_user(uid.0.clone())).await?;
            info!(%uid, %id, "registered");
            println!("{uid} {id}");
        }
        Command::Lookup { email } => {
            println!("{}", service.get_user_auth_instance_by_email(&email).await?);
        }
        Command::Authorize { token } => {
            println!("{}", service.authorization(&token).await?);
        }
    }

    Ok(())
}
