use super::Parser;
use clap::{Args, Subcommand};

#[derive(Parser, Debug)]
#[command(about = "Create user profiles and identities, look them up, verify tokens")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert a profile record and print its document id
    CreateUser {
        #[command(flatten)]
        profile: ProfileArgs,
        #[arg(long)]
        user_auth_id: String,
    },
    /// Register an identity and print its uid
    CreateUserAuth {
        #[command(flatten)]
        profile: ProfileArgs,
        #[arg(long)]
        password: String,
    },
    /// Register an identity, then insert its profile record
    Register {
        #[command(flatten)]
        profile: ProfileArgs,
        #[arg(long)]
        password: String,
    },
    /// Print the uid of the identity registered with an email
    Lookup {
        #[arg(long)]
        email: String,
    },
    /// Verify a bearer token and print the uid it carries
    Authorize {
        #[arg(long)]
        token: String,
    },
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub national_id: String,
    #[arg(long)]
    pub postal_code: String,
    #[arg(long)]
    pub address: String,
}
