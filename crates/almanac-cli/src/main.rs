//! Almanac CLI - admin provisioning and session administration
//!
//! Usage:
//!   almanac admin create <username> --display-name <name> --password <pw>
//!   almanac admin delete <username>
//!   almanac admin list
//!   almanac session revoke <username>

use almanac_core::{Admin, AppConfig, CredentialStore, PgStore, SessionStore};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "almanac")]
#[command(about = "Almanac calendar backend administration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage login sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Provision a new admin account
    Create {
        /// Login name, at most 12 alphanumeric characters
        username: String,
        /// Name shown in the admin UI
        #[arg(long)]
        display_name: String,
        /// Initial password
        #[arg(long)]
        password: String,
    },
    /// Deprovision an admin; any live session is removed with the account
    Delete {
        username: String,
    },
    /// List admin accounts
    List,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Force-logout an admin by deleting their session
    Revoke {
        username: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let store = PgStore::new(&config.database.url, config.database.pool_size).await?;

    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                display_name,
                password,
            } => {
                let admin = Admin::provision(&username, &display_name, &password)?;
                store.create_admin(&admin).await?;
                println!("Admin {} provisioned", admin.username);
            }
            AdminAction::Delete { username } => {
                if store.delete_admin(&username).await? {
                    println!("Admin {username} deleted");
                } else {
                    println!("No admin named {username}");
                }
            }
            AdminAction::List => {
                let admins = store.list_admins().await?;
                if admins.is_empty() {
                    println!("No admins provisioned");
                }
                for admin in admins {
                    println!(
                        "{:<12}  {}  enrolled {}",
                        admin.username,
                        admin.display_name,
                        admin.enrolled_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        },
        Commands::Session { action } => match action {
            SessionAction::Revoke { username } => {
                store.delete_for_admin(&username).await?;
                println!("Session for {username} revoked");
            }
        },
    }

    Ok(())
}
