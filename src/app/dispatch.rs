//! Command routing.
//!
//! Client handles are constructed here and injected into the flows; nothing
//! below this layer reaches for process-wide state.

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::flows;
use crate::flows::login::LoginArgs;
use crate::flows::register::RegisterArgs;
use crate::identity::{IdentityClient, SessionStore};
use crate::store::{ResilientWriter, RetryPolicy, StoreClient, TransportMode};
use anyhow::Result;
use std::sync::Arc;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let identity = IdentityClient::from_config(&config.identity);
    let sessions = SessionStore::new(config.config_dir());

    match cli.command {
        Commands::Login {
            email,
            password,
            provider,
            assertion,
        } => {
            flows::login::run(
                &identity,
                &sessions,
                LoginArgs {
                    email,
                    password,
                    provider,
                    assertion,
                },
            )
            .await
        }

        Commands::Register {
            name,
            email,
            password,
            program,
            provider,
            assertion,
        } => {
            let store = StoreClient::from_config(&config.store, TransportMode::Streaming);
            flows::register::run(
                &identity,
                &store,
                &sessions,
                &config.store.users_collection,
                RegisterArgs {
                    name,
                    email,
                    password,
                    program,
                    provider,
                    assertion,
                },
            )
            .await
        }

        Commands::Waitlist { name, email } => {
            let writer = build_resilient_writer(&config);
            flows::waitlist::run(
                &writer,
                &config.store.waitlist_collection,
                &name,
                &email,
            )
            .await
        }

        Commands::Onboarding { name, watch } => {
            let session = sessions.load()?;
            flows::onboarding::run(
                &config.onboarding,
                session.as_ref().map(|s| &s.user),
                name,
                watch,
            )
            .await
        }

        Commands::ResetPassword { email } => {
            flows::account::reset_password(&identity, &email).await
        }

        Commands::Whoami => flows::account::whoami(&identity, &sessions).await,

        Commands::Logout => flows::account::logout(&sessions),
    }
}

/// The waitlist writer: default streaming transport plus the long-polling
/// fallback, sharing one retry policy from config.
fn build_resilient_writer(config: &Config) -> ResilientWriter {
    let primary = StoreClient::from_config(&config.store, TransportMode::Streaming);
    let fallback = StoreClient::from_config(&config.store, TransportMode::LongPolling);
    ResilientWriter::new(
        Arc::new(primary),
        Arc::new(fallback),
        RetryPolicy::from(&config.reliability),
    )
}
