use crate::flows::{prompt_password, validate_email, validate_name};
use crate::identity::{FederatedProvider, IdentityClient, SessionStore};
use crate::store::{StoreClient, server_timestamp};
use anyhow::{Result, bail};
use serde_json::{Map, Value};

/// Programs open for enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Program {
    ComputerScience,
    Business,
    Engineering,
}

impl Program {
    /// Catalog slug stored on the profile document.
    pub fn slug(self) -> &'static str {
        match self {
            Self::ComputerScience => "computer-science",
            Self::Business => "business",
            Self::Engineering => "engineering",
        }
    }
}

#[derive(Debug)]
pub struct RegisterArgs {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub program: Option<Program>,
    pub provider: Option<FederatedProvider>,
    pub assertion: Option<String>,
}

pub async fn run(
    identity: &IdentityClient,
    store: &StoreClient,
    sessions: &SessionStore,
    users_collection: &str,
    args: RegisterArgs,
) -> Result<()> {
    if let Some(provider) = args.provider {
        return run_federated(identity, store, sessions, users_collection, provider, args).await;
    }

    let (Some(name), Some(email), Some(program)) =
        (args.name.as_deref(), args.email.as_deref(), args.program)
    else {
        bail!("email registration needs --name, --email and --program (or use --provider)");
    };
    validate_name(name)?;
    validate_email(email)?;

    let password = match args.password {
        Some(password) => password,
        None => prompt_password(&format!("Choose a password for {email}"))?,
    };

    let session = identity.register_with_email(email.trim(), &password).await?;
    identity.update_profile(&session.id_token, name).await?;
    identity.send_email_verification(&session.id_token).await?;

    let payload = profile_payload(name, email.trim(), Some(program));
    store
        .set(users_collection, &session.user.uid, &payload)
        .await?;

    println!("✅ Registration successful! Verification email sent.");
    println!("Log in once your email is verified: nexgenu login --email {email}");
    Ok(())
}

async fn run_federated(
    identity: &IdentityClient,
    store: &StoreClient,
    sessions: &SessionStore,
    users_collection: &str,
    provider: FederatedProvider,
    args: RegisterArgs,
) -> Result<()> {
    let Some(assertion) = args.assertion.as_deref() else {
        bail!(
            "federated registration needs --assertion <ID_TOKEN> (an OAuth ID token from {})",
            provider.label()
        );
    };

    let session = identity.sign_in_with_provider(provider, assertion).await?;
    sessions.save(&session)?;

    let payload = profile_payload(
        session.user.greeting_name(),
        &session.user.email,
        args.program,
    );
    write_profile_best_effort(store, users_collection, &session.user.uid, &payload).await;

    println!("✅ Registered as {}", session.user.greeting_name());
    println!("Next: nexgenu onboarding");
    Ok(())
}

fn profile_payload(name: &str, email: &str, program: Option<Program>) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("name".into(), Value::String(name.to_string()));
    payload.insert("email".into(), Value::String(email.to_string()));
    if let Some(program) = program {
        payload.insert("program".into(), Value::String(program.slug().to_string()));
    }
    payload.insert("created_at".into(), server_timestamp());
    payload
}

/// Best-effort profile upsert after federated sign-in: the sign-in outcome
/// does not depend on it; failure is logged, never propagated.
async fn write_profile_best_effort(
    store: &StoreClient,
    collection: &str,
    uid: &str,
    payload: &Map<String, Value>,
) {
    if let Err(err) = store.set(collection, uid, payload).await {
        tracing::warn!(
            collection,
            uid,
            error = %err,
            "best-effort profile write failed"
        );
    }
}
