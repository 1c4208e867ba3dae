use crate::flows::{prompt_password, validate_email};
use crate::identity::{FederatedProvider, IdentityClient, SessionStore};
use anyhow::{Result, bail};

#[derive(Debug)]
pub struct LoginArgs {
    pub email: Option<String>,
    pub password: Option<String>,
    pub provider: Option<FederatedProvider>,
    pub assertion: Option<String>,
}

pub async fn run(
    identity: &IdentityClient,
    sessions: &SessionStore,
    args: LoginArgs,
) -> Result<()> {
    if let Some(provider) = args.provider {
        let Some(assertion) = args.assertion.as_deref() else {
            bail!(
                "federated sign-in needs --assertion <ID_TOKEN> (an OAuth ID token from {})",
                provider.label()
            );
        };

        let session = identity.sign_in_with_provider(provider, assertion).await?;
        sessions.save(&session)?;
        println!("✅ Logged in as {}", session.user.greeting_name());
        println!("Next: nexgenu onboarding");
        return Ok(());
    }

    let Some(email) = args.email.as_deref() else {
        bail!("supply --email, or --provider for federated sign-in");
    };
    validate_email(email)?;

    let password = match args.password {
        Some(password) => password,
        None => prompt_password(&format!("Password for {email}"))?,
    };

    let session = identity.sign_in_with_email(email.trim(), &password).await?;
    sessions.save(&session)?;

    println!("✅ Login successful!");
    println!("Next: nexgenu onboarding");
    Ok(())
}
