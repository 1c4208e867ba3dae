use crate::flows::validate_email;
use crate::identity::{IdentityClient, SessionStore};
use anyhow::Result;

/// Show the signed-in account with a freshly looked-up profile snapshot.
pub async fn whoami(identity: &IdentityClient, sessions: &SessionStore) -> Result<()> {
    let session = sessions.require()?;
    let user = identity.lookup(&session.id_token).await?;

    println!("👤 {}", user.greeting_name());
    println!("Uid: {}", user.uid);
    println!("Email: {}", user.email);
    println!(
        "Email verified: {}",
        if user.email_verified { "yes" } else { "no" }
    );
    Ok(())
}

pub fn logout(sessions: &SessionStore) -> Result<()> {
    sessions.clear()?;
    println!("👋 You have logged out successfully.");
    Ok(())
}

pub async fn reset_password(identity: &IdentityClient, email: &str) -> Result<()> {
    validate_email(email)?;
    identity.send_password_reset(email.trim()).await?;
    println!("📧 Password reset email sent to {email}.");
    Ok(())
}
