use crate::flows::register::Program;
use crate::identity::FederatedProvider;
use clap::{Parser, Subcommand};

/// `NexGenU` - onboarding client for NexGen University.
#[derive(Parser, Debug)]
#[command(name = "nexgenu")]
#[command(version = "0.1.0")]
#[command(about = "Login, register, and join the NexGen University waitlist.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with email/password or a federated provider
    Login {
        /// Account email (required unless --provider is used)
        #[arg(long)]
        email: Option<String>,

        /// Password (prompted interactively when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Federated provider to sign in through
        #[arg(long, value_enum)]
        provider: Option<FederatedProvider>,

        /// Provider assertion (OAuth ID token) for federated sign-in
        #[arg(long)]
        assertion: Option<String>,
    },

    /// Create an account and the student profile document
    Register {
        /// Full name (email registration)
        #[arg(long)]
        name: Option<String>,

        /// Account email (email registration)
        #[arg(long)]
        email: Option<String>,

        /// Password (prompted interactively when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Program to enroll in (email registration)
        #[arg(long, value_enum)]
        program: Option<Program>,

        /// Federated provider to register through
        #[arg(long, value_enum)]
        provider: Option<FederatedProvider>,

        /// Provider assertion (OAuth ID token) for federated registration
        #[arg(long)]
        assertion: Option<String>,
    },

    /// Join the waitlist
    Waitlist {
        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,
    },

    /// Show the onboarding countdown
    Onboarding {
        /// Greeting name (defaults to the signed-in display name)
        #[arg(long)]
        name: Option<String>,

        /// Keep the countdown ticking once per second
        #[arg(long)]
        watch: bool,
    },

    /// Send a password-reset email
    ResetPassword {
        /// Account email
        #[arg(long)]
        email: String,
    },

    /// Show the signed-in account
    Whoami,

    /// Sign out and remove the local session
    Logout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn waitlist_parses_name_and_email() {
        let cli = Cli::try_parse_from([
            "nexgenu",
            "waitlist",
            "--name",
            "Ada Lovelace",
            "--email",
            "ada@nexgenu.edu",
        ])
        .unwrap();
        match cli.command {
            Commands::Waitlist { name, email } => {
                assert_eq!(name, "Ada Lovelace");
                assert_eq!(email, "ada@nexgenu.edu");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn login_accepts_federated_provider() {
        let cli = Cli::try_parse_from([
            "nexgenu",
            "login",
            "--provider",
            "google",
            "--assertion",
            "idtok",
        ])
        .unwrap();
        match cli.command {
            Commands::Login {
                provider, assertion, ..
            } => {
                assert_eq!(provider, Some(FederatedProvider::Google));
                assert_eq!(assertion.as_deref(), Some("idtok"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn register_program_values_match_catalog() {
        for program in ["computer-science", "business", "engineering"] {
            let parsed = Cli::try_parse_from(["nexgenu", "register", "--program", program]);
            assert!(parsed.is_ok(), "program {program} should parse");
        }
    }
}
