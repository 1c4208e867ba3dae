use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `NexGenU`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum NexError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Identity provider ───────────────────────────────────────────────
    #[error("identity: {0}")]
    Identity(#[from] IdentityError),

    // ── Document store ──────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Identity provider errors ───────────────────────────────────────────────

/// Authentication failures mapped from the identity provider's error codes.
///
/// These are terminal: the flows surface them to the user verbatim and never
/// retry them.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("email address is not valid")]
    InvalidEmail,

    #[error("wrong password")]
    WrongPassword,

    #[error("no account exists for this email")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("an account already exists for this email")]
    EmailExists,

    #[error("password is too weak: {0}")]
    WeakPassword(String),

    #[error("federated provider rejected the sign-in: {0}")]
    Provider(String),

    #[error("identity provider error {code}: {message}")]
    Api { code: String, message: String },

    #[error("request failed: {0}")]
    Http(String),

    #[error("identity API key not set. Add identity.api_key to config.toml")]
    MissingApiKey,

    #[error("not signed in")]
    NotSignedIn,

    #[error("session store: {0}")]
    SessionStore(String),
}

// ─── Document store errors ──────────────────────────────────────────────────

/// Code/message pair captured from a failed document-store attempt.
///
/// Carries enough to classify the failure and to surface it to the caller;
/// never mutated after capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub code: Option<String>,
    pub message: String,
}

impl ErrorDescriptor {
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Descriptor for a failure with no upstream status code (connection
    /// resets, malformed bodies).
    pub fn message_only(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code.as_deref() {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store rejected the write (status code + message from the error
    /// body).
    #[error("write rejected: {0}")]
    Rejected(ErrorDescriptor),

    /// The request never produced a store response (connection, TLS, timeout).
    #[error("transport: {0}")]
    Transport(String),

    /// The store responded with a body this client could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Collapse any store failure into the code/message pair the retry policy
    /// classifies on.
    pub fn descriptor(&self) -> ErrorDescriptor {
        match self {
            Self::Rejected(descriptor) => descriptor.clone(),
            Self::Transport(message) | Self::Malformed(message) => {
                ErrorDescriptor::message_only(message.clone())
            }
        }
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, NexError>;
