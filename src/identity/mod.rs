pub mod client;
pub mod session;
pub mod types;

pub use client::IdentityClient;
pub use session::SessionStore;
pub use types::{FederatedProvider, Session, User};
