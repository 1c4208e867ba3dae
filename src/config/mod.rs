pub mod schema;

pub use schema::{Config, IdentityConfig, OnboardingConfig, ReliabilityConfig, StoreConfig};
