pub mod client;
pub mod resilient;
pub mod transport;

pub use client::{StoreClient, WriteTransport, server_timestamp};
pub use resilient::{FailureClass, ResilientWriter, RetryPolicy, WriteOutcome, WriteRequest};
pub use transport::TransportMode;
