// Feed Application Layer

pub mod commands;
pub mod dedupe;
pub mod error;
pub mod metrics;
pub mod state;
pub mod store;

pub use dedupe::DedupeCache;
pub use error::AppError;
pub use metrics::Metrics;
pub use state::AppState;
pub use store::SubscriptionStore;
