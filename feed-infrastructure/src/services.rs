pub mod esi;
pub mod feed_client;
pub mod reference_cache;
pub mod webhook_delivery;

pub use esi::*;
pub use feed_client::*;
pub use reference_cache::*;
pub use webhook_delivery::*;
