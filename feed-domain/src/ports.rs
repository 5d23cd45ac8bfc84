// Port Traits (Interfaces)
// Define what the domain needs from infrastructure

pub mod delivery;
pub mod repositories;
pub mod resolver;

pub use delivery::*;
pub use repositories::*;
pub use resolver::*;
