pub mod agent;
pub mod game;
pub mod system;
pub mod user;

// Re-export all entities
pub use agent::*;
pub use game::*;
pub use system::*;
pub use user::*;
