pub mod error_handler;
pub mod session;

pub use session::{LoginUser, SessionAuth};
