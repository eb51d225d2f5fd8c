pub mod account_change;
pub mod bet_status;
pub mod quick_filter;
pub mod user_role;

pub use account_change::AccountChangeType;
pub use bet_status::BetStatus;
pub use quick_filter::QuickFilter;
pub use user_role::UserRole;
