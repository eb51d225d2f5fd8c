pub mod app_account_change;
pub mod app_user;

pub use app_account_change::AppAccountChange;
pub use app_user::AppUser;
