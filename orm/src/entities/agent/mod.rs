pub mod app_commission_change;

pub use app_commission_change::AppCommissionChange;
