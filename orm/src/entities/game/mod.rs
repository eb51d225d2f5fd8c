pub mod app_bet;

pub use app_bet::AppBet;
