pub mod arbitrage;
pub mod battery;
pub mod benchmark;
pub mod day;
pub mod dispatch;
mod error;
pub mod greedy;
pub mod linear;
pub mod provider;
pub mod tariff;
pub mod trajectory;

pub use self::error::Error;
