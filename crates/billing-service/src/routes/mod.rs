pub mod bills;
pub mod health;
pub mod metrics;
