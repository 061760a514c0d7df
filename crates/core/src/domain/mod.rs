pub mod contract;
pub mod health;
pub mod sales;
