pub mod appointment;
pub mod export;
pub mod health;
pub mod review;
pub mod vehicle;
