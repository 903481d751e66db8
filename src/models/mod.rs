pub mod appointment;
pub mod review;
pub mod vehicle;
