pub mod appointment_dto;
pub mod export_dto;
pub mod review_dto;
