pub mod appointment_form;
pub mod appointment_service;
pub mod export_service;
pub mod review_aggregator;
pub mod review_service;
pub mod storefront_client;
pub mod vehicle_service;
