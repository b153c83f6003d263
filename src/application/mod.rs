// Application layer - Use cases over the meter store
pub mod meter_repository;
pub mod reading_service;
