// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod meter_mapper;
pub mod rest_repository;
