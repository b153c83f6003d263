// Domain layer - Meters, cost distribution and draft readings
pub mod cost;
pub mod error;
pub mod format;
pub mod meter;
pub mod reading_board;
