pub mod clock;
pub mod dates;
pub mod heatmap;
pub mod insights;
pub mod models;
pub mod monthly;
pub mod preferences;
pub mod service;
pub mod session;
pub mod store;
pub mod streak;
