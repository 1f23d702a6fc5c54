pub mod analytics;
mod collection;
pub mod exercises;
pub mod fdc;
pub mod models;
pub mod nutrition;
pub mod service;
pub mod sets;
pub mod store;
