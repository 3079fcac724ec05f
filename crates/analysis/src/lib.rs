pub mod aggregator;
pub mod handler;
pub mod models;
pub mod service;

pub use aggregator::aggregate;
