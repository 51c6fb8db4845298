//! Service modules for business logic

pub mod processor;

pub use processor::DraftProcessor;
