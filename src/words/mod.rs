pub mod bank;
mod catalog;

// Re-export common types
pub use bank::WordBank;
