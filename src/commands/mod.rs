pub mod compare;
pub mod fetch;
pub mod report;
pub mod serve;

// Re-export command functions for convenience
pub use compare::compare;
pub use fetch::fetch;
pub use report::report;
pub use serve::serve;
