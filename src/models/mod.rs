pub mod product;
pub mod run_context;

// Re-exports for convenience
pub use product::*;
pub use run_context::*;
