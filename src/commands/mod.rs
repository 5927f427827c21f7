mod replay;
mod report;
mod validate;

// Re-export command functions for convenience
pub use replay::{replay, ReplayParams};
pub use report::report;
pub use validate::validate;
