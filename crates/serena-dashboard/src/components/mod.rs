//! Dashboard UI components
//!
//! Reusable Leptos components for the Serena dashboard.

mod runtime_badge;
mod stats;

pub use runtime_badge::*;
pub use stats::*;
