//! Fallback executor and routing statistics for the smart router.

pub mod executor;
pub mod stats;

pub use executor::{SmartRouter, AUTO_MODEL};
pub use stats::{RouteRecord, RoutingStats, StatsSnapshot};
