//! # Command Dispatch
//!
//! Routing of resolved sub-requests to resource handlers.
//!
//! - [`PathPattern`]: literal and `{param}` segments plus query constraints
//! - [`CommandStrategy`]: the handler capability
//! - [`CommandDispatchTable`]: specificity-ordered, immutable route list

pub mod dispatch_table;
pub mod pattern;
pub mod strategy;

pub use dispatch_table::{CommandDispatchTable, DispatchTableBuilder, RouteMatch};
pub use pattern::{split_relative_url, PathPattern, PatternSegment, Specificity};
pub use strategy::{CommandRequest, CommandStrategy, HandlerOutcome};
