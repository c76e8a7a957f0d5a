//! # Batch Data Model
//!
//! Caller-supplied [`SubRequest`]s and engine-produced [`SubResponse`]s. Both
//! are transient: they live for the duration of one batch invocation.

pub mod batch;
pub mod method;
pub mod sub_request;
pub mod sub_response;

pub use batch::{validate_batch, ExecutionMode};
pub use method::HttpMethod;
pub use sub_request::{RequestId, SubRequest};
pub use sub_response::SubResponse;
