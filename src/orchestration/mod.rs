//! # Orchestration Engine
//!
//! Sequential execution of a batch of sub-requests.
//!
//! ## Core Components
//!
//! - **BatchExecutor**: drives each sub-request through resolution, dispatch
//!   and invocation, and owns the unit-of-work policy for both execution modes
//! - **ResponseAssembler**: shapes handler outcomes and failures into
//!   sub-responses

pub mod assembler;
pub mod executor;

pub use assembler::ResponseAssembler;
pub use executor::BatchExecutor;
