//! Shared constants for the batch envelope and error mapping.

/// Query parameter selecting enclosing-transaction execution
pub const ENCLOSING_TRANSACTION_PARAM: &str = "enclosingTransaction";

/// Content type attached to every assembled sub-response
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Reference token markers
pub mod tokens {
    /// Introduces every reference token
    pub const MARKER: char = '$';
    /// `$.path`: path into the declared reference
    pub const DEFAULT_TARGET: char = '.';
    /// `${id}.path`: path into an explicitly named request
    pub const EXPLICIT_TARGET_OPEN: char = '{';
    pub const EXPLICIT_TARGET_CLOSE: char = '}';
}

/// Status codes used when the orchestrator itself produces a response
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const NOT_IMPLEMENTED: u16 = 501;
}

/// `errorType` values of error-shaped bodies
pub mod error_types {
    pub const RESOLUTION: &str = "ResolutionError";
    pub const DISPATCH: &str = "DispatchError";
    pub const HANDLER: &str = "HandlerError";
    pub const TRANSACTION: &str = "TransactionError";
    pub const INVALID_BATCH: &str = "InvalidBatch";
    pub const INTERNAL: &str = "InternalError";
}
