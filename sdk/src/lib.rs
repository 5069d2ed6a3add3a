//! Error types and response normalization shared by MyEM services.
//!
//! - [`HttpError`]: handler errors with a fixed status, rendered as `{"errors": ...}`
//! - [`DetailError`] and [`RemoteError`]: `{"detail": ...}` responses, including the
//!   mapping of errors returned by remote RPC calls
//! - [`ValidationErrors`]: request validation failures nested per field, rendered as 422
//! - [`init_app`]: CORS setup applied to every service router

mod app;
mod error;
mod response;
mod validation;

pub use app::init_app;
pub use error::{HttpError, HttpResult};
pub use response::{
    DetailError, RemoteError, RpcValidationError, INTERNAL_SERVER_ERROR_DETAIL,
    RPC_VALIDATION_EXCEPTION,
};
pub use validation::{nest_validation_errors, FieldError, ValidationErrors};
