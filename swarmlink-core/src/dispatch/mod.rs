//! Dispatch policy
//!
//! Decides per packet kind whether a verified frame is forwarded to the
//! other link, intercepted, or dropped.

pub mod intercept;
pub mod policy;

pub use intercept::{apply_config, apply_credential_update, InterceptError, Interception};
pub use policy::{route, Route};
