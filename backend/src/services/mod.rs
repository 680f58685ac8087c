pub mod workspaces;

use crate::error::ReconcileError;
use actix_web::web;

/// JSON extractor settings: body size limit, and malformed bodies answered with the
/// same error shape as every other invalid input.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| ReconcileError::InvalidInput(err.to_string()).into())
}
