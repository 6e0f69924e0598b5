mod http;
mod traits;
mod types;

pub use http::HttpBackend;
pub use traits::{Backend, ServiceStatus};

use crate::config::ClientConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the HTTP backend from configuration
pub fn create_backend(config: &ClientConfig) -> Result<Arc<dyn Backend>> {
    config.validate()?;
    let backend = HttpBackend::new(&config.server_url)?;

    Ok(Arc::new(backend))
}
