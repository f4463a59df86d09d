use std::sync::Arc;

use engine_rest_core::engine::ProcessEngine;
use engine_rest_core::resource::ResourceSpecs;
use engine_rest_core::value::{DataFormatRegistry, ValueCodec};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn ProcessEngine>,
    pub specs: Arc<ResourceSpecs>,
    pub codec: ValueCodec,
}

impl AppState {
    pub fn new(engine: Arc<dyn ProcessEngine>, formats: DataFormatRegistry) -> Self {
        Self {
            engine,
            specs: Arc::new(ResourceSpecs::new()),
            codec: ValueCodec::new(formats),
        }
    }
}
