use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::annotate::{Annotation, Annotator, AnnotatorFactory};
use crate::metrics::MetricParams;

/// State owned by one pool worker: a lazily created annotator and the most
/// recent annotation, so value and auxiliary functions share one pass.
pub struct WorkerContext {
    factory: Arc<dyn AnnotatorFactory>,
    annotator: Option<Box<dyn Annotator>>,
    cached: Option<(String, Annotation)>,
    params: MetricParams,
}

impl WorkerContext {
    pub fn new(factory: Arc<dyn AnnotatorFactory>, params: MetricParams) -> Self {
        Self {
            factory,
            annotator: None,
            cached: None,
            params,
        }
    }

    pub fn params(&self) -> &MetricParams {
        &self.params
    }

    pub fn annotate(&mut self, text: &str) -> Result<&Annotation> {
        let hit = matches!(&self.cached, Some((cached_text, _)) if cached_text == text);
        if !hit {
            let annotation = self.annotator()?.annotate(text)?;
            self.cached = Some((text.to_string(), annotation));
        }

        self.cached
            .as_ref()
            .map(|(_, annotation)| annotation)
            .context("annotation cache is empty")
    }

    fn annotator(&mut self) -> Result<&mut (dyn Annotator + 'static)> {
        if self.annotator.is_none() {
            debug!("initializing worker annotator");
            self.annotator = Some(
                self.factory
                    .create()
                    .context("failed to initialize annotator")?,
            );
        }

        self.annotator
            .as_deref_mut()
            .context("annotator is not initialized")
    }
}
