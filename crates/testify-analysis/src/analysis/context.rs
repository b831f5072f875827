//! Shared state handed to the class visitors.

use std::sync::Arc;

use testify_core::config::TestifyConfig;

use super::inspectors::InspectorRegistry;
use super::markers::Markers;
use crate::classpath::{ClassPath, TypeHierarchy};

/// Everything a visitor needs besides the class being visited.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub class_path: Arc<ClassPath>,
    pub markers: Arc<Markers>,
    pub inspectors: Arc<InspectorRegistry>,
    pub max_bundle_depth: u32,
}

impl AnalysisContext {
    /// Markers, built-in inspectors and bundle depth from `config`.
    pub fn new(class_path: Arc<ClassPath>, config: &TestifyConfig) -> Self {
        let markers = Arc::new(Markers::from_config(&config.markers));
        let inspectors = Arc::new(InspectorRegistry::with_defaults(&markers));
        Self {
            class_path,
            markers,
            inspectors,
            max_bundle_depth: config.analysis.effective_max_bundle_depth(),
        }
    }

    pub fn with_inspectors(mut self, inspectors: InspectorRegistry) -> Self {
        self.inspectors = Arc::new(inspectors);
        self
    }

    pub fn hierarchy(&self) -> Arc<dyn TypeHierarchy> {
        self.class_path.clone()
    }
}
