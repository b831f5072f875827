//! Analyzer: memoized test-class and SUT analysis.

use std::sync::Arc;
use std::time::Instant;

use moka::sync::Cache;
use testify_core::config::TestifyConfig;
use testify_core::errors::{AnalysisError, TestifyErrorCode};
use testify_core::events::types::{AnalysisFailedEvent, SutAnalyzedEvent, TestClassAnalyzedEvent};
use testify_core::events::EventDispatcher;

use super::context::AnalysisContext;
use super::markers::Markers;
use super::sut_class_visitor::SutClassVisitor;
use super::test_class_visitor::TestClassVisitor;
use crate::classfile::reader::ClassReader;
use crate::classpath::ClassPath;
use crate::descriptor::{FieldDescriptor, SutDescriptor, TestDescriptor};

/// Cache key for SUT descriptors: (test class, SUT field name).
type SutKey = (String, String);

/// Analyzes test classes and their SUTs, memoizing both.
///
/// Each cached key is analysed at most once; concurrent callers for the same
/// key wait for the first and receive the same `Arc`. Failures are not cached.
/// Eviction under a `cache_capacity` bound and `invalidate_all` both end that
/// sharing: the next lookup analyses again and returns a fresh `Arc`.
pub struct Analyzer {
    ctx: AnalysisContext,
    events: EventDispatcher,
    test_descriptors: Cache<String, Arc<TestDescriptor>>,
    sut_descriptors: Cache<SutKey, Arc<SutDescriptor>>,
}

impl Analyzer {
    pub fn new(class_path: Arc<ClassPath>, config: &TestifyConfig) -> Self {
        Self::with_context(
            AnalysisContext::new(class_path, config),
            config.analysis.cache_capacity,
        )
    }

    /// Class path built from `config.class_path` roots.
    pub fn from_config(config: &TestifyConfig) -> Self {
        let class_path = Arc::new(ClassPath::from_config(&config.class_path, &config.analysis));
        Self::new(class_path, config)
    }

    /// `capacity` bounds each cache; evicted entries are re-analysed on demand.
    pub fn with_context(ctx: AnalysisContext, capacity: Option<u64>) -> Self {
        let (test_descriptors, sut_descriptors) = match capacity {
            Some(cap) => (
                Cache::builder().max_capacity(cap).build(),
                Cache::builder().max_capacity(cap).build(),
            ),
            None => (Cache::builder().build(), Cache::builder().build()),
        };
        Self {
            ctx,
            events: EventDispatcher::new(),
            test_descriptors,
            sut_descriptors,
        }
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.ctx
    }

    pub fn class_path(&self) -> &Arc<ClassPath> {
        &self.ctx.class_path
    }

    pub fn markers(&self) -> &Markers {
        &self.ctx.markers
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Analyze `test_class` (binary name), or return the memoized result.
    pub fn analyze_test_class(&self, test_class: &str) -> Result<Arc<TestDescriptor>, AnalysisError> {
        self.test_descriptors
            .try_get_with(test_class.to_string(), || {
                self.run_test_analysis(test_class)
                    .map(Arc::new)
                    .map_err(|e| self.failed(test_class, e))
            })
            .map_err(|e: Arc<AnalysisError>| (*e).clone())
    }

    /// Analyze the SUT class behind `test`'s SUT field.
    pub fn analyze_sut_field(&self, test: &TestDescriptor) -> Result<Arc<SutDescriptor>, AnalysisError> {
        let sut_field = test.sut_field().ok_or_else(|| AnalysisError::MissingSutField {
            test_class: test.test_class().to_string(),
        })?;
        let key = (test.test_class().to_string(), sut_field.name().to_string());
        self.sut_descriptors
            .try_get_with(key, || {
                self.run_sut_analysis(test, sut_field)
                    .map(Arc::new)
                    .map_err(|e| self.failed(test.test_class(), e))
            })
            .map_err(|e: Arc<AnalysisError>| (*e).clone())
    }

    /// Test descriptor plus the SUT descriptor when a SUT field exists.
    pub fn analyze(
        &self,
        test_class: &str,
    ) -> Result<(Arc<TestDescriptor>, Option<Arc<SutDescriptor>>), AnalysisError> {
        let test = self.analyze_test_class(test_class)?;
        let sut = match test.sut_field() {
            Some(_) => Some(self.analyze_sut_field(&test)?),
            None => None,
        };
        Ok((test, sut))
    }

    /// Number of memoized test descriptors. Eventually consistent.
    pub fn cached_test_descriptors(&self) -> u64 {
        self.test_descriptors.run_pending_tasks();
        self.test_descriptors.entry_count()
    }

    pub fn cached_sut_descriptors(&self) -> u64 {
        self.sut_descriptors.run_pending_tasks();
        self.sut_descriptors.entry_count()
    }

    /// Drop every memoized descriptor. Later lookups return new instances.
    pub fn invalidate_all(&self) {
        self.test_descriptors.invalidate_all();
        self.sut_descriptors.invalidate_all();
    }

    fn run_test_analysis(&self, test_class: &str) -> Result<TestDescriptor, AnalysisError> {
        let _span = tracing::debug_span!("testify.analysis", test_class).entered();
        let start = Instant::now();

        let class = self.ctx.class_path.load_class(test_class, test_class)?;
        let mut visitor = TestClassVisitor::new(&self.ctx, test_class);
        ClassReader::from_class_file(class).accept(&mut visitor)?;
        let descriptor = visitor.finish()?;

        let duration_us = start.elapsed().as_micros() as u64;
        tracing::info!(
            test_class,
            fields = descriptor.field_descriptors().len(),
            sut = descriptor.sut_field().map(|f| f.name()),
            duration_us,
            "analyzed test class"
        );
        self.events.emit_test_class_analyzed(&TestClassAnalyzedEvent {
            test_class: test_class.to_string(),
            field_count: descriptor.field_descriptors().len(),
            sut_field: descriptor.sut_field().map(|f| f.name().to_string()),
            duration_us,
        });
        Ok(descriptor)
    }

    fn run_sut_analysis(
        &self,
        test: &TestDescriptor,
        sut_field: &FieldDescriptor,
    ) -> Result<SutDescriptor, AnalysisError> {
        let sut_class = sut_field.ty().class_name().ok_or_else(|| {
            AnalysisError::InvalidAnnotation {
                annotation: self.ctx.markers.sut.clone(),
                class: test.test_class().to_string(),
                message: format!("SUT field {} must have a class type", sut_field.name()),
            }
        })?;
        let class = self.ctx.class_path.load_class(sut_class, test.test_class())?;

        let _span = tracing::debug_span!("testify.analysis", sut_class).entered();
        let mut visitor = SutClassVisitor::new(&self.ctx, sut_field);
        ClassReader::from_class_file(class).accept(&mut visitor)?;
        let descriptor = visitor.finish()?;

        tracing::info!(
            test_class = %test.test_class(),
            sut_class,
            parameters = descriptor.parameter_descriptors().len(),
            fields = descriptor.field_descriptors().len(),
            "analyzed SUT"
        );
        self.events.emit_sut_analyzed(&SutAnalyzedEvent {
            test_class: test.test_class().to_string(),
            sut_class: sut_class.to_string(),
            parameter_count: descriptor.constructor().map(|c| c.parameter_count()),
            field_count: descriptor.field_descriptors().len(),
        });
        Ok(descriptor)
    }

    /// Report a failure once per analysis run. Callers coalesced onto the
    /// same run share its error without reporting again.
    fn failed(&self, class: &str, error: AnalysisError) -> AnalysisError {
        tracing::warn!(class, error = %error.coded_string(), "analysis failed");
        self.events.emit_analysis_failed(&AnalysisFailedEvent {
            class: class.to_string(),
            error_code: error.error_code(),
            message: error.to_string(),
        });
        error
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("class_path", &self.ctx.class_path)
            .field("events", &self.events)
            .finish()
    }
}
