// tests/common/mod.rs
// Deterministic collaborator stubs that count their calls.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use exposition_scout::collab::{
    CollaboratorError, NeighborhoodLookup, NeighborhoodReport, NeighborhoodTable,
    PhotoBrightnessAnalyzer, PhotoBrightnessReport, TextOrientationAnalyzer, TextOrientationReport,
    ValidationStatus,
};
use exposition_scout::{Collaborators, EngineConfig, ExpositionEngine, SignalClass};

#[derive(Clone, Copy, Debug)]
pub enum Failure {
    Timeout,
    Malformed,
    Unavailable,
}

impl Failure {
    fn into_error(self) -> CollaboratorError {
        match self {
            Failure::Timeout => CollaboratorError::Timeout(Duration::from_secs(10)),
            Failure::Malformed => CollaboratorError::MalformedResponse("not json".into()),
            Failure::Unavailable => CollaboratorError::Unavailable("stub".into()),
        }
    }
}

pub struct StubText {
    pub answer: Result<TextOrientationReport, Failure>,
    pub calls: Arc<AtomicUsize>,
}

impl StubText {
    pub fn answering(report: TextOrientationReport) -> Self {
        Self { answer: Ok(report), calls: Arc::default() }
    }
    pub fn failing(f: Failure) -> Self {
        Self { answer: Err(f), calls: Arc::default() }
    }
}

#[async_trait]
impl TextOrientationAnalyzer for StubText {
    async fn analyze(&self, _desc: &str, _chars: &str, _floor: &str) -> Result<TextOrientationReport, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(Failure::into_error)
    }
    fn name(&self) -> &'static str {
        "stub"
    }
}

pub struct StubPhotos {
    pub brightness: Result<Option<f32>, Failure>,
    pub calls: Arc<AtomicUsize>,
    pub last_batch: Arc<Mutex<usize>>,
}

impl StubPhotos {
    pub fn bright(value: f32) -> Self {
        Self { brightness: Ok(Some(value)), calls: Arc::default(), last_batch: Arc::default() }
    }
    pub fn nothing() -> Self {
        Self { brightness: Ok(None), calls: Arc::default(), last_batch: Arc::default() }
    }
    pub fn failing(f: Failure) -> Self {
        Self { brightness: Err(f), calls: Arc::default(), last_batch: Arc::default() }
    }
}

#[async_trait]
impl PhotoBrightnessAnalyzer for StubPhotos {
    async fn analyze(
        &self,
        photos: &[String],
        _max: usize,
        text_hint: Option<SignalClass>,
    ) -> Result<PhotoBrightnessReport, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock().unwrap() = photos.len();
        let value = self.brightness.map_err(Failure::into_error)?;
        Ok(PhotoBrightnessReport {
            photos_analyzed: if value.is_some() { photos.len() } else { 0 },
            brightness_value: value,
            validation_status: value
                .map(|v| ValidationStatus::assess(text_hint, v))
                .unwrap_or(ValidationStatus::PhotoOnly),
        })
    }
    fn name(&self) -> &'static str {
        "stub-photos"
    }
}

/// Neighborhood lookup that counts calls and delegates to the default table,
/// or fails.
pub struct StubNeighborhoods {
    pub table: NeighborhoodTable,
    pub fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl StubNeighborhoods {
    pub fn default_table() -> Self {
        Self {
            table: NeighborhoodTable::from_entries(&EngineConfig::default().neighborhoods),
            fail: false,
            calls: Arc::default(),
        }
    }
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default_table() }
    }
}

impl NeighborhoodLookup for StubNeighborhoods {
    fn lookup(&self, text: &str) -> Result<NeighborhoodReport, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CollaboratorError::Unavailable("table offline".into()));
        }
        Ok(self.table.find(text))
    }
}

pub fn engine(text: StubText, photos: StubPhotos, hoods: StubNeighborhoods) -> ExpositionEngine {
    ExpositionEngine::new(
        EngineConfig::default(),
        Collaborators {
            text: Arc::new(text),
            photos: Arc::new(photos),
            neighborhoods: Arc::new(hoods),
        },
    )
}

pub fn offline_engine() -> ExpositionEngine {
    let cfg = EngineConfig::default();
    let collab = Collaborators::offline(&cfg);
    ExpositionEngine::new(cfg, collab)
}

/// Offline text (keyword fallback) with the given photo stub.
pub fn engine_with_photos(photos: StubPhotos) -> ExpositionEngine {
    engine(
        StubText { answer: Ok(TextOrientationReport::unavailable()), calls: Arc::default() },
        photos,
        StubNeighborhoods::default_table(),
    )
}

pub fn calls(c: &Arc<AtomicUsize>) -> usize {
    c.load(Ordering::SeqCst)
}
