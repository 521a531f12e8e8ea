use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::scorer::{evaluate, is_time_suspicious, AnomalyScorer, ModelSource, OutlierModel};
use crate::constants::{MIB, REASON_SIZE, REASON_TIME};
use crate::logic::storage::{Catalog, MemoryCatalog, StorageResult};
use crate::logic::types::{AnomalyEvent, FeaturePoint, FileRecord};

/// Flags everything it is asked about
struct AlwaysOutlying;

impl OutlierModel for AlwaysOutlying {
    fn is_outlier(&self, _point: FeaturePoint) -> bool {
        true
    }
}

/// Must never be consulted
struct Unreachable;

impl OutlierModel for Unreachable {
    fn is_outlier(&self, point: FeaturePoint) -> bool {
        panic!("model consulted for {:?}", point);
    }
}

/// Catalog wrapper counting history fetches
struct CountingCatalog {
    inner: MemoryCatalog,
    history_calls: AtomicUsize,
    history: Vec<FeaturePoint>,
}

impl CountingCatalog {
    fn new(history: Vec<FeaturePoint>) -> Self {
        Self {
            inner: MemoryCatalog::new(),
            history_calls: AtomicUsize::new(0),
            history,
        }
    }
}

#[async_trait]
impl Catalog for CountingCatalog {
    async fn insert_file(&self, record: &FileRecord) -> StorageResult<()> {
        self.inner.insert_file(record).await
    }
    async fn find_by_checksum(&self, checksum: &str) -> StorageResult<Option<FileRecord>> {
        self.inner.find_by_checksum(checksum).await
    }
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<FileRecord>> {
        self.inner.find_by_id(id).await
    }
    async fn list_files(&self, limit: Option<usize>) -> StorageResult<Vec<FileRecord>> {
        self.inner.list_files(limit).await
    }
    async fn feature_history(&self) -> StorageResult<Vec<FeaturePoint>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.history.clone())
    }
    async fn count_files(&self) -> StorageResult<u64> {
        self.inner.count_files().await
    }
    async fn count_duplicates(&self) -> StorageResult<u64> {
        self.inner.count_duplicates().await
    }
    async fn total_storage_bytes(&self) -> StorageResult<u64> {
        self.inner.total_storage_bytes().await
    }
    async fn count_files_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<u64> {
        self.inner.count_files_between(start, end).await
    }
    async fn append_anomaly(&self, event: &AnomalyEvent) -> StorageResult<()> {
        self.inner.append_anomaly(event).await
    }
    async fn count_anomalies(&self) -> StorageResult<u64> {
        self.inner.count_anomalies().await
    }
    async fn recent_anomalies(&self, limit: usize) -> StorageResult<Vec<AnomalyEvent>> {
        self.inner.recent_anomalies(limit).await
    }
}

fn business_history(n: usize) -> Vec<FeaturePoint> {
    (0..n)
        .map(|i| FeaturePoint::new(40_000 + (i as u64 * 97 % 20_000), 9 + (i as u32 % 9)))
        .collect()
}

// ============================================================================
// RULES
// ============================================================================

#[test]
fn test_time_window_wraps_midnight() {
    let suspicious: Vec<u32> = (0..24).filter(|&h| is_time_suspicious(h)).collect();
    assert_eq!(suspicious, vec![0, 1, 2, 3, 4, 23]);
}

#[test]
fn test_small_uploads_never_consult_model() {
    for hour in 0..24 {
        assert_eq!(evaluate(1, hour, &Unreachable), Default::default());
        assert_eq!(evaluate(20 * MIB - 1, hour, &Unreachable), Default::default());
    }
}

#[test]
fn test_mid_size_uploads_never_anomalous() {
    for hour in 0..24 {
        assert!(!evaluate(20 * MIB, hour, &Unreachable).is_anomaly);
        assert!(!evaluate(25 * MIB, hour, &Unreachable).is_anomaly);
        assert!(!evaluate(30 * MIB, hour, &Unreachable).is_anomaly);
    }
}

#[test]
fn test_large_upload_needs_both_model_and_time() {
    let verdict = evaluate(40 * MIB, 2, &AlwaysOutlying);
    assert!(verdict.is_anomaly);
    assert!(verdict.details.contains_key(REASON_SIZE));
    assert!(verdict.details.contains_key(REASON_TIME));

    let daytime = evaluate(40 * MIB, 14, &AlwaysOutlying);
    assert!(!daytime.is_anomaly);
    assert!(daytime.details.is_empty());
}

#[test]
fn test_large_upload_normal_when_model_disagrees() {
    struct NeverOutlying;
    impl OutlierModel for NeverOutlying {
        fn is_outlier(&self, _point: FeaturePoint) -> bool {
            false
        }
    }

    assert!(!evaluate(40 * MIB, 2, &NeverOutlying).is_anomaly);
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_small_history_trains_on_prior() {
    let catalog = CountingCatalog::new(business_history(10));
    let scorer = AnomalyScorer::default();
    assert!(!scorer.is_trained());

    let info = scorer.initialize(&catalog).await.unwrap();
    assert_eq!(info.source, ModelSource::SyntheticPrior);
    assert_eq!(info.samples, 100);
    assert!(scorer.is_trained());
}

#[tokio::test]
async fn test_large_history_trains_on_history() {
    let catalog = CountingCatalog::new(business_history(11));
    let scorer = AnomalyScorer::default();

    let info = scorer.initialize(&catalog).await.unwrap();
    assert_eq!(info.source, ModelSource::History);
    assert_eq!(info.samples, 11);
}

#[tokio::test]
async fn test_initialize_trains_once() {
    let catalog = CountingCatalog::new(business_history(50));
    let scorer = AnomalyScorer::default();

    scorer.initialize(&catalog).await.unwrap();
    scorer.initialize(&catalog).await.unwrap();
    scorer.score(&catalog, 1, 3).await.unwrap();

    assert_eq!(catalog.history_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_trains_once() {
    let catalog = Arc::new(CountingCatalog::new(business_history(50)));
    let scorer = Arc::new(AnomalyScorer::default());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let catalog = catalog.clone();
            let scorer = scorer.clone();
            tokio::spawn(async move { scorer.score(catalog.as_ref(), 45 * MIB, 2).await.map(|_| ()) })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(catalog.history_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reinitialize_always_retrains() {
    let catalog = CountingCatalog::new(business_history(50));
    let scorer = AnomalyScorer::default();

    scorer.initialize(&catalog).await.unwrap();
    let info = scorer.reinitialize(&catalog).await.unwrap();

    assert_eq!(info.source, ModelSource::History);
    assert_eq!(catalog.history_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_trained_forest_flags_night_giant() {
    let catalog = CountingCatalog::new(business_history(200));
    let scorer = AnomalyScorer::default();
    scorer.initialize(&catalog).await.unwrap();

    let night = scorer.score(&catalog, 40 * MIB, 2).await.unwrap();
    assert!(night.is_anomaly);
    assert_eq!(night.details.len(), 2);

    let day = scorer.score(&catalog, 40 * MIB, 14).await.unwrap();
    assert!(!day.is_anomaly);
}

#[tokio::test]
async fn test_install_replaces_model() {
    let catalog = CountingCatalog::new(Vec::new());
    let scorer = AnomalyScorer::default();

    let info = scorer.install(Arc::new(AlwaysOutlying), 0);
    assert_eq!(info.source, ModelSource::External);
    assert!(info.offset.is_none());

    let verdict = scorer.score(&catalog, 31 * MIB, 23).await.unwrap();
    assert!(verdict.is_anomaly);
    assert_eq!(catalog.history_calls.load(Ordering::SeqCst), 0);
}
