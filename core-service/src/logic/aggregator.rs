//! Aggregator - dashboard statistics
//!
//! Pure read pipeline over the catalog. Nothing here writes.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{HISTOGRAM_DAYS, MIB, RECENT_ACTIVITY_LIMIT, RECENT_PER_KIND};
use crate::logic::clock::human_time;
use crate::logic::ingest::IngestConfig;
use crate::logic::storage::{Catalog, StorageResult};

/// Longest local-time gap a DST or zone change can open
const MIDNIGHT_GAP_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Upload,
    Anomaly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_files: u64,
    pub duplicates_detected: u64,
    pub anomalies_detected: u64,
    pub total_storage: u64,
    pub total_storage_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timestamp_formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    /// Abbreviated weekday, e.g. "Mon"
    pub day: String,
    /// YYYY-MM-DD
    pub date: String,
    pub uploads: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTime {
    pub iso: String,
    pub formatted: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stats: Totals,
    pub recent_activity: Vec<Activity>,
    pub uploads_by_day: Vec<DayBucket>,
    pub current_time: CurrentTime,
}

/// "12.34 MB"
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MIB as f64)
}

pub struct Aggregator {
    catalog: Arc<dyn Catalog>,
    config: IngestConfig,
}

impl Aggregator {
    pub fn new(catalog: Arc<dyn Catalog>, config: IngestConfig) -> Self {
        Self { catalog, config }
    }

    fn human(&self, instant: DateTime<Utc>) -> String {
        human_time(instant, &self.config.timezone)
    }

    /// First instant of a local calendar day in UTC. An ambiguous midnight
    /// takes its earlier reading; one skipped by a DST jump moves to the
    /// first local time that exists.
    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let zone = self.config.timezone;
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        (0..=MIDNIGHT_GAP_MINUTES)
            .find_map(|m| {
                zone.from_local_datetime(&(midnight + Duration::minutes(m)))
                    .earliest()
            })
            .map(|local| local.with_timezone(&Utc))
            // Unreachable for real zones
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
    }

    /// UTC bounds of a local calendar day, both inclusive
    fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.local_midnight(date);
        let end = self.local_midnight(date + Duration::days(1)) - Duration::microseconds(1);
        (start, end)
    }

    pub async fn totals(&self) -> StorageResult<Totals> {
        let total_files = self.catalog.count_files().await?;
        let duplicates_detected = self.catalog.count_duplicates().await?;
        let anomalies_detected = self.catalog.count_anomalies().await?;
        let total_storage = self.catalog.total_storage_bytes().await?;

        Ok(Totals {
            total_files,
            duplicates_detected,
            anomalies_detected,
            total_storage,
            total_storage_formatted: format_megabytes(total_storage),
        })
    }

    /// Latest uploads and anomalies, merged newest first
    pub async fn recent_activity(&self) -> StorageResult<Vec<Activity>> {
        let files = self.catalog.list_files(Some(RECENT_PER_KIND)).await?;
        let anomalies = self.catalog.recent_anomalies(RECENT_PER_KIND).await?;

        let uploads = files.into_iter().map(|f| Activity {
            kind: ActivityKind::Upload,
            message: format!("File '{}' was uploaded", f.filename),
            timestamp_formatted: self.human(f.upload_timestamp),
            timestamp: f.upload_timestamp,
        });
        let flagged = anomalies.into_iter().map(|a| Activity {
            kind: ActivityKind::Anomaly,
            message: format!("Anomaly detected in file '{}'", a.filename),
            timestamp_formatted: self.human(a.timestamp),
            timestamp: a.timestamp,
        });

        let mut activity: Vec<Activity> = uploads.chain(flagged).collect();
        activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activity.truncate(RECENT_ACTIVITY_LIMIT);
        Ok(activity)
    }

    /// Upload counts for the local days ending today, oldest first
    pub async fn uploads_by_day(&self, now: DateTime<Utc>) -> StorageResult<Vec<DayBucket>> {
        let today = now.with_timezone(&self.config.timezone).date_naive();
        let mut buckets = Vec::with_capacity(HISTOGRAM_DAYS as usize);

        for back in (0..HISTOGRAM_DAYS).rev() {
            let date = today - Duration::days(i64::from(back));
            let (start, end) = self.day_bounds(date);
            let uploads = self.catalog.count_files_between(start, end).await?;

            buckets.push(DayBucket {
                day: date.format("%a").to_string(),
                date: date.format("%Y-%m-%d").to_string(),
                uploads,
            });
        }

        Ok(buckets)
    }

    pub fn current_time(&self, now: DateTime<Utc>) -> CurrentTime {
        CurrentTime {
            iso: now.with_timezone(&self.config.timezone).to_rfc3339(),
            formatted: self.human(now),
            timezone: self.config.timezone_name().to_string(),
        }
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> StorageResult<DashboardStats> {
        let stats = self.totals().await?;
        let recent_activity = self.recent_activity().await?;
        let uploads_by_day = self.uploads_by_day(now).await?;

        log::debug!(
            "Dashboard: {} files, {} anomalies, {} activity items",
            stats.total_files,
            stats.anomalies_detected,
            recent_activity.len()
        );

        Ok(DashboardStats {
            stats,
            recent_activity,
            uploads_by_day,
            current_time: self.current_time(now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::logic::clock::parse_timezone;
    use crate::logic::storage::MemoryCatalog;
    use crate::logic::types::{Analysis, AnomalyEvent, BlobRef, FileRecord};

    fn record(name: &str, at: DateTime<Utc>, size: u64) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            filename: name.to_string(),
            checksum: format!("{:0>64}", name),
            blob_ref: BlobRef::new(name),
            content_type: "text/plain".to_string(),
            size_bytes: size,
            upload_timestamp: at,
            upload_hour: 12,
            timezone: "UTC".to_string(),
            analysis: Analysis::default(),
        }
    }

    fn anomaly(name: &str, at: DateTime<Utc>) -> AnomalyEvent {
        AnomalyEvent {
            id: Uuid::new_v4(),
            filename: name.to_string(),
            size_bytes: 40 * MIB,
            upload_hour: 2,
            details: Default::default(),
            timestamp: at,
            timezone: "UTC".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let agg = Aggregator::new(Arc::new(MemoryCatalog::new()), IngestConfig::default());
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap();

        let stats = agg.dashboard(now).await.unwrap();
        assert_eq!(stats.stats.total_files, 0);
        assert_eq!(stats.stats.total_storage, 0);
        assert_eq!(stats.stats.total_storage_formatted, "0.00 MB");
        assert!(stats.recent_activity.is_empty());
        assert_eq!(stats.uploads_by_day.len(), 7);
        assert!(stats.uploads_by_day.iter().all(|d| d.uploads == 0));
        assert_eq!(stats.uploads_by_day[6].date, "2024-03-14");
        assert_eq!(stats.uploads_by_day[6].day, "Thu");
        assert_eq!(stats.uploads_by_day[0].date, "2024-03-08");
    }

    #[tokio::test]
    async fn test_totals_and_histogram() {
        let catalog = Arc::new(MemoryCatalog::new());
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 18, 0, 0).unwrap();

        catalog.insert_file(&record("a", now - Duration::hours(1), MIB)).await.unwrap();
        catalog.insert_file(&record("b", now - Duration::days(1), MIB / 2)).await.unwrap();
        catalog.insert_file(&record("c", now - Duration::days(1), MIB / 2)).await.unwrap();
        // Outside the window
        catalog.insert_file(&record("d", now - Duration::days(10), MIB)).await.unwrap();
        catalog.append_anomaly(&anomaly("big.bin", now)).await.unwrap();

        let agg = Aggregator::new(catalog, IngestConfig::default());
        let stats = agg.dashboard(now).await.unwrap();

        assert_eq!(stats.stats.total_files, 4);
        assert_eq!(stats.stats.anomalies_detected, 1);
        assert_eq!(stats.stats.duplicates_detected, 0);
        assert_eq!(stats.stats.total_storage, 3 * MIB);
        assert_eq!(stats.stats.total_storage_formatted, "3.00 MB");

        let counts: Vec<u64> = stats.uploads_by_day.iter().map(|d| d.uploads).collect();
        assert_eq!(counts, vec![0, 0, 0, 0, 0, 2, 1]);
    }

    #[tokio::test]
    async fn test_day_boundaries_follow_local_zone() {
        let catalog = Arc::new(MemoryCatalog::new());
        let ist = parse_timezone("Asia/Kolkata").unwrap();

        // 2024-03-14 00:10 local is still the 13th in UTC
        let just_after_midnight = Utc.with_ymd_and_hms(2024, 3, 13, 18, 40, 0).unwrap();
        // 2024-03-13 23:50 local
        let just_before_midnight = Utc.with_ymd_and_hms(2024, 3, 13, 18, 20, 0).unwrap();
        catalog.insert_file(&record("late", just_before_midnight, 1)).await.unwrap();
        catalog.insert_file(&record("early", just_after_midnight, 1)).await.unwrap();

        let agg = Aggregator::new(catalog, IngestConfig::new(ist));
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 6, 0, 0).unwrap();
        let days = agg.uploads_by_day(now).await.unwrap();

        assert_eq!(days[6].date, "2024-03-14");
        assert_eq!(days[6].uploads, 1);
        assert_eq!(days[5].uploads, 1);
    }

    #[tokio::test]
    async fn test_daylight_saving_days() {
        let catalog = Arc::new(MemoryCatalog::new());
        let new_york = parse_timezone("America/New_York").unwrap();

        // 2024-03-10 is 23 hours long in New York (clocks jump 02:00 -> 03:00)
        // 23:30 EDT on the 10th
        catalog.insert_file(&record("late", Utc.with_ymd_and_hms(2024, 3, 11, 3, 30, 0).unwrap(), 1)).await.unwrap();
        // 00:30 EDT on the 11th
        catalog.insert_file(&record("early", Utc.with_ymd_and_hms(2024, 3, 11, 4, 30, 0).unwrap(), 1)).await.unwrap();
        // 23:30 EST on the 9th
        catalog.insert_file(&record("before", Utc.with_ymd_and_hms(2024, 3, 10, 4, 30, 0).unwrap(), 1)).await.unwrap();

        let agg = Aggregator::new(catalog, IngestConfig::new(new_york));
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 16, 0, 0).unwrap();
        let days = agg.uploads_by_day(now).await.unwrap();

        assert_eq!(days[6].date, "2024-03-11");
        assert_eq!(days[6].uploads, 1);
        assert_eq!(days[5].date, "2024-03-10");
        assert_eq!(days[5].uploads, 1);
        assert_eq!(days[4].uploads, 1);

        let (start, end) = agg.day_bounds(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap());
        assert_eq!(end + Duration::microseconds(1) - start, Duration::hours(23));
    }

    #[test]
    fn test_skipped_midnight_starts_at_first_local_time() {
        // Chile jumps 00:00 -> 01:00 on 2024-09-08, so that day has no midnight
        let santiago = parse_timezone("America/Santiago").unwrap();
        let agg = Aggregator::new(Arc::new(MemoryCatalog::new()), IngestConfig::new(santiago));

        let (start, _) = agg.day_bounds(NaiveDate::from_ymd_opt(2024, 9, 8).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());

        let (_, previous_end) = agg.day_bounds(NaiveDate::from_ymd_opt(2024, 9, 7).unwrap());
        assert_eq!(previous_end + Duration::microseconds(1), start);
    }

    #[test]
    fn test_formatted_time_uses_zone_abbreviation() {
        let new_york = parse_timezone("America/New_York").unwrap();
        let agg = Aggregator::new(Arc::new(MemoryCatalog::new()), IngestConfig::new(new_york));
        let summer = Utc.with_ymd_and_hms(2024, 7, 10, 9, 30, 0).unwrap();

        let now = agg.current_time(summer);
        assert_eq!(now.formatted, "2024-07-10 05:30:00 AM EDT");
        assert_eq!(now.timezone, "America/New_York");
    }

    #[tokio::test]
    async fn test_recent_activity_merge() {
        let catalog = Arc::new(MemoryCatalog::new());
        let base = Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap();

        for i in 0..8 {
            let at = base + Duration::minutes(i * 10);
            catalog.insert_file(&record(&format!("f{}", i), at, 1)).await.unwrap();
        }
        for i in 0..8 {
            let at = base + Duration::minutes(i * 10 + 5);
            catalog.append_anomaly(&anomaly(&format!("x{}", i), at)).await.unwrap();
        }

        let agg = Aggregator::new(catalog, IngestConfig::default());
        let activity = agg.recent_activity().await.unwrap();

        assert_eq!(activity.len(), 10);
        assert_eq!(activity[0].kind, ActivityKind::Anomaly);
        assert_eq!(activity[0].message, "Anomaly detected in file 'x7'");
        assert_eq!(activity[1].message, "File 'f7' was uploaded");
        assert!(activity.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(activity[1].timestamp_formatted, "2024-03-14 01:10:00 AM UTC");
    }

    #[test]
    fn test_serialized_field_names() {
        let agg = Aggregator::new(Arc::new(MemoryCatalog::new()), IngestConfig::default());
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 15, 4, 5).unwrap();
        let json = serde_json::to_value(agg.current_time(now)).unwrap();
        assert_eq!(json["formatted"], "2024-03-14 03:04:05 PM UTC");
        assert_eq!(json["timezone"], "UTC");

        let activity = Activity {
            kind: ActivityKind::Upload,
            message: "m".to_string(),
            timestamp: now,
            timestamp_formatted: String::new(),
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "upload");
        assert!(json.get("timestampFormatted").is_some());
    }
}
