//! Record source and session cache
//!
//! Loads the engagement table once and keeps it for the session. A cached
//! dataset is reused while the file's identity (path, modification time,
//! size) is unchanged; a modified file is re-read, and entries can be dropped
//! explicitly with [`DatasetCache::invalidate`] or [`DatasetCache::clear`].
//!
//! A missing file is not an error: a synthetic table is generated, written
//! at the requested path, and loaded in its place.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::Dimensions;
use crate::error::ComputeError;
use crate::generator::SyntheticGenerator;
use crate::metrics::MetricDeriver;
use crate::schema::{EngagementRecord, LoadReport, ParsedTable, RecordAdapter};
use crate::types::MeasuredRecord;

/// Where a dataset's records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    /// Read from an existing file
    File,
    /// Synthesized because the file was missing
    Generated,
}

impl DataOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataOrigin::File => "file",
            DataOrigin::Generated => "generated",
        }
    }
}

/// Identity of a source file at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceId {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceId {
    /// Stat `path`. Returns `None` when the file does not exist.
    pub fn probe(path: &Path) -> Result<Option<Self>, ComputeError> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(SourceId {
                path: path.to_path_buf(),
                modified: meta.modified().ok(),
                len: meta.len(),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ComputeError::io(path, e)),
        }
    }
}

/// Options controlling a load
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Generate and persist a synthetic table when the file is missing
    pub generate_missing: bool,
    pub generator: SyntheticGenerator,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            generate_missing: true,
            generator: SyntheticGenerator::default(),
        }
    }
}

/// A loaded, measured, immutable collection
#[derive(Debug)]
pub struct Dataset {
    source: SourceId,
    origin: DataOrigin,
    records: Vec<MeasuredRecord>,
    dimensions: Dimensions,
    report: LoadReport,
}

impl Dataset {
    /// Build a dataset from records already in memory
    pub fn from_records(
        source: SourceId,
        origin: DataOrigin,
        records: Vec<EngagementRecord>,
        report: LoadReport,
    ) -> Self {
        let records = MetricDeriver::derive(records);
        let dimensions = Dimensions::from_records(records.iter().map(MeasuredRecord::record));
        Dataset {
            source,
            origin,
            records,
            dimensions,
            report,
        }
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn origin(&self) -> DataOrigin {
        self.origin
    }

    pub fn records(&self) -> &[MeasuredRecord] {
        &self.records
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}

/// Load `path` without caching
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset, ComputeError> {
    if let Some(source) = SourceId::probe(path)? {
        let file = File::open(path).map_err(|e| ComputeError::io(path, e))?;
        let ParsedTable { records, report } = RecordAdapter::parse_csv(BufReader::new(file))?;

        if !report.is_clean() {
            warn!(
                path = %path.display(),
                rejected = report.rejected_rows(),
                total = report.total_rows,
                "skipped malformed rows"
            );
        }
        info!(path = %path.display(), records = records.len(), "loaded engagement data");
        return Ok(Dataset::from_records(source, DataOrigin::File, records, report));
    }

    if !options.generate_missing {
        return Err(ComputeError::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "data file not found"),
        ));
    }

    warn!(path = %path.display(), "data file not found, generating synthetic data");
    let records = options.generator.generate();
    write_records(path, &records)?;
    info!(
        path = %path.display(),
        records = records.len(),
        "generated synthetic engagement data"
    );

    let source = SourceId::probe(path)?.ok_or_else(|| {
        ComputeError::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "generated file vanished"),
        )
    })?;
    let report = LoadReport::clean(records.len());
    Ok(Dataset::from_records(
        source,
        DataOrigin::Generated,
        records,
        report,
    ))
}

/// Write records as CSV, creating parent directories as needed
pub fn write_records(path: &Path, records: &[EngagementRecord]) -> Result<(), ComputeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ComputeError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| ComputeError::io(path, e))?;
    RecordAdapter::write_csv(records, BufWriter::new(file))
}

/// Read-through cache of loaded datasets keyed by path
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache
    pub fn global() -> &'static DatasetCache {
        static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();
        GLOBAL.get_or_init(DatasetCache::new)
    }

    /// Return the cached dataset for `path`, loading it if absent or stale
    pub fn load(&self, path: &Path, options: &LoadOptions) -> Result<Arc<Dataset>, ComputeError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = entries.get(path) {
            match SourceId::probe(path)? {
                Some(current) if current == cached.source => {
                    debug!(path = %path.display(), "engagement data cache hit");
                    return Ok(Arc::clone(cached));
                }
                _ => debug!(path = %path.display(), "source changed, reloading"),
            }
        }

        let dataset = Arc::new(load_dataset(path, options)?);
        entries.insert(path.to_path_buf(), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    const SAMPLE: &str = "\
timestamp,platform,region,content_theme,views,likes,shares,comments
2024-01-15 09:10:00,Instagram,France,Environment,30000,3600,600,900
2024-01-15 18:45:00,TikTok,US,Sports,52000,7800,2080,1040
bad,TikTok,US,Sports,1,1,1,1
";

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("brut-engagement-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn small_generator() -> LoadOptions {
        LoadOptions {
            generate_missing: true,
            generator: SyntheticGenerator::new().with_records(50).with_anchor(
                NaiveDate::from_ymd_opt(2024, 6, 30)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
        }
    }

    #[test]
    fn test_load_existing_file() {
        let dir = scratch_dir();
        let path = dir.join("data.csv");
        fs::write(&path, SAMPLE).unwrap();

        let dataset = load_dataset(&path, &LoadOptions::default()).unwrap();
        assert_eq!(dataset.origin(), DataOrigin::File);
        assert_eq!(dataset.records().len(), 2);
        assert_eq!(dataset.report().rejected_rows(), 1);
        assert_eq!(dataset.dimensions().platforms, vec!["Instagram", "TikTok"]);
        // 3600 + 900 + 600 over 30000 views
        assert_eq!(dataset.records()[0].engagement_rate(), 17.0);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_generated_and_persisted() {
        let dir = scratch_dir();
        let path = dir.join("nested").join("data.csv");

        let dataset = load_dataset(&path, &small_generator()).unwrap();
        assert_eq!(dataset.origin(), DataOrigin::Generated);
        assert_eq!(dataset.records().len(), 50);
        assert!(path.exists());

        let reread = load_dataset(&path, &LoadOptions::default()).unwrap();
        assert_eq!(reread.origin(), DataOrigin::File);
        assert_eq!(reread.records(), dataset.records());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_file_without_generation_is_error() {
        let dir = scratch_dir();
        let options = LoadOptions {
            generate_missing: false,
            ..LoadOptions::default()
        };

        let err = load_dataset(&dir.join("absent.csv"), &options).unwrap_err();
        assert!(matches!(err, ComputeError::Io { .. }));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_cache_reuses_until_source_changes() {
        let dir = scratch_dir();
        let path = dir.join("data.csv");
        fs::write(&path, SAMPLE).unwrap();
        let cache = DatasetCache::new();
        let options = LoadOptions::default();

        let first = cache.load(&path, &options).unwrap();
        let second = cache.load(&path, &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        // Appending a row changes the size, so the identity changes
        let mut grown = SAMPLE.to_string();
        grown.push_str("2024-01-16 10:00:00,YouTube,India,Health,25000,2000,250,1000\n");
        fs::write(&path, grown).unwrap();

        let third = cache.load(&path, &options).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.records().len(), 3);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_cache_reloads_when_only_mtime_changes() {
        let dir = scratch_dir();
        let path = dir.join("data.csv");
        fs::write(&path, SAMPLE).unwrap();
        let cache = DatasetCache::new();
        let options = LoadOptions::default();

        let first = cache.load(&path, &options).unwrap();

        // Same length, different content and a later modification time
        let edited = SAMPLE.replace("30000,3600", "30000,3700");
        assert_eq!(edited.len(), SAMPLE.len());
        fs::write(&path, edited).unwrap();
        let later = first.source().modified.unwrap() + std::time::Duration::from_secs(60);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let second = cache.load(&path, &options).unwrap();
        assert_eq!(second.source().len, first.source().len);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.records()[0].record().likes, 3700);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_cache_invalidate_forces_reload() {
        let dir = scratch_dir();
        let path = dir.join("data.csv");
        fs::write(&path, SAMPLE).unwrap();
        let cache = DatasetCache::new();
        let options = LoadOptions::default();

        let first = cache.load(&path, &options).unwrap();
        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));
        assert!(cache.is_empty());

        let second = cache.load(&path, &options).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.records(), second.records());

        cache.clear();
        assert!(cache.is_empty());
        fs::remove_dir_all(dir).unwrap();
    }
}
