//! Read-through table store with file-fingerprint invalidation.
//!
//! Each table is memoized against the source file's modification time and
//! size; an edited or replaced file is reloaded on the next read. The store
//! is passed to consumers explicitly, never held as global state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info};

use super::loader::{load_lap_times, load_pit_stops, load_results, DataError};
use super::schema::{LapTime, PitStop, RaceResult};
use crate::config::DataConfig;

/// Identity of a file's contents at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: SystemTime,
    len: u64,
}

impl Fingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok()?,
            len: meta.len(),
        })
    }
}

struct Slot<T> {
    fingerprint: Fingerprint,
    rows: Arc<Vec<T>>,
}

/// One memoized table keyed by its source path.
struct CachedTable<T> {
    path: PathBuf,
    slot: Mutex<Option<Slot<T>>>,
}

impl<T> CachedTable<T> {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached rows, reloading when the file fingerprint changed.
    fn get_or_load<F>(&self, table: &'static str, load: F) -> Result<Arc<Vec<T>>, DataError>
    where
        F: FnOnce(&Path) -> Result<Vec<T>, DataError>,
    {
        let current = Fingerprint::of(&self.path);
        // The slot is only ever replaced whole, so a poisoned lock still
        // holds a consistent value.
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let (Some(cached), Some(current)) = (slot.as_ref(), current) {
            if cached.fingerprint == current {
                debug!("{} table served from cache", table);
                return Ok(Arc::clone(&cached.rows));
            }
        }

        let rows = Arc::new(load(&self.path)?);
        let fingerprint = Fingerprint::of(&self.path).ok_or_else(|| DataError::MissingInput {
            table,
            path: self.path.display().to_string(),
        })?;

        info!("{} table loaded: {} rows", table, rows.len());
        *slot = Some(Slot {
            fingerprint,
            rows: Arc::clone(&rows),
        });

        Ok(rows)
    }
}

/// Cached access to the three input tables.
///
/// Tables load independently, so a consumer that only needs results still
/// works while the lap or pit file is absent.
pub struct TableStore {
    results: CachedTable<RaceResult>,
    lap_times: CachedTable<LapTime>,
    pit_stops: CachedTable<PitStop>,
}

impl TableStore {
    pub fn new(
        results_path: impl Into<PathBuf>,
        lap_times_path: impl Into<PathBuf>,
        pit_stops_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            results: CachedTable::new(results_path.into()),
            lap_times: CachedTable::new(lap_times_path.into()),
            pit_stops: CachedTable::new(pit_stops_path.into()),
        }
    }

    /// Build a store over the configured table paths.
    pub fn from_config(data: &DataConfig) -> Self {
        Self::new(&data.results_path, &data.lap_times_path, &data.pit_stops_path)
    }

    pub fn results(&self) -> Result<Arc<Vec<RaceResult>>, DataError> {
        self.results.get_or_load("results", load_results)
    }

    pub fn lap_times(&self) -> Result<Arc<Vec<LapTime>>, DataError> {
        self.lap_times.get_or_load("lap_times", load_lap_times)
    }

    pub fn pit_stops(&self) -> Result<Arc<Vec<PitStop>>, DataError> {
        self.pit_stops.get_or_load("pit_stops", load_pit_stops)
    }
}
