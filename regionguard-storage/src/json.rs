//! One JSON document per world.

use regionguard_flags::FlagRegistry;
use regionguard_region::{DomainRegistry, ProtectedRegion};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::driver::RegionDriver;
use crate::error::{StorageError, StorageResult};
use crate::record::{link_parents, RegionRecord, RegionRecordV1};

/// Version written by [`JsonRegionDriver`].
pub const FORMAT_VERSION: u64 = 2;

#[derive(Serialize)]
struct Document<'a> {
    version: u64,
    regions: &'a [RegionRecord],
}

/// Stores a world's regions as `{"version": 2, "regions": [...]}`.
///
/// Documents without a version, or with version 1, are read through the
/// version 1 adapter and written back as version 2 on the next save.
pub struct JsonRegionDriver {
    path: PathBuf,
    flags: Arc<FlagRegistry>,
    domains: Arc<DomainRegistry>,
}

impl JsonRegionDriver {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, flags: Arc<FlagRegistry>, domains: Arc<DomainRegistry>) -> Self {
        Self {
            path: path.into(),
            flags,
            domains,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self, document: Value) -> StorageResult<Vec<RegionRecord>> {
        let version = document.get("version").and_then(Value::as_u64).unwrap_or(1);
        if version == 0 || version > FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion(version));
        }
        let Some(entries) = document.get("regions").and_then(Value::as_array) else {
            return Err(StorageError::InvalidData("document has no region list".to_string()));
        };

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = if version == 1 {
                serde_json::from_value::<RegionRecordV1>(entry.clone())
                    .map_err(StorageError::from)
                    .and_then(RegionRecordV1::upgrade)
            } else {
                serde_json::from_value::<RegionRecord>(entry.clone()).map_err(StorageError::from)
            };
            match record {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %self.path.display(), "skipping unreadable region record: {}", e),
            }
        }

        if version < FORMAT_VERSION {
            info!(path = %self.path.display(), version, "read region document through the version {} adapter", version);
        }
        Ok(records)
    }
}

impl RegionDriver for JsonRegionDriver {
    fn load_all(&self) -> StorageResult<Vec<ProtectedRegion>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no region document yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let document: Value = serde_json::from_slice(&bytes)?;

        let mut loaded = Vec::new();
        for record in self.read_records(document)? {
            let id = record.id.clone();
            match record.into_region(&self.flags, &self.domains) {
                Ok(entry) => loaded.push(entry),
                Err(e) => warn!(region = %id, "skipping region: {}", e),
            }
        }

        let regions = link_parents(loaded);
        debug!(path = %self.path.display(), regions = regions.len(), "loaded regions");
        Ok(regions)
    }

    fn save_all(&self, regions: &[Arc<ProtectedRegion>]) -> StorageResult<()> {
        let records = regions
            .iter()
            .map(|r| RegionRecord::from_region(r))
            .collect::<StorageResult<Vec<_>>>()?;
        let document = Document {
            version: FORMAT_VERSION,
            regions: &records,
        };
        write_atomic(&self.path, &document)?;
        debug!(path = %self.path.display(), regions = records.len(), "saved regions");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

impl std::fmt::Debug for JsonRegionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRegionDriver").field("path", &self.path).finish()
    }
}

/// Writes `<path>.tmp`, syncs it, then renames it over `path`, so a crash
/// mid-write leaves the previous document intact.
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| io::Error::other(e.to_string()))?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
