//! Per-world region manager.

use regionguard_flags::{Flag, FlagContext, FlagRegistry, FlagValue, Location, RegionGroup};
use regionguard_geometry::Shape;
use regionguard_index::{ConcurrentRegionIndex, QueryMode, RegionIndex, RegionSnapshot, RemovalStrategy};
use regionguard_query::{ApplicableRegionSet, RegionOverlapAssociation};
use regionguard_region::{Actor, ProtectedRegion};
use regionguard_storage::{MigrationReport, ProfileResolver, RegionDriver, StorageError, UuidMigration};
use regionguard_types::{BlockVector3, RegionId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// The regions of one world, with their store.
///
/// Queries and mutations never touch the store. [`RegionManager::load`],
/// [`RegionManager::save`] and [`RegionManager::save_changes`] block on it
/// and are called by the host outside the query path;
/// [`RegionManager::reload`] does the same from async code.
pub struct RegionManager {
    world: String,
    index: ConcurrentRegionIndex,
    driver: Arc<dyn RegionDriver>,
    flags: Arc<FlagRegistry>,
    config: Arc<EngineConfig>,
}

impl RegionManager {
    /// Creates an empty manager. Call [`RegionManager::load`] to read the store.
    #[must_use]
    pub fn new(
        world: impl Into<String>,
        driver: Arc<dyn RegionDriver>,
        flags: Arc<FlagRegistry>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            world: world.into(),
            index: ConcurrentRegionIndex::new(config.regions.max_chunk_span),
            driver,
            flags,
            config,
        }
    }

    #[must_use]
    pub fn world(&self) -> &str {
        &self.world
    }

    /// The underlying index, for operations without a manager shortcut.
    #[must_use]
    pub const fn index(&self) -> &ConcurrentRegionIndex {
        &self.index
    }

    #[must_use]
    pub fn flags(&self) -> &Arc<FlagRegistry> {
        &self.flags
    }

    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<Arc<ProtectedRegion>> {
        self.index.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // ── Queries ────────────────────────────────────────────────────

    fn query_mode(&self) -> QueryMode {
        if self.config.regions.prefer_cached_queries {
            QueryMode::PreferCached
        } else {
            QueryMode::Full
        }
    }

    fn result_set(snapshot: Arc<RegionSnapshot>, regions: Vec<Arc<ProtectedRegion>>) -> ApplicableRegionSet {
        let global = snapshot.get(&RegionId::global()).cloned();
        ApplicableRegionSet::new(regions, global, snapshot)
    }

    /// Regions containing `point`, plus the world's global region if it has one.
    #[must_use]
    pub fn applicable_regions(&self, point: BlockVector3) -> ApplicableRegionSet {
        let snapshot = self.index.snapshot();
        let regions = snapshot.query_contains(point, self.query_mode());
        Self::result_set(snapshot, regions)
    }

    /// Regions overlapping `shape`, plus the world's global region if it has one.
    #[must_use]
    pub fn applicable_regions_for(&self, shape: &Shape) -> ApplicableRegionSet {
        let snapshot = self.index.snapshot();
        let regions = snapshot.query_overlapping(shape, QueryMode::Full);
        Self::result_set(snapshot, regions)
    }

    /// Association for an action that originates at `source`, such as fire
    /// spreading or a piston pushing: the source owns the regions it is in.
    #[must_use]
    pub fn source_association(&self, source: BlockVector3) -> RegionOverlapAssociation {
        let regions: Vec<_> = self
            .index
            .snapshot()
            .query_contains(source, QueryMode::Full)
            .into_iter()
            .filter(|r| !r.is_global())
            .collect();
        RegionOverlapAssociation::new(regions, self.config.regions.use_max_priority_association)
    }

    /// Number of regions `actor` directly owns.
    #[must_use]
    pub fn region_count_of_player(&self, actor: &dyn Actor) -> usize {
        self.index.snapshot().region_count_of_player(actor)
    }

    /// True if `shape` overlaps a physical region `actor` does not own.
    #[must_use]
    pub fn overlaps_unowned_region(&self, shape: &Shape, actor: &dyn Actor) -> bool {
        self.index.snapshot().overlaps_unowned_region(shape, actor)
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Adds or replaces a region.
    pub fn add(&self, region: ProtectedRegion) -> EngineResult<()> {
        self.index.add(region)?;
        Ok(())
    }

    /// Removes a region, returning everything that was removed.
    pub fn remove(&self, id: &RegionId, strategy: RemovalStrategy) -> Vec<Arc<ProtectedRegion>> {
        self.index.remove(id, strategy)
    }

    pub fn set_parent(&self, id: &RegionId, parent: Option<RegionId>) -> EngineResult<()> {
        self.index.set_parent(id, parent)?;
        Ok(())
    }

    pub fn set_priority(&self, id: &RegionId, priority: i32) -> EngineResult<()> {
        self.index.set_priority(id, priority)?;
        Ok(())
    }

    pub fn set_flag(&self, id: &RegionId, flag: &Flag, value: Option<FlagValue>) -> EngineResult<()> {
        self.index.set_flag(id, flag, value)?;
        Ok(())
    }

    fn flag(&self, name: &str) -> EngineResult<Arc<Flag>> {
        self.flags
            .get(name)
            .ok_or_else(|| EngineError::UnknownFlag(name.to_string()))
    }

    /// Parses `input` for the flag named `flag` and stores the result.
    ///
    /// Input that parses to "unset" (such as `none` for a state flag) clears
    /// the flag. Returns the stored value. Nothing changes if parsing fails.
    pub fn set_flag_from_input(
        &self,
        id: &RegionId,
        flag: &str,
        input: &str,
        location: Option<&Location>,
    ) -> EngineResult<Option<FlagValue>> {
        let flag = self.flag(flag)?;
        let mut context = FlagContext::new(input);
        if let Some(location) = location {
            context = context.at(location);
        }
        let value = flag.parse_input(&context)?;
        self.index.set_flag(id, &flag, value.clone())?;
        debug!(world = %self.world, region = %id, flag = %flag, "flag set from input");
        Ok(value)
    }

    /// Parses `input` as a region group and stores it as the flag's
    /// `-group` sub-setting.
    pub fn set_group_from_input(&self, id: &RegionId, flag: &str, input: &str) -> EngineResult<RegionGroup> {
        let flag = self.flag(flag)?;
        let group = RegionGroup::parse(input)?;
        self.index.set_group(id, &flag, Some(group))?;
        Ok(group)
    }

    /// Adds `region` on behalf of `actor`, who becomes its owner.
    ///
    /// Refused if the id is already taken, if the actor already owns the
    /// configured maximum number of regions, or if the region overlaps one
    /// the actor does not own. The checks and the insert are one index
    /// mutation, so concurrent claims cannot both pass.
    pub fn claim(&self, mut region: ProtectedRegion, actor: &dyn Actor) -> EngineResult<()> {
        let limit = self.config.regions.max_regions_per_player;
        let id = region.id().clone();
        region.owners_mut().add_player(actor.unique_id());

        self.index.add_checked(region, |snapshot, region| {
            if snapshot.contains(region.id()) {
                return Err(EngineError::RegionExists(region.id().clone()));
            }
            if limit > 0 && snapshot.region_count_of_player(actor) >= limit {
                return Err(EngineError::RegionLimit { limit });
            }
            if snapshot.overlaps_unowned_region(region.shape(), actor) {
                return Err(EngineError::OverlapsUnownedRegion(region.id().clone()));
            }
            Ok(())
        })?;
        info!(world = %self.world, region = %id, player = %actor.name(), "region claimed");
        Ok(())
    }

    // ── Persistence ────────────────────────────────────────────────

    fn publish(&self, regions: Vec<ProtectedRegion>) -> usize {
        let repaired = self.index.replace_all(regions);
        if repaired > 0 {
            warn!(world = %self.world, repaired, "repaired parent links while loading regions");
        }
        let count = self.index.len();
        info!(world = %self.world, regions = count, "regions loaded");
        count
    }

    /// Replaces the in-memory regions with the store's. Returns the number
    /// of regions loaded. On error the current regions stay in place.
    pub fn load(&self) -> EngineResult<usize> {
        let regions = self.driver.load_all()?;
        Ok(self.publish(regions))
    }

    /// Like [`RegionManager::load`], reading the store on the blocking pool.
    /// Queries keep seeing the old regions until the new set is swapped in.
    pub async fn reload(&self) -> EngineResult<usize> {
        let driver = Arc::clone(&self.driver);
        let regions = tokio::task::spawn_blocking(move || driver.load_all())
            .await
            .map_err(|e| EngineError::Task(e.to_string()))??;
        Ok(self.publish(regions))
    }

    /// Writes every region. Pending changes are restored if the write fails.
    pub fn save(&self) -> EngineResult<()> {
        let pending = self.index.take_changes();
        let snapshot = self.index.snapshot();
        if let Err(e) = self.driver.save_all(&snapshot.sorted()) {
            warn!(world = %self.world, store = %self.driver.describe(), "saving regions failed: {}", e);
            self.index.requeue_changes(&pending);
            return Err(e.into());
        }
        debug!(world = %self.world, regions = snapshot.len(), "regions saved");
        Ok(())
    }

    /// Writes the regions changed since the last save. Returns false if
    /// there was nothing to write. Failed changes are kept for the next try.
    pub fn save_changes(&self) -> EngineResult<bool> {
        let changes = self.index.take_changes();
        if changes.is_empty() {
            return Ok(false);
        }
        let snapshot = self.index.snapshot();
        if let Err(e) = self.driver.save_changes(&changes, &snapshot) {
            warn!(world = %self.world, store = %self.driver.describe(), "saving region changes failed, will retry: {}", e);
            self.index.requeue_changes(&changes);
            return Err(e.into());
        }
        debug!(
            world = %self.world,
            changed = changes.changed.len(),
            removed = changes.removed.len(),
            "region changes saved"
        );
        Ok(true)
    }

    /// Rewrites name-based owners and members to unique ids.
    ///
    /// Names are resolved on the blocking pool. Each region is then
    /// rewritten inside its own index update, against the owners and members
    /// it holds at that moment, so edits made while the lookup ran are kept.
    /// The result is saved with the next save.
    pub async fn migrate_names(&self, resolver: Arc<dyn ProfileResolver>) -> EngineResult<MigrationReport> {
        let regions = self.index.snapshot().sorted();
        let keep = self.config.storage.keep_unresolved_names;

        let (migration, mut report) = tokio::task::spawn_blocking(move || {
            let mut migration = UuidMigration::new(resolver).keep_unresolved_names(keep);
            let report = migration.resolve_names(regions.iter().map(|r| &**r))?;
            Ok::<_, StorageError>((migration, report))
        })
        .await
        .map_err(|e| EngineError::Task(e.to_string()))??;

        if report.names == 0 {
            return Ok(report);
        }
        for region in self.index.snapshot().sorted() {
            if !migration.rewrites(&region) {
                migration.note_unresolved(&region, &mut report);
                continue;
            }
            let result = self
                .index
                .update(region.id(), |current| migration.apply(current, &mut report));
            if let Err(e) = result {
                debug!(world = %self.world, region = %region.id(), "skipping migrated region: {}", e);
            }
        }
        migration.finish(&report);
        Ok(report)
    }
}

impl std::fmt::Debug for RegionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionManager")
            .field("world", &self.world)
            .field("regions", &self.index.len())
            .field("store", &self.driver.describe())
            .finish()
    }
}
