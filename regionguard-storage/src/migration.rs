//! Name → unique id migration of region owners and members.
//!
//! Older stores identify players by name. Names change; ids do not. The
//! migration collects every stored name, resolves them in batches through a
//! [`ProfileResolver`], and rewrites each domain. Names that cannot be
//! resolved are reported as [`UnresolvedIdentity`] and either kept as names
//! or dropped, while every other entry is still migrated.

use regionguard_region::{DefaultDomain, ProtectedRegion};
use regionguard_types::{PlayerId, RegionId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::driver::RegionDriver;
use crate::error::StorageResult;

/// Names handed to the resolver per call.
pub const RESOLVE_BATCH_SIZE: usize = 100;

/// Maps player names to unique ids, typically through a remote profile
/// service.
pub trait ProfileResolver: Send + Sync {
    /// Resolves a batch of lowercase names. Names without a profile are
    /// simply absent from the result; an `Err` aborts the migration.
    fn resolve(&self, names: &[String]) -> StorageResult<HashMap<String, PlayerId>>;
}

/// A stored name that no profile could be found for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no unique id found for player '{name}'")]
pub struct UnresolvedIdentity {
    pub name: String,
    /// Regions listing the name as owner or member.
    pub regions: Vec<RegionId>,
}

/// Outcome of one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Distinct names found in the regions.
    pub names: usize,
    /// Names that were mapped to an id.
    pub resolved: usize,
    pub unresolved: Vec<UnresolvedIdentity>,
    /// Regions whose owners or members were rewritten.
    pub regions_changed: usize,
}

impl MigrationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Rewrites name-based domains to id-based ones.
///
/// Resolved names are remembered, so one migration can be run over several
/// worlds without asking for the same name twice.
pub struct UuidMigration {
    resolver: Arc<dyn ProfileResolver>,
    keep_unresolved_names: bool,
    resolved: HashMap<String, PlayerId>,
}

impl UuidMigration {
    #[must_use]
    pub fn new(resolver: Arc<dyn ProfileResolver>) -> Self {
        Self {
            resolver,
            keep_unresolved_names: true,
            resolved: HashMap::new(),
        }
    }

    /// Whether names without an id stay in their domains. Defaults to true.
    #[must_use]
    pub fn keep_unresolved_names(mut self, keep: bool) -> Self {
        self.keep_unresolved_names = keep;
        self
    }

    /// Loads every region from `driver`, migrates them and saves them back
    /// if anything changed. Nothing is saved if resolution fails.
    pub fn migrate_driver(&mut self, driver: &dyn RegionDriver) -> StorageResult<MigrationReport> {
        info!(store = %driver.describe(), "migrating region owners and members from names to ids");
        let mut regions = driver.load_all()?;
        let report = self.migrate(&mut regions)?;
        if report.regions_changed > 0 {
            let regions: Vec<Arc<ProtectedRegion>> = regions.into_iter().map(Arc::new).collect();
            driver.save_all(&regions)?;
        }
        Ok(report)
    }

    /// Migrates `regions` in place.
    pub fn migrate(&mut self, regions: &mut [ProtectedRegion]) -> StorageResult<MigrationReport> {
        let mut report = self.resolve_names(regions.iter())?;
        if report.names == 0 {
            return Ok(report);
        }
        for region in regions.iter_mut() {
            self.apply(region, &mut report);
        }
        self.finish(&report);
        Ok(report)
    }

    /// Looks up every stored name in `regions` that has not been resolved
    /// yet. Returns a report with `names` and `resolved` filled in; the
    /// domains themselves are rewritten by [`UuidMigration::apply`].
    pub fn resolve_names<'a>(
        &mut self,
        regions: impl IntoIterator<Item = &'a ProtectedRegion>,
    ) -> StorageResult<MigrationReport> {
        let names: BTreeSet<String> = regions
            .into_iter()
            .flat_map(|r| r.owners().players().names().iter().chain(r.members().players().names()))
            .cloned()
            .collect();
        if names.is_empty() {
            return Ok(MigrationReport::default());
        }

        let lookup: Vec<String> = names.iter().filter(|n| !self.resolved.contains_key(*n)).cloned().collect();
        info!(names = lookup.len(), "resolving player names to unique ids");
        for batch in lookup.chunks(RESOLVE_BATCH_SIZE) {
            let found = self.resolver.resolve(batch)?;
            self.resolved
                .extend(found.into_iter().map(|(name, id)| (name.to_ascii_lowercase(), id)));
            info!(resolved = self.resolved.len(), "unique ids found so far");
        }

        Ok(MigrationReport {
            names: names.len(),
            resolved: names.iter().filter(|n| self.resolved.contains_key(*n)).count(),
            ..MigrationReport::default()
        })
    }

    /// True if [`UuidMigration::apply`] would change `region`.
    #[must_use]
    pub fn rewrites(&self, region: &ProtectedRegion) -> bool {
        let mut names = region
            .owners()
            .players()
            .names()
            .iter()
            .chain(region.members().players().names());
        names.any(|n| !self.keep_unresolved_names || self.resolved.contains_key(n))
    }

    /// Rewrites the names `region` holds right now with the ids resolved so
    /// far. Unresolved names are added to `report`. Returns true if the
    /// region changed.
    pub fn apply(&self, region: &mut ProtectedRegion, report: &mut MigrationReport) -> bool {
        self.note_unresolved(region, report);
        let owners = self.convert(region.owners_mut());
        let members = self.convert(region.members_mut());
        let changed = owners || members;
        if changed {
            report.regions_changed += 1;
        }
        changed
    }

    /// Adds the names of `region` that have no id to `report`.
    pub fn note_unresolved(&self, region: &ProtectedRegion, report: &mut MigrationReport) {
        let names = region
            .owners()
            .players()
            .names()
            .iter()
            .chain(region.members().players().names())
            .filter(|n| !self.resolved.contains_key(*n));

        for name in names {
            let at = match report.unresolved.binary_search_by(|u| u.name.as_str().cmp(name)) {
                Ok(at) => at,
                Err(at) => {
                    report.unresolved.insert(
                        at,
                        UnresolvedIdentity {
                            name: name.clone(),
                            regions: Vec::new(),
                        },
                    );
                    at
                }
            };
            let regions = &mut report.unresolved[at].regions;
            if let Err(pos) = regions.binary_search(region.id()) {
                regions.insert(pos, region.id().clone());
            }
        }
    }

    /// Logs the outcome of a run.
    pub fn finish(&self, report: &MigrationReport) {
        if !report.unresolved.is_empty() {
            if self.keep_unresolved_names {
                warn!(
                    count = report.unresolved.len(),
                    "some owner and member names have no unique id and were kept as names; \
                     anyone taking one of those names later will match them"
                );
            } else {
                warn!(count = report.unresolved.len(), "some owner and member names have no unique id and were removed");
            }
        }
        info!(
            names = report.names,
            resolved = report.resolved,
            regions = report.regions_changed,
            "name migration finished"
        );
    }

    /// Returns true if the domain changed.
    fn convert(&self, domain: &mut DefaultDomain) -> bool {
        let names: Vec<String> = domain.players().names().iter().cloned().collect();
        let mut changed = false;
        let players = domain.players_mut();

        for name in names {
            match self.resolved.get(&name) {
                Some(id) => {
                    players.remove_name(&name);
                    players.add_player(*id);
                    changed = true;
                }
                None if !self.keep_unresolved_names => {
                    players.remove_name(&name);
                    changed = true;
                }
                None => {}
            }
        }
        changed
    }
}

impl std::fmt::Debug for UuidMigration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UuidMigration")
            .field("keep_unresolved_names", &self.keep_unresolved_names)
            .field("resolved", &self.resolved.len())
            .finish()
    }
}
