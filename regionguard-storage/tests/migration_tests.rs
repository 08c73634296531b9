use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use regionguard_flags::FlagRegistry;
use regionguard_geometry::Shape;
use regionguard_region::{DomainRegistry, ProtectedRegion};
use regionguard_storage::{
    JsonRegionDriver, MemoryRegionDriver, ProfileResolver, RegionDriver, StorageError, StorageResult,
    UnresolvedIdentity, UuidMigration, RESOLVE_BATCH_SIZE,
};
use regionguard_types::{BlockVector3, PlayerId, RegionId};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// Resolves from a fixed table and records every batch it is asked for.
#[derive(Default)]
struct TableResolver {
    known: HashMap<String, PlayerId>,
    batches: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl TableResolver {
    fn with(names: &[&str]) -> Self {
        Self {
            known: names.iter().map(|n| (n.to_string(), PlayerId::new())).collect(),
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn id_of(&self, name: &str) -> PlayerId {
        self.known[name]
    }

    fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }
}

impl ProfileResolver for TableResolver {
    fn resolve(&self, names: &[String]) -> StorageResult<HashMap<String, PlayerId>> {
        self.batches.lock().push(names.to_vec());
        if self.fail {
            return Err(StorageError::Migration("profile service unavailable".to_string()));
        }
        Ok(names
            .iter()
            .filter_map(|n| self.known.get(n).map(|id| (n.clone(), *id)))
            .collect())
    }
}

fn id(s: &str) -> RegionId {
    RegionId::new(s).unwrap()
}

fn region(name: &str, owners: &[&str], members: &[&str]) -> ProtectedRegion {
    let mut region = ProtectedRegion::new(id(name), Shape::cuboid(BlockVector3::ZERO, BlockVector3::new(4, 4, 4)));
    for owner in owners {
        region.owners_mut().add_name(owner);
    }
    for member in members {
        region.members_mut().add_name(member);
    }
    region
}

// ============================================================================
// In-place migration
// ============================================================================

#[test]
fn resolved_names_become_ids() {
    let resolver = Arc::new(TableResolver::with(&["alice", "bob"]));
    let mut regions = vec![region("farm", &["alice"], &["bob"]), region("mine", &[], &["alice"])];

    let report = UuidMigration::new(resolver.clone()).migrate(&mut regions).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.names, 2);
    assert_eq!(report.resolved, 2);
    assert_eq!(report.regions_changed, 2);

    let farm = &regions[0];
    assert!(farm.owners().players().names().is_empty());
    assert!(farm.owners().contains_id(&resolver.id_of("alice")));
    assert!(farm.members().contains_id(&resolver.id_of("bob")));
    assert!(regions[1].members().contains_id(&resolver.id_of("alice")));
}

#[test]
fn unresolved_names_are_kept_by_default() {
    let resolver = Arc::new(TableResolver::with(&["alice"]));
    let mut regions = vec![region("farm", &["alice", "ghost"], &[]), region("mill", &[], &["ghost"])];

    let report = UuidMigration::new(resolver).migrate(&mut regions).unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.resolved, 1);
    assert_eq!(
        report.unresolved,
        vec![UnresolvedIdentity {
            name: "ghost".to_string(),
            regions: vec![id("farm"), id("mill")],
        }]
    );
    assert!(regions[0].owners().players().contains_name("ghost"));
    assert!(regions[1].members().players().contains_name("ghost"));
    assert_eq!(report.regions_changed, 1);
}

#[test]
fn unresolved_names_can_be_dropped() {
    let resolver = Arc::new(TableResolver::with(&[]));
    let mut regions = vec![region("farm", &["ghost"], &[]), region("empty", &[], &[])];

    let report = UuidMigration::new(resolver)
        .keep_unresolved_names(false)
        .migrate(&mut regions)
        .unwrap();

    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.regions_changed, 1);
    assert!(regions[0].owners().is_empty());
}

#[test]
fn unresolved_identity_names_the_player() {
    let err = UnresolvedIdentity {
        name: "ghost".to_string(),
        regions: vec![id("farm")],
    };
    assert_eq!(err.to_string(), "no unique id found for player 'ghost'");
}

#[test]
fn regions_without_names_are_untouched() {
    let resolver = Arc::new(TableResolver::with(&["alice"]));
    let mut plain = region("plain", &[], &[]);
    plain.owners_mut().add_player(PlayerId::new());
    let mut regions = vec![plain.clone()];

    let report = UuidMigration::new(resolver.clone()).migrate(&mut regions).unwrap();

    assert_eq!(report.names, 0);
    assert_eq!(report.regions_changed, 0);
    assert_eq!(regions[0], plain);
    assert!(resolver.batches().is_empty());
}

#[test]
fn apply_rewrites_the_region_as_it_is_now() {
    let resolver = Arc::new(TableResolver::with(&["alice", "bob"]));
    let mut farm = region("farm", &["alice", "bob"], &["ghost"]);
    let mut migration = UuidMigration::new(resolver.clone());

    let mut report = migration.resolve_names([&farm]).unwrap();
    assert_eq!(report.names, 3);
    assert_eq!(report.resolved, 2);

    farm.owners_mut().remove_name("bob");
    farm.members_mut().remove_name("ghost");
    assert!(migration.rewrites(&farm));
    assert!(migration.apply(&mut farm, &mut report));
    migration.finish(&report);

    assert!(farm.owners().contains_id(&resolver.id_of("alice")));
    assert!(!farm.owners().contains_id(&resolver.id_of("bob")));
    assert!(farm.owners().players().names().is_empty());
    assert!(report.unresolved.is_empty());
    assert_eq!(report.regions_changed, 1);

    let plain = region("plain", &[], &[]);
    assert!(!migration.rewrites(&plain));
}

// ============================================================================
// Batching and caching
// ============================================================================

#[test]
fn names_are_resolved_in_batches() {
    let names: Vec<String> = (0..RESOLVE_BATCH_SIZE * 2 + 5).map(|i| format!("player{i:04}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let resolver = Arc::new(TableResolver::with(&refs));
    let mut regions = vec![region("crowded", &[], &refs)];

    let report = UuidMigration::new(resolver.clone()).migrate(&mut regions).unwrap();

    let sizes: Vec<usize> = resolver.batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![RESOLVE_BATCH_SIZE, RESOLVE_BATCH_SIZE, 5]);
    assert_eq!(report.resolved, names.len());
    assert_eq!(regions[0].members().players().ids().len(), names.len());
}

#[test]
fn resolved_names_are_cached_across_runs() {
    let resolver = Arc::new(TableResolver::with(&["alice", "bob"]));
    let mut migration = UuidMigration::new(resolver.clone());

    let mut first = vec![region("farm", &["alice"], &[])];
    migration.migrate(&mut first).unwrap();
    let mut second = vec![region("mine", &["alice"], &["bob"])];
    migration.migrate(&mut second).unwrap();

    assert_eq!(
        resolver.batches(),
        vec![vec!["alice".to_string()], vec!["bob".to_string()]]
    );
    assert!(second[0].owners().contains_id(&resolver.id_of("alice")));
}

#[test]
fn resolver_failure_aborts_without_changes() {
    let resolver = Arc::new(TableResolver::failing());
    let original = vec![region("farm", &["alice"], &[])];
    let mut regions = original.clone();

    let result = UuidMigration::new(resolver).migrate(&mut regions);

    assert!(matches!(result, Err(StorageError::Migration(_))));
    assert_eq!(regions, original);
}

// ============================================================================
// Driver migration
// ============================================================================

#[test]
fn driver_migration_saves_once() {
    let resolver = Arc::new(TableResolver::with(&["alice"]));
    let driver = MemoryRegionDriver::with_regions([region("farm", &["alice"], &[])]);

    let report = UuidMigration::new(resolver.clone()).migrate_driver(&driver).unwrap();

    assert_eq!(report.regions_changed, 1);
    assert_eq!(driver.save_count(), 1);
    let stored = driver.load_all().unwrap();
    assert!(stored[0].owners().contains_id(&resolver.id_of("alice")));
}

#[test]
fn driver_migration_skips_save_when_nothing_changed() {
    let resolver = Arc::new(TableResolver::with(&[]));
    let driver = MemoryRegionDriver::with_regions([region("farm", &["ghost"], &[])]);

    let report = UuidMigration::new(resolver).migrate_driver(&driver).unwrap();

    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(driver.save_count(), 0);
}

#[test]
fn driver_migration_does_not_save_after_resolver_failure() {
    let driver = MemoryRegionDriver::with_regions([region("farm", &["alice"], &[])]);
    let result = UuidMigration::new(Arc::new(TableResolver::failing())).migrate_driver(&driver);

    assert!(result.is_err());
    assert_eq!(driver.save_count(), 0);
}

#[test]
fn json_store_is_rewritten_with_ids() {
    let dir = TempDir::new().unwrap();
    let flags = FlagRegistry::with_builtins();
    flags.lock();
    let driver = JsonRegionDriver::new(
        dir.path().join("regions.json"),
        Arc::new(flags),
        Arc::new(DomainRegistry::new()),
    );
    driver
        .save_all(&[Arc::new(region("farm", &["alice"], &["bob"]))])
        .unwrap();

    let resolver = Arc::new(TableResolver::with(&["alice", "bob"]));
    UuidMigration::new(resolver.clone()).migrate_driver(&driver).unwrap();

    let reloaded = driver.load_all().unwrap();
    assert!(reloaded[0].owners().players().names().is_empty());
    assert!(reloaded[0].owners().contains_id(&resolver.id_of("alice")));
    assert!(reloaded[0].members().contains_id(&resolver.id_of("bob")));
}
