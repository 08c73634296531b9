use pretty_assertions::assert_eq;
use regionguard_flags::builtin::{self, builtin_flags};
use regionguard_flags::{FlagRegistry, FlagValue, RegionGroup, State};
use regionguard_geometry::{Polygon, Shape};
use regionguard_index::{ConcurrentRegionIndex, RegionIndex, RemovalStrategy};
use regionguard_region::{
    Actor, CustomDomain, DomainFactory, DomainRegistry, PlayerActor, ProtectedRegion, RegionResult,
};
use regionguard_storage::{
    JsonRegionDriver, MemoryRegionDriver, RegionDriver, StorageError, FORMAT_VERSION,
};
use regionguard_types::{BlockVector2, BlockVector3, PlayerId, RegionId};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn id(s: &str) -> RegionId {
    RegionId::new(s).unwrap()
}

fn registries() -> (Arc<FlagRegistry>, Arc<DomainRegistry>) {
    let flags = FlagRegistry::with_builtins();
    flags.lock();
    (Arc::new(flags), Arc::new(DomainRegistry::new()))
}

fn driver(dir: &TempDir) -> JsonRegionDriver {
    let (flags, domains) = registries();
    JsonRegionDriver::new(dir.path().join("world").join("regions.json"), flags, domains)
}

fn flag(name: &str) -> regionguard_flags::Flag {
    builtin_flags().into_iter().find(|f| f.name() == name).unwrap()
}

fn write(path: &Path, document: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(document).unwrap()).unwrap();
}

fn by_id<'a>(regions: &'a [ProtectedRegion], name: &str) -> &'a ProtectedRegion {
    regions.iter().find(|r| r.id() == &id(name)).unwrap()
}

fn sample() -> Vec<Arc<ProtectedRegion>> {
    let owner = PlayerId::new();
    let index = ConcurrentRegionIndex::default();

    let mut town = ProtectedRegion::new(
        id("town"),
        Shape::cuboid(BlockVector3::new(0, 0, 0), BlockVector3::new(100, 255, 100)),
    )
    .with_priority(1);
    town.owners_mut().add_player(owner);
    town.owners_mut().add_group("mayors");
    town.members_mut().add_name("legacy_builder");
    town.set_flag(&flag(builtin::PVP), Some(FlagValue::State(State::Deny))).unwrap();
    town.set_flag(&flag(builtin::GREETING), Some(FlagValue::String("Welcome".into()))).unwrap();
    town.set_group(&flag(builtin::PVP), Some(RegionGroup::NonMembers));
    index.add(town).unwrap();

    let plaza = ProtectedRegion::new(
        id("plaza"),
        Polygon::new(
            vec![BlockVector2::new(10, 10), BlockVector2::new(30, 10), BlockVector2::new(20, 30)],
            70,
            60,
        )
        .unwrap(),
    );
    index.add(plaza).unwrap();
    index.set_parent(&id("plaza"), Some(id("town"))).unwrap();

    let mut global = ProtectedRegion::global();
    global.set_flag(&flag(builtin::FIRE_SPREAD), Some(FlagValue::State(State::Deny))).unwrap();
    index.add(global).unwrap();

    index.snapshot().sorted()
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn save_then_load_preserves_regions() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    let saved = sample();

    driver.save_all(&saved).unwrap();
    let loaded = driver.load_all().unwrap();

    assert_eq!(loaded.len(), saved.len());
    for original in &saved {
        assert_eq!(by_id(&loaded, original.id().as_str()), original.as_ref());
    }
    assert_eq!(by_id(&loaded, "plaza").parent(), Some(&id("town")));
}

#[test]
fn saved_document_is_versioned() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    driver.save_all(&sample()).unwrap();

    let document: Value = serde_json::from_slice(&fs::read(driver.path()).unwrap()).unwrap();
    assert_eq!(document["version"], json!(FORMAT_VERSION));
    assert_eq!(document["regions"].as_array().unwrap().len(), 3);

    let tmp = driver.path().with_file_name("regions.json.tmp");
    assert!(!tmp.exists());
}

#[test]
fn save_replaces_previous_document() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    driver.save_all(&sample()).unwrap();
    driver.save_all(&[]).unwrap();
    assert!(driver.load_all().unwrap().is_empty());
}

#[test]
fn missing_document_loads_empty() {
    let dir = TempDir::new().unwrap();
    assert!(driver(&dir).load_all().unwrap().is_empty());
}

// ============================================================================
// Damaged input
// ============================================================================

#[test]
fn corrupt_document_is_an_error() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    fs::create_dir_all(driver.path().parent().unwrap()).unwrap();
    fs::write(driver.path(), b"{ not json").unwrap();
    assert!(matches!(driver.load_all(), Err(StorageError::Serialization(_))));
}

#[test]
fn future_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    write(driver.path(), &json!({"version": 9, "regions": []}));
    assert!(matches!(driver.load_all(), Err(StorageError::UnsupportedVersion(9))));
}

#[test]
fn bad_records_are_skipped() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    write(
        driver.path(),
        &json!({
            "version": 2,
            "regions": [
                {"id": "ok", "shape": {"type": "cuboid", "min": {"x": 0, "y": 0, "z": 0}, "max": {"x": 1, "y": 1, "z": 1}}},
                {"id": "bad id!", "shape": {"type": "global"}},
                {"id": "flat", "shape": {"type": "polygon", "points": [{"x": 0, "z": 0}], "min_y": 0, "max_y": 1}},
                {"shape": {"type": "global"}}
            ]
        }),
    );

    let loaded = driver.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id(), &id("ok"));
}

#[test]
fn malformed_flags_are_dropped_and_unknown_flags_kept() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    write(
        driver.path(),
        &json!({
            "version": 2,
            "regions": [{
                "id": "spawn",
                "shape": {"type": "cuboid", "min": {"x": 0, "y": 0, "z": 0}, "max": {"x": 9, "y": 9, "z": 9}},
                "flags": {
                    "pvp": "sometimes",
                    "build": "deny",
                    "build-group": "nobody-in-particular",
                    "greeting": "hi",
                    "third-party-flag": {"level": 3}
                }
            }]
        }),
    );

    let loaded = driver.load_all().unwrap();
    let spawn = &loaded[0];
    assert_eq!(spawn.raw_flag("pvp"), None);
    assert_eq!(spawn.raw_flag("build"), Some(&json!("deny")));
    assert_eq!(spawn.raw_flag("build-group"), None);
    assert_eq!(spawn.flag(&flag(builtin::GREETING)), Some(FlagValue::String("hi".into())));
    assert_eq!(spawn.raw_flag("third-party-flag"), Some(&json!({"level": 3})));
}

#[test]
fn missing_parents_and_cycles_are_unlinked() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    let cube = json!({"type": "cuboid", "min": {"x": 0, "y": 0, "z": 0}, "max": {"x": 1, "y": 1, "z": 1}});
    write(
        driver.path(),
        &json!({
            "version": 2,
            "regions": [
                {"id": "a", "parent": "b", "shape": cube},
                {"id": "b", "parent": "a", "shape": cube},
                {"id": "c", "parent": "gone", "shape": cube},
                {"id": "d", "parent": "a", "shape": cube}
            ]
        }),
    );

    let loaded = driver.load_all().unwrap();
    assert_eq!(loaded.len(), 4);
    // links are applied in id order, so a -> b is kept and b -> a would close the loop
    assert_eq!(by_id(&loaded, "a").parent(), Some(&id("b")));
    assert_eq!(by_id(&loaded, "b").parent(), None);
    assert_eq!(by_id(&loaded, "c").parent(), None);
    assert_eq!(by_id(&loaded, "d").parent(), Some(&id("a")));
}

// ============================================================================
// Version 1 documents
// ============================================================================

#[test]
fn version_one_document_is_upgraded() {
    let dir = TempDir::new().unwrap();
    let driver = driver(&dir);
    write(
        driver.path(),
        &json!({
            "regions": [
                {
                    "id": "Farm",
                    "type": "cuboid",
                    "min": {"x": 10, "y": 0, "z": 10},
                    "max": {"x": 0, "y": 64, "z": 0},
                    "priority": 3,
                    "owners": {"players": ["Notch"], "groups": ["farmers"]},
                    "flags": {"use": "allow"}
                },
                {
                    "id": "pond",
                    "type": "poly2d",
                    "min-y": 0,
                    "max-y": 10,
                    "points": [{"x": 1, "z": 1}, {"x": 5, "z": 1}, {"x": 5, "z": 5}],
                    "parent": "farm",
                    "members": {"players": ["jeb_"]}
                }
            ]
        }),
    );

    let loaded = driver.load_all().unwrap();
    let farm = by_id(&loaded, "farm");
    assert_eq!(farm.priority(), 3);
    assert_eq!(farm.bounds().min, BlockVector3::new(0, 0, 0));
    assert!(farm.owners().players().contains_name("notch"));
    assert!(farm.owners().groups().contains_group("farmers"));
    assert_eq!(farm.flag(&flag(builtin::USE)), Some(FlagValue::State(State::Allow)));

    let pond = by_id(&loaded, "pond");
    assert!(matches!(pond.shape(), Shape::Polygon(_)));
    assert_eq!(pond.parent(), Some(&id("farm")));

    let jeb = PlayerActor::new("jeb_");
    assert!(pond.is_member(&jeb, &std::collections::HashMap::<RegionId, ProtectedRegion>::new()));

    let rewritten: Vec<Arc<ProtectedRegion>> = loaded.into_iter().map(Arc::new).collect();
    driver.save_all(&rewritten).unwrap();
    let document: Value = serde_json::from_slice(&fs::read(driver.path()).unwrap()).unwrap();
    assert_eq!(document["version"], json!(2));
}

// ============================================================================
// Custom domains
// ============================================================================

#[derive(Debug)]
struct PermissionDomain {
    permission: String,
}

impl CustomDomain for PermissionDomain {
    fn type_name(&self) -> &str {
        "permission"
    }

    fn contains(&self, actor: &dyn Actor) -> bool {
        actor.has_permission(&self.permission)
    }

    fn size(&self) -> usize {
        1
    }

    fn marshal(&self) -> Value {
        json!(self.permission)
    }
}

fn permission_factory() -> DomainFactory {
    Arc::new(|raw: &Value| -> RegionResult<Arc<dyn CustomDomain>> {
        Ok(Arc::new(PermissionDomain {
            permission: raw.as_str().unwrap_or_default().to_string(),
        }))
    })
}

#[test]
fn custom_domains_round_trip_through_registry() {
    let dir = TempDir::new().unwrap();
    let (flags, domains) = registries();
    domains.register("permission", permission_factory()).unwrap();
    let path = dir.path().join("regions.json");
    let driver = JsonRegionDriver::new(&path, Arc::clone(&flags), Arc::clone(&domains));

    let mut vip = ProtectedRegion::new(id("vip"), Shape::cuboid(BlockVector3::ZERO, BlockVector3::new(5, 5, 5)));
    vip.members_mut().add_custom(Arc::new(PermissionDomain {
        permission: "lounge.enter".into(),
    }));
    driver.save_all(&[Arc::new(vip)]).unwrap();

    let loaded = driver.load_all().unwrap();
    let guest = PlayerActor::new("guest").with_permission("lounge.enter");
    assert!(loaded[0].members().contains(&guest));

    let without_type = JsonRegionDriver::new(&path, flags, Arc::new(DomainRegistry::new()));
    let loaded = without_type.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded[0].members().is_empty());
}

// ============================================================================
// Memory driver
// ============================================================================

#[test]
fn memory_driver_applies_partial_saves() {
    let index = ConcurrentRegionIndex::default();
    for name in ["a", "b"] {
        index
            .add(ProtectedRegion::new(id(name), Shape::cuboid(BlockVector3::ZERO, BlockVector3::new(1, 1, 1))))
            .unwrap();
    }
    let driver = MemoryRegionDriver::new();
    driver.save_all(&index.snapshot().sorted()).unwrap();
    index.take_changes();

    index.set_priority(&id("a"), 7).unwrap();
    assert_eq!(index.remove(&id("b"), RemovalStrategy::default()).len(), 1);
    let changes = index.take_changes();
    driver.save_changes(&changes, &index.snapshot()).unwrap();

    let loaded = driver.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].priority(), 7);
    assert_eq!(driver.save_count(), 2);
}
