use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};

use redlilium_persist::value::to_value;
use redlilium_persist::{
    CodecRegistry, CollectingSink, DeserializeError, FacetHost, FieldMap, Format, InitError, MemberKey,
    Persist, RegistryConfig, SerializeError, TypeResolver, Value, WireVersion,
};

// ---------------------------------------------------------------------------
// Fixture types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum Mode {
    #[default]
    Idle,
    Tracking,
    Firing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Sweep {
    min: f32,
    max: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Persist)]
#[property(name = "heat", ty = f32, get = heat, set = set_heat, key(20, "heat"))]
#[property(name = "overheated", ty = bool, get = overheated, key(21))]
struct Turret {
    #[key(0)]
    yaw: f32,
    #[key(1, "ammo")]
    ammo: u32,
    #[key("label")]
    label: String,
    #[key(3)]
    targets: Vec<i32>,
    #[key(4)]
    owner: Option<String>,
    #[key(5)]
    tint: [u8; 3],
    #[key(6)]
    armed: bool,
    #[key(7)]
    mode: Mode,
    #[key(8)]
    sweep: Sweep,
    #[key(9)]
    tags: BTreeMap<String, u32>,
    #[key(-1)]
    offset: i64,
    heat_raw: f32,
    scratch: u64,
}

impl Turret {
    fn heat(&self) -> f32 {
        self.heat_raw
    }

    fn set_heat(&mut self, heat: f32) {
        self.heat_raw = heat;
    }

    fn overheated(&self) -> bool {
        self.heat_raw > 1.0
    }

    fn sample() -> Self {
        Self {
            yaw: 1.5,
            ammo: 120,
            label: "north gate".into(),
            targets: vec![3, -7, 11],
            owner: Some("blue".into()),
            tint: [255, 128, 0],
            armed: true,
            mode: Mode::Tracking,
            sweep: Sweep { min: -0.5, max: 0.75 },
            tags: BTreeMap::from([("tier".to_string(), 2), ("zone".to_string(), 9)]),
            offset: -42,
            heat_raw: 0.3,
            scratch: 99,
        }
    }
}

#[derive(Debug, Default, PartialEq, Persist)]
struct BeaconV1 {
    #[key(0)]
    id: u32,
    #[key(1)]
    name: String,
}

#[derive(Debug, Default, PartialEq, Persist)]
struct BeaconV2 {
    #[key(0)]
    id: u32,
    #[key(1)]
    name: String,
    #[key(2)]
    range: f64,
}

#[derive(Debug, Default, PartialEq, Persist)]
struct Speed(#[key(0)] f32, #[key("unit")] String);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct AssetHandle(u64);

#[derive(Debug, Default, PartialEq, Persist)]
struct Decal {
    #[key(0, custom)]
    texture: AssetHandle,
    #[key(1)]
    scale: f32,
}

fn asset_types() -> TypeResolver {
    let mut types = TypeResolver::new();
    types.register::<AssetHandle, _, _>(
        |handle| redlilium_persist::value::to_value(&format!("asset:{}", handle.0)),
        |value| {
            let text: String = redlilium_persist::value::from_value(value)?;
            let handle = text
                .strip_prefix("asset:")
                .and_then(|id| id.parse().ok())
                .map(AssetHandle);
            handle.ok_or(DeserializeError::FormatError(text))
        },
    );
    types
}

fn registry() -> (CodecRegistry, Arc<CollectingSink>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let sink = Arc::new(CollectingSink::new());
    let registry = CodecRegistry::builder()
        .diagnostics(sink.clone())
        .build()
        .unwrap();
    (registry, sink)
}

fn save(registry: &CodecRegistry, object: &dyn Persist) -> Vec<u8> {
    registry.to_bytes(Some(object)).unwrap().unwrap()
}

// ---------------------------------------------------------------------------
// Round-trip and idempotence
// ---------------------------------------------------------------------------

#[test]
fn round_trip_restores_every_marked_member() {
    let (registry, sink) = registry();
    let original = Turret::sample();
    let bytes = save(&registry, &original);

    let mut restored = Turret::default();
    let report = registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT);
    assert!(report.is_clean(), "{:?}", report.failures);
    assert!(report.skipped.is_empty());
    assert!(sink.is_empty());

    let expected = Turret {
        scratch: 0,
        ..original
    };
    assert_eq!(restored, expected);
}

#[test]
fn unmarked_members_are_not_persisted() {
    let (registry, _) = registry();
    let table = registry.discovery().table_of::<Turret>();
    assert!(table.iter().all(|(_, m)| m.name() != "scratch" && m.name() != "heat_raw"));
}

#[test]
fn build_field_map_is_idempotent() {
    let (registry, _) = registry();
    let turret = Turret::sample();
    let first = registry.build_field_map(Some(&turret)).unwrap();
    let second = registry.build_field_map(Some(&turret)).unwrap();
    assert_eq!(first, second);
    assert_eq!(save(&registry, &turret), save(&registry, &turret));
}

#[test]
fn tuple_struct_members_are_named_by_index() {
    let (registry, _) = registry();
    let table = registry.discovery().table_of::<Speed>();
    assert_eq!(table.get(&MemberKey::Index(0)).unwrap().name(), "0");
    assert_eq!(table.get(&MemberKey::from("unit")).unwrap().name(), "1");

    let bytes = save(&registry, &Speed(3.5, "m/s".into()));
    let mut restored = Speed::default();
    assert!(registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT).is_clean());
    assert_eq!(restored, Speed(3.5, "m/s".into()));
}

// ---------------------------------------------------------------------------
// Keys and properties
// ---------------------------------------------------------------------------

#[test]
fn dual_keyed_member_loads_from_either_key() {
    let (registry, _) = registry();
    let turret = Turret::sample();
    let fields = registry.build_field_map(Some(&turret)).unwrap().unwrap();
    assert!(fields.contains_key(&MemberKey::Index(1)));
    assert!(fields.contains_key(&MemberKey::from("ammo")));

    for key in [MemberKey::Index(1), MemberKey::from("ammo")] {
        let only: FieldMap = fields.iter().filter(|(k, _)| **k == key).map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut restored = Turret::default();
        let report = registry.apply_field_map(Some(&mut restored), only, WireVersion::CURRENT);
        assert_eq!(report.applied, vec![key]);
        assert_eq!(restored.ammo, 120);
    }
}

#[derive(Debug, Default, PartialEq, Persist)]
struct Ledger {
    #[key(-9223372036854775808)]
    floor: i64,
    #[key(9223372036854775807)]
    ceiling: i64,
}

#[test]
fn extreme_integer_keys_round_trip() {
    let (registry, _) = registry();
    let table = registry.discovery().table_of::<Ledger>();
    assert!(table.contains(&MemberKey::Index(i64::MIN)));
    assert!(table.contains(&MemberKey::Index(i64::MAX)));

    let source = Ledger {
        floor: i64::MIN,
        ceiling: i64::MAX,
    };
    let mut restored = Ledger::default();
    let report = registry.apply_bytes(Some(&mut restored), &save(&registry, &source), WireVersion::CURRENT);
    assert!(report.is_clean());
    assert_eq!(restored, source);
}

#[test]
fn integer_and_string_keys_do_not_collide() {
    let (registry, _) = registry();
    let table = registry.discovery().table_of::<Turret>();
    assert!(table.contains(&MemberKey::Index(-1)));
    assert!(!table.contains(&MemberKey::from("0")));
    assert!(!table.contains(&MemberKey::Index(2)));
}

#[test]
fn property_round_trips_through_accessors() {
    let (registry, _) = registry();
    let mut turret = Turret::sample();
    turret.heat_raw = 0.9;
    let bytes = save(&registry, &turret);

    let mut restored = Turret::default();
    registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT);
    assert_eq!(restored.heat_raw, 0.9);
    assert_eq!(registry.member_as::<f32>(&restored, &MemberKey::from("heat")), Some(0.9));
}

#[test]
fn property_without_setter_is_not_registered() {
    let (registry, _) = registry();
    let table = registry.discovery().table_of::<Turret>();
    assert!(table.iter().all(|(_, m)| m.name() != "overheated"));
    assert!(!table.contains(&MemberKey::Index(21)));
    assert!(table.contains(&MemberKey::Index(20)));
}

#[test]
fn member_value_helpers_use_keys() {
    let (registry, _) = registry();
    let mut turret = Turret::sample();
    assert_eq!(registry.member_as::<Mode>(&turret, &MemberKey::Index(7)), Some(Mode::Tracking));
    assert!(registry.member_value(&turret, &MemberKey::from("missing")).is_none());

    let changed = registry
        .set_member_value(&mut turret, &MemberKey::from("label"), Box::new(String::from("south")))
        .unwrap();
    assert!(changed);
    assert_eq!(turret.label, "south");
}

// ---------------------------------------------------------------------------
// Forward compatibility and fault isolation
// ---------------------------------------------------------------------------

#[test]
fn unknown_keys_are_skipped() {
    let (registry, sink) = registry();
    let newer = BeaconV2 {
        id: 4,
        name: "harbor".into(),
        range: 250.0,
    };
    let bytes = save(&registry, &newer);

    let mut older = BeaconV1::default();
    let report = registry.apply_bytes(Some(&mut older), &bytes, WireVersion::CURRENT);
    assert!(report.is_clean());
    assert_eq!(report.skipped, vec![MemberKey::Index(2)]);
    assert_eq!(
        older,
        BeaconV1 {
            id: 4,
            name: "harbor".into()
        }
    );
    assert!(sink.is_empty());
}

#[test]
fn missing_keys_keep_current_values() {
    let (registry, _) = registry();
    let bytes = save(&registry, &BeaconV1 { id: 8, name: "pier".into() });

    let mut newer = BeaconV2 {
        range: 12.5,
        ..BeaconV2::default()
    };
    let report = registry.apply_bytes(Some(&mut newer), &bytes, WireVersion::CURRENT);
    assert!(report.is_clean());
    assert_eq!(newer.id, 8);
    assert_eq!(newer.range, 12.5);
}

#[test]
fn corrupt_member_is_isolated() {
    let (registry, sink) = registry();
    let beacon = BeaconV2 {
        id: 4,
        name: "harbor".into(),
        range: 250.0,
    };
    let mut fields = registry.build_field_map(Some(&beacon)).unwrap().unwrap();
    let name_bytes = fields[&MemberKey::Index(1)].as_bytes().unwrap()[..4].to_vec();
    fields.insert(MemberKey::Index(1), Value::Bytes(name_bytes));
    let bytes = registry.envelope().encode(&fields).unwrap();

    let mut restored = BeaconV2 {
        name: "untouched".into(),
        ..BeaconV2::default()
    };
    let report = registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT);

    assert_eq!(restored.id, 4);
    assert_eq!(restored.range, 250.0);
    assert_eq!(restored.name, "untouched");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].member, Some("name"));
    assert_eq!(report.failures[0].key, Some(MemberKey::Index(1)));
    assert_eq!(report.applied, vec![MemberKey::Index(0), MemberKey::Index(2)]);

    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("BeaconV2::name"));
}

#[test]
fn garbage_envelope_is_reported_not_raised() {
    let (registry, sink) = registry();
    let mut beacon = BeaconV1 { id: 1, name: "keep".into() };
    let report = registry.apply_bytes(Some(&mut beacon), b"\x01\x02", WireVersion::CURRENT);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(beacon, BeaconV1 { id: 1, name: "keep".into() });
    assert_eq!(sink.len(), 1);
}

#[test]
fn deeply_nested_envelope_is_reported_not_raised() {
    let (registry, sink) = registry();
    // {Index(0): List(List(...(Null)))} in bincode layout.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0i64.to_le_bytes());
    for _ in 0..200_000 {
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&1u64.to_le_bytes());
    }
    bytes.extend_from_slice(&0u32.to_le_bytes());

    let mut beacon = BeaconV1 { id: 6, name: "deep".into() };
    let report = registry.apply_bytes(Some(&mut beacon), &bytes, WireVersion::CURRENT);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].member.is_none());
    assert!(matches!(report.failures[0].error, DeserializeError::FormatError(_)));
    assert_eq!(beacon, BeaconV1 { id: 6, name: "deep".into() });
    assert_eq!(sink.len(), 1);
}

// ---------------------------------------------------------------------------
// Wire versions and codec use
// ---------------------------------------------------------------------------

#[test]
fn inline_version_assigns_without_binary_codec() {
    let (registry, _) = registry();
    let mut fields = FieldMap::new();
    fields.insert(MemberKey::Index(0), Value::F64(0.25));
    fields.insert(MemberKey::Index(1), Value::U64(64));
    fields.insert(MemberKey::from("label"), Value::String("legacy".into()));
    fields.insert(MemberKey::Index(3), to_value(&vec![1i64, -2]).unwrap());
    fields.insert(MemberKey::Index(4), to_value(&None::<String>).unwrap());
    fields.insert(MemberKey::Index(5), to_value(&[1u64, 2, 3]).unwrap());
    fields.insert(MemberKey::Index(6), Value::Bool(true));
    fields.insert(MemberKey::Index(7), to_value(&Mode::Firing).unwrap());
    fields.insert(MemberKey::Index(8), to_value(&Sweep { min: -1.0, max: 1.0 }).unwrap());
    let bytes = registry.envelope().encode(&fields).unwrap();

    let mut turret = Turret {
        owner: Some("stale".into()),
        ..Turret::default()
    };
    let report = registry.apply_bytes(Some(&mut turret), &bytes, WireVersion::INLINE);
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(turret.yaw, 0.25);
    assert_eq!(turret.ammo, 64);
    assert_eq!(turret.label, "legacy");
    assert_eq!(turret.targets, vec![1, -2]);
    assert_eq!(turret.owner, None);
    assert_eq!(turret.tint, [1, 2, 3]);
    assert!(turret.armed);
    assert_eq!(turret.mode, Mode::Firing);
    assert_eq!(turret.sweep, Sweep { min: -1.0, max: 1.0 });

    let stats = registry.stats();
    assert_eq!(stats.decode_calls, 0);
    assert_eq!(stats.decode_specializations, 0);
}

#[test]
fn nested_version_goes_through_codec() {
    let (registry, _) = registry();
    let bytes = save(&registry, &BeaconV2::default());
    let mut restored = BeaconV2::default();
    registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::NESTED);
    assert_eq!(registry.stats().decode_calls, 3);
}

#[test]
fn inline_value_of_wrong_shape_fails_that_member_only() {
    let (registry, sink) = registry();
    let mut fields = FieldMap::new();
    fields.insert(MemberKey::Index(0), Value::String("not a number".into()));
    fields.insert(MemberKey::Index(1), Value::String("kept".into()));
    let mut beacon = BeaconV1::default();
    let report = registry.apply_field_map(Some(&mut beacon), fields, WireVersion::INLINE);
    assert_eq!(report.failed_members(), vec!["id"]);
    assert_eq!(beacon.name, "kept");
    assert_eq!(sink.len(), 1);
}

#[test]
fn versions_above_one_use_nested_layout() {
    let (registry, _) = registry();
    let bytes = save(&registry, &BeaconV1 { id: 3, name: "x".into() });
    let mut restored = BeaconV1::default();
    assert!(registry.apply_bytes(Some(&mut restored), &bytes, WireVersion(7)).is_clean());
    assert_eq!(restored.id, 3);
}

// ---------------------------------------------------------------------------
// Codec cache
// ---------------------------------------------------------------------------

#[test]
fn one_specialization_per_type() {
    let (registry, _) = registry();
    for i in 0..50 {
        let beacon = BeaconV2 {
            id: i,
            name: format!("b{i}"),
            range: f64::from(i),
        };
        let bytes = save(&registry, &beacon);
        let mut restored = BeaconV2::default();
        registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT);
    }
    let stats = registry.stats();
    assert_eq!(stats.encode_specializations, 3);
    assert_eq!(stats.decode_specializations, 3);
    assert_eq!(stats.encode_calls, 150);
    assert_eq!(stats.decode_calls, 150);
    assert_eq!(registry.discovery().builds(), 1);
}

#[test]
fn concurrent_first_use_specializes_once() {
    let (registry, _) = registry();
    let registry = Arc::new(registry);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                let beacon = BeaconV2 {
                    id: i,
                    name: "t".into(),
                    range: 1.0,
                };
                let bytes = registry.to_bytes(Some(&beacon)).unwrap().unwrap();
                let mut restored = BeaconV2::default();
                assert!(registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT).is_clean());
                restored.id
            })
        })
        .collect();
    let mut ids: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..8).collect::<Vec<u32>>());
    let stats = registry.stats();
    assert_eq!(stats.encode_specializations, 3);
    assert_eq!(stats.decode_specializations, 3);
}

// ---------------------------------------------------------------------------
// Absent objects
// ---------------------------------------------------------------------------

#[test]
fn absent_object_is_a_no_op() {
    let (registry, sink) = registry();
    assert!(registry.to_bytes(None).unwrap().is_none());
    assert!(registry.build_field_map(None).unwrap().is_none());
    assert!(registry.discover(None).is_none());

    let report = registry.apply_bytes(None, b"not even an envelope", WireVersion::CURRENT);
    assert!(report.is_clean());
    assert!(report.applied.is_empty());
    assert!(sink.is_empty());
    assert_eq!(registry.stats().encode_calls, 0);
}

// ---------------------------------------------------------------------------
// Custom type resolver
// ---------------------------------------------------------------------------

#[test]
fn custom_type_round_trips_through_resolver() {
    let sink = Arc::new(CollectingSink::new());
    let registry = CodecRegistry::builder()
        .resolver(asset_types())
        .diagnostics(sink.clone())
        .build()
        .unwrap();

    let decal = Decal {
        texture: AssetHandle(31),
        scale: 2.0,
    };
    let bytes = save(&registry, &decal);
    let mut restored = Decal::default();
    assert!(registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT).is_clean());
    assert_eq!(restored, decal);

    let mut fields = FieldMap::new();
    fields.insert(MemberKey::Index(0), Value::String("asset:5".into()));
    let mut legacy = Decal::default();
    assert!(registry.apply_field_map(Some(&mut legacy), fields, WireVersion::INLINE).is_clean());
    assert_eq!(legacy.texture, AssetHandle(5));
    assert!(sink.is_empty());
}

#[test]
fn unregistered_custom_type_fails_to_encode() {
    let (registry, _) = registry();
    let err = registry.to_bytes(Some(&Decal::default())).unwrap_err();
    match err {
        SerializeError::FieldError { field, message } => {
            assert_eq!(field, "Decal::texture");
            assert!(message.contains("no codec registered"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[derive(Debug, Default, PartialEq, Persist)]
struct Odometer {
    #[key(0)]
    total: u64,
}

#[derive(Debug, Default, PartialEq, Persist)]
struct PackedOdometer {
    #[key(0, custom)]
    total: u64,
}

#[test]
fn serde_member_does_not_resolve_custom_member_of_same_type() {
    let (registry, sink) = registry();
    assert!(registry.to_bytes(Some(&PackedOdometer::default())).is_err());

    let bytes = save(&registry, &Odometer { total: 42 });
    assert!(registry.to_bytes(Some(&PackedOdometer { total: 42 })).is_err());

    let mut packed = PackedOdometer::default();
    let report = registry.apply_bytes(Some(&mut packed), &bytes, WireVersion::CURRENT);
    assert_eq!(report.failed_members(), vec!["total"]);
    assert!(matches!(
        report.failures[0].error,
        DeserializeError::Unresolved { .. }
    ));
    assert_eq!(packed.total, 0);
    assert_eq!(sink.len(), 1);

    let mut plain = Odometer::default();
    assert!(registry.apply_bytes(Some(&mut plain), &bytes, WireVersion::CURRENT).is_clean());
    assert_eq!(plain.total, 42);
}

// ---------------------------------------------------------------------------
// Facet hosts
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Node {
    facet: Option<Turret>,
    children: Vec<Node>,
}

impl FacetHost for Node {
    fn find_serializable_facet(&self) -> Option<&dyn Persist> {
        if let Some(facet) = &self.facet {
            return Some(facet as &dyn Persist);
        }
        self.children.iter().find_map(|c| c.find_serializable_facet())
    }

    fn find_serializable_facet_mut(&mut self) -> Option<&mut dyn Persist> {
        if let Some(facet) = self.facet.as_mut() {
            return Some(facet as &mut dyn Persist);
        }
        self.children.iter_mut().find_map(|c| c.find_serializable_facet_mut())
    }
}

#[test]
fn facet_falls_back_to_first_child() {
    let (registry, _) = registry();
    let saved = Node {
        facet: None,
        children: vec![
            Node::default(),
            Node {
                facet: Some(Turret::sample()),
                children: Vec::new(),
            },
        ],
    };
    let bytes = registry.save_facet(&saved).unwrap().unwrap();

    let mut loaded = Node {
        facet: None,
        children: vec![Node {
            facet: Some(Turret::default()),
            children: Vec::new(),
        }],
    };
    assert!(registry.load_facet(&mut loaded, &bytes, WireVersion::CURRENT).is_clean());
    assert_eq!(loaded.children[0].facet.as_ref().unwrap().label, "north gate");
}

#[test]
fn host_without_facet_saves_nothing() {
    let (registry, _) = registry();
    let mut empty = Node::default();
    assert!(registry.save_facet(&empty).unwrap().is_none());
    assert!(registry.load_facet(&mut empty, &[], WireVersion::CURRENT).is_clean());
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn format_names_resolve_at_startup() {
    assert_eq!(Format::from_name("bincode").unwrap(), Format::Bincode);
    assert!(matches!(
        Format::from_name("msgpack"),
        Err(InitError::UnknownFormat { .. })
    ));
    #[cfg(not(feature = "serialize-ron"))]
    assert!(matches!(
        Format::from_name("ron"),
        Err(InitError::FormatUnavailable { .. })
    ));
}

#[test]
fn quiet_config_still_skips_unknown_keys() {
    let registry = CodecRegistry::builder()
        .config(RegistryConfig {
            trace_skipped_keys: false,
            ..RegistryConfig::default()
        })
        .build()
        .unwrap();
    let bytes = save(&registry, &BeaconV2::default());
    let mut older = BeaconV1::default();
    let report = registry.apply_bytes(Some(&mut older), &bytes, WireVersion::CURRENT);
    assert_eq!(report.skipped.len(), 1);
}

#[cfg(feature = "serialize-ron")]
#[test]
fn ron_format_round_trip() {
    let config: RegistryConfig = ron::from_str("(format: ron)").unwrap();
    assert_eq!(config.format, Format::Ron);
    assert!(config.trace_skipped_keys);

    let registry = CodecRegistry::builder().config(config).build().unwrap();
    let bytes = save(&registry, &Turret::sample());
    let mut restored = Turret::default();
    assert!(registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT).is_clean());
    assert_eq!(restored.label, "north gate");
    assert_eq!(restored.tags, Turret::sample().tags);
}
