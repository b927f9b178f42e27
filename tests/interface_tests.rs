use venus_virtual::devices::KNOWN_KINDS;
use venus_virtual::error::StoreError;
use venus_virtual::interface::InstanceOverrides;
use venus_virtual::*;

fn assemble(config: &DeviceConfig) -> ExportedObject {
    ExportedObject::assemble(config, Ownership::Owned)
}

#[test]
fn test_descriptor_and_store_share_property_names() {
    for kind in KNOWN_KINDS.iter() {
        let object = assemble(&DeviceConfig::new("x", kind.clone()));
        let descriptor: Vec<&str> = object.descriptor.keys().collect();
        let store: Vec<&str> = object.store.keys().collect();
        assert_eq!(descriptor, store, "{} descriptor and store differ", kind);
    }

    let object = assemble(&DeviceConfig::new("x", DeviceKind::Grid).with_phases(3));
    assert!(object.descriptor.keys().eq(object.store.keys()));
}

#[test]
fn test_every_value_matches_declared_type() {
    for kind in KNOWN_KINDS.iter() {
        let object = assemble(&DeviceConfig::new("x", kind.clone()).with_phases(2));
        for (name, value) in object.store.iter() {
            let wire_type = object.descriptor.get(name).unwrap().wire_type;
            let fits = match value {
                Value::Null => wire_type.is_numeric(),
                Value::Text(_) => wire_type == WireType::String,
                Value::Int(_) => wire_type == WireType::Int32,
                Value::Double(_) => wire_type == WireType::Double,
            };
            assert!(fits, "{} {} holds {:?}", kind, name, value);
        }
    }
}

#[test]
fn test_unknown_kind_exports_common_properties_only() {
    let object = assemble(&DeviceConfig::new("x", DeviceKind::parse("toaster")));
    let names: Vec<&str> = object.descriptor.keys().collect();
    assert_eq!(names, ["DeviceInstance", "CustomName", "Status"]);
    assert_eq!(object.store.len(), 3);
    assert_eq!(object.store.get("CustomName"), Some(&Value::Text("Virtual toaster".into())));
}

#[test]
fn test_common_properties_come_last() {
    let object = assemble(&DeviceConfig::new("x", DeviceKind::Tank));
    let names: Vec<&str> = object.descriptor.keys().collect();
    assert_eq!(&names[names.len() - 3..], ["DeviceInstance", "CustomName", "Status"]);

    // Tank declares its own Status; the common one replaces it in place
    assert_eq!(names.iter().filter(|n| **n == "Status").count(), 1);
    assert_eq!(object.store.get("Status"), Some(&Value::Int(0)));
}

#[test]
fn test_instance_overrides() {
    let config = DeviceConfig::new("x", DeviceKind::Heatpump)
        .with_device_instance("41")
        .with_name("Garage pump");
    let object = assemble(&config);
    assert_eq!(object.get("DeviceInstance"), Ok(&Value::Int(41)));
    assert_eq!(object.get("CustomName"), Ok(&Value::Text("Garage pump".into())));

    let blank = InstanceOverrides::for_kind(&DeviceKind::Meteo, 0, Some("  "));
    assert_eq!(blank.custom_name, "Virtual meteo");
}

#[test]
fn test_management_block() {
    let meteo = assemble(&DeviceConfig::new("x", DeviceKind::Meteo));
    for name in ["Connected", "ProductName", "Mgmt/ProcessName", "Mgmt/ProcessVersion", "Mgmt/Connection"] {
        assert!(meteo.descriptor.contains(name), "meteo lacks {}", name);
    }
    assert_eq!(meteo.get("Connected"), Ok(&Value::Int(1)));
    assert_eq!(meteo.get("ProductName"), Ok(&Value::Text("Virtual meteo".into())));

    let relay = assemble(&DeviceConfig::new("x", DeviceKind::Relay));
    assert!(!relay.descriptor.contains("Mgmt/ProcessName"));

    let unknown = assemble(&DeviceConfig::new("x", DeviceKind::parse("toaster")));
    assert!(!unknown.descriptor.contains("Connected"));
}

#[test]
fn test_grid_phase_expansion() {
    let single = assemble(&DeviceConfig::new("m", DeviceKind::Grid));
    let three = assemble(&DeviceConfig::new("m", DeviceKind::Grid).with_phases(3));
    assert_eq!(three.descriptor.len(), single.descriptor.len() + 10);
    assert_eq!(three.get("NrOfPhases"), Ok(&Value::Int(3)));

    for phase in 1..=3 {
        for quantity in ["Current", "Power", "Voltage", "Energy/Forward", "Energy/Reverse"] {
            let name = format!("Ac/L{}/{}", phase, quantity);
            assert_eq!(three.get(&name), Ok(&Value::Double(0.0)), "{}", name);
            assert_eq!(three.descriptor.get(&name).unwrap().wire_type, WireType::Double);
        }
    }
    assert!(three.get("Ac/L4/Power").is_err());
}

#[test]
fn test_grid_phase_count_not_capped() {
    let single = assemble(&DeviceConfig::new("m", DeviceKind::Grid));
    let four = assemble(&DeviceConfig::new("m", DeviceKind::Grid).with_phases(4));

    assert_eq!(four.descriptor.len(), single.descriptor.len() + 15);
    assert_eq!(four.store.len(), four.descriptor.len());
    assert_eq!(four.get("NrOfPhases"), Ok(&Value::Int(4)));
    assert_eq!(four.get("Ac/L4/Power"), Ok(&Value::Double(0.0)));
    assert!(!four.descriptor.contains("Ac/L5/Power"));
}

#[test]
fn test_grid_non_numeric_phase_config_builds_one_phase() {
    let config: DeviceConfig =
        serde_json::from_str(r#"{"id":"m","device":"grid","device_instance":true,"nr_of_phases":true}"#)
            .unwrap();
    let object = assemble(&config);

    assert_eq!(object.get("NrOfPhases"), Ok(&Value::Int(1)));
    assert_eq!(object.get("DeviceInstance"), Ok(&Value::Int(0)));
    assert!(object.descriptor.contains("Ac/L1/Power"));
    assert!(!object.descriptor.contains("Ac/L2/Power"));
}

#[test]
fn test_grid_phase_count_fallback() {
    let base_len = DeviceKind::Grid.schema().len() + 5 + 3;

    for config in [
        DeviceConfig::new("m", DeviceKind::Grid),
        DeviceConfig::new("m", DeviceKind::Grid).with_phases("many"),
        DeviceConfig::new("m", DeviceKind::Grid).with_phases(0),
    ] {
        let object = assemble(&config);
        assert_eq!(object.descriptor.len(), base_len + 5);
        assert_eq!(object.get("NrOfPhases"), Ok(&Value::Int(1)));
        assert!(object.descriptor.contains("Ac/L1/Voltage"));
        assert!(!object.descriptor.contains("Ac/L2/Voltage"));
    }
}

#[test]
fn test_other_kinds_ignore_phase_count() {
    let plain = assemble(&DeviceConfig::new("h", DeviceKind::Heatpump));
    let configured = assemble(&DeviceConfig::new("h", DeviceKind::Heatpump).with_phases(3));
    assert_eq!(plain.descriptor, configured.descriptor);
}

#[test]
fn test_temperature_formatting() {
    let mut object = assemble(&DeviceConfig::new("t", DeviceKind::Temperature));
    assert_eq!(object.get("Temperature"), Ok(&Value::Null));
    assert_eq!(object.text("Temperature").unwrap(), "");

    object.set("Temperature", Value::Double(21.5)).unwrap();
    assert_eq!(object.text("Temperature").unwrap(), "21.5C");
    assert_eq!(object.text("TemperatureType").unwrap(), "Generic");
}

#[test]
fn test_set_checks_type_but_not_range() {
    let mut object = assemble(&DeviceConfig::new("t", DeviceKind::Temperature));

    // Advisory range is -50..150
    object.set("Temperature", Value::Double(999.0)).unwrap();
    assert_eq!(object.get("Temperature"), Ok(&Value::Double(999.0)));

    // Integers widen into double slots
    object.set("Temperature", Value::Int(20)).unwrap();
    assert_eq!(object.get("Temperature"), Ok(&Value::Double(20.0)));

    assert!(matches!(
        object.set("Temperature", Value::Text("warm".into())),
        Err(StoreError::TypeMismatch { expected: WireType::Double, .. })
    ));
    assert_eq!(
        object.set("Nope", Value::Int(1)),
        Err(StoreError::UnknownProperty("Nope".into()))
    );
}

#[test]
fn test_descriptor_serializes_in_order() {
    let object = assemble(&DeviceConfig::new("x", DeviceKind::parse("toaster")));
    let json = serde_json::to_string(&object.descriptor).unwrap();
    assert_eq!(
        json,
        r#"{"DeviceInstance":{"type":"i"},"CustomName":{"type":"s"},"Status":{"type":"i"}}"#
    );
}

#[test]
fn test_relay_settings() {
    let settings = DeviceKind::Relay.settings();
    let paths: Vec<&str> = settings.iter().map(|s| s.path).collect();
    assert_eq!(
        paths,
        [
            "/Settings/Relay/2/InitialState",
            "/Settings/Relay/2/Function",
            "/Settings/Relay/2/Polarity"
        ]
    );
    assert!(DeviceKind::Grid.settings().is_empty());
}
