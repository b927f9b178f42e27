use super::{PropertySpec, Value};
use crate::format::Format;

const POSITIONS: &[(i32, &str)] = &[(0, "AC input 1"), (1, "AC output"), (2, "AC input 2")];

// Current, forward energy, power and voltage per phase
const PHASES: [[&str; 4]; 3] = [
    ["Ac/L1/Current", "Ac/L1/Energy/Forward", "Ac/L1/Power", "Ac/L1/Voltage"],
    ["Ac/L2/Current", "Ac/L2/Energy/Forward", "Ac/L2/Power", "Ac/L2/Voltage"],
    ["Ac/L3/Current", "Ac/L3/Energy/Forward", "Ac/L3/Power", "Ac/L3/Voltage"],
];

pub fn properties() -> Vec<PropertySpec> {
    let mut properties = vec![
        PropertySpec::measured("Ac/Energy/Forward", 2, "kWh").with_default(Value::Double(0.0)),
        PropertySpec::measured("Ac/Power", 0, "W"),
    ];

    for [current, energy, power, voltage] in PHASES {
        properties.push(PropertySpec::measured(current, 2, "A"));
        properties.push(PropertySpec::measured(energy, 2, "kWh").with_default(Value::Double(0.0)));
        properties.push(PropertySpec::measured(power, 0, "W"));
        properties.push(PropertySpec::measured(voltage, 1, "V"));
    }

    properties.extend([
        PropertySpec::double("ErrorCode").with_default(Value::Double(0.0)),
        PropertySpec::double("FroniusDeviceType").with_default(Value::Double(0.0)),
        PropertySpec::double("Position")
            .with_default(Value::Double(0.0))
            .with_range(0.0, 2.0)
            .with_format(Format::Enumerated { labels: POSITIONS }),
        PropertySpec::text("Serial").with_default(Value::Text(String::new())),
        PropertySpec::int("StatusCode").with_default(Value::Int(7)),
    ]);

    properties
}
