use super::{PropertySpec, Value};
use crate::format::Format;

const OPERATION_MODES: &[(i32, &str)] = &[(0, "Off"), (1, "Heating"), (2, "Cooling"), (3, "Hot water")];
const ON_OFF: &[(i32, &str)] = &[(0, "Off"), (1, "On")];

pub fn properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::int("OperationMode")
            .with_default(Value::Int(0))
            .with_range(0.0, 3.0)
            .with_format(Format::Enumerated { labels: OPERATION_MODES }),
        PropertySpec::int("Operation/Defrost")
            .with_default(Value::Int(0))
            .with_format(Format::Enumerated { labels: ON_OFF }),
        PropertySpec::int("Operation/Thermostat")
            .with_default(Value::Int(0))
            .with_format(Format::Enumerated { labels: ON_OFF }),
        PropertySpec::measured("Ac/Power", 0, "W"),
        PropertySpec::measured("Ac/Energy/Forward", 2, "kWh").with_default(Value::Double(0.0)),
        PropertySpec::measured("Temperature", 1, "C"),
        PropertySpec::measured("TargetTemperature", 1, "C").with_range(5.0, 65.0),
    ]
}
