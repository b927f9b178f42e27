use super::{PropertySpec, Value};
use crate::format::Format;

const INPUT_TYPES: &[(i32, &str)] = &[
    (0, "Disabled"),
    (1, "Pulse meter"),
    (2, "Door alarm"),
    (3, "Bilge pump"),
    (4, "Bilge alarm"),
    (5, "Burglar alarm"),
    (6, "Smoke alarm"),
    (7, "Fire alarm"),
    (8, "CO2 alarm"),
    (9, "Generator"),
];

const INPUT_STATES: &[(i32, &str)] = &[
    (0, "Low"),
    (1, "High"),
    (2, "Off"),
    (3, "On"),
    (4, "No"),
    (5, "Yes"),
    (6, "Open"),
    (7, "Closed"),
    (8, "Ok"),
    (9, "Alarm"),
    (10, "Running"),
    (11, "Stopped"),
];

pub fn properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::int("Count").with_default(Value::Int(0)),
        PropertySpec::int("State")
            .with_default(Value::Int(0))
            .with_format(Format::Enumerated { labels: INPUT_STATES }),
        PropertySpec::int("InputState").with_default(Value::Int(0)).with_range(0.0, 1.0),
        PropertySpec::int("Type")
            .with_default(Value::Int(2))
            .with_range(0.0, 9.0)
            .with_format(Format::Enumerated { labels: INPUT_TYPES }),
        PropertySpec::int("Alarm").with_default(Value::Int(0)).with_range(0.0, 2.0),
    ]
}
