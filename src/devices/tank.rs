use super::{PropertySpec, Value};
use crate::format::Format;

pub const FLUID_TYPES: &[(i32, &str)] = &[
    (0, "Fuel"),
    (1, "Fresh water"),
    (2, "Waste water"),
    (3, "Live well"),
    (4, "Oil"),
    (5, "Black water"),
    (6, "Gasoline"),
    (7, "Diesel"),
    (8, "LPG"),
    (9, "LNG"),
    (10, "Hydraulic oil"),
    (11, "Raw water"),
];

const SENSOR_STATUS: &[(i32, &str)] = &[
    (0, "Ok"),
    (1, "Disconnected"),
    (2, "Short circuited"),
    (3, "Reverse polarity"),
    (4, "Unknown"),
];

pub fn properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::measured("Level", 1, "%").with_range(0.0, 100.0),
        PropertySpec::measured("Remaining", 3, "m3"),
        PropertySpec::measured("Capacity", 3, "m3").with_default(Value::Double(0.2)),
        PropertySpec::int("FluidType")
            .with_default(Value::Int(0))
            .with_range(0.0, 11.0)
            .with_format(Format::Enumerated { labels: FLUID_TYPES }),
        // Replaced by the common Status property when the descriptor is built
        PropertySpec::int("Status")
            .with_default(Value::Int(0))
            .with_format(Format::Enumerated { labels: SENSOR_STATUS }),
    ]
}
