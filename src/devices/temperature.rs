use super::{PropertySpec, Value};
use crate::format::Format;

pub const PRODUCT_ID: i32 = 0xC029;

pub const TEMPERATURE_TYPES: &[(i32, &str)] = &[
    (0, "Battery"),
    (1, "Fridge"),
    (2, "Generic"),
    (3, "Room"),
    (4, "Outdoor"),
    (5, "Water heater"),
    (6, "Freezer"),
];

pub fn properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::int("ProductId").with_default(Value::Int(PRODUCT_ID)),
        PropertySpec::measured("Temperature", 1, "C").with_range(-50.0, 150.0),
        PropertySpec::int("TemperatureType")
            .with_default(Value::Int(2))
            .with_range(0.0, 6.0)
            .with_format(Format::Enumerated { labels: TEMPERATURE_TYPES }),
        PropertySpec::measured("Pressure", 0, "hPa"),
        PropertySpec::measured("Humidity", 1, "%").with_range(0.0, 100.0),
        PropertySpec::measured("BatteryVoltage", 2, "V"),
    ]
}
