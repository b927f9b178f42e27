use super::PropertySpec;

pub fn properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::measured("Irradiance", 1, "W/m2").with_range(0.0, 1500.0),
        PropertySpec::measured("Windspeed", 1, "m/s"),
        PropertySpec::measured("ExternalTemperature", 1, "C"),
        PropertySpec::measured("CellTemperature", 1, "C"),
    ]
}
