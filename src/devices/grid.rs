use super::{PropertySpec, Value, WireType};
use crate::config::{ConfigValue, DeviceConfig};
use crate::format::Format;
use crate::interface::{InterfaceDescriptor, LiveValueStore};
use tracing::{debug, warn};

pub const NR_OF_PHASES: &str = "NrOfPhases";
pub const DEFAULT_PHASES: u32 = 1;
/// Upper end of the advisory `NrOfPhases` range. Not enforced.
pub const TYPICAL_MAX_PHASES: u32 = 3;

/// Per-phase quantities: property suffix and unit.
const PHASE_QUANTITIES: [(&str, &str); 5] = [
    ("Current", "A"),
    ("Power", "W"),
    ("Voltage", "V"),
    ("Energy/Forward", "kWh"),
    ("Energy/Reverse", "kWh"),
];

pub fn properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::measured("Ac/Energy/Forward", 2, "kWh").with_default(Value::Double(0.0)),
        PropertySpec::measured("Ac/Energy/Reverse", 2, "kWh").with_default(Value::Double(0.0)),
        PropertySpec::measured("Ac/Frequency", 2, "Hz").with_range(45.0, 65.0),
        PropertySpec::measured("Ac/Power", 0, "W"),
        PropertySpec::int(NR_OF_PHASES)
            .with_default(Value::Int(DEFAULT_PHASES as i32))
            .with_range(1.0, f64::from(TYPICAL_MAX_PHASES)),
        PropertySpec::int("ProductId").with_default(Value::Int(0xA144)),
    ]
}

/// Coerces the configured phase count into a positive integer.
///
/// Missing, non-numeric and non-positive values fall back to a single phase.
/// Fractions truncate.
pub fn phase_count(configured: Option<&ConfigValue>) -> u32 {
    let Some(value) = configured else {
        return DEFAULT_PHASES;
    };

    match value.as_number().map(f64::trunc) {
        Some(n) if n >= 1.0 => n.min(f64::from(i32::MAX)) as u32,
        _ => {
            warn!("Invalid NrOfPhases {:?}, using {}", value, DEFAULT_PHASES);
            DEFAULT_PHASES
        }
    }
}

pub fn phase_property(phase: u32, quantity: &str) -> String {
    format!("Ac/L{}/{}", phase, quantity)
}

/// Adds the per-phase measurements of a grid meter to a built descriptor and store.
pub fn expand_phases(
    descriptor: &mut InterfaceDescriptor,
    store: &mut LiveValueStore,
    config: &DeviceConfig,
) {
    let phases = phase_count(config.nr_of_phases.as_ref());

    for phase in 1..=phases {
        for (quantity, unit) in PHASE_QUANTITIES {
            let name = phase_property(phase, quantity);
            descriptor.insert(name.clone(), WireType::Double, Format::Fixed { decimals: 2, unit });
            store.insert(name, WireType::Double, Value::Double(0.0));
        }
    }

    store.insert(NR_OF_PHASES, WireType::Int32, Value::Int(phases as i32));
    debug!("Expanded grid meter {} to {} phase(s)", config.id, phases);
}
