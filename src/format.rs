use crate::devices::Value;
use serde::Serialize;

/// Display rule attached to a property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Format {
    /// Raw value, no formatting.
    None,
    /// Fixed number of decimals followed by a unit, e.g. `21.5C` or `3.20kWh`.
    Fixed { decimals: u8, unit: &'static str },
    /// Integer code mapped to a label. Unlisted codes render as the bare number.
    Enumerated { labels: &'static [(i32, &'static str)] },
}

impl Format {
    pub fn is_none(&self) -> bool {
        matches!(self, Format::None)
    }

    pub fn apply(&self, value: &Value) -> String {
        // An absent reading renders empty under every rule
        if value.is_null() {
            return String::new();
        }

        match (self, value) {
            (Format::Fixed { decimals, unit }, _) => match value.as_f64() {
                Some(v) => format!("{:.*}{}", usize::from(*decimals), v, unit),
                None => value.to_string(),
            },
            (Format::Enumerated { labels }, Value::Int(code)) => label_for(labels, *code),
            // Codes carried as doubles on the wire
            (Format::Enumerated { labels }, Value::Double(v))
                if v.fract() == 0.0 && *v >= f64::from(i32::MIN) && *v <= f64::from(i32::MAX) =>
            {
                label_for(labels, *v as i32)
            }
            _ => value.to_string(),
        }
    }
}

fn label_for(labels: &[(i32, &str)], code: i32) -> String {
    labels
        .iter()
        .find(|(c, _)| *c == code)
        .map_or_else(|| code.to_string(), |(_, label)| (*label).to_string())
}

impl Default for Format {
    fn default() -> Self {
        Format::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: &[(i32, &str)] = &[(0, "Off"), (1, "On")];

    #[test]
    fn test_fixed_formatting() {
        let celsius = Format::Fixed { decimals: 1, unit: "C" };
        assert_eq!(celsius.apply(&Value::Double(21.5)), "21.5C");
        assert_eq!(celsius.apply(&Value::Int(20)), "20.0C");

        let energy = Format::Fixed { decimals: 2, unit: "kWh" };
        assert_eq!(energy.apply(&Value::Double(3.14159)), "3.14kWh");
    }

    #[test]
    fn test_null_renders_empty() {
        let rules = [
            Format::None,
            Format::Fixed { decimals: 2, unit: "W" },
            Format::Enumerated { labels: LABELS },
        ];
        for rule in rules.iter() {
            assert_eq!(rule.apply(&Value::Null), "");
        }
    }

    #[test]
    fn test_enumerated_formatting() {
        let rule = Format::Enumerated { labels: LABELS };
        assert_eq!(rule.apply(&Value::Int(1)), "On");
        assert_eq!(rule.apply(&Value::Int(7)), "7");
        assert_eq!(rule.apply(&Value::Double(1.0)), "On");
        assert_eq!(rule.apply(&Value::Double(1.5)), "1.5");
    }

    #[test]
    fn test_text_passes_through() {
        let rule = Format::Fixed { decimals: 2, unit: "V" };
        assert_eq!(rule.apply(&Value::Text("n/a".into())), "n/a");
        assert_eq!(Format::None.apply(&Value::Text("-".into())), "-");
    }
}
