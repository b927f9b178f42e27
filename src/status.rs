use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFill {
    Green,
    Yellow,
    Red,
    Grey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusShape {
    Dot,
    Ring,
}

/// Operator-visible status indicator of a device instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub fill: StatusFill,
    pub shape: StatusShape,
    pub text: String,
}

impl NodeStatus {
    pub fn idle() -> Self {
        Self::new(StatusFill::Grey, StatusShape::Ring, "idle")
    }

    pub fn pending(text: impl Into<String>) -> Self {
        Self::new(StatusFill::Yellow, StatusShape::Ring, text)
    }

    pub fn ok(text: impl Into<String>) -> Self {
        Self::new(StatusFill::Green, StatusShape::Dot, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusFill::Red, StatusShape::Dot, text)
    }

    pub fn closed() -> Self {
        Self::new(StatusFill::Grey, StatusShape::Dot, "closed")
    }

    fn new(fill: StatusFill, shape: StatusShape, text: impl Into<String>) -> Self {
        Self {
            fill,
            shape,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.fill == StatusFill::Red
    }
}
