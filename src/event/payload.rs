//! Event payloads: the discriminated values the registry dispatches.
//!
//! Every payload has a `type` (its [`kind`](Payload::kind)) and a set of
//! named fields readable through [`Payload::field`], which is what
//! [`Condition`](super::Condition)s match against.

use std::collections::BTreeMap;
use std::fmt;

use crate::input::{Direction, Switch};

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A dynamically typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Truthiness: `false`, zero and the empty string are false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String view of the value, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Something that happened, offered to every enabled event.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// State of one shoulder-switch button this tick.
    Button {
        switch: Switch,
        button: Direction,
        /// The button is held.
        pressed: bool,
        /// `pressed` differs from the previous tick.
        change: bool,
    },
    /// State of one touch petal this tick.
    Touch {
        zone: u8,
        /// The petal is touched.
        pressed: bool,
        /// `pressed` differs from the previous tick.
        change: bool,
        pressure: u16,
        radius: f32,
        angle: f32,
    },
    /// A sequencer fired.
    Timer {
        name: String,
        /// Firing count, wrapped to the sequencer's step count if it has one.
        step: u32,
        /// How far past its due time the firing was dispatched.
        late_ms: f32,
    },
    /// Application-defined payload.
    Custom {
        kind: String,
        fields: BTreeMap<String, Value>,
    },
}

impl Payload {
    /// Start building an application payload of the given kind.
    pub fn custom(kind: impl Into<String>) -> Self {
        Payload::Custom {
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to a custom payload. Ignored for built-in kinds.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Payload::Custom { fields, .. } = &mut self {
            fields.insert(name.into(), value.into());
        }
        self
    }

    /// The `type` discriminant.
    pub fn kind(&self) -> &str {
        match self {
            Payload::Button { .. } => "button",
            Payload::Touch { .. } => "touch",
            Payload::Timer { .. } => "timer",
            Payload::Custom { kind, .. } => kind,
        }
    }

    /// Look up a field by name. `type` is always present.
    pub fn field(&self, name: &str) -> Option<Value> {
        if name == "type" {
            return Some(Value::Str(self.kind().to_owned()));
        }
        match self {
            Payload::Button {
                switch,
                button,
                pressed,
                change,
            } => match name {
                "switch" => Some(switch.name().into()),
                "button" => Some(button.name().into()),
                "pressed" => Some((*pressed).into()),
                "change" => Some((*change).into()),
                _ => None,
            },
            Payload::Touch {
                zone,
                pressed,
                change,
                pressure,
                radius,
                angle,
            } => match name {
                "zone" | "index" => Some(Value::Int(i64::from(*zone))),
                "pressed" => Some((*pressed).into()),
                "change" => Some((*change).into()),
                "pressure" => Some(Value::Int(i64::from(*pressure))),
                "radius" => Some((*radius).into()),
                "angle" => Some((*angle).into()),
                _ => None,
            },
            Payload::Timer {
                name: timer,
                step,
                late_ms,
            } => match name {
                "name" | "timer" => Some(timer.as_str().into()),
                "step" => Some((*step).into()),
                "late" => Some((*late_ms).into()),
                _ => None,
            },
            Payload::Custom { fields, .. } => fields.get(name).cloned(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
