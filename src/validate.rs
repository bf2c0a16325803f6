use serde_json::Value;

/// Outcome of coercing one payload field into a measurement.
///
/// Devices in the field send numbers however their firmware happens to
/// format them, so numeric strings are accepted alongside JSON numbers.
/// Everything else is `Invalid`; a missing or `null` field is `Absent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Num(f64),
    Absent,
    Invalid,
}

impl Coerced {
    /// Required-field view: only a finite number is acceptable.
    pub fn require(self) -> Option<f64> {
        match self {
            Coerced::Num(n) => Some(n),
            _ => None,
        }
    }

    /// Optional-field view: an invalid value is dropped, never an error.
    pub fn optional(self) -> Option<f64> {
        self.require()
    }
}

/// Coerce a payload field into a finite number.
///
/// Strings are trimmed before parsing; empty and non-numeric strings,
/// booleans, arrays, objects, and non-finite results are all `Invalid`.
pub fn coerce(value: Option<&Value>) -> Coerced {
    let Some(value) = value else {
        return Coerced::Absent;
    };
    match value {
        Value::Null => Coerced::Absent,
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Coerced::Num(f),
            _ => Coerced::Invalid,
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Coerced::Invalid;
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Coerced::Num(f),
                _ => Coerced::Invalid,
            }
        }
        _ => Coerced::Invalid,
    }
}
