use serde::{Deserialize, Serialize};
use std::fmt;

/// A single attribute value carried by a node.
///
/// Attributes are flat: nested lists or maps are not representable, which keeps
/// the canonical projection a simple `name="value"` rendering.
///
/// # Examples
///
/// ```rust
/// use uix::ast::value::Scalar;
/// let s = Scalar::from("primary");
/// assert_eq!(s.type_name(), "String");
/// assert_eq!(s.to_string(), "primary");
/// assert_eq!(Scalar::Number(2.0).to_string(), "2");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Scalar {
    /// Returns the type name of the value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "Null",
            Scalar::Bool(_) => "Bool",
            Scalar::Number(_) => "Number",
            Scalar::String(_) => "String",
        }
    }

    /// True only for the boolean `true`; such attributes project as bare names.
    pub fn is_true(&self) -> bool {
        matches!(self, Scalar::Bool(true))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value into a scalar. Arrays and objects have no scalar
    /// form and yield `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uix::ast::value::Scalar;
    /// use serde_json::json;
    /// assert_eq!(Scalar::from_json(&json!(true)), Some(Scalar::Bool(true)));
    /// assert_eq!(Scalar::from_json(&json!([1, 2])), None);
    /// ```
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Scalar::Null),
            serde_json::Value::Bool(b) => Some(Scalar::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Scalar::Number),
            serde_json::Value::String(s) => Some(Scalar::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_render_in_shortest_form() {
        assert_eq!(Scalar::Number(1.0).to_string(), "1");
        assert_eq!(Scalar::Number(1.5).to_string(), "1.5");
        assert_eq!(Scalar::Number(-3.0).to_string(), "-3");
    }

    #[test]
    fn untagged_deserialization_picks_the_natural_variant() {
        let parsed: Vec<Scalar> = serde_json::from_value(json!([null, false, 4, "x"])).unwrap();
        assert_eq!(
            parsed,
            vec![
                Scalar::Null,
                Scalar::Bool(false),
                Scalar::Number(4.0),
                Scalar::String("x".to_string())
            ]
        );
    }

    #[test]
    fn only_boolean_true_is_true() {
        assert!(Scalar::Bool(true).is_true());
        assert!(!Scalar::String("true".to_string()).is_true());
        assert!(!Scalar::Number(1.0).is_true());
    }
}
