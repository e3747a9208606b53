//! Popups returned by identify operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A field value as stored on a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PopupValue {
    Null,
    Integer(i64),
    Double(f64),
    Text(String),
}

impl fmt::Display for PopupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Double(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            Self::Double(v) => write!(f, "{v:.2}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// One displayed field of a popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupField {
    /// Attribute name on the feature.
    pub id: String,
    /// Human readable label; empty means "use the id".
    #[serde(default)]
    pub label: String,
    pub value: PopupValue,
}

/// The popup of one identified feature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Popup {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<PopupField>,
}

impl Popup {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field append.
    pub fn with_field(mut self, id: impl Into<String>, label: impl Into<String>, value: PopupValue) -> Self {
        self.fields.push(PopupField {
            id: id.into(),
            label: label.into(),
            value,
        });
        self
    }
}

/// Popups found on one layer by an identify operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentifyLayerResult {
    pub layer_name: String,
    pub popups: Vec<Popup>,
}
