//! Phone number lists.
//!
//! The backend stores phone numbers as a JSON-encoded string, and depending
//! on the endpoint either echoes that string or a decoded list. Both shapes
//! deserialize into the same ordered `PhoneNumbers`.

use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize};

/// Ordered list of phone numbers, normalized from either wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumbers(Vec<String>);

impl PhoneNumbers {
    pub fn new(numbers: Vec<String>) -> Self {
        Self(numbers)
    }

    /// Decode the JSON-encoded form, e.g. `["555-1234","555-5678"]`.
    /// An empty or blank string is an empty list.
    pub fn from_encoded(encoded: &str) -> Result<Self, serde_json::Error> {
        if encoded.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(encoded).map(Self)
    }

    /// The JSON-encoded form used in multipart bodies.
    pub fn to_encoded(&self) -> String {
        serde_json::Value::from(self.0.clone()).to_string()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl Deref for PhoneNumbers {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for PhoneNumbers {
    fn from(numbers: Vec<String>) -> Self {
        Self(numbers)
    }
}

impl<'de> Deserialize<'de> for PhoneNumbers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            List(Vec<String>),
            Encoded(String),
        }

        match Option::<Wire>::deserialize(deserializer)? {
            None => Ok(Self::default()),
            Some(Wire::List(numbers)) => Ok(Self(numbers)),
            Some(Wire::Encoded(encoded)) => {
                Self::from_encoded(&encoded).map_err(serde::de::Error::custom)
            }
        }
    }
}

/// Drop blank entries and surrounding whitespace before sending.
pub fn clean(numbers: &[String]) -> Vec<String> {
    numbers
        .iter()
        .map(|number| number.trim())
        .filter(|number| !number.is_empty())
        .map(str::to_string)
        .collect()
}
