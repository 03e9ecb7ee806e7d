//! # Settings Store
//!
//! Flat key/value table holding generation parameters, persisted as a TOML
//! document. Noise parameters are nested tables (written inline or as
//! sections, both load):
//!
//! ```toml
//! seed = 1234
//! mg_name = "v7"
//! mgv7_spflags = "mountains, ridges, nofloatlands, caverns"
//! mgv7_np_terrain_base = { offset = 4.0, scale = 70.0, spread = { x = 600.0, y = 600.0, z = 600.0 }, seed = 82341, octaves = 5, persistence = 0.6 }
//! ```
//!
//! Readers return `Ok(None)` for a missing key so callers can fall back to
//! their documented default; a present key of the wrong type is an error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use toml::Value;

use crate::error::{MapgenError, MapgenResult};
use crate::noise::NoiseParams;

/// Generation settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    /// Key to value, sorted so saved files are stable.
    values: BTreeMap<String, Value>,
}

impl Settings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document. Only top-level keys are read.
    ///
    /// # Errors
    ///
    /// Returns [`MapgenError::TomlParse`] on malformed input.
    pub fn from_toml_str(text: &str) -> MapgenResult<Self> {
        let values: BTreeMap<String, Value> = toml::from_str(text)?;
        Ok(Self { values })
    }

    /// Renders the store as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`MapgenError::TomlWrite`] if a value cannot be represented.
    pub fn to_toml_string(&self) -> MapgenResult<String> {
        Ok(toml::to_string(&self.values)?)
    }

    /// Loads a settings file.
    ///
    /// # Errors
    ///
    /// I/O or parse failure.
    pub fn load(path: impl AsRef<Path>) -> MapgenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Writes the store to a file.
    ///
    /// # Errors
    ///
    /// I/O or serialization failure.
    pub fn save(&self, path: impl AsRef<Path>) -> MapgenResult<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// True if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Raw value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Stores any TOML-convertible value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_owned(), value.into());
    }

    /// Removes `key`, returning its old value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Iterates keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn wrong_type(key: &str, expected: &str, found: &Value) -> MapgenError {
        MapgenError::InvalidSetting {
            key: key.to_owned(),
            reason: format!("expected {expected}, found {}", found.type_str()),
        }
    }

    /// Reads a string.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] if the value is not a string.
    pub fn get_str(&self, key: &str) -> MapgenResult<Option<&str>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(Self::wrong_type(key, "string", other)),
        }
    }

    /// Reads an integer.
    ///
    /// Integers stored as decimal strings are accepted as well.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] if the value is not an integer.
    pub fn get_i64(&self, key: &str) -> MapgenResult<Option<i64>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Integer(v)) => Ok(Some(*v)),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Self::wrong_type(key, "integer", &Value::String(s.clone()))),
            Some(other) => Err(Self::wrong_type(key, "integer", other)),
        }
    }

    /// Reads an integer that must fit an `i16`.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] on a wrong type or an out-of-range value.
    pub fn get_i16(&self, key: &str) -> MapgenResult<Option<i16>> {
        self.get_i64(key)?
            .map(|v| {
                i16::try_from(v).map_err(|_| MapgenError::InvalidSetting {
                    key: key.to_owned(),
                    reason: format!("{v} does not fit in i16"),
                })
            })
            .transpose()
    }

    /// Reads an unsigned 16-bit integer.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] on a wrong type or an out-of-range value.
    pub fn get_u16(&self, key: &str) -> MapgenResult<Option<u16>> {
        self.get_i64(key)?
            .map(|v| {
                u16::try_from(v).map_err(|_| MapgenError::InvalidSetting {
                    key: key.to_owned(),
                    reason: format!("{v} does not fit in u16"),
                })
            })
            .transpose()
    }

    /// Reads a 64-bit seed.
    ///
    /// TOML integers are signed, so seeds above `i64::MAX` are stored as
    /// decimal strings; both forms are accepted. Negative integers are not.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] if the value is neither, or negative.
    pub fn get_u64(&self, key: &str) -> MapgenResult<Option<u64>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Integer(v)) => u64::try_from(*v).map(Some).map_err(|_| MapgenError::InvalidSetting {
                key: key.to_owned(),
                reason: format!("{v} is negative"),
            }),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Self::wrong_type(key, "unsigned integer", &Value::String(s.clone()))),
            Some(other) => Err(Self::wrong_type(key, "unsigned integer", other)),
        }
    }

    /// Stores a 64-bit seed, as an integer when it fits.
    pub fn set_u64(&mut self, key: &str, value: u64) {
        match i64::try_from(value) {
            Ok(v) => self.set(key, v),
            Err(_) => self.set(key, value.to_string()),
        }
    }

    /// Reads a float. Integers are widened.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] if the value is not numeric.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn get_f32(&self, key: &str) -> MapgenResult<Option<f32>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Float(v)) => Ok(Some(*v as f32)),
            Some(Value::Integer(v)) => Ok(Some(*v as f32)),
            Some(other) => Err(Self::wrong_type(key, "float", other)),
        }
    }

    /// Stores a float.
    pub fn set_f32(&mut self, key: &str, value: f32) {
        self.set(key, f64::from(value));
    }

    /// Reads a boolean.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] if the value is not a boolean.
    pub fn get_bool(&self, key: &str) -> MapgenResult<Option<bool>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Boolean(v)) => Ok(Some(*v)),
            Some(other) => Err(Self::wrong_type(key, "boolean", other)),
        }
    }

    /// Deserializes any structured value.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] if the value has the wrong shape.
    pub fn get_struct<T: DeserializeOwned>(&self, key: &str) -> MapgenResult<Option<T>> {
        self.values
            .get(key)
            .map(|v| {
                v.clone().try_into().map_err(|e: toml::de::Error| MapgenError::InvalidSetting {
                    key: key.to_owned(),
                    reason: e.message().to_owned(),
                })
            })
            .transpose()
    }

    /// Serializes any structured value.
    ///
    /// # Errors
    ///
    /// [`MapgenError::TomlWrite`] if it has no TOML form.
    pub fn set_struct<T: Serialize>(&mut self, key: &str, value: &T) -> MapgenResult<()> {
        let v = Value::try_from(value)?;
        self.values.insert(key.to_owned(), v);
        Ok(())
    }

    /// Reads and validates noise parameters.
    ///
    /// # Errors
    ///
    /// [`MapgenError::InvalidSetting`] for a malformed table,
    /// [`MapgenError::InvalidNoiseParams`] for values the sampler cannot use.
    pub fn get_noise_params(&self, key: &str) -> MapgenResult<Option<NoiseParams>> {
        let np: Option<NoiseParams> = self.get_struct(key)?;
        if let Some(np) = &np {
            np.validate(key)?;
        }
        Ok(np)
    }

    /// Stores noise parameters as an inline table.
    ///
    /// # Errors
    ///
    /// [`MapgenError::TomlWrite`] on serialization failure.
    pub fn set_noise_params(&mut self, key: &str, np: &NoiseParams) -> MapgenResult<()> {
        self.set_struct(key, np)
    }
}
