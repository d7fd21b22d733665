//! # Parameter Bag
//!
//! Manipulators are invoked with free-form `String -> String` parameters.
//! Each manipulator turns the bag into its own typed config once, up front.
//! Optional numbers are parsed leniently: absent or unparsable values fall
//! back to the documented default (unparsable ones are logged).

use std::collections::HashMap;

use flatland_core::{FlatError, FlatResult};

use crate::random::TerrainRng;

/// String parameters of one manipulator call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    /// Empty parameter bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    /// Raw value, trimmed; blank counts as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// True if a non-blank value exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = raw, "unparsable parameter, using default");
                default
            }),
        }
    }

    /// Float value or `default`.
    #[must_use]
    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        let value = self.parse_or(key, default);
        if value.is_finite() {
            value
        } else {
            default
        }
    }

    /// Float value clamped to `[min, max]`.
    #[must_use]
    pub fn f64_clamped(&self, key: &str, default: f64, min: f64, max: f64) -> f64 {
        self.f64_or(key, default).clamp(min, max)
    }

    /// Integer value or `default`. Accepts decimal input by truncation.
    #[must_use]
    pub fn i32_or(&self, key: &str, default: i32) -> i32 {
        match self.get(key) {
            None => default,
            Some(raw) => raw.parse::<i32>().unwrap_or_else(|_| {
                let float = self.f64_or(key, f64::from(default));
                float.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
            }),
        }
    }

    /// Integer value clamped to `[min, max]`.
    #[must_use]
    pub fn i32_clamped(&self, key: &str, default: i32, min: i32, max: i32) -> i32 {
        self.i32_or(key, default).clamp(min, max)
    }

    /// Level value clamped to a byte.
    #[must_use]
    pub fn level_or(&self, key: &str, default: u8) -> u8 {
        self.i32_clamped(key, i32::from(default), 0, 255) as u8
    }

    /// Boolean value; accepts `true/false/yes/no/1/0/on/off`.
    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(str::to_ascii_lowercase).as_deref() {
            None => default,
            Some("true" | "yes" | "1" | "on") => true,
            Some("false" | "no" | "0" | "off") => false,
            Some(other) => {
                tracing::warn!(key, value = other, "unparsable boolean parameter, using default");
                default
            }
        }
    }

    /// Lower-cased string value or `default`.
    #[must_use]
    pub fn choice_or(&self, key: &str, default: &str) -> String {
        self.get(key).map_or_else(|| default.to_string(), str::to_ascii_lowercase)
    }

    /// Required byte value.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidArgument`] if absent, unparsable or not in `0..=255`.
    pub fn required_u8(&self, key: &str) -> FlatResult<u8> {
        let raw = self
            .get(key)
            .ok_or_else(|| FlatError::invalid(format!("parameter '{key}' is required")))?;
        raw.parse::<u8>()
            .map_err(|_| FlatError::invalid(format!("parameter '{key}' must be in 0..=255, got '{raw}'")))
    }

    /// Seeded generator from the `seed` parameter, or a clock seed.
    #[must_use]
    pub fn rng(&self) -> TerrainRng {
        let seed = self
            .get("seed")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(TerrainRng::time_seed);
        TerrainRng::new(seed)
    }

    /// Seed value for noise tables: the `seed` parameter or `default`.
    #[must_use]
    pub fn seed_or(&self, default: u64) -> u64 {
        self.get("seed").and_then(|s| s.parse().ok()).unwrap_or(default)
    }

    /// Sub-bag of keys prefixed with `"{prefix}."`, prefix stripped.
    #[must_use]
    pub fn scoped(&self, prefix: &str) -> Self {
        let head = format!("{prefix}.");
        let values = self
            .values
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(&head).map(|rest| (rest.to_string(), v.clone())))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { values }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl From<HashMap<String, String>> for Params {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_numbers() {
        let params = Params::new()
            .with("a", "12")
            .with("b", "abc")
            .with("c", " 7.9 ")
            .with("d", "NaN")
            .with("e", "");
        assert_eq!(params.i32_or("a", 0), 12);
        assert_eq!(params.i32_or("b", 3), 3);
        assert_eq!(params.i32_or("c", 0), 7);
        assert_eq!(params.f64_or("d", 1.5), 1.5);
        assert_eq!(params.i32_or("e", 9), 9);
        assert_eq!(params.level_or("a", 0), 12);
        assert_eq!(Params::new().with("x", "900").level_or("x", 0), 255);
    }

    #[test]
    fn test_bool_and_choice() {
        let params = Params::new().with("flag", "Yes").with("mode", "RAISE");
        assert!(params.bool_or("flag", false));
        assert!(!params.bool_or("missing", false));
        assert_eq!(params.choice_or("mode", "set"), "raise");
        assert_eq!(params.choice_or("other", "set"), "set");
    }

    #[test]
    fn test_required_u8() {
        assert_eq!(Params::new().with("m", "4").required_u8("m").unwrap(), 4);
        assert!(Params::new().with("m", "256").required_u8("m").is_err());
        assert!(Params::new().required_u8("m").is_err());
    }

    #[test]
    fn test_scoped_strips_prefix() {
        let params = Params::new()
            .with("crater.depth", "9")
            .with("crater.", "x")
            .with("craterdepth", "1")
            .with("depth", "2");
        let scoped = params.scoped("crater");
        assert_eq!(scoped.get("depth"), Some("9"));
        assert_eq!(scoped, Params::new().with("depth", "9"));
    }
}
