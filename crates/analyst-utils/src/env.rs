//! Typed environment-variable lookup
//!
//! Configuration reads go through an [`EnvSource`] so tests can supply a
//! map instead of mutating the process environment.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Environment lookup failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// A required variable is unset or blank
    #[error("{0} is not set")]
    Missing(String),

    /// A variable is set but does not parse
    #[error("{var}='{value}' is invalid: {reason}")]
    Invalid {
        /// Variable name
        var: String,
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Source of environment variables
///
/// Blank values count as unset.
pub struct EnvSource<F> {
    lookup: F,
}

impl EnvSource<fn(&str) -> Option<String>> {
    /// The process environment
    pub fn process() -> Self {
        fn read(key: &str) -> Option<String> {
            std::env::var(key).ok()
        }
        Self { lookup: read }
    }
}

impl EnvSource<Box<dyn Fn(&str) -> Option<String> + Send + Sync>> {
    /// A fixed set of variables
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            lookup: Box::new(move |key| map.get(key).cloned()),
        }
    }
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Wrap any lookup function
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Raw value, trimmed; blank counts as unset
    pub fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Required raw value
    pub fn require(&self, key: &str) -> Result<String, EnvError> {
        self.var(key).ok_or_else(|| EnvError::Missing(key.to_string()))
    }

    /// Parsed value, or `default` when unset
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, EnvError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.var(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| EnvError::Invalid {
                var: key.to_string(),
                reason: e.to_string(),
                value: raw,
            }),
        }
    }

    /// Boolean flag: 1/true/yes/on and 0/false/no/off, any case
    pub fn flag(&self, key: &str, default: bool) -> Result<bool, EnvError> {
        let Some(raw) = self.var(key) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(EnvError::Invalid {
                var: key.to_string(),
                value: raw,
                reason: "expected true or false".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_unset() {
        let env = EnvSource::from_pairs([("A", "  "), ("B", " x ")]);
        assert_eq!(env.var("A"), None);
        assert_eq!(env.var("B").as_deref(), Some("x"));
        assert_eq!(env.require("A"), Err(EnvError::Missing("A".into())));
    }

    #[test]
    fn test_parse_or() {
        let env = EnvSource::from_pairs([("N", "25"), ("BAD", "ten")]);
        assert_eq!(env.parse_or("N", 10_usize), Ok(25));
        assert_eq!(env.parse_or("MISSING", 10_usize), Ok(10));

        let err = env.parse_or("BAD", 10_usize).unwrap_err();
        assert!(matches!(err, EnvError::Invalid { ref var, ref value, .. } if var == "BAD" && value == "ten"));
        assert!(err.to_string().starts_with("BAD='ten' is invalid"));
    }

    #[test]
    fn test_flags() {
        let env = EnvSource::from_pairs([("ON", "Yes"), ("OFF", "0"), ("ODD", "maybe")]);
        assert_eq!(env.flag("ON", false), Ok(true));
        assert_eq!(env.flag("OFF", true), Ok(false));
        assert_eq!(env.flag("UNSET", true), Ok(true));
        assert!(env.flag("ODD", false).is_err());
    }

    #[test]
    fn test_custom_lookup() {
        let env = EnvSource::new(|key: &str| (key == "K").then(|| "v".to_string()));
        assert_eq!(env.var("K").as_deref(), Some("v"));
    }
}
