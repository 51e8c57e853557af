// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Movie runtime in whole minutes, carried on the wire as `"<n> mins"`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Returned when a runtime value is not of the form `"<int> mins"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

/// A movie runtime in minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(pub i32);

impl Runtime {
    pub fn minutes(self) -> i32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(' ').collect();
        match parts.as_slice() {
            [n, "mins"] => n.parse::<i32>().map(Runtime).map_err(|_| InvalidRuntimeFormat),
            _ => Err(InvalidRuntimeFormat),
        }
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RuntimeVisitor)
    }
}

struct RuntimeVisitor;

impl RuntimeVisitor {
    fn reject<E: de::Error>() -> E {
        E::custom(InvalidRuntimeFormat)
    }
}

// Any non-string JSON value is a format error rather than a type mismatch, so
// clients always see the same message for a bad runtime.
impl<'de> Visitor<'de> for RuntimeVisitor {
    type Value = Runtime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string of the form \"<n> mins\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Runtime, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Runtime, E> {
        Err(Self::reject())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Runtime, E> {
        Err(Self::reject())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Runtime, E> {
        Err(Self::reject())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Runtime, E> {
        Err(Self::reject())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn serializes_as_quoted_minutes() {
        let json = serde_json::to_string(&Runtime(135)).unwrap();
        assert_eq!(json, r#""135 mins""#);
    }

    #[test]
    fn parses_valid_runtime() {
        let rt: Runtime = serde_json::from_str(r#""146 mins""#).unwrap();
        assert_eq!(rt, Runtime(146));
        assert_eq!(rt.minutes(), 146);
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in [
            "146",
            "146 min",
            "146  mins",
            " 146 mins",
            "mins 146",
            "abc mins",
            "1.5 mins",
            "99999999999 mins",
            "",
        ] {
            assert_eq!(bad.parse::<Runtime>(), Err(InvalidRuntimeFormat), "{bad:?}");
        }
    }

    #[test]
    fn rejects_non_string_json() {
        let err = serde_json::from_str::<Runtime>("146").unwrap_err();
        assert!(err.to_string().starts_with("invalid runtime format"));
        assert!(serde_json::from_str::<Runtime>("true").is_err());
    }

    #[test]
    fn deserialize_error_message() {
        let err = serde_json::from_str::<Runtime>(r#""long""#).unwrap_err();
        assert!(err.to_string().starts_with("invalid runtime format"));
    }

    proptest! {
        #[test]
        fn round_trip(n in any::<i32>()) {
            let json = serde_json::to_string(&Runtime(n)).unwrap();
            let back: Runtime = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, Runtime(n));
        }

        #[test]
        fn text_without_mins_suffix_is_rejected(s in "[0-9]{1,5}( [a-z]{1,5})?") {
            prop_assume!(!s.ends_with(" mins"));
            prop_assert!(s.parse::<Runtime>().is_err());
        }
    }
}
