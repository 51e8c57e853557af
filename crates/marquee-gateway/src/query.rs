// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-string readers with defaults. Missing or empty keys yield the default.

use std::collections::HashMap;

use marquee_core::Validator;

pub type QueryParams = HashMap<String, String>;

fn present<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|s| !s.is_empty())
}

pub fn read_string(params: &QueryParams, key: &str, default: &str) -> String {
    present(params, key).unwrap_or(default).to_string()
}

/// Splits a comma-separated value.
pub fn read_csv(params: &QueryParams, key: &str, default: &[&str]) -> Vec<String> {
    match present(params, key) {
        Some(raw) => raw.split(',').map(str::to_string).collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// Parses an integer, recording "must be an integer value" under `key` and
/// returning `default` when the value does not parse.
pub fn read_int(params: &QueryParams, key: &str, default: i64, v: &mut Validator) -> i64 {
    let Some(raw) = present(params, key) else {
        return default;
    };
    match raw.parse() {
        Ok(n) => n,
        Err(_) => {
            v.add_error(key, "must be an integer value");
            default
        }
    }
}
