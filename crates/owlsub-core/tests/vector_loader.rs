//! JSON test vector loader shared by decoder tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    /// Clock value the decoder is driven with.
    pub now: DateTime<Utc>,
    /// Envelope as structured JSON.
    #[serde(default)]
    pub frame: Option<serde_json::Value>,
    /// Verbatim frame text, for inputs that are not valid JSON.
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub reason: String,
}

impl TestVector {
    pub fn bytes(&self) -> Vec<u8> {
        match (&self.raw, &self.frame) {
            (Some(raw), _) => raw.as_bytes().to_vec(),
            (None, Some(frame)) => serde_json::to_vec(frame).expect("frame re-encode"),
            (None, None) => panic!("vector {} has neither raw nor frame", self.description),
        }
    }
}

pub fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
