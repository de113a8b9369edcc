//! The JSON output contract
//!
//! Every invocation prints exactly one line:
//!
//! ```json
//! {"allow":true,"explain":["admin","data1","read"]}
//! ```
//!
//! `allow` always comes first, and `explain` is always present as an array.

use serde::Serialize;

/// Decision reported for a single enforcement run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnforcementResult {
    /// Whether access is granted
    pub allow: bool,
    /// Best-effort annotation of an allow decision; empty otherwise
    pub explain: Vec<String>,
}

impl EnforcementResult {
    /// The shape reported for a denial and for every failure
    pub fn denied() -> Self {
        EnforcementResult::default()
    }

    /// Render as a single compact JSON line (no trailing newline)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use casbin_cli::response::EnforcementResult;
    ///
    /// let json = EnforcementResult::denied().to_json().unwrap();
    /// assert_eq!(json, r#"{"allow":false,"explain":[]}"#);
    /// ```
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
