//! # casbin-cli
//!
//! Evaluate Casbin access control decisions from the command line.
//!
//! The crate wraps a casbin-rs enforcer in a small, predictable pipeline:
//! - Pre-flight validation of the model (`.conf`) and policy (`.csv`) files
//! - Conversion of free-form CLI tokens into request values, including a
//!   one-field attribute syntax (`{"Age":30}`) for ABAC models
//! - A single enforcement call per run, with an optional explanation
//! - A fixed one-line JSON result: `{"allow":<bool>,"explain":[...]}`
//!
//! Failures of any kind (missing files, invalid config, no parameters, engine
//! errors) are reported on stderr and produce the same output as a denial.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use casbin_cli::{run, EnforcementMode};
//! use std::path::Path;
//!
//! # async fn demo() {
//! let result = run(
//!     Path::new("basic_model.conf"),
//!     Path::new("basic_policy.csv"),
//!     &["alice", "data1", "read"],
//!     EnforcementMode::EnforceEx,
//! )
//! .await;
//!
//! println!("{}", result.to_json().unwrap());
//! # }
//! ```

pub mod engine;
pub mod enforcement;
pub mod params;
pub mod response;
pub mod validation;

pub use engine::{CasbinEngine, EngineError, PolicyEngine};
pub use enforcement::{run, try_run, EnforcementMode, FailureReason};
pub use params::{encode, AttributeRecord, AttributeValue, EnforcementRequest, RequestValue};
pub use response::EnforcementResult;
pub use validation::{validate_model, validate_policy, ValidationOutcome};
