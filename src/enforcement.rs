//! Enforcement orchestration
//!
//! A run walks one request through these stages:
//!
//! ```text
//! Start -> FilesChecked -> ConfigValidated -> ParametersBuilt
//!       -> Enforced -> (ExplanationBuilt) -> Done
//! ```
//!
//! Any stage may fail instead. Internally that is a
//! `Result<EnforcementResult, FailureReason>`; at the boundary every failure
//! is reported on stderr and collapsed into the same
//! `{"allow":false,"explain":[]}` shape as a genuine denial.

use crate::engine::{CasbinEngine, EngineError, PolicyEngine};
use crate::params::{self, EnforcementRequest};
use crate::response::EnforcementResult;
use crate::validation::{self, FileKind};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Explanation used when the role lookup itself fails.
pub const FALLBACK_EXPLANATION: &str = "Policy matched";

/// Which command is being served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementMode {
    /// Decision only; `explain` is always empty
    Enforce,
    /// Decision plus explanation when access is allowed
    EnforceEx,
}

impl EnforcementMode {
    pub fn wants_explanation(self) -> bool {
        matches!(self, EnforcementMode::EnforceEx)
    }
}

/// Why a run ended without a decision
#[derive(Debug, Error)]
pub enum FailureReason {
    /// Model or policy path is not a readable file
    #[error("{kind} file not found: {path}")]
    NotFound { kind: FileKind, path: String },

    /// A file failed pre-flight validation
    #[error("{0}")]
    ConfigInvalid(String),

    /// Empty argument list
    #[error("No enforcement parameters provided")]
    NoParameters,

    /// The engine could not be built or queried
    #[error(transparent)]
    EngineFailure(#[from] EngineError),
}

/// Evaluate a request and never fail
///
/// This is the boundary used by the CLI. Failures are logged to stderr as
/// `Error during enforcement: <reason>` and reported as a denial.
///
/// # Arguments
///
/// * `model` - Path to the Casbin model (`.conf`)
/// * `policy` - Path to the CSV policy
/// * `tokens` - Raw request tokens, e.g. `["alice", "data1", "read"]`
/// * `mode` - Whether an explanation is wanted
pub async fn run<S: AsRef<str>>(
    model: &Path,
    policy: &Path,
    tokens: &[S],
    mode: EnforcementMode,
) -> EnforcementResult {
    match try_run(model, policy, tokens, mode).await {
        Ok(result) => result,
        Err(reason) => {
            eprintln!("Error during enforcement: {}", reason);
            EnforcementResult::denied()
        }
    }
}

/// Evaluate a request, keeping the failure reason
///
/// # Errors
///
/// * [`FailureReason::NotFound`] - a path is missing (model checked first)
/// * [`FailureReason::ConfigInvalid`] - a file failed validation
/// * [`FailureReason::NoParameters`] - `tokens` is empty
/// * [`FailureReason::EngineFailure`] - casbin rejected the model, policy
///   or request
pub async fn try_run<S: AsRef<str>>(
    model: &Path,
    policy: &Path,
    tokens: &[S],
    mode: EnforcementMode,
) -> Result<EnforcementResult, FailureReason> {
    // Step 1: both files must exist
    require_file(model, FileKind::Model)?;
    require_file(policy, FileKind::Policy)?;
    debug!(model = %model.display(), policy = %policy.display(), "files checked");

    // Step 2: syntactic pre-flight, model first
    let outcome = validation::validate_model(model);
    if !outcome.is_valid {
        return Err(FailureReason::ConfigInvalid(outcome.message));
    }
    let outcome = validation::validate_policy(policy);
    if !outcome.is_valid {
        return Err(FailureReason::ConfigInvalid(outcome.message));
    }
    debug!(rules = outcome.rules, "config validated");

    // Step 3: there has to be something to ask about
    if tokens.is_empty() {
        return Err(FailureReason::NoParameters);
    }

    // Step 4: the engine reads both files while it is built
    let mut engine = CasbinEngine::load(model, policy).await?;
    debug!(rules = engine.policy().len(), "engine loaded");

    // Steps 5-8
    let request = params::encode(tokens);
    debug!(?request, "parameters built");
    decide(&mut engine, &request, mode)
}

/// Run the decision and, if wanted, the explanation against a loaded engine
pub fn decide<E: PolicyEngine>(
    engine: &mut E,
    request: &EnforcementRequest,
    mode: EnforcementMode,
) -> Result<EnforcementResult, FailureReason> {
    let allow = engine.enforce(request)?;
    debug!(allow, "enforced");

    let explain = if allow && mode.wants_explanation() {
        let lines = explain(engine, request);
        debug!(explain = ?lines, "explanation built");
        lines
    } else {
        Vec::new()
    };

    Ok(EnforcementResult { allow, explain })
}

/// Best-effort annotation of an allow decision
///
/// This does not identify the rule that fired. In order:
///
/// 1. If the first request value holds roles, report
///    `[first_role, second_value, third_value]`.
/// 2. Otherwise echo the first three request values.
/// 3. If the role lookup fails, report [`FALLBACK_EXPLANATION`].
///
/// Missing positions are reported as empty strings in case 1. casbin-rs
/// role lookups never fail, so case 3 does not occur with [`CasbinEngine`].
pub fn explain<E: PolicyEngine>(engine: &mut E, request: &EnforcementRequest) -> Vec<String> {
    let subject = request.first().map(|v| v.to_string()).unwrap_or_default();

    let roles = match engine.roles_for_user(&subject) {
        Ok(roles) => roles,
        Err(err) => {
            debug!(error = %err, "role lookup failed");
            return vec![FALLBACK_EXPLANATION.to_string()];
        }
    };

    let positional = |idx: usize| request.get(idx).map(|v| v.to_string()).unwrap_or_default();

    match roles.into_iter().next() {
        Some(role) => vec![role, positional(1), positional(2)],
        None => request.iter().take(3).map(|v| v.to_string()).collect(),
    }
}

fn require_file(path: &Path, kind: FileKind) -> Result<(), FailureReason> {
    if path.is_file() {
        Ok(())
    } else {
        Err(FailureReason::NotFound {
            kind,
            path: path.display().to_string(),
        })
    }
}
