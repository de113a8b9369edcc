//! The seam between the enforcement pipeline and the policy engine
//!
//! The pipeline never evaluates matchers or walks role graphs itself. It
//! talks to a [`PolicyEngine`], and the production implementation,
//! [`CasbinEngine`], delegates everything to casbin-rs.

use crate::params::RequestValue;
use casbin::{CoreApi, DefaultModel, Enforcer, FileAdapter, MgmtApi, RbacApi};
use rhai::Dynamic;
use std::path::Path;
use thiserror::Error;

/// casbin-rs version resolved for this build, or `unknown` without a lockfile.
pub const ENGINE_VERSION: &str = env!("CASBIN_CLI_ENGINE_VERSION");

/// Errors raised while building or querying the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Anything casbin itself reports: bad model, unreadable policy,
    /// request that does not fit the request definition...
    #[error(transparent)]
    Casbin(#[from] casbin::Error),

    /// A request value could not be converted for the matcher
    #[error("cannot pass request value to the engine: {0}")]
    Conversion(String),

    #[error("role lookup failed: {0}")]
    RoleLookup(String),
}

/// What the enforcement pipeline needs from a policy engine
pub trait PolicyEngine {
    /// Decide a single request
    fn enforce(&self, request: &[RequestValue]) -> Result<bool, EngineError>;

    /// All `p` rules currently loaded, in file order
    fn policy(&self) -> Vec<Vec<String>>;

    /// Roles directly or transitively held by `subject`
    ///
    /// casbin-rs answers this infallibly, so [`CasbinEngine`] never returns
    /// an error here and the `"Policy matched"` explanation only appears
    /// with engines whose role lookup can fail.
    fn roles_for_user(&mut self, subject: &str) -> Result<Vec<String>, EngineError>;
}

/// casbin-rs enforcer bound to one model file and one policy file
pub struct CasbinEngine {
    enforcer: Enforcer,
}

impl CasbinEngine {
    /// Load the model and policy from disk
    ///
    /// Both files are read in full while constructing the enforcer; no
    /// handle outlives this call.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Casbin`] when either file cannot be read or the
    /// model cannot be parsed.
    pub async fn load(model: &Path, policy: &Path) -> Result<Self, EngineError> {
        let model = DefaultModel::from_file(model).await?;
        let adapter = FileAdapter::new(policy.to_path_buf());
        let enforcer = Enforcer::new(model, adapter).await?;
        Ok(CasbinEngine { enforcer })
    }
}

impl PolicyEngine for CasbinEngine {
    /// Plain tokens become matcher strings and attribute records become
    /// maps, so `r.sub.Age` resolves. Any number of values is passed on;
    /// casbin checks it against the request definition.
    fn enforce(&self, request: &[RequestValue]) -> Result<bool, EngineError> {
        let values = request
            .iter()
            .map(|value| {
                rhai::serde::to_dynamic(value).map_err(|e| EngineError::Conversion(e.to_string()))
            })
            .collect::<Result<Vec<Dynamic>, _>>()?;

        Ok(self.enforcer.enforce(values)?)
    }

    fn policy(&self) -> Vec<Vec<String>> {
        self.enforcer.get_policy()
    }

    fn roles_for_user(&mut self, subject: &str) -> Result<Vec<String>, EngineError> {
        Ok(self.enforcer.get_roles_for_user(subject, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::encode;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn data(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("data")
            .join(name)
    }

    #[tokio::test]
    async fn test_load_and_enforce_basic_model() {
        let engine = CasbinEngine::load(&data("basic_model.conf"), &data("basic_policy.csv"))
            .await
            .unwrap();

        assert!(engine.enforce(&encode(&["alice", "data1", "read"])).unwrap());
        assert!(!engine.enforce(&encode(&["alice", "data1", "write"])).unwrap());
        assert_eq!(engine.policy().len(), 2);
    }

    #[tokio::test]
    async fn test_seven_field_request() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("wide_model.conf");
        let policy = dir.path().join("wide_policy.csv");
        std::fs::write(
            &model,
            "[request_definition]\nr = a, b, c, d, e, f, g\n\n\
             [policy_definition]\np = a, b, c, d, e, f, g\n\n\
             [policy_effect]\ne = some(where (p.eft == allow))\n\n\
             [matchers]\nm = r.a == p.a && r.b == p.b && r.c == p.c && r.d == p.d \
             && r.e == p.e && r.f == p.f && r.g == p.g\n",
        )
        .unwrap();
        std::fs::write(&policy, "p, 1, 2, 3, 4, 5, 6, 7\n").unwrap();

        let engine = CasbinEngine::load(&model, &policy).await.unwrap();

        let allowed = encode(&["1", "2", "3", "4", "5", "6", "7"]);
        assert!(engine.enforce(&allowed).unwrap());
        let denied = encode(&["1", "2", "3", "4", "5", "6", "8"]);
        assert!(!engine.enforce(&denied).unwrap());
    }

    #[tokio::test]
    async fn test_attribute_record_reaches_matcher() {
        let engine = CasbinEngine::load(
            &data("abac_rule_model.conf"),
            &data("abac_rule_policy.csv"),
        )
        .await
        .unwrap();

        assert!(engine.enforce(&encode(&[r#"{"Age":30}"#, "/data1", "read"])).unwrap());
        assert!(!engine.enforce(&encode(&[r#"{"Age":15}"#, "/data1", "read"])).unwrap());
    }

    #[tokio::test]
    async fn test_missing_model_fails_to_load() {
        let result = CasbinEngine::load(&data("absent.conf"), &data("basic_policy.csv")).await;
        assert!(result.is_err());
    }
}
