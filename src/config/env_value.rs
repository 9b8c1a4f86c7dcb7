// ABOUTME: Config values that may come from the environment.
// ABOUTME: Either a literal string or `{ env: NAME, default: ... }`.

use crate::error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_resolves_to_itself() {
        let value: EnvValue = serde_yaml::from_str("deployments.json").unwrap();
        assert_eq!(value.resolve().unwrap(), "deployments.json");
    }

    #[test]
    fn env_reference_falls_back_to_default() {
        let value: EnvValue =
            serde_yaml::from_str("{ env: ROLLOUT_TEST_UNSET_VAR, default: fallback.json }")
                .unwrap();
        temp_env::with_var_unset("ROLLOUT_TEST_UNSET_VAR", || {
            assert_eq!(value.resolve().unwrap(), "fallback.json");
        });
    }

    #[test]
    fn env_reference_without_default_is_an_error() {
        let value = EnvValue::FromEnv {
            var: "ROLLOUT_TEST_MISSING_VAR".to_string(),
            default: None,
        };
        temp_env::with_var_unset("ROLLOUT_TEST_MISSING_VAR", || {
            assert!(matches!(value.resolve(), Err(Error::MissingEnvVar(_))));
        });
    }
}
