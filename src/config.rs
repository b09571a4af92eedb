use std::env;

use anyhow::anyhow;
use clap::ValueEnum;

use crate::schedule::OvernightPolicy;

pub const OVERNIGHT_VAR: &str = "PONTIAPP_OVERNIGHT";
pub const STRICT_VAR: &str = "PONTIAPP_STRICT";

/// Environment defaults; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub overnight: OvernightPolicy,
    pub strict: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overnight = match lookup(OVERNIGHT_VAR) {
            Some(raw) => OvernightPolicy::from_str(raw.trim(), true)
                .map_err(|err| anyhow!("{OVERNIGHT_VAR}: {err}"))?,
            None => OvernightPolicy::default(),
        };
        let strict = lookup(STRICT_VAR)
            .map(|raw| matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self { overnight, strict })
    }

    pub fn with_overrides(mut self, overnight: Option<OvernightPolicy>, strict: bool) -> Self {
        if let Some(overnight) = overnight {
            self.overnight = overnight;
        }
        self.strict |= strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.overnight, OvernightPolicy::NextDay);
    }

    #[test]
    fn reads_environment_values() {
        let config =
            Config::from_lookup(lookup(&[(OVERNIGHT_VAR, "same-day"), (STRICT_VAR, "TRUE")]))
                .unwrap();
        assert_eq!(config.overnight, OvernightPolicy::SameDay);
        assert!(config.strict);
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = Config::from_lookup(lookup(&[(OVERNIGHT_VAR, "wrap")])).unwrap_err();
        assert!(err.to_string().contains(OVERNIGHT_VAR));
    }

    #[test]
    fn flags_override_environment() {
        let config = Config {
            overnight: OvernightPolicy::SameDay,
            strict: false,
        }
        .with_overrides(Some(OvernightPolicy::NextDay), true);
        assert_eq!(config.overnight, OvernightPolicy::NextDay);
        assert!(config.strict);
    }
}
