//! Merge settings for the command line.
//!
//! Resolution order (highest priority first):
//! 1. Command-line flags
//! 2. The `--config` TOML file
//! 3. Compiled defaults

use std::fs;
use std::path::Path;

use anyhow::Context;
use defmerge_merge::MergeConfig;

use crate::cli::ConfigOverrides;

pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> anyhow::Result<MergeConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => MergeConfig::default(),
    };
    apply_overrides(&mut config, overrides);
    Ok(config)
}

fn apply_overrides(config: &mut MergeConfig, overrides: &ConfigOverrides) {
    if let Some(region) = &overrides.region {
        config.region = region.clone();
    }
    if let Some(account_id) = &overrides.account_id {
        config.account_id = account_id.clone();
    }
    if let Some(namespace) = &overrides.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(user_name) = &overrides.user_name {
        config.user_name = user_name.clone();
    }
    if let Some(probes) = overrides.max_alias_probes {
        config.max_alias_probes = probes;
    }
}
