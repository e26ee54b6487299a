// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use validator::Validate;

use super::core::ScannerConfig;
use crate::signature::SignatureId;

pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = Self::detect_format(&path)?;

        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn with_format<P: AsRef<Path>>(config_path: P, format: ConfigFormat) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            format,
        }
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file format"))?;

        match extension {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(anyhow::anyhow!("Unsupported config file format: {}", extension)),
        }
    }

    /// Read, apply environment overrides, validate
    pub fn load_config(&self) -> Result<ScannerConfig> {
        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let mut config = self.parse(&content)?;
        apply_overrides(&mut config, |key| std::env::var(key).ok())?;

        config
            .validate()
            .context("Scanner configuration failed validation")?;

        debug!("Loaded scanner config from {:?}", self.config_path);
        Ok(config)
    }

    fn parse(&self, content: &str) -> Result<ScannerConfig> {
        let config = match self.format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).context("Failed to parse YAML config")?
            }
            ConfigFormat::Toml => toml::from_str(content).context("Failed to parse TOML config")?,
            ConfigFormat::Json => {
                serde_json::from_str(content).context("Failed to parse JSON config")?
            }
        };
        Ok(config)
    }

    pub fn save_config(&self, config: &ScannerConfig) -> Result<()> {
        config
            .validate()
            .context("Refusing to save invalid configuration")?;

        let content = match self.format {
            ConfigFormat::Yaml => serde_yaml::to_string(config)?,
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        };

        std::fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;

        Ok(())
    }
}

/// Apply `SIGPROBE_CONCURRENCY`, `SIGPROBE_JOB_TIMEOUT` and `LOG_LEVEL` from `lookup`
pub fn apply_overrides<F>(config: &mut ScannerConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(concurrency) = lookup("SIGPROBE_CONCURRENCY") {
        config.concurrency = concurrency
            .trim()
            .parse()
            .context("Invalid SIGPROBE_CONCURRENCY")?;
    }

    if let Some(timeout) = lookup("SIGPROBE_JOB_TIMEOUT") {
        config.job_timeout_secs = match timeout.trim() {
            "" | "0" => None,
            secs => Some(secs.parse().context("Invalid SIGPROBE_JOB_TIMEOUT")?),
        };
    }

    if let Some(log_level) = lookup("LOG_LEVEL") {
        config.log_level = log_level;
    }

    Ok(())
}

/// Load every `.yaml`/`.yml` file of a directory as a signature, keyed 1..=n in file-name order
pub fn load_signature_dir(dir_path: &Path) -> Result<HashMap<SignatureId, String>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read signature directory: {:?}", dir_path))?
    {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false);

        if path.is_file() && is_yaml {
            paths.push(path);
        } else {
            debug!("Skipping non-signature entry {:?}", path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        warn!("No signature files found in {:?}", dir_path);
    }

    let mut signatures = HashMap::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read signature file: {:?}", path))?;
        signatures.insert(index as SignatureId + 1, content);
    }

    Ok(signatures)
}
