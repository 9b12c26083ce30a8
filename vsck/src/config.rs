// SPDX-License-Identifier: MIT

use anyhow::{Context, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use vsfs::vsfs::{VerifyPhases, VsfsCheckOptions};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    FailFast,
    CollectAll,
}

/// Optional `vsck.toml` check configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    #[serde(default)]
    pub mode: Mode,
    /// Phase names; `geometry` is always added.
    pub phases: Option<Vec<String>>,
    /// Cap on reported marked-but-unused blocks in collect-all mode.
    pub orphan_sample_limit: Option<usize>,
}

impl CheckConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn phases(&self) -> anyhow::Result<VerifyPhases> {
        let Some(names) = &self.phases else {
            return Ok(VerifyPhases::ALL);
        };
        let mut phases = VerifyPhases::empty();
        for name in names {
            match VerifyPhases::parse_name(name) {
                Some(p) => phases |= p,
                None => bail!("unknown phase '{name}'"),
            }
        }
        Ok(phases)
    }

    /// Check options with the command line applied on top (`--all` wins).
    pub fn options(&self, collect_all: bool) -> anyhow::Result<VsfsCheckOptions> {
        let mut opt = VsfsCheckOptions {
            phases: self.phases()?,
            fail_fast: !collect_all && self.mode == Mode::FailFast,
            ..VsfsCheckOptions::default()
        };
        if let Some(limit) = self.orphan_sample_limit {
            opt.orphan_sample_limit = limit;
        }
        Ok(opt)
    }
}
