use cql_lint::LintConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_INCLUDE: &str = "src/**/*.rs";

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;
        let file = ConfigFile::parse(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e:#}",
                config_path.display()
            )
        })?;

        Ok(Self { config_dir, file })
    }

    /// The config at `config_path`, or the defaults when there is none.
    pub fn load_or_default(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        Ok(Self {
            config_dir: PathBuf::from("."),
            file: ConfigFile::default(),
        })
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub lint: LintSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LintSection {
    /// Globs, relative to the config file, analyzed when no path is given.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    #[serde(default)]
    pub deny_warnings: bool,

    #[serde(flatten)]
    pub rules: LintConfig,
}

fn default_include() -> Vec<String> {
    vec![DEFAULT_INCLUDE.to_string()]
}

impl Default for LintSection {
    fn default() -> Self {
        Self {
            include: default_include(),
            deny_warnings: false,
            rules: LintConfig::default(),
        }
    }
}

impl ConfigFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let lint = &self.lint;
        if lint.rules.query_functions.is_empty() {
            anyhow::bail!("lint.query_functions must not be empty");
        }
        for pattern in &lint.include {
            glob::Pattern::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid lint.include glob {pattern:?}: {e}"))?;
        }
        Ok(())
    }
}
