//! Bootstrap strategies.
//!
//! A strategy is written `"<local>[:<external>]"`. The local half says how a
//! sibling package is made visible to its consumers, the external half where
//! a package's registry dependencies are installed.
//!
//! Settings are layered, first defined wins:
//! 1. the package's own `"tether": { "strategy": ... }` override
//! 2. the run-level `--strategy` flag
//! 3. `[bootstrap] strategy` in `tether.toml`
//! 4. `default:default`

use std::fmt;
use std::str::FromStr;

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Package;
use crate::util::diagnostic::Diagnostic;

/// How a sibling workspace package reaches its consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalStrategy {
    /// Symlink the sibling into each consumer's `node_modules`
    #[default]
    Default,
    /// Copy the sibling's `files` globs into each consumer
    Copy,
    /// Place the sibling once in the root `node_modules`
    Link,
}

impl LocalStrategy {
    pub const VALID: [&'static str; 3] = ["default", "copy", "link"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocalStrategy::Default => "default",
            LocalStrategy::Copy => "copy",
            LocalStrategy::Link => "link",
        }
    }
}

/// Where a package's external dependencies are installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalStrategy {
    /// Install into the package's own `node_modules`
    #[default]
    Default,
    /// Hoist into the workspace root where possible
    Root,
}

impl ExternalStrategy {
    pub const VALID: [&'static str; 2] = ["default", "root"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalStrategy::Default => "default",
            ExternalStrategy::Root => "root",
        }
    }
}

/// A fully resolved strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Strategy {
    pub local: LocalStrategy,
    pub external: ExternalStrategy,
}

impl Strategy {
    pub fn new(local: LocalStrategy, external: ExternalStrategy) -> Self {
        Strategy { local, external }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.local.as_str(), self.external.as_str())
    }
}

impl FromStr for Strategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (local, external) = s.split_once(':').unwrap_or((s, "default"));

        let local = match local {
            "default" => LocalStrategy::Default,
            "copy" => LocalStrategy::Copy,
            "link" => LocalStrategy::Link,
            other => {
                return Err(StrategyError::InvalidLocal {
                    value: other.to_string(),
                    origin: String::new(),
                })
            }
        };

        let external = match external {
            "default" => ExternalStrategy::Default,
            "root" => ExternalStrategy::Root,
            other => {
                return Err(StrategyError::InvalidExternal {
                    value: other.to_string(),
                    origin: String::new(),
                })
            }
        };

        Ok(Strategy { local, external })
    }
}

/// A raw strategy value as written in a manifest or config file.
///
/// Anything that is not a string is kept so it can be rejected with a
/// configuration error instead of a parse failure of the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrategySetting {
    Text(String),
    Other(serde_json::Value),
}

impl StrategySetting {
    /// Empty strings count as unset.
    fn is_set(&self) -> bool {
        match self {
            StrategySetting::Text(s) => !s.trim().is_empty(),
            StrategySetting::Other(_) => true,
        }
    }

    /// Parse the setting, naming `origin` in any error.
    pub fn parse(&self, origin: &str) -> Result<Strategy, StrategyError> {
        match self {
            StrategySetting::Text(s) => s.trim().parse().map_err(|e: StrategyError| e.at(origin)),
            StrategySetting::Other(value) => Err(StrategyError::NotAString {
                found: value.to_string(),
                origin: String::new(),
            }
            .at(origin)),
        }
    }
}

impl From<&str> for StrategySetting {
    fn from(s: &str) -> Self {
        StrategySetting::Text(s.to_string())
    }
}

/// Invalid strategy configuration. Always fatal, raised before anything is
/// written to disk.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum StrategyError {
    #[error("local bootstrap strategy must be one of [\"default\", \"copy\", \"link\"], `{value}` provided{origin}")]
    #[diagnostic(
        code(tether::config::local_strategy),
        help("use `default`, `copy` or `link` before the colon")
    )]
    InvalidLocal { value: String, origin: String },

    #[error("external bootstrap strategy must be one of [\"default\", \"root\"], `{value}` provided{origin}")]
    #[diagnostic(
        code(tether::config::external_strategy),
        help("use `default` or `root` after the colon")
    )]
    InvalidExternal { value: String, origin: String },

    #[error("bootstrap strategy must be a string, found `{found}`{origin}")]
    #[diagnostic(
        code(tether::config::strategy_type),
        help("write the strategy as a string such as \"default:root\"")
    )]
    NotAString { found: String, origin: String },
}

impl StrategyError {
    fn at(self, origin: &str) -> Self {
        let origin = if origin.is_empty() {
            String::new()
        } else {
            format!(" (in {})", origin)
        };
        match self {
            StrategyError::InvalidLocal { value, .. } => StrategyError::InvalidLocal { value, origin },
            StrategyError::InvalidExternal { value, .. } => {
                StrategyError::InvalidExternal { value, origin }
            }
            StrategyError::NotAString { found, .. } => StrategyError::NotAString { found, origin },
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            StrategyError::InvalidLocal { .. } => diag
                .with_context(format!("valid local strategies: {}", LocalStrategy::VALID.join(", ")))
                .with_suggestion("Fix the part before the colon, e.g. `link:root`"),
            StrategyError::InvalidExternal { .. } => diag
                .with_context(format!(
                    "valid external strategies: {}",
                    ExternalStrategy::VALID.join(", ")
                ))
                .with_suggestion("Fix the part after the colon, e.g. `default:root`"),
            StrategyError::NotAString { .. } => diag
                .with_suggestion("Quote the strategy, e.g. `strategy = \"default:root\"`"),
        }
    }
}

/// Resolves the effective strategy of a package from the layered settings.
#[derive(Debug, Clone, Default)]
pub struct StrategyResolver {
    run: Option<StrategySetting>,
    workspace: Option<StrategySetting>,
}

impl StrategyResolver {
    /// Create a resolver from the run-level and workspace-level settings.
    pub fn new(run: Option<StrategySetting>, workspace: Option<StrategySetting>) -> Self {
        StrategyResolver { run, workspace }
    }

    /// Resolve from an explicit override, falling back through the layers.
    pub fn resolve(
        &self,
        own: Option<&StrategySetting>,
        owner: &str,
    ) -> Result<Strategy, StrategyError> {
        let package_origin = format!("package `{}`", owner);
        let layers = [
            (own, package_origin.as_str()),
            (self.run.as_ref(), "--strategy"),
            (self.workspace.as_ref(), "tether.toml"),
        ];

        let found = layers
            .into_iter()
            .find_map(|(setting, origin)| setting.filter(|s| s.is_set()).map(|s| (s, origin)));

        match found {
            Some((setting, origin)) => setting.parse(origin),
            None => Ok(Strategy::default()),
        }
    }

    /// Resolve the strategy of a package, honouring its own override.
    pub fn resolve_for(&self, package: &Package) -> Result<Strategy, StrategyError> {
        self.resolve(package.overrides().strategy.as_ref(), package.name())
    }

    /// Validate the run and workspace layers on their own.
    ///
    /// Lets a bad `--strategy` fail even in a workspace where every package
    /// overrides it.
    pub fn validate(&self) -> Result<(), StrategyError> {
        if let Some(run) = self.run.as_ref().filter(|s| s.is_set()) {
            run.parse("--strategy")?;
        }
        if let Some(ws) = self.workspace.as_ref().filter(|s| s.is_set()) {
            ws.parse("tether.toml")?;
        }
        Ok(())
    }
}
