//! Configuration management for `retidy.toml` and CLI overrides.
//!
//! # Sections
//!
//! | Section   | Purpose                                             |
//! |-----------|-----------------------------------------------------|
//! | `[tidy]`  | Processor options and formatter mode                |
//! | `[serve]` | HTTP boundary (interface, port, root, body ceiling) |
//!
//! Option names resolve case-sensitively against [`TidyOption`]; the single
//! sentinel value `all` enables every option. Unknown names are fatal at
//! load time - a misconfigured processor never reaches request handling.

use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::{
    fs,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "retidy.toml";

/// Responses larger than this are served untouched (bytes).
pub const DEFAULT_MAX_BODY_LEN: usize = 1024 * 1024;

// ============================================================================
// Errors
// ============================================================================

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("no tidy option named `{0}`")]
    UnknownOption(String),

    #[error("no formatter named `{0}` (expected NONE, FORMAT or COMPACT)")]
    UnknownFormatter(String),
}

// ============================================================================
// Tidy options
// ============================================================================

/// A single processor capability, toggled by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TidyOption {
    RemoveComments,
    RelocateStylesToHead,
    RelocateStylesheets,
    RemoveDuplicateStyles,
    RelocateScripts,
    RemoveDuplicateScripts,
    MinifyScripts,
}

impl TidyOption {
    /// All options, in declaration order.
    pub const ALL: [TidyOption; 7] = [
        TidyOption::RemoveComments,
        TidyOption::RelocateStylesToHead,
        TidyOption::RelocateStylesheets,
        TidyOption::RemoveDuplicateStyles,
        TidyOption::RelocateScripts,
        TidyOption::RemoveDuplicateScripts,
        TidyOption::MinifyScripts,
    ];

    /// Canonical configuration name.
    pub const fn name(self) -> &'static str {
        match self {
            TidyOption::RemoveComments => "REMOVE_COMMENTS",
            TidyOption::RelocateStylesToHead => "RELOCATE_STYLES_TO_HEAD",
            TidyOption::RelocateStylesheets => "RELOCATE_STYLESHEETS",
            TidyOption::RemoveDuplicateStyles => "REMOVE_DUPLICATE_STYLES",
            TidyOption::RelocateScripts => "RELOCATE_SCRIPTS",
            TidyOption::RemoveDuplicateScripts => "REMOVE_DUPLICATE_SCRIPTS",
            TidyOption::MinifyScripts => "MINIFY_SCRIPTS",
        }
    }
}

impl FromStr for TidyOption {
    type Err = ConfigError;

    /// Case-sensitive resolution against the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TidyOption::ALL
            .into_iter()
            .find(|o| o.name() == s)
            .ok_or_else(|| ConfigError::UnknownOption(s.to_string()))
    }
}

/// The set of enabled [`TidyOption`]s.
///
/// Immutable once configuration is resolved; shared read-only across
/// concurrent processor invocations.
#[derive(Debug, Clone, Default)]
pub struct OptionSet(FxHashSet<TidyOption>);

impl OptionSet {
    /// Empty set (processor becomes a byte-for-byte no-op).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every option enabled.
    pub fn all() -> Self {
        Self(TidyOption::ALL.into_iter().collect())
    }

    /// Parse a comma-separated option list.
    ///
    /// Items are trimmed, empty items skipped. The sentinel `all`
    /// (case-insensitive, matching the historical behavior) short-circuits
    /// to [`OptionSet::all`].
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let mut set = FxHashSet::default();
        for item in s.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            if item.eq_ignore_ascii_case("all") {
                return Ok(Self::all());
            }
            set.insert(item.parse::<TidyOption>()?);
        }
        Ok(Self(set))
    }

    /// Enable a single option.
    pub fn insert(&mut self, option: TidyOption) {
        self.0.insert(option);
    }

    /// Check whether an option is enabled.
    #[inline]
    pub fn has(&self, option: TidyOption) -> bool {
        self.0.contains(&option)
    }

    /// True if any of the given options is enabled.
    #[inline]
    pub fn has_any(&self, options: &[TidyOption]) -> bool {
        options.iter().any(|o| self.0.contains(o))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Formatter mode
// ============================================================================

/// Post-rewrite layout transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatterMode {
    /// Identity - bytes pass through unchanged.
    #[default]
    None,
    /// Whitespace-collapsing pretty-print with indentation.
    Format,
    /// Removal of insignificant inter-tag whitespace.
    Compact,
}

impl FromStr for FormatterMode {
    type Err = ConfigError;

    /// Case-sensitive resolution; a blank value means [`FormatterMode::None`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "NONE" => Ok(FormatterMode::None),
            "FORMAT" => Ok(FormatterMode::Format),
            "COMPACT" => Ok(FormatterMode::Compact),
            other => Err(ConfigError::UnknownFormatter(other.to_string())),
        }
    }
}

// ============================================================================
// Raw TOML layer
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    tidy: RawTidy,
    #[serde(default)]
    serve: RawServe,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTidy {
    options: Option<String>,
    formatter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServe {
    interface: Option<IpAddr>,
    port: Option<u16>,
    root: Option<PathBuf>,
    max_body_len: Option<usize>,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Processor settings (the `[tidy]` section).
#[derive(Debug, Clone)]
pub struct TidyConfig {
    pub options: OptionSet,
    pub formatter: FormatterMode,
}

/// HTTP boundary settings (the `[serve]` section).
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,
    /// Directory served by the HTTP boundary.
    pub root: PathBuf,
    /// Responses larger than this are passed through unprocessed.
    pub max_body_len: usize,
}

/// Root configuration, resolved and validated at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub tidy: TidyConfig,
    pub serve: ServeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tidy: TidyConfig {
                options: OptionSet::empty(),
                formatter: FormatterMode::None,
            },
            serve: ServeConfig {
                interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 8080,
                root: PathBuf::from("."),
                max_body_len: DEFAULT_MAX_BODY_LEN,
            },
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// With an explicit path, a missing or unreadable file is an error.
    /// Without one, `retidy.toml` is used when present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let raw = match path {
            Some(p) => Self::read_raw(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::read_raw(default)?
                } else {
                    RawConfig::default()
                }
            }
        };
        Self::resolve(raw)
    }

    /// Parse configuration from TOML text (used by tests).
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Self::resolve(toml::from_str(text)?)
    }

    fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
        let text =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(toml::from_str(&text)?)
    }

    fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let options = match raw.tidy.options.as_deref() {
            Some(s) => OptionSet::parse(s)?,
            None => OptionSet::empty(),
        };
        let formatter = match raw.tidy.formatter.as_deref() {
            Some(s) => s.parse()?,
            None => FormatterMode::None,
        };

        Ok(Self {
            tidy: TidyConfig { options, formatter },
            serve: ServeConfig {
                interface: raw.serve.interface.unwrap_or(defaults.serve.interface),
                port: raw.serve.port.unwrap_or(defaults.serve.port),
                root: raw.serve.root.unwrap_or(defaults.serve.root),
                max_body_len: raw.serve.max_body_len.unwrap_or(defaults.serve.max_body_len),
            },
        })
    }

    /// Override the option set from a CLI-provided list.
    pub fn override_options(&mut self, s: &str) -> Result<(), ConfigError> {
        self.tidy.options = OptionSet::parse(s)?;
        Ok(())
    }

    /// Override the formatter mode from a CLI-provided name.
    pub fn override_formatter(&mut self, s: &str) -> Result<(), ConfigError> {
        self.tidy.formatter = s.parse()?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
