use std::path;
use std::sync;

use lazy_static::lazy_static;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::model::addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tokenized output, consumed by the listing.
    #[default]
    Json,
    Plain,
    C,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAddress {
    pub name: String,
    pub address: addr::Address,
}

/// Decompiler configuration. Passed by value into every decompilation; the
/// process-wide instance behind [get] and [set] is only the starting point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_file: path::PathBuf,
    pub output_file: Option<path::PathBuf>,
    pub output_format: OutputFormat,
    pub selected_ranges: Vec<addr::Extent>,
    pub selected_decode_only: bool,
    pub verbose: bool,

    /// Functions the decompiler knows by name, ahead of the analysis database.
    pub functions: Vec<NamedAddress>,
    pub globals: Vec<NamedAddress>,

    #[serde(skip)]
    pub version: usize, /* incremented when config changes */
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_file: path::PathBuf::new(),
            output_file: None,
            output_format: OutputFormat::Json,
            selected_ranges: Vec::new(),
            selected_decode_only: false,
            verbose: false,
            functions: Vec::new(),
            globals: Vec::new(),
            version: 0,
        }
    }
}

impl Config {
    /// Configuration for decompiling a single unit of `input` to tokenized
    /// output. Only `extent` is selected, whatever the base selection was.
    pub fn selective(&self, input: &path::Path, extent: addr::Extent) -> Config {
        let mut config = self.clone();
        config.input_file = input.to_path_buf();
        config.output_format = OutputFormat::Json;
        config.selected_ranges = vec![extent];
        config.selected_decode_only = true;
        config
    }

    /// Configuration for decompiling the whole of `input` to a C file, by
    /// default `<input>.c`.
    pub fn full(&self, input: &path::Path, output_file: Option<path::PathBuf>) -> Config {
        let mut config = self.clone();
        config.input_file = input.to_path_buf();
        config.output_format = OutputFormat::C;
        config.output_file = Some(output_file.unwrap_or_else(|| default_output_path(input)));
        config.selected_ranges.clear();
        config.selected_decode_only = false;
        config
    }

    /// Selective configuration used by regression runs: verbose plain text
    /// written to `<input>.c` instead of tokens.
    pub fn regression(&self, input: &path::Path, extent: addr::Extent) -> Config {
        let mut config = self.selective(input, extent);
        config.output_format = OutputFormat::Plain;
        config.output_file = Some(default_output_path(input));
        config.verbose = true;
        config
    }

    pub fn function_by_name(&self, name: &str) -> Option<addr::Address> {
        self.functions.iter().find(|f| f.name == name).map(|f| f.address).filter(|a| !a.is_null())
    }

    pub fn global_by_name(&self, name: &str) -> Option<addr::Address> {
        self.globals.iter().find(|g| g.name == name).map(|g| g.address).filter(|a| !a.is_null())
    }
}

/// `<input>.c`, next to the input file.
pub fn default_output_path(input: &path::Path) -> path::PathBuf {
    let mut output = input.as_os_str().to_os_string();
    output.push(".c");
    path::PathBuf::from(output)
}

lazy_static! {
    static ref INSTANCE: arc_swap::ArcSwap<Config> = arc_swap::ArcSwap::from_pointee(Config::default());
}

pub fn get() -> sync::Arc<Config> {
    INSTANCE.load_full()
}

pub fn set(mut config: Config) {
    config.version = INSTANCE.load().version + 1;
    INSTANCE.store(sync::Arc::new(config));
}

pub fn parse(text: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(text)?)
}

pub fn load(path: &path::Path) -> Result<Config, ConfigError> {
    parse(&std::fs::read_to_string(path)?)
}

/// Looks for `pseudoview/config.toml` in the XDG config directories.
pub fn find_config_file() -> Option<path::PathBuf> {
    xdg::BaseDirectories::with_prefix("pseudoview").ok()?.find_config_file("config.toml")
}

/// Loads the user's config file, if there is one, into the process-wide
/// instance. Returns whether a file was found.
pub fn load_default() -> Result<bool, ConfigError> {
    match find_config_file() {
        Some(path) => {
            tracing::event!(tracing::Level::INFO, ?path, "loading config");
            set(load(&path)?);
            Ok(true)
        },
        None => Ok(false),
    }
}
