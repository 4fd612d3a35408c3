//! Command-line configuration for WSI Anonymizer.
//!
//! The binary has three subcommands:
//! - `anonymize` - remove label/macro images and identifying metadata
//! - `check` - print the detected vendor of each file
//! - `info` - print the vendor and identifying metadata as JSON
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use wsi_anonymizer::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! match cli.into_command() {
//!     Command::Anonymize(config) => println!("{} file(s)", config.files.len()),
//!     Command::Check(_) | Command::Info(_) => {}
//! }
//! ```
//!
//! # Environment Variables
//!
//! The `anonymize` options can also be set with the `WSI_ANON_` prefix:
//!
//! - `WSI_ANON_NEW_NAME` - Output file stem
//! - `WSI_ANON_IN_PLACE` - Anonymize the original file (default: false)
//! - `WSI_ANON_KEEP_MACRO_IMAGE` - Keep the macro image (default: false)
//! - `WSI_ANON_DISABLE_UNLINKING` - Keep wiped directories linked (default: false)
//! - `WSI_ANON_PSEUDONYM` - Masking character (default: X)

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::anonymize::{AnonymizeOptions, DEFAULT_PSEUDONYM};

// =============================================================================
// CLI Arguments
// =============================================================================

/// WSI Anonymizer - removes label images and identifying metadata from
/// Whole Slide Images.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-anonymizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Take the selected subcommand.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Anonymize one or more slides.
    Anonymize(AnonymizeConfig),

    /// Detect the vendor of one or more slides.
    Check(CheckConfig),

    /// Print the identifying metadata of one or more slides as JSON.
    Info(InfoConfig),
}

// =============================================================================
// Anonymize Command
// =============================================================================

/// Options of the `anonymize` subcommand.
#[derive(Args, Debug, Clone)]
pub struct AnonymizeConfig {
    /// Slide files to anonymize.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// File stem of the anonymized copy (single file only).
    ///
    /// Defaults to `anonymized_<stem>`. The extension is kept.
    #[arg(short = 'n', long, env = "WSI_ANON_NEW_NAME")]
    pub new_name: Option<String>,

    /// Anonymize the original file instead of a copy.
    ///
    /// WARNING: the original label and metadata cannot be recovered.
    #[arg(short = 'i', long, default_value_t = false, env = "WSI_ANON_IN_PLACE")]
    pub in_place: bool,

    /// Keep the macro image where the vendor allows it.
    #[arg(short = 'm', long, default_value_t = false, env = "WSI_ANON_KEEP_MACRO_IMAGE")]
    pub keep_macro_image: bool,

    /// Wipe images but keep their directories in the directory chain.
    #[arg(short = 'u', long, default_value_t = false, env = "WSI_ANON_DISABLE_UNLINKING")]
    pub disable_unlinking: bool,

    /// Character written over identifying metadata values.
    #[arg(short = 'p', long, default_value_t = DEFAULT_PSEUDONYM, env = "WSI_ANON_PSEUDONYM")]
    pub pseudonym: char,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl AnonymizeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() {
            return Err("At least one slide file is required".to_string());
        }

        // Every copy would get the same name
        if self.new_name.is_some() && self.files.len() > 1 {
            return Err("--new-name can only be used with a single file".to_string());
        }

        // Each file is owned by exactly one run
        if let Some(path) = first_repeated_path(&self.files) {
            return Err(format!("{} is listed more than once", path.display()));
        }

        self.to_options().validate().map_err(|e| e.to_string())
    }

    /// Build the run options shared by every file.
    pub fn to_options(&self) -> AnonymizeOptions {
        AnonymizeOptions {
            new_name: self.new_name.clone(),
            in_place: self.in_place,
            keep_macro_image: self.keep_macro_image,
            disable_unlinking: self.disable_unlinking,
            pseudonym: self.pseudonym,
        }
    }
}

/// Find the first path that names the same file as an earlier one.
///
/// Paths are compared after canonicalization. Paths that cannot be resolved
/// are compared as given.
fn first_repeated_path(files: &[PathBuf]) -> Option<&Path> {
    let mut seen = HashSet::new();
    files
        .iter()
        .find(|path| {
            let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            !seen.insert(key)
        })
        .map(PathBuf::as_path)
}

// =============================================================================
// Check Command
// =============================================================================

/// Options of the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Slide files to check.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() {
            return Err("At least one slide file is required".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Info Command
// =============================================================================

/// Options of the `info` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// Slide files to inspect.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl InfoConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() {
            return Err("At least one slide file is required".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
