pub mod cli;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod toml_config;

use crate::core::normalize::DEFAULT_DATE_FORMAT;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_PREFIX: &str = "processed";
pub const DEFAULT_MAX_BATCH_ROWS: usize = 1_000_000;

/// Settings for normalizing one object, however it was invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub input_key: String,
    pub output_prefix: String,
    pub date_format: String,
    pub max_batch_rows: usize,
}

impl JobConfig {
    pub fn new(input_key: impl Into<String>) -> Self {
        Self {
            input_key: input_key.into(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            max_batch_rows: DEFAULT_MAX_BATCH_ROWS,
        }
    }
}

impl ConfigProvider for JobConfig {
    fn input_key(&self) -> &str {
        &self.input_key
    }

    fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    fn date_format(&self) -> &str {
        &self.date_format
    }

    fn max_batch_rows(&self) -> usize {
        self.max_batch_rows
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input_key)?;
        validation::validate_file_extensions("input", &[self.input_key.clone()], &["csv"])?;
        if !self.output_prefix.is_empty() {
            validation::validate_path("output_prefix", &self.output_prefix)?;
        }
        validation::validate_date_format("date_format", &self.date_format)?;
        validation::validate_positive_number("max_batch_rows", self.max_batch_rows, 1)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use self::cli_args::{CliConfig, ResolvedCli};

#[cfg(feature = "cli")]
mod cli_args {
    use super::{JobConfig, DEFAULT_MAX_BATCH_ROWS, DEFAULT_OUTPUT_PREFIX};
    use crate::config::toml_config::TomlConfig;
    use crate::core::normalize::DEFAULT_DATE_FORMAT;
    use crate::utils::error::Result;
    use crate::utils::validation::Validate;
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "listing-etl")]
    #[command(about = "Normalize a raw listings CSV into its cleaned form")]
    pub struct CliConfig {
        /// Listings CSV to normalize, relative to --input-dir
        #[arg(long)]
        pub input: String,

        #[arg(long, default_value = ".")]
        pub input_dir: String,

        /// Directory the cleaned CSV is written under [default: ./output]
        #[arg(long)]
        pub output_dir: Option<String>,

        /// Sub-directory of --output-dir for cleaned files [default: processed]
        #[arg(long)]
        pub output_prefix: Option<String>,

        /// strftime format of last_review [default: %Y-%m-%d]
        #[arg(long)]
        pub date_format: Option<String>,

        /// Refuse batches with more rows than this [default: 1000000]
        #[arg(long)]
        pub max_batch_rows: Option<usize>,

        /// Optional TOML settings file; command-line flags take precedence
        #[arg(long)]
        pub config: Option<String>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log CPU and memory usage per stage")]
        pub monitor: bool,
    }

    /// Everything the CLI needs after flags and the settings file are merged.
    #[derive(Debug, Clone)]
    pub struct ResolvedCli {
        pub job: JobConfig,
        pub input_dir: String,
        pub output_dir: String,
        pub monitor: bool,
    }

    impl CliConfig {
        pub fn resolve(&self) -> Result<ResolvedCli> {
            let file = match &self.config {
                Some(path) => {
                    let file = TomlConfig::from_file(path)?;
                    file.validate()?;
                    file
                }
                None => TomlConfig::default(),
            };
            Ok(self.merge(&file))
        }

        pub fn merge(&self, file: &TomlConfig) -> ResolvedCli {
            let job = JobConfig {
                input_key: self.input.clone(),
                output_prefix: self
                    .output_prefix
                    .clone()
                    .or_else(|| file.output_prefix().map(str::to_string))
                    .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
                date_format: self
                    .date_format
                    .clone()
                    .or_else(|| file.date_format().map(str::to_string))
                    .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
                max_batch_rows: self
                    .max_batch_rows
                    .or(file.max_batch_rows())
                    .unwrap_or(DEFAULT_MAX_BATCH_ROWS),
            };

            ResolvedCli {
                job,
                input_dir: self.input_dir.clone(),
                output_dir: self
                    .output_dir
                    .clone()
                    .or_else(|| file.output_directory().map(str::to_string))
                    .unwrap_or_else(|| "./output".to_string()),
                monitor: self.monitor || file.monitoring_enabled(),
            }
        }
    }

    impl Validate for ResolvedCli {
        fn validate(&self) -> Result<()> {
            crate::utils::validation::validate_path("input_dir", &self.input_dir)?;
            crate::utils::validation::validate_path("output_dir", &self.output_dir)?;
            self.job.validate()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_flags_override_file_which_overrides_defaults() {
            let args = CliConfig::parse_from([
                "listing-etl",
                "--input",
                "AB_NYC_2019.csv",
                "--date-format",
                "%d/%m/%Y",
            ]);
            let file = TomlConfig::from_toml_str(
                "[normalize]\ndate_format = \"%Y/%m/%d\"\n[batch]\nmax_rows = 50\n",
            )
            .unwrap();

            let resolved = args.merge(&file);

            assert_eq!(resolved.job.date_format, "%d/%m/%Y");
            assert_eq!(resolved.job.max_batch_rows, 50);
            assert_eq!(resolved.job.output_prefix, DEFAULT_OUTPUT_PREFIX);
            assert_eq!(resolved.output_dir, "./output");
            assert!(!resolved.monitor);
            assert!(resolved.validate().is_ok());
        }

        #[test]
        fn test_non_csv_input_is_rejected() {
            let args = CliConfig::parse_from(["listing-etl", "--input", "listings.json"]);
            let resolved = args.merge(&TomlConfig::default());
            assert!(resolved.validate().is_err());
        }
    }
}
