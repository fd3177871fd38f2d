// Command routing and dispatch

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wordforge_config::{ConfigManager, EngineConfig, GenerationMode};
use wordforge_engine::RawWordInput;

use crate::commands::{letter_count, Command, FingerprintCommand, GenerateCommand, ScoreCommand};
use crate::error::{CliError, CliResult};

/// wordforge - generate and validate words from a bag of letters
#[derive(Parser, Debug)]
#[command(name = "wordforge")]
#[command(bin_name = "wordforge")]
#[command(about = "Generate, score and validate words from a set of letters")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML); defaults to the user config directory
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Length, language and mode flags shared by request-shaped commands
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Letters to build words from
    #[arg(value_name = "LETTERS")]
    pub letters: String,

    /// Shortest word to produce
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    pub min: i64,

    /// Longest word to produce (default: number of letters)
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<i64>,

    /// Language code used for validation
    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// Enumeration mode: permutations or subsequences
    #[arg(long)]
    pub mode: Option<GenerationMode>,
}

impl RequestArgs {
    fn to_request(&self) -> RawWordInput {
        let max = self.max.unwrap_or_else(|| letter_count(&self.letters));
        RawWordInput::new(self.letters.clone(), self.min, max).with_language(self.language.clone())
    }

    fn apply_mode(&self, config: &mut EngineConfig) {
        if let Some(mode) = self.mode {
            config.generation.mode = mode;
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate candidate words and print the response as JSON
    Generate {
        #[command(flatten)]
        request: RequestArgs,

        /// Word list file, one word per line (optional tab-separated definition)
        #[arg(short, long, value_name = "FILE")]
        dictionary: Option<PathBuf>,

        /// Lowest complexity to keep (1-10)
        #[arg(long)]
        min_complexity: Option<i64>,

        /// Highest complexity to keep (1-10)
        #[arg(long)]
        max_complexity: Option<i64>,

        /// Show at most this many combinations
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the complexity rating of each word
    Score {
        #[arg(value_name = "WORD", required = true)]
        words: Vec<String>,
    },

    /// Print the fingerprint (cache key) of a request
    Fingerprint {
        #[command(flatten)]
        request: RequestArgs,
    },
}

/// Command router
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments, set up logging and run the selected command
    pub async fn route() -> CliResult<String> {
        let cli = Cli::parse();
        let config = Self::load_config(&cli)?;
        crate::logging::init_logging(cli.verbose, &config.logging.level)?;
        Self::execute(&cli, config).await
    }

    /// Load and validate configuration from `--config` or the default location
    pub fn load_config(cli: &Cli) -> CliResult<EngineConfig> {
        let mut manager = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                ConfigManager::with_path(path.clone())
            }
            None => ConfigManager::new(),
        };
        Ok(manager.load_validated()?)
    }

    /// Execute a command against an already loaded configuration
    pub async fn execute(cli: &Cli, mut config: EngineConfig) -> CliResult<String> {
        match &cli.command {
            Commands::Generate {
                request,
                dictionary,
                min_complexity,
                max_complexity,
                limit,
            } => {
                request.apply_mode(&mut config);
                let mut raw = request.to_request();
                if min_complexity.is_some() || max_complexity.is_some() {
                    raw = raw.with_filters(min_complexity.unwrap_or(1), max_complexity.unwrap_or(10));
                }
                let cmd = GenerateCommand::new(raw, config)
                    .with_dictionary(dictionary.clone())
                    .with_limit(*limit);
                cmd.execute().await
            }
            Commands::Score { words } => {
                let cmd = ScoreCommand::new(words.clone(), config.generation.saturation_length);
                cmd.execute().await
            }
            Commands::Fingerprint { request } => {
                request.apply_mode(&mut config);
                let cmd = FingerprintCommand::new(request.to_request(), config.generation);
                cmd.execute().await
            }
        }
    }
}
