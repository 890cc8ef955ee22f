use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use member_completion::config::CompletionConfig;
use member_completion::logging::init_logger;
use member_completion::session::CompletionSession;

/// Member-access completion for Java-family sources
#[derive(Parser, Debug)]
#[command(name = "member-completion", version, about)]
struct Cli {
    /// JSON settings file (otherwise $MEMBER_COMPLETION_CONFIG, then defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project root to search for class sources; may be repeated
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Library source archive, overriding toolchain discovery
    #[arg(long, global = true, conflicts_with = "no_archive")]
    archive: Option<PathBuf>,

    /// Never consult a library source archive
    #[arg(long, global = true)]
    no_archive: bool,

    /// Log level (error, warn, info, debug, trace); defaults to RUST_LOG, then info
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable color in log output
    #[arg(long, global = true)]
    no_color: bool,

    /// Also write a debug-level session log to the user cache directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Completions at a byte offset of a saved file
    ///
    /// Offers constructors when the text before the offset ends in `new Type(`, and
    /// members of the accessed class otherwise.
    Complete {
        #[arg(long)]
        file: PathBuf,

        /// Byte offset of the cursor
        #[arg(long)]
        offset: usize,
    },

    /// Fully qualified names matching a partial path, or an entire `import` line
    Imports { partial: String },

    /// Print the class model extracted from a source file as JSON
    Extract { file: PathBuf },
}

impl Cli {
    fn completion_config(&self) -> Result<CompletionConfig> {
        let mut config = match &self.config {
            Some(path) => CompletionConfig::from_json_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => CompletionConfig::from_env_or_default(),
        };
        for root in &self.roots {
            config = config.with_project_root(root);
        }
        if let Some(archive) = &self.archive {
            config = config.with_archive_path(archive);
        }
        if self.no_archive {
            config = config.without_archive();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logger(cli.no_color, cli.log_level.as_deref(), cli.log_file)
        .context("initializing logging")?;

    let config = cli.completion_config()?;
    debug!("Effective configuration: {:?}", config);
    let mut session = CompletionSession::new(config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Complete { file, offset } => {
            let text = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let before = text.get(..offset.min(text.len())).unwrap_or_default();
            let items = if before.trim_end().ends_with('(') {
                session.on_constructor_trigger(text.as_str(), offset, &file)
            } else {
                session.on_access_trigger(text.as_str(), offset, &file)
            };
            serde_json::to_writer_pretty(&mut out, &items)?;
            writeln!(out)?;
        }
        Command::Imports { partial } => {
            if partial.trim_start().starts_with("import ") {
                serde_json::to_writer_pretty(&mut out, &session.on_import_line(&partial))?;
                writeln!(out)?;
            } else {
                for name in session.on_import_like_trigger(&partial) {
                    writeln!(out, "{}", name)?;
                }
            }
        }
        Command::Extract { file } => {
            let model = session
                .extract_file(&file)
                .with_context(|| format!("extracting {}", file.display()))?;
            serde_json::to_writer_pretty(&mut out, &model)?;
            writeln!(out)?;
        }
    }

    let stats = session.cache_stats();
    debug!(
        "Cache: {} hits, {} misses, {} evictions, {} stale",
        stats.hits, stats.misses, stats.evictions, stats.stale
    );
    Ok(())
}
