use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use stapling::{Config, ConfiguredStore, EchoEngine, HttpFetcher, Stapled, Stapler};

#[derive(Parser, Debug)]
#[command(name = "stapling")]
#[command(about = "Render JSON through XML templates, with cached templates and data")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/stapling/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Neither read nor write the cache
  #[arg(long)]
  no_cache: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the XML document generated from JSON (a file, or stdin)
  Xml { file: Option<PathBuf> },
  /// Fetch resources and store them in the cache
  Prefetch {
    #[arg(required = true)]
    urls: Vec<String>,
  },
  /// Exit with status 0 if the resource is cached, 1 otherwise
  Cached { url: String },
  /// Print a cached resource
  Show { url: String },
  /// Remove resources from the cache
  Clear {
    #[arg(required = true)]
    urls: Vec<String>,
  },
  /// Load service JSON and print the document the template would receive
  Load { service: String, template: String },
}

type CliStapler = Stapler<EchoEngine, HttpFetcher, ConfiguredStore>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;
  let _log_guard = init_tracing();

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  if let Command::Xml { file } = &args.command {
    let json = read_json(file.as_ref())?;
    println!("{}", stapling::xml::to_document_string(&json));
    return Ok(ExitCode::SUCCESS);
  }

  let stapler = build_stapler(&config)?;
  if args.no_cache {
    stapler.set_cachable(false);
  }

  run(&stapler, args.command).await
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
  let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
  let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stapling=info"));

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(writer)
    .with_target(false)
    .init();

  guard
}

fn build_stapler(config: &Config) -> Result<CliStapler> {
  let store = ConfiguredStore::open(&config.cache)?;
  let fetcher = HttpFetcher::new(&config.http)?;
  Ok(Stapler::from_config(EchoEngine, fetcher, store, config))
}

async fn run(stapler: &CliStapler, command: Command) -> Result<ExitCode> {
  match command {
    Command::Xml { .. } => unreachable!("handled before the stapler is built"),
    Command::Prefetch { urls } => {
      let total = urls.len();
      let stored = stapler.prefetch(urls).await;
      println!("{stored}/{total} stored");
      if stored == total {
        Ok(ExitCode::SUCCESS)
      } else {
        Ok(ExitCode::FAILURE)
      }
    }
    Command::Cached { url } => {
      if stapler.is_cached(&url) {
        Ok(ExitCode::SUCCESS)
      } else {
        Ok(ExitCode::FAILURE)
      }
    }
    Command::Show { url } => {
      let text = stapler
        .cache()
        .try_get(&url)
        .ok_or_else(|| eyre!("Not cached: {}", url))?;
      match stapler.cache().store().cached_at(&url) {
        Ok(Some(cached_at)) => tracing::info!(url, cached_at, "Cached entry"),
        Ok(None) => {}
        Err(e) => tracing::debug!(url, "Could not read cache timestamp: {}", e),
      }
      println!("{text}");
      Ok(ExitCode::SUCCESS)
    }
    Command::Clear { urls } => {
      stapler.clear(urls);
      Ok(ExitCode::SUCCESS)
    }
    Command::Load { service, template } => match stapler.load(&service, &template).await? {
      Stapled::Done(document) => {
        println!("{document}");
        Ok(ExitCode::SUCCESS)
      }
      Stapled::Aborted(event) => Err(eyre!("Aborted by {} hook", event)),
    },
  }
}

fn read_json(file: Option<&PathBuf>) -> Result<Value> {
  let text = match file {
    Some(path) => std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?,
    None => {
      let mut buf = String::new();
      std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| eyre!("Failed to read stdin: {}", e))?;
      buf
    }
  };

  serde_json::from_str(&text).map_err(|e| eyre!("Invalid JSON: {}", e))
}
