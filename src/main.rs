mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use pkgwatch::output::{print_outcome, print_plan};
use pkgwatch::{Config, DebounceMode, plan_watch, watch_plan};

/// Exit status when the watch ends without a change.
const EXIT_NO_CHANGE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Watch {
            path,
            ext,
            settle_ms,
            timeout_secs,
            quiet_debounce,
            json,
        } => {
            let mut config = Config::load(&path);
            if let Some(ext) = ext {
                config.extension = ext;
            }
            if let Some(settle_ms) = settle_ms {
                config.settle_ms = settle_ms;
            }
            if timeout_secs.is_some() {
                config.timeout_secs = timeout_secs;
            }
            if quiet_debounce {
                config.debounce = DebounceMode::Quiet;
            }

            let plan = plan_watch(&path, &config)
                .with_context(|| format!("cannot watch {}", path.display()))?;

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    debug!("interrupt received");
                    on_ctrl_c.cancel();
                }
            });

            let outcome = watch_plan(&plan, &config, &cancel)
                .await
                .with_context(|| format!("cannot watch {}", path.display()))?;
            print_outcome(&outcome, json);

            if !outcome.should_rebuild() {
                std::process::exit(EXIT_NO_CHANGE);
            }
        }
        Commands::Deps { path, json } => {
            let config = Config::load(&path);
            let plan = plan_watch(&path, &config)
                .with_context(|| format!("cannot resolve imports of {}", path.display()))?;
            print_plan(&plan, json);
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over the `--verbose` default.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "pkgwatch=debug" } else { "pkgwatch=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
