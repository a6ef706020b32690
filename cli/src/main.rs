use clap::Parser;
use taskdeck_cli::app;
use taskdeck_cli::commands::cli;
use taskdeck_core::api::{load_default, load_explicit, AppConfig, CliError, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

fn load_config(args: &cli::Args) -> Result<AppConfig, CliError> {
    let mut cfg = match &args.config {
        Some(path) => load_explicit(path)?,
        None => load_default()?,
    };
    if let Some(format) = &args.format {
        cfg.output.format = format.clone();
    }
    Ok(cfg)
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(&args)?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    match args.command {
        cli::Commands::Run(run_args) => app::run_single(run_args, &cfg, args.no_progress).await,
        cli::Commands::Batch(batch_args) => {
            app::run_batch_file(batch_args, &cfg, args.no_progress).await
        }
        cli::Commands::Ai(ai_args) => app::run_ai(ai_args, &cfg, args.no_progress).await,
        cli::Commands::Steps(steps_args) => {
            app::print_steps(&steps_args);
            Ok(0)
        }
        cli::Commands::Stats(stats_args) => app::print_stats(&stats_args),
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("taskdeck"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("taskdeck.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
