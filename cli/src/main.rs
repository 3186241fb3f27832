use clap::Parser;
mod app;
mod commands;
use cabrig_core::error;
use commands::cli;
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
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, error::CliError> {
    let args = cli::Args::parse();
    init_tracing(&args.log_level, args.log_file.as_deref()).map_err(error::CliError::Logging)?;

    match args.command {
        cli::Commands::Inspect(inspect) => app::inspect(&inspect),
        cli::Commands::Build(build) => app::build(&build),
        cli::Commands::Run(run) => app::run(&run).await,
    }
}

fn exit_code_for_error(e: &error::CliError) -> i32 {
    // 0: success
    // 1: logging setup failure
    // 2: usage error
    // others: stable per-family codes from CabError::error_code
    match e {
        error::CliError::Usage(_) => 2,
        error::CliError::Logging(_) => 1,
        error::CliError::Cab(cab) => i32::from(cab.error_code().as_u16()),
    }
}

fn init_tracing(level: &str, log_file: Option<&std::path::Path>) -> Result<(), String> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(level).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if let Some(path) = log_file {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| format!("log file path has no file name: {}", path.display()))?;
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr));

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
