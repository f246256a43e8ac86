use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `--json` output on stdout stays machine-readable.
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "faction_admin", version = env!("CARGO_PKG_VERSION"), %rust_log, "faction-admin starting");

    let code = faction_admin::cli::run(std::env::args().collect())?;
    std::process::exit(code)
}
