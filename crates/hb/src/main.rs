use hb_core::{
    commands::CommandRegistry, config::Config, lifecycle::run_until_shutdown,
    shutdown::ShutdownSignal, Error,
};
use hb_telegram::TelegramClient;
use tracing::error;

fn main() -> Result<(), Error> {
    // `.env` is applied while the process is still single-threaded, so
    // `RUST_LOG` from it reaches the subscriber below.
    let cfg = Config::load();
    hb_core::logging::init("hb")?;

    if let Err(e) = cfg.and_then(run) {
        error!(error = %e, "fatal error");
        return Err(e);
    }
    Ok(())
}

fn run(cfg: Config) -> hb_core::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::External(format!("failed to start tokio runtime: {e}")))?;

    runtime.block_on(async {
        let shutdown = ShutdownSignal::install()?;
        let registry = CommandRegistry::with_defaults()?;

        let mut client = TelegramClient::new(&cfg, registry)?;
        run_until_shutdown(&mut client, &shutdown, cfg.idle_interval).await
    })
}
