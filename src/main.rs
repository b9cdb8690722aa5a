use std::sync::Arc;

use clap::Parser;
use hostpolicy::{
    cli::{Args, Command, SettingsLoader, check_manifests},
    controller::{self, ShutdownSignal},
    error::HostPolicyError,
    policy::Verdict,
    store::FileStore,
};

#[tokio::main]
async fn main() -> Result<(), HostPolicyError> {
    env_logger::init();

    let args = Args::parse();

    match &args.command {
        Command::Check { files } => {
            let results = check_manifests(files.as_slice())?;
            for result in &results {
                println!("{result}");
            }
            if results.iter().any(|r| r.verdict() == Verdict::NotOk) {
                std::process::exit(1);
            }
        }
        Command::Run(run_args) => {
            let settings = SettingsLoader::load(args.config.as_deref(), run_args)?;
            let store = Arc::new(FileStore::new(&settings.dir));
            log::info!("Watching host policies in {}", store.dir().display());

            let shutdown = ShutdownSignal::new();
            tokio::spawn({
                let shutdown = Arc::clone(&shutdown);
                async move {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for Ctrl-C: {err}");
                        return;
                    }
                    log::info!("Received Ctrl-C, shutting down");
                    shutdown.shutdown();
                }
            });

            controller::run(store, &settings.controller, shutdown).await;
        }
    }

    Ok(())
}
