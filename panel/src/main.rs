use std::process::exit;

use clap::Parser;
use common::{error::FancyError, init::PanelInit};
use panel::{
    application::Panel,
    args::Args,
    config::Config,
    storage::Storage,
    version::{AUTHORS, VERSION},
};
use simplelog::info;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    PanelInit::init_logging(args.debug, Storage::latest_log_file());
    PanelInit::print_ascii_art("Hatchery", &VERSION, &AUTHORS);

    let config = match Config::parse() {
        Ok(config) => config,
        Err(error) => {
            FancyError::print_fancy(&error, true);
            exit(1);
        }
    };

    info!("Starting panel version {}...", VERSION);
    let mut panel = match Panel::init(config).await {
        Ok(panel) => panel,
        Err(error) => {
            FancyError::print_fancy(&error, true);
            exit(1);
        }
    };

    if let Err(error) = panel.run().await {
        FancyError::print_fancy(&error, true);
        exit(1);
    }
}
