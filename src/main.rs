mod app;
mod backend;
mod config;
mod map;
mod state;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use log::{error, info, warn};
use poolbars_core::Secrets;

use app::{PoolBarsApp, StartupErrorApp};
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Where the voted-bars file lives. Defaults to the platform data directory.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Open with the bar list visible
    #[arg(long)]
    show_list: bool,

    /// Print the config file location and exit
    #[arg(long)]
    print_config_path: bool,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.print_config_path {
        match AppConfig::config_path() {
            Ok(path) => println!("{}", path.display()),
            Err(e) => eprintln!("Could not determine config path: {e}"),
        }
        return Ok(());
    }

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    });
    let data_dir = args.data_dir.unwrap_or_else(config::default_data_dir);
    let show_list = args.show_list || config.show_list;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Cue Club"),
        ..Default::default()
    };

    match Secrets::from_env(&config.secrets) {
        Ok(secrets) => {
            info!("Starting Cue Club");
            eframe::run_native(
                "Cue Club",
                options,
                Box::new(move |cc| {
                    let app = PoolBarsApp::new(cc, &config, &secrets, &data_dir, show_list)?;
                    Ok(Box::new(app))
                }),
            )
        }
        Err(e) => {
            error!("{e}");
            eframe::run_native(
                "Cue Club",
                options,
                Box::new(move |_cc| Ok(Box::new(StartupErrorApp::new(e)))),
            )
        }
    }
}
