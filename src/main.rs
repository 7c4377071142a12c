//! Habla main entry point
//!
//! Sets up logging, reads the optional config file, builds the voice
//! model loader and opens the synthesizer window.

use anyhow::Context;
use eframe::egui;
use habla::app::HablaApp;
use habla::config::Config;
use habla::synth::create_loader;
use habla::worker::{Dispatcher, ModelSettings};
use log::{error, info};
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    // Initialize logger
    if debug_mode {
        // Debug mode: write to habla.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("habla.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open habla.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "Habla version {} starting (debug mode, logging to habla.log)",
            habla::VERSION
        );
    } else {
        // Normal mode: errors only unless RUST_LOG says otherwise
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .parse_default_env()
            .init();
    }

    if let Err(e) = run() {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    info!("Configuration from {:?}", config.path());

    let settings = ModelSettings {
        language: config.language()?,
        device: config.device()?,
    };
    info!(
        "Voice model: language {}, device {}",
        settings.language, settings.device
    );

    let loader = create_loader(&config).context("Failed to set up voice model loader")?;
    let dispatcher = Dispatcher::new(loader, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(habla::APP_TITLE)
            .with_inner_size([520.0, 260.0]),
        ..Default::default()
    };

    eframe::run_native(
        habla::APP_TITLE,
        options,
        Box::new(move |cc| Box::new(HablaApp::new(cc, dispatcher))),
    )
    .map_err(|e| anyhow::anyhow!("Window closed with an error: {}", e))?;

    info!("Window closed");
    Ok(())
}
