use std::{
    fs::{self, File},
    path::PathBuf,
    process::exit,
};

use colored::Colorize;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger,
};

use crate::version::Version;

pub struct PanelInit;

impl PanelInit {
    pub fn init_logging(debug: bool, log_file: PathBuf) {
        if let Some(parent) = log_file.parent() {
            if !parent.exists() {
                if let Err(error) = fs::create_dir_all(parent) {
                    println!("Failed to create logs directory: {}", &error);
                    exit(1);
                }
            }
        }

        Self::init_logging_with_writeable(
            debug,
            File::create(log_file).expect("Failed to create log file"),
        );
    }

    pub fn init_logging_with_writeable(debug: bool, log_file: File) {
        let level = if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };

        let mut config = ConfigBuilder::new();
        if debug {
            config.set_location_level(LevelFilter::Error);
        }

        CombinedLogger::init(vec![
            TermLogger::new(
                level,
                config.build(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            ),
            WriteLogger::new(level, config.build(), log_file),
        ])
        .expect("Failed to init logging crate");
    }

    pub fn print_ascii_art(application: &str, version: &Version, authors: &[&str]) {
        println!(
            "{}{}",
            r" _   _       _       _".blue(),
            r"                      ".cyan()
        );
        println!(
            "{}{}",
            r"| | | | __ _| |_ ___| |__".blue(),
            r"  ___ _ __ _   _     ".cyan()
        );
        println!(
            "{}{}",
            r"| |_| |/ _` | __/ __| '_ \".blue(),
            r" / _ \ '__| | | |    ".cyan()
        );
        println!(
            "{}{}",
            r"|  _  | (_| | || (__| | | |".blue(),
            r"  __/ |  | |_| |    ".cyan()
        );
        println!(
            "{}{}",
            r"|_| |_|\__,_|\__\___|_| |_|".blue(),
            r"\___|_|   \__, |    ".cyan()
        );
        println!(
            "{}{}",
            r"                           ".blue(),
            r"          |___/     ".cyan()
        );
        println!();
        println!(
            "«{}» {} | {} by {}",
            "*".blue(),
            application.blue(),
            format!("v{}", version).blue(),
            authors.join(", ").blue()
        );
        println!();
    }
}
