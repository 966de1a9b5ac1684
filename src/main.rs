use clap::{Arg, Command};
use log::LevelFilter;
use smishscan::analyzer::Analyzer;
use smishscan::config::Config;
use smishscan::ocr::TesseractRecognizer;
use smishscan::reputation::VirusTotalClient;
use smishscan::senders::{JsonSenderStore, SenderSource, StaticSenderSet};
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    let matches = Command::new("smishscan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Screenshot smishing analyzer: sender ID verification and URL reputation checks")
        .arg(
            Arg::new("image")
                .value_name("IMAGE")
                .help("Screenshot of the message to analyze")
                .index(1),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("smishscan.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-rule classification traces")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = load_config(config_path);

    if matches.get_flag("test-config") {
        println!("Configuration is valid");
        println!("Organization: {}", config.organization);
        println!("Known senders: {}", config.known_senders.join(", "));
        return;
    }

    let Some(image_path) = matches.get_one::<String>("image") else {
        eprintln!("No image provided. Usage: smishscan <IMAGE>");
        process::exit(1);
    };

    let recognizer = match TesseractRecognizer::new(&config.ocr_language) {
        Ok(recognizer) => recognizer,
        Err(e) => {
            eprintln!("Error initializing OCR engine: {e}");
            process::exit(1);
        }
    };

    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        log::warn!("No VirusTotal API key configured; URL verdicts will report as errors");
    }
    let reputation = VirusTotalClient::new(api_key);
    let senders = build_sender_source(&config);

    let analyzer = Analyzer::new(config, recognizer, reputation, senders);
    match analyzer.analyze_file(Path::new(image_path)).await {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error analyzing image: {e}");
            process::exit(1);
        }
    }
}

fn load_config(path: &str) -> Config {
    if Path::new(path).exists() {
        match Config::from_file(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {path}");
                config
            }
            Err(e) => {
                eprintln!("Error loading configuration: {e}");
                process::exit(1);
            }
        }
    } else {
        log::info!("Config file {path} not found, using defaults");
        Config::default()
    }
}

/// Select the known-sender source once at startup: the JSON store when
/// configured and readable, otherwise the static list from the config.
fn build_sender_source(config: &Config) -> SenderSource {
    match &config.sender_store {
        Some(path) => match JsonSenderStore::load(Path::new(path)) {
            Ok(store) => SenderSource::Store(store),
            Err(e) => {
                log::warn!(
                    "Sender store {path} unavailable ({e}); falling back to configured list"
                );
                SenderSource::Static(StaticSenderSet::new(config.known_senders.clone()))
            }
        },
        None => SenderSource::Static(StaticSenderSet::new(config.known_senders.clone())),
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => println!("Generated default configuration at {path}"),
        Err(e) => {
            eprintln!("Error generating configuration: {e}");
            process::exit(1);
        }
    }
}
