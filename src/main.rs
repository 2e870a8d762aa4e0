// KYC document scanner
// Loads a document image, preprocesses it, runs local OCR and prints the extracted fields

use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

use kyc_lens::{
    models::{DocumentKind, ExtractedFields, PreprocessingParameters},
    processing::{ImageUpload, RecognitionProgress, TesseractRecognizer},
    NotificationLevel, ScanConfig, ScanError, ScanSession,
};

#[derive(Parser, Debug)]
#[command(name = "kyc-lens", about = "Scan an identity or vehicle document and extract its fields")]
struct Args {
    /// Document image (JPEG or PNG)
    image: PathBuf,

    /// Document kind: identity or vehicle
    #[arg(short, long, default_value = "identity")]
    kind: DocumentKind,

    /// Brightness, 0-200 (100 = unchanged)
    #[arg(long)]
    brightness: Option<u8>,

    /// Contrast, 0-200 (100 = unchanged)
    #[arg(long)]
    contrast: Option<u8>,

    /// Binarization threshold, 0-255
    #[arg(long)]
    threshold: Option<u8>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Correct a field before confirming, e.g. --set firstName=JUAN
    #[arg(long = "set", value_name = "NAME=VALUE")]
    edits: Vec<String>,

    /// Print the confirmed fields as JSON
    #[arg(long)]
    json: bool,
}

fn print_report(fields: &ExtractedFields, high_confidence: bool) {
    println!("\n===============================================");
    println!("      {} DOCUMENT SCAN", fields.kind().to_string().to_uppercase());
    println!("===============================================\n");

    for (name, value) in fields.entries() {
        let shown = if value.is_empty() { "(not found)" } else { value };
        println!("  {:<14} {}", name, shown);
    }
    println!(
        "\n  Confidence: {:.0}% ({})",
        fields.confidence(),
        if high_confidence { "HIGH" } else { "REVIEW RECOMMENDED" }
    );
}

fn run(args: Args) -> Result<(), ScanError> {
    let config = match &args.config {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    };
    let recognizer = TesseractRecognizer::new(config.resolved_tessdata_dir());
    let defaults = config.defaults;
    let mut session = ScanSession::with_config(args.kind, recognizer, config);

    session.set_parameters(PreprocessingParameters::new(
        args.brightness.unwrap_or(defaults.brightness),
        args.contrast.unwrap_or(defaults.contrast),
        args.threshold.unwrap_or(defaults.threshold),
    ));
    session.load(&ImageUpload::from_path(&args.image)?)?;

    session.extract_with_progress(|progress| {
        if let RecognitionProgress::Determinate(fraction) = progress {
            log::info!("Recognition {:.0}%", fraction * 100.0);
        }
    })?;

    for edit in &args.edits {
        let (name, value) = edit
            .split_once('=')
            .ok_or_else(|| ScanError::Config(format!("Expected NAME=VALUE, got {}", edit)))?;
        session.set_field(name, value)?;
    }

    let high_confidence = session.is_high_confidence();
    let json = args.json;
    session.confirm(|fields| {
        if json {
            match serde_json::to_string_pretty(&fields) {
                Ok(out) => println!("{}", out),
                Err(e) => error!("Failed to serialize fields: {}", e),
            }
        } else {
            print_report(&fields, high_confidence);
        }
    })?;

    for note in session.take_notifications() {
        if note.level != NotificationLevel::Error {
            eprintln!("note: {}", note.message);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
