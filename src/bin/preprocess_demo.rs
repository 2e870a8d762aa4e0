// Writes the binarized image the recognizer would see, for tuning the sliders.

use clap::Parser;
use image::DynamicImage;
use std::path::PathBuf;

use kyc_lens::models::PreprocessingParameters;
use kyc_lens::processing::{preprocess, ImageProcessor, ImageUpload};
use kyc_lens::ScanError;

#[derive(Parser, Debug)]
#[command(name = "preprocess_demo")]
struct Args {
    /// Document image (JPEG or PNG)
    input: PathBuf,

    /// Output PNG
    #[arg(short, long, default_value = "processed.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 100)]
    brightness: u8,

    #[arg(long, default_value_t = 100)]
    contrast: u8,

    #[arg(long, default_value_t = 128)]
    threshold: u8,
}

fn main() -> Result<(), ScanError> {
    env_logger::init();
    let args = Args::parse();

    let source = ImageProcessor::decode(&ImageUpload::from_path(&args.input)?)?;
    let params = PreprocessingParameters::new(args.brightness, args.contrast, args.threshold);
    let processed = preprocess(&source, &params);

    let png = ImageProcessor::encode_png(DynamicImage::ImageRgba8(processed.pixels().clone()))?;
    std::fs::write(&args.output, png)?;

    println!(
        "Wrote {}x{} processed image to {:?} (brightness {}, contrast {}, threshold {})",
        processed.width(),
        processed.height(),
        args.output,
        params.brightness,
        params.contrast,
        params.threshold
    );
    Ok(())
}
