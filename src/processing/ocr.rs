use log::{debug, info};
use std::path::PathBuf;
use tesseract::Tesseract;

use crate::models::{ProcessedImage, RecognitionResult};
use crate::processing::ImageProcessor;
use crate::utils::ScanError;

/// Language hint used for identity and vehicle documents.
pub const DEFAULT_LANGUAGE: &str = "spa";

/// Progress reported by a recognizer while it runs. Purely informational:
/// engines without incremental reporting stay `Indeterminate` until done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecognitionProgress {
    Indeterminate,
    Determinate(f32),
}

/// A local text recognition capability.
pub trait TextRecognizer {
    fn recognize(
        &self,
        image: &ProcessedImage,
        language: &str,
        progress: &mut dyn FnMut(RecognitionProgress),
    ) -> Result<RecognitionResult, ScanError>;
}

/// Runs Tesseract in-process. Nothing is sent over the network: the image
/// reaches the engine through a temporary file on the local disk.
#[derive(Debug, Clone, Default)]
pub struct TesseractRecognizer {
    tessdata_dir: Option<PathBuf>,
}

impl TesseractRecognizer {
    pub fn new(tessdata_dir: Option<PathBuf>) -> Self {
        TesseractRecognizer { tessdata_dir }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(
        &self,
        image: &ProcessedImage,
        language: &str,
        progress: &mut dyn FnMut(RecognitionProgress),
    ) -> Result<RecognitionResult, ScanError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ScanError::Recognition("Image is empty".to_string()));
        }
        let (text, confidence) = report_progress(progress, || self.run_engine(image, language))?;

        if text.trim().is_empty() {
            return Err(ScanError::Recognition("No text recognized".to_string()));
        }

        debug!("Recognized text:\n{}", text);
        info!("Recognition finished with confidence {}", confidence);
        Ok(RecognitionResult::new(text, confidence))
    }
}

impl TesseractRecognizer {
    fn run_engine(&self, image: &ProcessedImage, language: &str) -> Result<(String, f32), ScanError> {
        let temp_file = ImageProcessor::save_to_temp_file(&image.to_luma())?;
        let image_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| ScanError::Recognition("Failed to convert path to string".to_string()))?;
        let datapath = match &self.tessdata_dir {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| ScanError::Recognition("Invalid tessdata path".to_string()))?,
            ),
            None => None,
        };

        let mut tess = Tesseract::new(datapath, Some(language))
            .map_err(|e| ScanError::Recognition(format!("Tesseract init error: {}", e)))?;
        tess.set_page_seg_mode(tesseract::PageSegMode::PsmAuto);

        let mut tess = tess
            .set_image(image_path)
            .map_err(|e| ScanError::Recognition(format!("Tesseract set image error: {}", e)))?
            .recognize()
            .map_err(|e| ScanError::Recognition(format!("Tesseract error: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| ScanError::Recognition(format!("Tesseract get text error: {}", e)))?;
        let confidence = tess.mean_text_conf() as f32;
        Ok((text, confidence))
    }
}

/// Brackets a blocking engine call: `Indeterminate` before it starts and
/// `Determinate(1.0)` only once it has succeeded.
fn report_progress<T, F>(
    progress: &mut dyn FnMut(RecognitionProgress),
    run: F,
) -> Result<T, ScanError>
where
    F: FnOnce() -> Result<T, ScanError>,
{
    progress(RecognitionProgress::Indeterminate);
    let outcome = run()?;
    progress(RecognitionProgress::Determinate(1.0));
    Ok(outcome)
}
