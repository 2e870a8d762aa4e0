pub mod extractors;
pub mod image_processor;
pub mod ocr;
pub mod preprocess;

pub use extractors::{extract, extract_identity, extract_vehicle, FieldExtractor};
pub use image_processor::{ImageProcessor, ImageUpload, MediaType};
pub use ocr::{RecognitionProgress, TesseractRecognizer, TextRecognizer, DEFAULT_LANGUAGE};
pub use preprocess::preprocess;
