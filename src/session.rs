use log::{debug, info, warn};

use crate::config::ScanConfig;
use crate::models::{
    DocumentKind, ExtractedFields, PreprocessingParameters, ProcessedImage, SourceImage,
    MAX_ADJUSTMENT,
};
use crate::processing::{extract, preprocess, ImageProcessor, ImageUpload, RecognitionProgress, TextRecognizer};
use crate::utils::ScanError;
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A dismissable, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Notification { level: NotificationLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notification { level: NotificationLevel::Warning, message: message.into() }
    }
}

impl From<&ScanError> for Notification {
    fn from(err: &ScanError) -> Self {
        Notification { level: NotificationLevel::Error, message: err.to_string() }
    }
}

/// One document being scanned: the loaded image, its processed copy, the
/// preprocessing knobs and the fields the user is reviewing.
///
/// Every operation either succeeds or leaves the previous state in place and
/// records a [`Notification`].
pub struct ScanSession<R: TextRecognizer> {
    kind: DocumentKind,
    recognizer: R,
    config: ScanConfig,
    params: PreprocessingParameters,
    source: Option<SourceImage>,
    processed: Option<ProcessedImage>,
    fields: Option<ExtractedFields>,
    edited: bool,
    progress: Option<RecognitionProgress>,
    notifications: Vec<Notification>,
}

impl<R: TextRecognizer> ScanSession<R> {
    pub fn new(kind: DocumentKind, recognizer: R) -> Self {
        Self::with_config(kind, recognizer, ScanConfig::default())
    }

    pub fn with_config(kind: DocumentKind, recognizer: R, config: ScanConfig) -> Self {
        ScanSession {
            kind,
            recognizer,
            params: config.defaults,
            config,
            source: None,
            processed: None,
            fields: None,
            edited: false,
            progress: None,
            notifications: Vec::new(),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn parameters(&self) -> PreprocessingParameters {
        self.params
    }

    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn processed_image(&self) -> Option<&ProcessedImage> {
        self.processed.as_ref()
    }

    pub fn fields(&self) -> Option<&ExtractedFields> {
        self.fields.as_ref()
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn last_progress(&self) -> Option<RecognitionProgress> {
        self.progress
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Decodes a new document image. On failure the previous image, processed
    /// image and fields are kept untouched.
    pub fn load(&mut self, upload: &ImageUpload) -> Result<(), ScanError> {
        let source = match ImageProcessor::decode(upload) {
            Ok(source) => source,
            Err(err) => return self.fail(err),
        };
        self.source = Some(source);
        self.fields = None;
        self.edited = false;
        self.progress = None;
        self.recompute();
        Ok(())
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.params.brightness = brightness.min(MAX_ADJUSTMENT);
        self.recompute();
    }

    pub fn set_contrast(&mut self, contrast: u8) {
        self.params.contrast = contrast.min(MAX_ADJUSTMENT);
        self.recompute();
    }

    pub fn set_threshold(&mut self, threshold: u8) {
        self.params.threshold = threshold;
        self.recompute();
    }

    pub fn set_parameters(&mut self, params: PreprocessingParameters) {
        self.params = PreprocessingParameters::new(params.brightness, params.contrast, params.threshold);
        self.recompute();
    }

    /// Back to `(100, 100, 128)`, not to the configured defaults.
    pub fn reset_parameters(&mut self) {
        self.params.reset();
        self.recompute();
    }

    pub fn can_extract(&self) -> bool {
        self.processed.is_some()
    }

    pub fn extract(&mut self) -> Result<&ExtractedFields, ScanError> {
        self.extract_with_progress(|_| {})
    }

    /// Recognizes the processed image as it is right now and replaces the
    /// reviewed fields with a fresh extraction.
    pub fn extract_with_progress<F>(&mut self, mut on_progress: F) -> Result<&ExtractedFields, ScanError>
    where
        F: FnMut(RecognitionProgress),
    {
        let Some(processed) = self.processed.as_ref() else {
            return self.fail(ScanError::NoProcessedImage);
        };

        let mut last = None;
        let mut report = |progress: RecognitionProgress| {
            debug!("Recognition progress: {:?}", progress);
            last = Some(progress);
            on_progress(progress);
        };
        let outcome = self
            .recognizer
            .recognize(processed, &self.config.language, &mut report);
        self.progress = last;

        let result = match outcome {
            Ok(result) => result,
            Err(err) => return self.fail(err),
        };

        if self.edited {
            warn!("Re-extraction replaces edited {} fields", self.kind);
            self.notifications
                .push(Notification::warning("Previous edits were replaced by the new extraction"));
        }

        let fields = extract(self.kind, &result);
        if fields.meets_confidence(self.config.high_confidence_threshold) {
            self.notifications.push(Notification::info(format!(
                "High confidence extraction ({:.0}%)",
                fields.confidence()
            )));
        }
        info!("Extracted {} fields with confidence {}", self.kind, fields.confidence());
        self.edited = false;
        Ok(&*self.fields.insert(fields))
    }

    pub fn is_high_confidence(&self) -> bool {
        self.fields
            .as_ref()
            .map(|f| f.meets_confidence(self.config.high_confidence_threshold))
            .unwrap_or(false)
    }

    /// Edits one field by name. Edits stay in the session until [`confirm`](Self::confirm).
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), ScanError> {
        let outcome = match self.fields.as_mut() {
            Some(fields) => fields.set_field(name, value),
            None => Err(ScanError::UnknownField(format!("{} (nothing extracted yet)", name))),
        };
        match outcome {
            Ok(()) => {
                self.edited = true;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn fields_mut(&mut self) -> Option<&mut ExtractedFields> {
        let fields = self.fields.as_mut()?;
        self.edited = true;
        Some(fields)
    }

    pub fn confirm<F>(&mut self, on_confirm: F) -> Result<(), ScanError>
    where
        F: FnOnce(ExtractedFields),
    {
        let outcome = match self.fields.as_ref() {
            Some(fields) => validation::confirm(fields, on_confirm),
            None => Err(ScanError::MissingPrimaryField(match self.kind {
                DocumentKind::Identity => "documentNumber",
                DocumentKind::Vehicle => "plate",
            })),
        };
        match outcome {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    fn recompute(&mut self) {
        if let Some(source) = &self.source {
            self.processed = Some(preprocess(source, &self.params));
        }
    }

    fn fail<T>(&mut self, err: ScanError) -> Result<T, ScanError> {
        warn!("{}", err);
        self.notifications.push(Notification::from(&err));
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecognitionResult;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::cell::RefCell;

    struct StubRecognizer {
        text: String,
        confidence: f32,
        fail: bool,
        seen: RefCell<Vec<(ProcessedImage, String)>>,
    }

    impl StubRecognizer {
        fn new(text: &str, confidence: f32) -> Self {
            StubRecognizer {
                text: text.to_string(),
                confidence,
                fail: false,
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            StubRecognizer { fail: true, ..StubRecognizer::new("", 0.0) }
        }
    }

    impl TextRecognizer for StubRecognizer {
        fn recognize(
            &self,
            image: &ProcessedImage,
            language: &str,
            progress: &mut dyn FnMut(RecognitionProgress),
        ) -> Result<RecognitionResult, ScanError> {
            self.seen.borrow_mut().push((image.clone(), language.to_string()));
            progress(RecognitionProgress::Indeterminate);
            if self.fail {
                return Err(ScanError::Recognition("engine unavailable".to_string()));
            }
            progress(RecognitionProgress::Determinate(1.0));
            Ok(RecognitionResult::new(self.text.clone(), self.confidence))
        }
    }

    const CEDULA: &str = "CEDULA DE IDENTIDAD\nV-12345678\nAPELLIDOS: PÉREZ\nNOMBRES: ANA LUCÍA\nFECHA DE NACIMIENTO: 02-05-1988";

    fn png_upload(value: u8) -> ImageUpload {
        let img = RgbaImage::from_pixel(6, 4, Rgba([value, value, value, 255]));
        ImageUpload::new("image/png", ImageProcessor::encode_png(DynamicImage::ImageRgba8(img)).unwrap())
    }

    fn identity_session(confidence: f32) -> ScanSession<StubRecognizer> {
        ScanSession::new(DocumentKind::Identity, StubRecognizer::new(CEDULA, confidence))
    }

    #[test]
    fn test_full_identity_flow() {
        let mut session = identity_session(85.0);
        assert!(!session.can_extract());
        session.load(&png_upload(200)).unwrap();
        assert!(session.can_extract());

        let mut steps = Vec::new();
        let fields = session.extract_with_progress(|p| steps.push(p)).unwrap().clone();
        assert_eq!(steps.last(), Some(&RecognitionProgress::Determinate(1.0)));
        assert_eq!(session.last_progress(), Some(RecognitionProgress::Determinate(1.0)));
        assert!(session.is_high_confidence());

        let ExtractedFields::Identity(identity) = &fields else {
            panic!("expected identity fields")
        };
        assert_eq!(identity.document_number, "12345678");
        assert_eq!(identity.first_name, "ANA LUCÍA");
        assert_eq!(identity.last_name, "PÉREZ");
        assert_eq!(identity.date_of_birth, "02-05-1988");

        let seen = session.recognizer.seen.borrow();
        assert_eq!(seen[0].1, "spa");
        assert_eq!(&seen[0].0, session.processed_image().unwrap());
    }

    #[test]
    fn test_extract_without_image_notifies() {
        let mut session = identity_session(85.0);
        assert!(matches!(session.extract(), Err(ScanError::NoProcessedImage)));
        assert_eq!(session.notifications().len(), 1);
        assert_eq!(session.notifications()[0].level, NotificationLevel::Error);
        assert!(session.recognizer.seen.borrow().is_empty());
    }

    #[test]
    fn test_unsupported_type_keeps_previous_image() {
        let mut session = identity_session(85.0);
        session.load(&png_upload(10)).unwrap();
        let before = session.source_image().cloned();

        for media_type in ["image/gif", "application/pdf"] {
            let mut upload = png_upload(250);
            upload.media_type = media_type.to_string();
            let err = session.load(&upload).unwrap_err();
            assert!(matches!(err, ScanError::UnsupportedMediaType(_)));
        }

        assert_eq!(session.source_image().cloned(), before);
        let notes = session.take_notifications();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].message.contains("image/gif"));
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn test_parameter_changes_recompute() {
        let mut session = identity_session(85.0);
        session.load(&png_upload(120)).unwrap();
        assert_eq!(session.processed_image().unwrap().pixels().get_pixel(0, 0)[0], 0);

        session.set_brightness(130);
        assert_eq!(session.processed_image().unwrap().pixels().get_pixel(0, 0)[0], 255);

        session.set_threshold(200);
        assert_eq!(session.processed_image().unwrap().pixels().get_pixel(0, 0)[0], 0);

        session.set_contrast(255);
        assert_eq!(session.parameters().contrast, 200);

        session.reset_parameters();
        assert_eq!(session.parameters(), PreprocessingParameters::new(100, 100, 128));
        assert_eq!(session.processed_image().unwrap().pixels().get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_parameters_without_image_are_noop() {
        let mut session = identity_session(85.0);
        session.set_parameters(PreprocessingParameters::new(10, 20, 30));
        assert!(session.processed_image().is_none());
        assert_eq!(session.parameters(), PreprocessingParameters::new(10, 20, 30));
    }

    #[test]
    fn test_edits_survive_preprocessing_and_are_confirmed() {
        let mut session = identity_session(60.0);
        session.load(&png_upload(200)).unwrap();
        session.extract().unwrap();
        assert!(!session.is_high_confidence());

        session.set_field("firstName", "ANA").unwrap();
        session.set_threshold(10);
        assert!(session.is_edited());

        let mut confirmed = None;
        session.confirm(|fields| confirmed = Some(fields)).unwrap();
        match confirmed {
            Some(ExtractedFields::Identity(f)) => {
                assert_eq!(f.first_name, "ANA");
                assert_eq!(f.confidence, 60.0);
            }
            other => panic!("unexpected confirmation: {:?}", other),
        }
    }

    #[test]
    fn test_reextraction_after_edits_warns() {
        let mut session = identity_session(85.0);
        session.load(&png_upload(200)).unwrap();
        session.extract().unwrap();
        session.take_notifications();

        if let Some(ExtractedFields::Identity(f)) = session.fields_mut() {
            f.last_name = "GOMEZ".to_string();
        }
        session.extract().unwrap();

        assert!(!session.is_edited());
        assert!(session
            .notifications()
            .iter()
            .any(|n| n.level == NotificationLevel::Warning));
    }

    #[test]
    fn test_recognition_failure_keeps_fields() {
        let mut session = ScanSession::new(DocumentKind::Vehicle, StubRecognizer::failing());
        session.load(&png_upload(200)).unwrap();
        let err = session.extract().unwrap_err();
        assert!(matches!(err, ScanError::Recognition(_)));
        assert!(session.fields().is_none());
        assert_eq!(session.last_progress(), Some(RecognitionProgress::Indeterminate));
        assert_eq!(session.notifications().len(), 1);
    }

    #[test]
    fn test_vehicle_partial_data_and_missing_plate() {
        let recognizer = StubRecognizer::new("MODELO: SPARK\nCOLOR: ROJO", 45.0);
        let mut session = ScanSession::new(DocumentKind::Vehicle, recognizer);
        session.load(&png_upload(200)).unwrap();
        session.extract().unwrap();

        assert!(matches!(
            session.confirm(|_| {}),
            Err(ScanError::MissingPrimaryField("plate"))
        ));
        session.set_field("plate", "AB123CD").unwrap();
        assert!(session.confirm(|_| {}).is_ok());
    }

    #[test]
    fn test_confirm_before_extraction_fails() {
        let mut session = identity_session(85.0);
        assert!(session.confirm(|_| {}).is_err());
        assert!(session.set_field("firstName", "X").is_err());
    }

    #[test]
    fn test_new_image_clears_fields() {
        let mut session = identity_session(85.0);
        session.load(&png_upload(200)).unwrap();
        session.extract().unwrap();
        session.load(&png_upload(50)).unwrap();
        assert!(session.fields().is_none());
        assert!(session.last_progress().is_none());
    }
}
