use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BRIGHTNESS: u8 = 100;
pub const DEFAULT_CONTRAST: u8 = 100;
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Upper bound of the brightness and contrast sliders.
pub const MAX_ADJUSTMENT: u8 = 200;

/// Decoded raster image as selected by the user. Never modified by preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Self {
        SourceImage { pixels }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Binarized copy of a [`SourceImage`]: same dimensions, RGB channels are 0 or 255.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    pixels: RgbaImage,
}

impl ProcessedImage {
    pub fn new(pixels: RgbaImage) -> Self {
        ProcessedImage { pixels }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Single channel view handed to the recognizer. Binarized pixels have
    /// R == G == B, so the red channel carries the full information.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            image::Luma([self.pixels.get_pixel(x, y)[0]])
        })
    }
}

/// The three preprocessing knobs.
///
/// `brightness` and `contrast` range over `0..=200` with 100 meaning "unchanged",
/// `threshold` covers the full `0..=255` luminance range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingParameters {
    pub brightness: u8,
    pub contrast: u8,
    pub threshold: u8,
}

impl Default for PreprocessingParameters {
    fn default() -> Self {
        PreprocessingParameters {
            brightness: DEFAULT_BRIGHTNESS,
            contrast: DEFAULT_CONTRAST,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl PreprocessingParameters {
    pub fn new(brightness: u8, contrast: u8, threshold: u8) -> Self {
        PreprocessingParameters {
            brightness: brightness.min(MAX_ADJUSTMENT),
            contrast: contrast.min(MAX_ADJUSTMENT),
            threshold,
        }
    }

    pub fn reset(&mut self) {
        *self = PreprocessingParameters::default();
    }

    /// Signed offset added to every colour channel.
    pub fn brightness_offset(&self) -> i32 {
        i32::from(self.brightness.min(MAX_ADJUSTMENT)) - i32::from(DEFAULT_BRIGHTNESS)
    }

    /// Contrast stretch factor. The slider is centred on 100, so the formula
    /// receives `contrast - 100` and the default yields exactly 1.0.
    pub fn contrast_factor(&self) -> f32 {
        let c = f32::from(self.contrast.min(MAX_ADJUSTMENT)) - f32::from(DEFAULT_CONTRAST);
        (259.0 * (c + 255.0)) / (255.0 * (259.0 - c))
    }
}
