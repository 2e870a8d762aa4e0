use image::Rgba;
use imageproc::map::map_colors;
use log::debug;

use crate::models::{PreprocessingParameters, ProcessedImage, SourceImage};

// BT.601 luma weights in thousandths, so ties against the threshold are exact.
const LUMA_R: u32 = 299;
const LUMA_G: u32 = 587;
const LUMA_B: u32 = 114;

/// Brightness, contrast, grayscale and binarization in one pass.
///
/// Pure: the source is only borrowed and the same inputs always give the same
/// output buffer.
pub fn preprocess(source: &SourceImage, params: &PreprocessingParameters) -> ProcessedImage {
    let offset = params.brightness_offset() as f32;
    let factor = params.contrast_factor();
    let threshold = params.threshold;

    debug!(
        "Preprocessing {}x{} (brightness offset {}, contrast factor {:.3}, threshold {})",
        source.width(),
        source.height(),
        offset,
        factor,
        threshold
    );

    let pixels = map_colors(source.pixels(), |pixel: Rgba<u8>| {
        let [r, g, b, a] = pixel.0;
        let adjust = |channel: u8| contrast(brighten(channel, offset), factor);
        let value = binarize(luminance_milli(adjust(r), adjust(g), adjust(b)), threshold);
        Rgba([value, value, value, a])
    });

    ProcessedImage::new(pixels)
}

fn brighten(channel: u8, offset: f32) -> u8 {
    clamp_channel(f32::from(channel) + offset)
}

fn contrast(channel: u8, factor: f32) -> u8 {
    clamp_channel(factor * (f32::from(channel) - 128.0) + 128.0)
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Luminance scaled by 1000.
fn luminance_milli(r: u8, g: u8, b: u8) -> u32 {
    LUMA_R * u32::from(r) + LUMA_G * u32::from(g) + LUMA_B * u32::from(b)
}

/// White only when luminance is strictly above the threshold; a tie is black.
fn binarize(luminance_milli: u32, threshold: u8) -> u8 {
    if luminance_milli > u32::from(threshold) * 1000 {
        255
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn gradient() -> SourceImage {
        SourceImage::new(RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8, (x * y) as u8])
        }))
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let source = gradient();
        let params = PreprocessingParameters::new(130, 70, 90);
        let first = preprocess(&source, &params);
        let second = preprocess(&source, &params);
        assert_eq!(first.pixels().as_raw(), second.pixels().as_raw());
        assert_eq!(source, gradient());
    }

    #[test]
    fn test_output_is_binary_and_keeps_dimensions_and_alpha() {
        let source = gradient();
        let processed = preprocess(&source, &PreprocessingParameters::default());
        assert_eq!(processed.pixels().dimensions(), (16, 16));
        for (x, y, pixel) in processed.pixels().enumerate_pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
            assert_eq!(pixel[3], source.pixels().get_pixel(x, y)[3]);
        }
    }

    #[test]
    fn test_threshold_tie_is_black() {
        let source = SourceImage::new(RgbaImage::from_pixel(1, 1, Rgba([128, 128, 128, 255])));
        let processed = preprocess(&source, &PreprocessingParameters::default());
        assert_eq!(processed.pixels().get_pixel(0, 0), &Rgba([0, 0, 0, 255]));

        let source = SourceImage::new(RgbaImage::from_pixel(1, 1, Rgba([129, 129, 129, 255])));
        let processed = preprocess(&source, &PreprocessingParameters::default());
        assert_eq!(processed.pixels().get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_tie_with_mixed_channels() {
        // 0.299 * 100 + 0.587 * 200 + 0.114 * 0 = 147.3, not a tie at 147
        assert_eq!(binarize(luminance_milli(100, 200, 0), 147), 255);
        // 0.299 * 0 + 0.587 * 0 + 0.114 * 250 = 28.5
        assert_eq!(binarize(luminance_milli(0, 0, 250), 28), 255);
        assert_eq!(binarize(luminance_milli(0, 0, 250), 29), 0);
        assert_eq!(binarize(luminance_milli(255, 255, 255), 255), 0);
        assert_eq!(binarize(luminance_milli(0, 0, 0), 0), 0);
    }

    #[test]
    fn test_default_adjustments_are_identity() {
        let params = PreprocessingParameters::default();
        let offset = params.brightness_offset() as f32;
        let factor = params.contrast_factor();
        for channel in 0..=255u8 {
            assert_eq!(contrast(brighten(channel, offset), factor), channel);
        }
    }

    #[test]
    fn test_brightness_shifts_the_cut() {
        // luminance 120 is black at the default threshold, white once brightened by 20
        let source = SourceImage::new(RgbaImage::from_pixel(1, 1, Rgba([120, 120, 120, 255])));
        let dark = preprocess(&source, &PreprocessingParameters::default());
        let bright = preprocess(&source, &PreprocessingParameters::new(120, 100, 128));
        assert_eq!(dark.pixels().get_pixel(0, 0)[0], 0);
        assert_eq!(bright.pixels().get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_contrast_pushes_away_from_mid_gray() {
        let factor = PreprocessingParameters::new(100, 200, 128).contrast_factor();
        assert!(contrast(140, factor) > 140);
        assert!(contrast(110, factor) < 110);
        assert_eq!(contrast(128, factor), 128);
        assert_eq!(contrast(250, factor), 255);
        assert_eq!(contrast(3, factor), 0);
    }
}
