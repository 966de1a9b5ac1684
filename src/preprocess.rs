use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};

// Header crop geometry, tuned for phone messaging apps: the sender label
// sits in the top strip, right of the back button and left of the call
// and video icons.
const MIN_CROP_HEIGHT: u32 = 115;
const CROP_HEIGHT_RATIO: f32 = 0.10;
const CROP_LEFT_RATIO: f32 = 0.125;
const CROP_RIGHT_RATIO: f32 = 0.60;

const UPSCALE_TRIGGER_WIDTH: u32 = 800;
const UPSCALE_TARGET_WIDTH: f32 = 1200.0;

const HEADER_CONTRAST_FACTOR: f32 = 2.5;
const HEADER_SHARPNESS_FACTOR: f32 = 2.0;
const BODY_CONTRAST_FACTOR: f32 = 1.8;
const AUTOCONTRAST_CUTOFF: f32 = 0.05;

/// Crop, upscale and enhance the header region of a screenshot so the
/// sender identifier survives OCR.
///
/// Total over any decoded input: every step is a pure transform and none
/// of them can fail.
pub fn normalize_header(img: &DynamicImage) -> GrayImage {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let crop_height = ((height as f32 * CROP_HEIGHT_RATIO) as u32)
        .max(MIN_CROP_HEIGHT)
        .min(height);
    let left = (width as f32 * CROP_LEFT_RATIO) as u32;
    let right = (width as f32 * CROP_RIGHT_RATIO) as u32;
    let mut cropped = rgb.crop_imm(left, 0, right.saturating_sub(left), crop_height);

    let (w, h) = (cropped.width(), cropped.height());
    if w > 0 && w < UPSCALE_TRIGGER_WIDTH {
        let scale = UPSCALE_TARGET_WIDTH / w as f32;
        cropped = cropped.resize_exact(
            (w as f32 * scale).round() as u32,
            (h as f32 * scale).round() as u32,
            image::imageops::FilterType::Lanczos3,
        );
    }

    let mut gray = cropped.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return gray;
    }

    // Dark-mode screenshots render the sender label light-on-dark, which
    // tesseract reads poorly; flip them to a light-mode orientation.
    if mean_brightness(&gray) < 127.0 {
        image::imageops::invert(&mut gray);
    }

    let gray = autocontrast(&gray, AUTOCONTRAST_CUTOFF);
    let gray = adjust_contrast(&gray, HEADER_CONTRAST_FACTOR);
    let gray = sharpen(&gray, HEADER_SHARPNESS_FACTOR);

    // Small median filter to knock out compression artifacts.
    median_filter(&gray, 1, 1)
}

/// Light-touch preparation of the full image for the message-body OCR
/// pass: grayscale plus a mild contrast boost, no cropping.
pub fn prepare_body(img: &DynamicImage) -> GrayImage {
    let gray = img.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return gray;
    }
    adjust_contrast(&gray, BODY_CONTRAST_FACTOR)
}

/// Mean pixel value over the whole image.
pub fn mean_brightness(img: &GrayImage) -> f32 {
    let count = (img.width() as u64 * img.height() as u64) as f32;
    let sum: u64 = img.pixels().map(|p| p.0[0] as u64).sum();
    sum as f32 / count
}

/// Histogram stretch that ignores `cutoff` (fraction) of pixels at each
/// end before remapping the remaining range to 0..=255.
pub fn autocontrast(img: &GrayImage, cutoff: f32) -> GrayImage {
    let mut histogram = [0u32; 256];
    for p in img.pixels() {
        histogram[p.0[0] as usize] += 1;
    }
    let total = img.width() * img.height();
    let cut = (total as f32 * cutoff) as u32;

    let mut lo = 0usize;
    let mut acc = 0u32;
    for (i, &count) in histogram.iter().enumerate() {
        acc += count;
        if acc > cut {
            lo = i;
            break;
        }
    }
    let mut hi = 255usize;
    acc = 0;
    for (i, &count) in histogram.iter().enumerate().rev() {
        acc += count;
        if acc > cut {
            hi = i;
            break;
        }
    }
    if hi <= lo {
        return img.clone();
    }

    let scale = 255.0 / (hi - lo) as f32;
    map_pixels(img, |v| (v - lo as f32) * scale)
}

/// Contrast enhancement anchored at the image mean: 1.0 leaves the image
/// unchanged, larger factors push pixels away from the mean.
pub fn adjust_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let mean = mean_brightness(img).round();
    map_pixels(img, |v| mean + (v - mean) * factor)
}

/// Unsharp-style sharpening: 1.0 leaves the image unchanged, larger
/// factors amplify the difference from a blurred copy.
pub fn sharpen(img: &GrayImage, factor: f32) -> GrayImage {
    let blurred = gaussian_blur_f32(img, 1.0);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let original = img.get_pixel(x, y).0[0] as f32;
        let smooth = blurred.get_pixel(x, y).0[0] as f32;
        Luma([(smooth + (original - smooth) * factor).clamp(0.0, 255.0) as u8])
    })
}

fn map_pixels(img: &GrayImage, f: impl Fn(f32) -> f32) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img.get_pixel(x, y).0[0] as f32;
        Luma([f(v).clamp(0.0, 255.0) as u8])
    })
}
