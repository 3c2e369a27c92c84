use crate::utils::error::{Result, TrafficError};
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Linear contrast stretch: `|alpha * p + beta|`, saturated to `[0, 255]`.
pub fn enhance_contrast(image: &mut RgbImage, alpha: f32, beta: f32) {
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let value = (alpha * f32::from(*channel) + beta).abs().round();
            *channel = value.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Scale factor that fits `(width, height)` inside the bounds without upscaling.
pub fn fit_scale(width: u32, height: u32, max_width: u32, max_height: u32) -> f64 {
    let scale_w = f64::from(max_width) / f64::from(width);
    let scale_h = f64::from(max_height) / f64::from(height);
    scale_w.min(scale_h).min(1.0)
}

/// Downscale to fit within `max_width x max_height`, keeping the aspect ratio.
pub fn fit_within(image: RgbImage, max_width: u32, max_height: u32) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TrafficError::processing(format!(
            "invalid image dimensions: {}x{}",
            width, height
        )));
    }

    let scale = fit_scale(width, height, max_width, max_height);
    if scale >= 1.0 {
        return Ok(image);
    }

    let new_width = ((f64::from(width) * scale) as u32).max(1);
    let new_height = ((f64::from(height) * scale) as u32).max(1);
    tracing::debug!(
        "Resizing image {}x{} -> {}x{}",
        width,
        height,
        new_width,
        new_height
    );

    Ok(imageops::resize(&image, new_width, new_height, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_contrast_saturates() {
        let mut image = RgbImage::from_pixel(2, 2, Rgb([0, 100, 250]));
        enhance_contrast(&mut image, 1.2, 10.0);

        assert_eq!(image.get_pixel(0, 0), &Rgb([10, 130, 255]));
    }

    #[test]
    fn test_fit_never_upscales() {
        let image = RgbImage::new(640, 480);
        let resized = fit_within(image, 1280, 720).unwrap();
        assert_eq!(resized.dimensions(), (640, 480));
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        let image = RgbImage::new(1920, 1080);
        let resized = fit_within(image, 1280, 720).unwrap();
        assert_eq!(resized.dimensions(), (1280, 720));

        let tall = RgbImage::new(1000, 2000);
        let resized = fit_within(tall, 1280, 720).unwrap();
        assert_eq!(resized.dimensions(), (360, 720));
    }

    #[test]
    fn test_fit_truncates_like_double_precision() {
        let resized = fit_within(RgbImage::new(2128, 800), 1280, 720).unwrap();
        assert_eq!(resized.dimensions(), (1280, 481));

        let resized = fit_within(RgbImage::new(2139, 800), 1280, 720).unwrap();
        assert_eq!(resized.dimensions(), (1279, 478));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        assert!(fit_within(RgbImage::new(0, 10), 1280, 720).is_err());
    }
}
