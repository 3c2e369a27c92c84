use crate::domain::model::Detection;
use crate::utils::error::Result;
use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const BOX_THICKNESS: i32 = 3;
const JPEG_QUALITY: u8 = 90;

/// Draw a class-coloured box around every vehicle detection.
pub fn draw_vehicle_boxes(image: &mut RgbImage, vehicles: &[Detection]) {
    let (width, height) = image.dimensions();

    for detection in vehicles {
        let Some(class) = detection.vehicle_class() else {
            continue;
        };
        let color = Rgb(class.color());

        let [x1, y1, x2, y2] = detection.bbox;
        let x1 = x1.clamp(0.0, width as f32) as i32;
        let y1 = y1.clamp(0.0, height as f32) as i32;
        let x2 = x2.clamp(0.0, width as f32) as i32;
        let y2 = y2.clamp(0.0, height as f32) as i32;

        // nested 1px rects give the thick outline
        for inset in 0..BOX_THICKNESS {
            let w = x2 - x1 - 2 * inset;
            let h = y2 - y1 - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(x1 + inset, y1 + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, rect, color);
        }
    }
}

pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY).encode_image(image)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_id: usize, bbox: [f32; 4]) -> Detection {
        Detection {
            bbox,
            confidence: 0.8,
            class_id,
        }
    }

    #[test]
    fn test_boxes_use_class_colour() {
        let mut image = RgbImage::new(50, 50);
        draw_vehicle_boxes(&mut image, &[detection(2, [10.0, 10.0, 40.0, 40.0])]);

        assert_eq!(image.get_pixel(10, 20), &Rgb([0, 255, 0]));
        assert_eq!(image.get_pixel(12, 20), &Rgb([0, 255, 0]));
        // interior untouched
        assert_eq!(image.get_pixel(25, 25), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_non_vehicles_and_degenerate_boxes_are_skipped() {
        let mut image = RgbImage::new(20, 20);
        draw_vehicle_boxes(
            &mut image,
            &[
                detection(0, [2.0, 2.0, 18.0, 18.0]),
                detection(7, [5.0, 5.0, 5.0, 12.0]),
            ],
        );
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_encode_jpeg_produces_jpeg_magic() {
        let image = RgbImage::new(8, 8);
        let bytes = encode_jpeg(&image).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
