//! Flattening transparent images for three-channel encoders.

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage};

/// Opaque white, the backdrop used before encoding to JPEG.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Composite an image over a solid background, dropping the alpha channel.
pub fn flatten_alpha(img: &DynamicImage, background: [u8; 3]) -> RgbImage {
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    let mut output: RgbImage = ImageBuffer::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |fg: u8, bg: u8| ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8;
        output.put_pixel(
            x,
            y,
            Rgb([blend(r, background[0]), blend(g, background[1]), blend(b, background[2])]),
        );
    }
    output
}

/// Check if a decoded image carries an alpha channel.
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}
