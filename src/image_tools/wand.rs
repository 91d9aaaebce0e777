//! Magic wand: flood fill over the page image.

use docanno_geometry::Point;
use image::RgbaImage;

use super::mask::Mask;

/// Fill the 4-connected region around `seed` whose pixels stay within
/// `threshold` of the seed color on every channel.
///
/// Returns `None` if the seed lies outside the image.
pub fn flood_fill(image: &RgbaImage, seed: Point, threshold: u8) -> Option<Mask> {
    if seed.x < 0.0 || seed.y < 0.0 {
        return None;
    }
    let (sx, sy) = (seed.x.floor() as u32, seed.y.floor() as u32);
    if sx >= image.width() || sy >= image.height() {
        return None;
    }

    let reference = image.get_pixel(sx, sy).0;
    let matches = |x: u32, y: u32| {
        let pixel = image.get_pixel(x, y).0;
        pixel
            .iter()
            .zip(reference.iter())
            .all(|(a, b)| a.abs_diff(*b) <= threshold)
    };

    let mut mask = Mask::new(image.width(), image.height());
    let mut stack = vec![(sx, sy)];
    mask.set(sx, sy);
    while let Some((x, y)) = stack.pop() {
        let neighbours = [
            x.checked_sub(1).map(|nx| (nx, y)),
            (x + 1 < image.width()).then_some((x + 1, y)),
            y.checked_sub(1).map(|ny| (x, ny)),
            (y + 1 < image.height()).then_some((x, y + 1)),
        ];
        for (nx, ny) in neighbours.into_iter().flatten() {
            if !mask.get(nx, ny) && matches(nx, ny) {
                mask.set(nx, ny);
                stack.push((nx, ny));
            }
        }
    }

    log::debug!(
        "🪄 Wand at ({}, {}) filled {} pixels",
        sx,
        sy,
        mask.count()
    );
    Some(mask)
}
