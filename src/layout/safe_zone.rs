use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::{Canvas, PixelRect};
use crate::foundation::error::{AdError, AdResult};

/// Share of the vertical overflow trimmed from the top when cropping; the rest comes off
/// the bottom. Product subjects tend to sit low in generated scenes.
const TOP_TRIM_BIAS: f64 = 0.65;

/// Darkening applied to the last row of the zone; rows above ramp down to none.
const ZONE_MAX_DARKEN: f32 = 0.35;

/// Fit `image` to `canvas` and reserve the bottom `fraction` of it for overlays.
///
/// The source is cover-scaled (uniformly, never distorted), cropped center-biased
/// horizontally and bottom-biased vertically, and the reserved zone gets a soft
/// darkening ramp so light copy stays legible. The zone spans the full canvas width and
/// the bottom `round(fraction * canvas.height)` rows.
pub fn reserve_safe_zone(
    image: &RgbaImage,
    canvas: Canvas,
    fraction: f32,
) -> AdResult<(RgbaImage, PixelRect)> {
    if !fraction.is_finite() || fraction <= 0.0 || fraction >= 1.0 {
        return Err(AdError::layout(format!(
            "safe zone fraction must be in (0, 1), got {fraction}"
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(AdError::layout("background image has zero size"));
    }
    let canvas = Canvas::new(canvas.width, canvas.height)
        .map_err(|e| AdError::layout(format!("invalid canvas: {e}")))?;

    let mut fitted = cover_crop(image, canvas);
    let zone = zone_rect(canvas, fraction);
    darken_zone(&mut fitted, zone);
    Ok((fitted, zone))
}

/// The reserved rectangle for `canvas` at `fraction`, without touching pixels.
pub fn zone_rect(canvas: Canvas, fraction: f32) -> PixelRect {
    let h = canvas.height;
    let zone_h = ((f64::from(fraction) * f64::from(h)).round() as u32).clamp(1, h);
    PixelRect::new(0, h - zone_h, canvas.width, zone_h)
}

fn cover_crop(image: &RgbaImage, canvas: Canvas) -> RgbaImage {
    let (iw, ih) = image.dimensions();
    if (iw, ih) == (canvas.width, canvas.height) {
        return image.clone();
    }

    let scale = f64::max(
        f64::from(canvas.width) / f64::from(iw),
        f64::from(canvas.height) / f64::from(ih),
    );
    let sw = ((f64::from(iw) * scale).round() as u32).max(canvas.width);
    let sh = ((f64::from(ih) * scale).round() as u32).max(canvas.height);
    let scaled = if (sw, sh) == (iw, ih) {
        image.clone()
    } else {
        imageops::resize(image, sw, sh, FilterType::Lanczos3)
    };

    let x = (sw - canvas.width) / 2;
    let y = (f64::from(sh - canvas.height) * TOP_TRIM_BIAS).round() as u32;
    imageops::crop_imm(&scaled, x, y, canvas.width, canvas.height).to_image()
}

fn darken_zone(img: &mut RgbaImage, zone: PixelRect) {
    let rows = zone.height.max(1) as f32;
    for row in 0..zone.height {
        let t = (row as f32 + 1.0) / rows;
        // smoothstep keeps the top edge of the ramp invisible
        let k = 1.0 - ZONE_MAX_DARKEN * t * t * (3.0 - 2.0 * t);
        let y = zone.y + row;
        for x in zone.x..zone.right() {
            let px = img.get_pixel_mut(x, y);
            for c in &mut px.0[..3] {
                *c = (f32::from(*c) * k).round() as u8;
            }
        }
    }
}
