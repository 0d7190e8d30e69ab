use image::RgbaImage;

use crate::assets::source::AssetSource;
use crate::foundation::error::{AdError, AdResult};
use crate::foundation::pixels::image_from_premultiplied;

/// Height SVG logos are rasterized at before the card scales them down.
const SVG_LOGO_RASTER_HEIGHT: u32 = 512;
const MAX_SVG_DIM: u32 = 8_192;

/// Decode raster bytes (PNG, JPEG, WebP, ...) into straight-alpha RGBA8.
pub fn decode_raster(bytes: &[u8]) -> AdResult<RgbaImage> {
    let dyn_img =
        image::load_from_memory(bytes).map_err(|e| AdError::asset(format!("decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(AdError::asset("decoded image has zero size"));
    }
    Ok(rgba)
}

/// Decode a logo from a raster file or an SVG document.
pub fn decode_logo(source: &AssetSource) -> AdResult<RgbaImage> {
    let bytes = source.read_bytes()?;
    let decoded = if source.looks_like_svg(&bytes) {
        let tree = parse_svg(&bytes)?;
        rasterize_svg(&tree, SVG_LOGO_RASTER_HEIGHT)
    } else {
        decode_raster(&bytes)
    };
    decoded.map_err(|e| AdError::asset(format!("logo '{}': {e}", source.describe())))
}

pub fn parse_svg(bytes: &[u8]) -> AdResult<usvg::Tree> {
    let opts = usvg::Options::default();
    usvg::Tree::from_data(bytes, &opts).map_err(|e| AdError::asset(format!("parse svg tree: {e}")))
}

/// Rasterize `tree` at `target_height` pixels tall, keeping its aspect ratio.
pub fn rasterize_svg(tree: &usvg::Tree, target_height: u32) -> AdResult<RgbaImage> {
    let size = tree.size();
    let (sw, sh) = (size.width(), size.height());
    if !sw.is_finite() || !sh.is_finite() || sw <= 0.0 || sh <= 0.0 {
        return Err(AdError::asset("svg has invalid width/height"));
    }

    let scale = target_height as f32 / sh;
    let width = ((sw * scale).ceil() as u32).max(1);
    let height = target_height.max(1);
    if width > MAX_SVG_DIM || height > MAX_SVG_DIM {
        return Err(AdError::asset(format!(
            "svg raster size too large: {width}x{height} (max {MAX_SVG_DIM}x{MAX_SVG_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| AdError::asset("failed to allocate svg pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(tree, xform, &mut pixmap.as_mut());

    // tiny-skia pixmaps are premultiplied.
    image_from_premultiplied(width, height, pixmap.data().to_vec())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba(px));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_png_logo_from_bytes() {
        let src = AssetSource::from_bytes(png_bytes(3, 2, [10, 20, 30, 255]));
        let logo = decode_logo(&src).unwrap();
        assert_eq!(logo.dimensions(), (3, 2));
        assert_eq!(logo.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn garbage_logo_is_asset_error() {
        let src = AssetSource::from_bytes(b"not an image".to_vec());
        assert!(matches!(decode_logo(&src), Err(AdError::Asset(_))));
    }

    #[test]
    fn svg_logo_is_rasterized_at_fixed_height() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
            <rect width="40" height="20" fill="#ff0000"/></svg>"##;
        let logo = decode_logo(&AssetSource::from_bytes(svg.to_vec())).unwrap();
        assert_eq!(logo.height(), SVG_LOGO_RASTER_HEIGHT);
        assert_eq!(logo.width(), SVG_LOGO_RASTER_HEIGHT * 2);
        assert_eq!(logo.get_pixel(5, 5).0, [255, 0, 0, 255]);
    }

    #[test]
    fn broken_svg_is_asset_error() {
        let src = AssetSource::from_bytes(b"<svg".to_vec());
        assert!(matches!(decode_logo(&src), Err(AdError::Asset(_))));
    }
}
