//! Premultiplied RGBA8 helpers shared by the layout primitives.
//!
//! `image::RgbaImage` buffers are straight alpha; `vello_cpu` pixmaps are premultiplied.
//! Overlays are rasterized into a transparent pixmap and then composited with
//! [`over_in_place`] onto a premultiplied copy of the canvas.

use image::RgbaImage;

use crate::foundation::error::{AdError, AdResult};

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> AdResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(AdError::layout(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

pub fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Premultiplied copy of a straight-alpha image, row-major RGBA8.
pub fn premultiplied_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = img.as_raw().clone();
    premultiply_in_place(&mut bytes);
    bytes
}

/// Build a straight-alpha image from premultiplied bytes.
pub fn image_from_premultiplied(
    width: u32,
    height: u32,
    mut bytes: Vec<u8>,
) -> AdResult<RgbaImage> {
    unpremultiply_in_place(&mut bytes);
    RgbaImage::from_raw(width, height, bytes)
        .ok_or_else(|| AdError::layout("rgba8 buffer does not match width*height*4"))
}

/// Fresh transparent `vello_cpu` surface matching `img`.
pub fn transparent_pixmap_for(img: &RgbaImage) -> AdResult<vello_cpu::Pixmap> {
    let w: u16 = img
        .width()
        .try_into()
        .map_err(|_| AdError::layout("surface width exceeds u16"))?;
    let h: u16 = img
        .height()
        .try_into()
        .map_err(|_| AdError::layout("surface height exceeds u16"))?;
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    pixmap.data_as_u8_slice_mut().fill(0);
    Ok(pixmap)
}

/// Composite a premultiplied overlay surface onto a straight-alpha image copy.
pub fn flatten_overlay(base: &RgbaImage, overlay: &vello_cpu::Pixmap) -> AdResult<RgbaImage> {
    let mut dst = premultiplied_bytes(base);
    over_in_place(&mut dst, overlay.data_as_u8_slice(), 1.0)?;
    image_from_premultiplied(base.width(), base.height(), dst)
}

/// Source-over `src` onto `dst` with its top-left corner at `(x, y)`.
///
/// Both images are straight alpha; pixels falling outside `dst` are an error.
pub fn over_image_at(dst: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) -> AdResult<()> {
    if x.saturating_add(src.width()) > dst.width() || y.saturating_add(src.height()) > dst.height()
    {
        return Err(AdError::layout(format!(
            "{}x{} image at ({x}, {y}) exceeds {}x{} surface",
            src.width(),
            src.height(),
            dst.width(),
            dst.height()
        )));
    }
    for (sx, sy, sp) in src.enumerate_pixels() {
        let d = dst.get_pixel_mut(x + sx, y + sy);
        let mut both = [d.0, sp.0].concat();
        premultiply_in_place(&mut both);
        let mut out = over(
            [both[0], both[1], both[2], both[3]],
            [both[4], both[5], both[6], both[7]],
            1.0,
        );
        unpremultiply_in_place(&mut out);
        d.0 = out;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
