use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::{Canvas, Corner, PixelRect, Rgba8};
use crate::foundation::error::{AdError, AdResult};
use crate::foundation::pixels::{flatten_overlay, over_image_at, transparent_pixmap_for};
use crate::layout::paint::{render_context, rounded_rect_path};

/// Card height as a share of the canvas' shorter side.
const CARD_HEIGHT_FRACTION: f64 = 0.14;
/// Inner padding between card edge and logo, as a share of the card height.
const CARD_INNER_FRACTION: f64 = 0.125;
/// Widest a card may get, as a share of the canvas width.
const CARD_MAX_WIDTH_FRACTION: f64 = 0.4;
const CARD_CORNER_RADIUS_FRACTION: f64 = 0.18;

/// Where the card and the logo inside it land on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogoCardGeometry {
    pub card: PixelRect,
    pub logo: PixelRect,
}

/// Card placement for a `logo_width` x `logo_height` logo at `corner`, `padding_px` away
/// from both canvas edges.
pub fn logo_card_geometry(
    canvas: Canvas,
    logo_width: u32,
    logo_height: u32,
    corner: Corner,
    padding_px: u32,
) -> AdResult<LogoCardGeometry> {
    if logo_width == 0 || logo_height == 0 {
        return Err(AdError::layout("logo has zero size"));
    }
    let short_side = f64::from(canvas.width.min(canvas.height));
    let mut card_h = (short_side * CARD_HEIGHT_FRACTION).round().max(3.0);
    let mut inner = (card_h * CARD_INNER_FRACTION).round().max(1.0);
    let aspect = f64::from(logo_width) / f64::from(logo_height);
    let mut logo_h = card_h - 2.0 * inner;
    let mut logo_w = logo_h * aspect;

    let max_card_w = f64::from(canvas.width) * CARD_MAX_WIDTH_FRACTION;
    if logo_w + 2.0 * inner > max_card_w {
        // Wide logos shrink the whole card.
        let shrink = max_card_w / (logo_w + 2.0 * inner);
        card_h *= shrink;
        inner = (inner * shrink).max(1.0);
        logo_h = card_h - 2.0 * inner;
        logo_w = logo_h * aspect;
    }

    let logo_w = logo_w.round().max(1.0) as u32;
    let logo_h = logo_h.round().max(1.0) as u32;
    let inner = inner as u32;
    let card_w = logo_w + 2 * inner;
    let card_h = logo_h + 2 * inner;

    if card_w + 2 * padding_px > canvas.width || card_h + 2 * padding_px > canvas.height {
        return Err(AdError::layout(format!(
            "logo card {card_w}x{card_h} with padding {padding_px} does not fit {}x{}",
            canvas.width, canvas.height
        )));
    }

    let x = match corner {
        Corner::TopLeft | Corner::BottomLeft => padding_px,
        Corner::TopRight | Corner::BottomRight => canvas.width - padding_px - card_w,
    };
    let y = match corner {
        Corner::TopLeft | Corner::TopRight => padding_px,
        Corner::BottomLeft | Corner::BottomRight => canvas.height - padding_px - card_h,
    };
    Ok(LogoCardGeometry {
        card: PixelRect::new(x, y, card_w, card_h),
        logo: PixelRect::new(x + inner, y + inner, logo_w, logo_h),
    })
}

/// Place `logo` on a white rounded card anchored at `corner`.
///
/// Returns the new image and the card rectangle.
pub fn render_logo_card(
    image: &RgbaImage,
    logo: &RgbaImage,
    corner: Corner,
    padding_px: u32,
) -> AdResult<(RgbaImage, PixelRect)> {
    let canvas = Canvas::new(image.width(), image.height())
        .map_err(|e| AdError::layout(format!("invalid canvas: {e}")))?;
    let geom = logo_card_geometry(canvas, logo.width(), logo.height(), corner, padding_px)?;

    let mut pixmap = transparent_pixmap_for(image)?;
    let mut ctx = render_context(image.width(), image.height());
    let radius = f64::from(geom.card.height) * CARD_CORNER_RADIUS_FRACTION;
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(Rgba8::WHITE.to_vello());
    ctx.fill_path(&rounded_rect_path(geom.card.to_kurbo(), radius));
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    let mut out = flatten_overlay(image, &pixmap)?;

    let scaled = if logo.dimensions() == (geom.logo.width, geom.logo.height) {
        logo.clone()
    } else {
        imageops::resize(logo, geom.logo.width, geom.logo.height, FilterType::Lanczos3)
    };
    over_image_at(&mut out, &scaled, geom.logo.x, geom.logo.y)?;
    Ok((out, geom.card))
}
