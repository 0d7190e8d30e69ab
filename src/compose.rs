use std::io::Cursor;

use image::RgbaImage;
use serde::Serialize;

use crate::assets::font::{FontFace, TextShaper};
use crate::config::AspectRatioSpec;
use crate::foundation::core::{Corner, PixelRect, Rgba8};
use crate::foundation::error::{AdError, AdResult};
use crate::layout::logo::{logo_card_geometry, render_logo_card};
use crate::layout::safe_zone::reserve_safe_zone;
use crate::layout::text::{TextStyle, block_height, render_text_overlay};
use crate::layout::wrap::{FontMetrics, wrap_text};

/// Candidate font sizes as a share of the canvas' shorter side, largest first.
pub const FONT_SCALE_LADDER: [f32; 6] = [0.060, 0.055, 0.050, 0.045, 0.040, 0.035];

const TEXT_PADDING_FRACTION: f32 = 0.02;
const EDGE_MARGIN_FRACTION: f32 = 0.025;

/// Brand-level text and logo settings shared by every unit of a run.
#[derive(Clone, Debug)]
pub struct Typography {
    pub face: FontFace,
    pub line_spacing: f32,
    pub text_color: Rgba8,
    pub scrim: Option<Rgba8>,
    pub logo_corner: Corner,
}

impl Typography {
    pub fn new(face: FontFace) -> Self {
        Self {
            face,
            line_spacing: 1.2,
            text_color: Rgba8::WHITE,
            scrim: Some(Rgba8::rgba(0, 0, 0, 110)),
            logo_corner: Corner::BottomRight,
        }
    }

    pub fn with_logo_corner(mut self, corner: Corner) -> Self {
        self.logo_corner = corner;
        self
    }
}

/// Where things ended up on a composite.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompositeLayout {
    pub safe_zone: PixelRect,
    pub text_rect: PixelRect,
    pub lines: Vec<String>,
    pub font_size_px: f32,
    pub logo_card: Option<PixelRect>,
}

/// One rendered creative.
#[derive(Clone, Debug)]
pub struct Composite {
    pub image: RgbaImage,
    pub layout: CompositeLayout,
}

impl Composite {
    pub fn encode_png(&self) -> AdResult<Vec<u8>> {
        encode_png(&self.image)
    }
}

pub fn encode_png(image: &RgbaImage) -> AdResult<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| AdError::layout(format!("png encode: {e}")))?;
    Ok(buf)
}

/// Build the final creative for `spec` from a background, the copy and an optional logo.
///
/// Deterministic for identical inputs.
pub fn compose(
    background: &RgbaImage,
    copy: &str,
    logo: Option<&RgbaImage>,
    spec: &AspectRatioSpec,
    typography: &Typography,
) -> AdResult<Composite> {
    let canvas = spec.canvas;
    let (fitted, safe_zone) = reserve_safe_zone(background, canvas, spec.safe_zone_fraction)?;

    let short_side = canvas.width.min(canvas.height) as f32;
    let margin = ((short_side * EDGE_MARGIN_FRACTION).round() as u32).max(1);
    let padding = (short_side * TEXT_PADDING_FRACTION).round();

    let card = logo
        .map(|l| {
            logo_card_geometry(canvas, l.width(), l.height(), typography.logo_corner, margin)
                .map(|g| g.card)
        })
        .transpose()?;
    let text_rect = text_region(safe_zone, card, typography.logo_corner, margin)?;

    let (shaper, lines) = fit_copy(copy, text_rect, padding, short_side, typography)?;
    let style = TextStyle {
        color: typography.text_color,
        padding_px: padding,
        scrim: typography.scrim,
        scrim_radius_px: padding * 0.75,
    };
    let mut image = render_text_overlay(&fitted, &lines, text_rect, &style, &shaper)?;

    let mut logo_card = None;
    if let Some(logo) = logo {
        let (with_logo, card) = render_logo_card(&image, logo, typography.logo_corner, margin)?;
        image = with_logo;
        logo_card = Some(card);
    }

    tracing::debug!(
        aspect = %spec.label,
        lines = lines.len(),
        font_size_px = shaper.size_px(),
        "composed creative"
    );
    Ok(Composite {
        image,
        layout: CompositeLayout {
            safe_zone,
            text_rect,
            lines,
            font_size_px: shaper.size_px(),
            logo_card,
        },
    })
}

/// Part of the safe zone left for copy once a logo card claims its corner.
///
/// Prefers symmetric side insets so the block stays centered; when those would leave
/// less than half the zone, the copy moves above (or below) the card instead.
fn text_region(
    zone: PixelRect,
    card: Option<PixelRect>,
    corner: Corner,
    margin: u32,
) -> AdResult<PixelRect> {
    let Some(card) = card.filter(|c| c.intersects(zone)) else {
        return Ok(zone);
    };

    let inset = card.width + 2 * margin;
    if zone.width > 2 * inset && zone.width - 2 * inset >= zone.width / 2 {
        return Ok(PixelRect::new(
            zone.x + inset,
            zone.y,
            zone.width - 2 * inset,
            zone.height,
        ));
    }

    let region = if corner.is_bottom() {
        let bottom = card.y.saturating_sub(margin);
        PixelRect::new(zone.x, zone.y, zone.width, bottom.saturating_sub(zone.y))
    } else {
        let top = (card.bottom() + margin).max(zone.y);
        PixelRect::new(zone.x, top, zone.width, zone.bottom().saturating_sub(top))
    };
    if region.is_empty() {
        return Err(AdError::layout(format!(
            "logo card {card:?} leaves no room for copy in safe zone {zone:?}"
        )));
    }
    Ok(region)
}

/// Largest ladder size whose wrapped block fits `rect`, else the smallest.
fn fit_copy(
    copy: &str,
    rect: PixelRect,
    padding: f32,
    short_side: f32,
    typography: &Typography,
) -> AdResult<(TextShaper, Vec<String>)> {
    let max_width = rect.width as f32 - 2.0 * padding;
    let mut best = None;
    for scale in FONT_SCALE_LADDER {
        let shaper = TextShaper::new(
            &typography.face,
            (short_side * scale).max(1.0),
            typography.line_spacing,
        )?;
        let lines: Vec<String> = wrap_text(copy, max_width, &shaper)?.collect();
        let fits = block_height(lines.len(), shaper.line_height(), padding) <= rect.height as f32;
        best = Some((shaper, lines));
        if fits {
            break;
        }
    }
    best.ok_or_else(|| AdError::layout("empty font size ladder"))
}
