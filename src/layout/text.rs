use image::RgbaImage;

use crate::assets::font::{TextBrushRgba8, TextShaper};
use crate::foundation::core::{PixelRect, Rgba8};
use crate::foundation::error::{AdError, AdResult};
use crate::foundation::pixels::{flatten_overlay, transparent_pixmap_for};
use crate::layout::paint::{render_context, rounded_rect_path};
use crate::layout::wrap::FontMetrics;

/// How copy is painted inside its zone. Size and line spacing live on the [`TextShaper`].
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub color: Rgba8,
    /// Gap kept between the text block and the zone edges.
    pub padding_px: f32,
    /// Rounded backdrop drawn behind the block, if any.
    pub scrim: Option<Rgba8>,
    pub scrim_radius_px: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::WHITE,
            padding_px: 16.0,
            scrim: Some(Rgba8::rgba(0, 0, 0, 110)),
            scrim_radius_px: 12.0,
        }
    }
}

/// Vertical extent a block of `line_count` lines needs, padding included.
pub fn block_height(line_count: usize, line_height: f32, padding_px: f32) -> f32 {
    line_count as f32 * line_height + 2.0 * padding_px
}

/// Draw `lines` bottom-up inside `zone`, each centered horizontally.
///
/// Returns a new image; `image` is left as is. No lines means an unchanged copy.
pub fn render_text_overlay(
    image: &RgbaImage,
    lines: &[String],
    zone: PixelRect,
    style: &TextStyle,
    shaper: &TextShaper,
) -> AdResult<RgbaImage> {
    if lines.is_empty() {
        return Ok(image.clone());
    }
    if zone.is_empty() || zone.right() > image.width() || zone.bottom() > image.height() {
        return Err(AdError::layout(format!(
            "text zone {zone:?} is outside the {}x{} canvas",
            image.width(),
            image.height()
        )));
    }
    if !style.padding_px.is_finite() || style.padding_px < 0.0 {
        return Err(AdError::layout("text padding must be finite and >= 0"));
    }

    let brush = TextBrushRgba8 {
        r: style.color.r,
        g: style.color.g,
        b: style.color.b,
        a: style.color.a,
    };
    let layouts: Vec<_> = lines
        .iter()
        .map(|line| shaper.layout_line(line, brush))
        .collect();

    let line_h = f64::from(shaper.line_height());
    let pad = f64::from(style.padding_px);
    let center_x = f64::from(zone.x) + f64::from(zone.width) / 2.0;
    let text_bottom = f64::from(zone.bottom()) - pad;
    let text_top = text_bottom - line_h * layouts.len() as f64;

    let mut pixmap = transparent_pixmap_for(image)?;
    let mut ctx = render_context(image.width(), image.height());

    if let Some(scrim) = style.scrim {
        let widest = layouts
            .iter()
            .map(|l| f64::from(l.width()))
            .fold(0.0_f64, f64::max);
        let half_pad = pad / 2.0;
        let rect = kurbo::Rect::new(
            center_x - widest / 2.0 - half_pad,
            text_top - half_pad,
            center_x + widest / 2.0 + half_pad,
            text_bottom + half_pad,
        )
        .intersect(zone.to_kurbo());
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(scrim.to_vello());
        ctx.fill_path(&rounded_rect_path(
            rect,
            f64::from(style.scrim_radius_px),
        ));
    }

    for (i, layout) in layouts.iter().enumerate() {
        let slot_top = text_top + line_h * i as f64;
        let x = center_x - f64::from(layout.width()) / 2.0;
        let y = slot_top + (line_h - f64::from(layout.height())) / 2.0;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(shaper.font())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    flatten_overlay(image, &pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::font::FontFace;
    use crate::assets::source::AssetSource;

    fn shaper(size: f32) -> TextShaper {
        let face =
            FontFace::load(&AssetSource::Path("tests/data/fonts/DejaVuSans.ttf".into())).unwrap();
        TextShaper::new(&face, size, 1.2).unwrap()
    }

    fn gray(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([90, 90, 90, 255]))
    }

    fn changed_rows(a: &RgbaImage, b: &RgbaImage) -> Vec<u32> {
        (0..a.height())
            .filter(|&y| (0..a.width()).any(|x| a.get_pixel(x, y) != b.get_pixel(x, y)))
            .collect()
    }

    #[test]
    fn empty_lines_return_unchanged_copy() {
        let img = gray(64, 64);
        let zone = PixelRect::new(0, 48, 64, 16);
        let out = render_text_overlay(&img, &[], zone, &TextStyle::default(), &shaper(10.0))
            .unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn text_only_touches_the_zone() {
        let img = gray(200, 120);
        let zone = PixelRect::new(0, 80, 200, 40);
        let style = TextStyle {
            padding_px: 4.0,
            ..TextStyle::default()
        };
        let out = render_text_overlay(&img, &["Hello".to_string()], zone, &style, &shaper(14.0))
            .unwrap();
        let rows = changed_rows(&img, &out);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|&y| y >= zone.y), "{rows:?}");
        // Input is never mutated.
        assert_eq!(img.get_pixel(100, 100).0, [90, 90, 90, 255]);
    }

    #[test]
    fn glyphs_are_drawn_without_scrim() {
        let img = gray(200, 60);
        let zone = PixelRect::new(0, 0, 200, 60);
        let style = TextStyle {
            scrim: None,
            color: Rgba8::WHITE,
            ..TextStyle::default()
        };
        let out = render_text_overlay(&img, &["WWW".to_string()], zone, &style, &shaper(24.0))
            .unwrap();
        let brightest = out.pixels().map(|p| p.0[0]).max().unwrap();
        assert!(brightest > 200);
    }

    #[test]
    fn zone_outside_canvas_is_layout_error() {
        let img = gray(50, 50);
        let zone = PixelRect::new(0, 40, 50, 20);
        let err = render_text_overlay(
            &img,
            &["x".to_string()],
            zone,
            &TextStyle::default(),
            &shaper(10.0),
        )
        .unwrap_err();
        assert!(matches!(err, AdError::Layout(_)));
    }

    #[test]
    fn block_height_counts_padding() {
        assert_eq!(block_height(3, 10.0, 2.0), 34.0);
        assert_eq!(block_height(0, 10.0, 2.0), 4.0);
    }
}
