mod common;

use adcraft::layout::safe_zone::zone_rect;
use adcraft::{
    AdError, AspectRatioSpec, AssetSource, Canvas, FixedAdvanceMetrics, FontFace, FontMetrics,
    TextShaper, compose, reserve_safe_zone, wrap_text,
};
use image::RgbaImage;

const COPY: &str = "Crisp sound for long summer evenings with friends and family outdoors";

fn rewrap<M: FontMetrics>(lines: &[String], width: f32, metrics: &M) -> Vec<String> {
    wrap_text(&lines.join(" "), width, metrics)
        .unwrap()
        .collect()
}

#[test]
fn safe_zone_height_tracks_fraction_within_one_pixel() {
    for (w, h) in [(1080, 1080), (1080, 1920), (1920, 1080), (37, 91), (300, 7)] {
        for f in [0.05_f32, 0.2, 0.25, 0.333, 0.5, 0.9] {
            let canvas = Canvas::new(w, h).unwrap();
            let zone = zone_rect(canvas, f);
            let expected = f64::from(f) * f64::from(h);
            assert!(
                (f64::from(zone.height) - expected).abs() <= 1.0,
                "{w}x{h} f={f}: got {}",
                zone.height
            );
            assert_eq!(zone.bottom(), h);
            assert_eq!((zone.x, zone.width), (0, w));
        }
    }
}

#[test]
fn reserved_background_matches_canvas() {
    let src = RgbaImage::from_pixel(50, 30, image::Rgba([200, 180, 160, 255]));
    let canvas = Canvas::new(40, 60).unwrap();
    let (img, zone) = reserve_safe_zone(&src, canvas, 0.25).unwrap();
    assert_eq!(img.dimensions(), (40, 60));
    assert_eq!(zone.y, 45);
    // Above the zone the photo is untouched; inside it gets darker toward the bottom.
    let above = img.get_pixel(20, 10).0;
    assert!(above[0].abs_diff(200) <= 1 && above[2].abs_diff(160) <= 1, "{above:?}");
    assert!(img.get_pixel(20, 59).0[0] < img.get_pixel(20, 46).0[0]);
}

#[test]
fn wrapping_is_idempotent_with_fixed_advance() {
    let metrics = FixedAdvanceMetrics {
        advance_px: 7.0,
        line_height_px: 12.0,
    };
    for width in [30.0, 70.0, 140.0, 400.0] {
        let lines: Vec<String> = wrap_text(COPY, width, &metrics).unwrap().collect();
        assert_eq!(rewrap(&lines, width, &metrics), lines, "width {width}");
        for line in &lines {
            assert!(
                metrics.text_width(line) <= width || !line.contains(' '),
                "'{line}' overflows {width}"
            );
        }
    }
}

#[test]
fn wrapping_is_idempotent_with_shaped_font() {
    let face = FontFace::load(&AssetSource::Path(common::font_path())).unwrap();
    let shaper = TextShaper::new(&face, 22.0, 1.2).unwrap();
    for width in [120.0, 260.0, 900.0] {
        let lines: Vec<String> = wrap_text(COPY, width, &shaper).unwrap().collect();
        assert!(!lines.is_empty());
        assert_eq!(rewrap(&lines, width, &shaper), lines, "width {width}");
        assert_eq!(lines.join(" "), COPY);
    }
}

#[test]
fn over_wide_word_gets_its_own_line() {
    let metrics = FixedAdvanceMetrics {
        advance_px: 10.0,
        line_height_px: 12.0,
    };
    let lines: Vec<String> = wrap_text("go Supercalifragilistic now", 60.0, &metrics)
        .unwrap()
        .collect();
    assert_eq!(lines, vec!["go", "Supercalifragilistic", "now"]);
}

#[test]
fn non_positive_width_is_a_layout_error() {
    let metrics = FixedAdvanceMetrics {
        advance_px: 10.0,
        line_height_px: 12.0,
    };
    for width in [0.0, -5.0, f32::NAN] {
        assert!(matches!(
            wrap_text("hello", width, &metrics),
            Err(AdError::Layout(_))
        ));
    }
}

#[test]
fn composed_copy_stays_inside_the_safe_zone() {
    let typo = common::typography();
    let background = RgbaImage::from_pixel(80, 80, image::Rgba([90, 140, 60, 255]));
    let logo = RgbaImage::from_pixel(30, 30, image::Rgba([250, 0, 0, 255]));
    for spec in [
        AspectRatioSpec::new("1x1", 160, 160, 0.25),
        AspectRatioSpec::new("9x16", 90, 160, 0.25),
        AspectRatioSpec::new("16x9", 160, 90, 0.3),
    ] {
        let out = compose(&background, COPY, Some(&logo), &spec, &typo).unwrap();
        let l = &out.layout;
        assert_eq!(out.image.dimensions(), (spec.canvas.width, spec.canvas.height));
        assert!(l.text_rect.y >= l.safe_zone.y && l.text_rect.bottom() <= l.safe_zone.bottom());
        assert!(!l.lines.is_empty());
        let card = l.logo_card.unwrap();
        assert!(!card.intersects(l.text_rect), "{}: {card:?} vs {:?}", spec.label, l.text_rect);
    }
}
