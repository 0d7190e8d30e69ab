use std::borrow::Cow;
use std::cell::RefCell;
use std::sync::Arc;

use crate::assets::source::AssetSource;
use crate::foundation::error::{AdError, AdResult};
use crate::layout::wrap::FontMetrics;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A validated font file shared read-only across workers.
#[derive(Clone)]
pub struct FontFace {
    bytes: Arc<Vec<u8>>,
    family: String,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

impl FontFace {
    pub fn load(source: &AssetSource) -> AdResult<Self> {
        let bytes = source.read_bytes()?;
        Self::from_shared_bytes(bytes)
            .map_err(|e| AdError::asset(format!("font '{}': {e}", source.describe())))
    }

    pub fn from_shared_bytes(bytes: Arc<Vec<u8>>) -> AdResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let family = register_family(&mut font_ctx, &bytes)?;
        Ok(Self { bytes, family })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }
}

fn register_family(font_ctx: &mut parley::FontContext, bytes: &[u8]) -> AdResult<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| AdError::asset("no font families registered from font bytes"))?;
    let name = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| AdError::asset("registered font family has no name"))?;
    Ok(name.to_string())
}

/// Shapes single lines of text at a fixed size with one font.
///
/// Owns its Parley contexts, so it is cheap to create per compose call and never shared
/// between threads.
pub struct TextShaper {
    font_ctx: RefCell<parley::FontContext>,
    layout_ctx: RefCell<parley::LayoutContext<TextBrushRgba8>>,
    family: String,
    font: vello_cpu::peniko::FontData,
    size_px: f32,
    line_spacing: f32,
}

impl TextShaper {
    pub fn new(face: &FontFace, size_px: f32, line_spacing: f32) -> AdResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(AdError::layout("text size_px must be finite and > 0"));
        }
        if !line_spacing.is_finite() || line_spacing < 1.0 {
            return Err(AdError::layout("line_spacing must be finite and >= 1"));
        }
        let mut font_ctx = parley::FontContext::default();
        let family = register_family(&mut font_ctx, face.bytes())?;
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(face.bytes().as_ref().clone()),
            0,
        );
        Ok(Self {
            font_ctx: RefCell::new(font_ctx),
            layout_ctx: RefCell::new(parley::LayoutContext::new()),
            family,
            font,
            size_px,
            line_spacing,
        })
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Lay out `text` as a single unbroken line.
    pub fn layout_line(
        &self,
        text: &str,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut font_ctx = self.font_ctx.borrow_mut();
        let mut layout_ctx = self.layout_ctx.borrow_mut();
        let mut builder = layout_ctx.ranged_builder(&mut font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

impl FontMetrics for TextShaper {
    fn text_width(&self, text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        self.layout_line(text, TextBrushRgba8::default()).width()
    }

    fn line_height(&self) -> f32 {
        self.size_px * self.line_spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face() -> FontFace {
        FontFace::load(&AssetSource::Path("tests/data/fonts/DejaVuSans.ttf".into())).unwrap()
    }

    #[test]
    fn font_face_exposes_family_from_bytes() {
        assert!(!face().family().trim().is_empty());
    }

    #[test]
    fn non_font_bytes_are_asset_error() {
        let err = FontFace::load(&AssetSource::from_bytes(b"nope".to_vec())).unwrap_err();
        assert!(matches!(err, AdError::Asset(_)));
    }

    #[test]
    fn widths_grow_with_text_and_size() {
        let small = TextShaper::new(&face(), 16.0, 1.2).unwrap();
        let big = TextShaper::new(&face(), 32.0, 1.2).unwrap();
        let a = small.text_width("ad");
        let b = small.text_width("advertising");
        assert!(a > 0.0);
        assert!(b > a);
        assert!(big.text_width("advertising") > b);
        assert_eq!(small.text_width(""), 0.0);
        assert!((small.line_height() - 19.2).abs() < 1e-3);
    }

    #[test]
    fn shaper_rejects_bad_size() {
        assert!(TextShaper::new(&face(), 0.0, 1.2).is_err());
        assert!(TextShaper::new(&face(), 12.0, 0.5).is_err());
    }
}
