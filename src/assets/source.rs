use std::path::PathBuf;
use std::sync::Arc;

use crate::foundation::error::{AdError, AdResult};

/// Where an input asset (logo, reference photo, font) comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    Path(PathBuf),
    Bytes(Arc<Vec<u8>>),
}

impl AssetSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Arc::new(bytes.into()))
    }

    /// Read the raw bytes. A missing or unreadable file is an asset error.
    pub fn read_bytes(&self) -> AdResult<Arc<Vec<u8>>> {
        match self {
            Self::Bytes(b) => Ok(b.clone()),
            Self::Path(p) => std::fs::read(p)
                .map(Arc::new)
                .map_err(|e| AdError::asset(format!("read '{}': {e}", p.display()))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    pub(crate) fn looks_like_svg(&self, bytes: &[u8]) -> bool {
        if let Self::Path(p) = self
            && p.extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
        {
            return true;
        }
        let head = &bytes[..bytes.len().min(256)];
        let head = String::from_utf8_lossy(head);
        let head = head.trim_start();
        head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_asset_error() {
        let src = AssetSource::Path(PathBuf::from("/definitely/not/here.png"));
        let err = src.read_bytes().unwrap_err();
        assert!(matches!(err, AdError::Asset(_)));
        assert!(err.to_string().contains("here.png"));
    }

    #[test]
    fn svg_sniffing_uses_extension_or_content() {
        let by_ext = AssetSource::Path(PathBuf::from("logo.SVG"));
        assert!(by_ext.looks_like_svg(b"garbage"));

        let by_content = AssetSource::from_bytes(b"  <svg xmlns=\"x\"/>".to_vec());
        assert!(by_content.looks_like_svg(b"  <svg xmlns=\"x\"/>"));

        let png = AssetSource::from_bytes(vec![0x89, b'P', b'N', b'G']);
        assert!(!png.looks_like_svg(&[0x89, b'P', b'N', b'G']));
    }
}
