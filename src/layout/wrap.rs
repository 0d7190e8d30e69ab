use std::iter::FusedIterator;
use std::str::SplitWhitespace;

use crate::foundation::error::{AdError, AdResult};

/// Measures text for wrapping. Implementations must be deterministic.
pub trait FontMetrics {
    /// Advance width of `text` laid out on a single line, in pixels.
    fn text_width(&self, text: &str) -> f32;
    /// Distance between consecutive baselines, in pixels.
    fn line_height(&self) -> f32;
}

/// Every character advances by the same amount. Handy for geometry tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvanceMetrics {
    pub advance_px: f32,
    pub line_height_px: f32,
}

impl FontMetrics for FixedAdvanceMetrics {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance_px
    }

    fn line_height(&self) -> f32 {
        self.line_height_px
    }
}

/// Greedy word wrap of `text` into lines no wider than `max_width_px`.
///
/// Words are whitespace-separated; a word wider than the limit sits alone on its line and
/// is never split. Lines are produced lazily; clone the iterator to restart it.
pub fn wrap_text<'a, M: FontMetrics + ?Sized>(
    text: &'a str,
    max_width_px: f32,
    metrics: &'a M,
) -> AdResult<WrappedLines<'a, M>> {
    if !max_width_px.is_finite() || max_width_px <= 0.0 {
        return Err(AdError::layout(format!(
            "wrap width must be finite and > 0, got {max_width_px}"
        )));
    }
    Ok(WrappedLines {
        words: text.split_whitespace(),
        pending: None,
        max_width_px,
        metrics,
    })
}

pub struct WrappedLines<'a, M: ?Sized> {
    words: SplitWhitespace<'a>,
    pending: Option<&'a str>,
    max_width_px: f32,
    metrics: &'a M,
}

impl<M: ?Sized> Clone for WrappedLines<'_, M> {
    fn clone(&self) -> Self {
        Self {
            words: self.words.clone(),
            pending: self.pending,
            max_width_px: self.max_width_px,
            metrics: self.metrics,
        }
    }
}

impl<M: FontMetrics + ?Sized> Iterator for WrappedLines<'_, M> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let first = self.pending.take().or_else(|| self.words.next())?;
        let mut line = first.to_string();
        for word in self.words.by_ref() {
            let trial = format!("{line} {word}");
            if self.metrics.text_width(&trial) <= self.max_width_px {
                line = trial;
            } else {
                self.pending = Some(word);
                break;
            }
        }
        Some(line)
    }
}

impl<M: FontMetrics + ?Sized> FusedIterator for WrappedLines<'_, M> {}

#[cfg(test)]
mod tests {
    use super::*;

    const M: FixedAdvanceMetrics = FixedAdvanceMetrics {
        advance_px: 10.0,
        line_height_px: 12.0,
    };

    fn lines(text: &str, width: f32) -> Vec<String> {
        wrap_text(text, width, &M).unwrap().collect()
    }

    #[test]
    fn greedy_wrap_fills_lines() {
        // 10px per char: "the quick" = 90px, "the quick brown" = 150px.
        assert_eq!(
            lines("the quick brown fox jumps", 100.0),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn long_word_is_alone_and_intact() {
        assert_eq!(
            lines("go supercalifragilistic now", 50.0),
            vec!["go", "supercalifragilistic", "now"]
        );
    }

    #[test]
    fn empty_and_blank_text_yield_no_lines() {
        assert!(lines("", 100.0).is_empty());
        assert!(lines("   \n\t ", 100.0).is_empty());
    }

    #[test]
    fn non_positive_width_is_reported() {
        assert!(matches!(wrap_text("a", 0.0, &M), Err(AdError::Layout(_))));
        assert!(wrap_text("a", -3.0, &M).is_err());
        assert!(wrap_text("a", f32::NAN, &M).is_err());
    }

    #[test]
    fn wrapping_is_idempotent() {
        let text = "Sound that fills the room, all day long, wherever you are";
        for width in [40.0, 95.0, 130.0, 400.0] {
            let once = lines(text, width);
            let again = lines(&once.join("\n"), width);
            assert_eq!(once, again, "width {width}");
        }
    }

    #[test]
    fn iterator_is_lazy_and_restartable() {
        let it = wrap_text("one two three four", 70.0, &M).unwrap();
        let mut first_pass = it.clone();
        assert_eq!(first_pass.next().as_deref(), Some("one two"));
        let restarted: Vec<_> = it.collect();
        assert_eq!(restarted, vec!["one two", "three", "four"]);
        assert_eq!(first_pass.count(), 2);
    }
}
