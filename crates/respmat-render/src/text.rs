use crate::primitives::{FontWeight, TextStyle};

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Per-character advance as a fraction of the font size, tuned for common
/// sans-serif faces. Rasterization falls back to system fonts, so exact
/// metrics are not available at layout time; these estimates keep margins
/// within a point or two of the rendered text.
fn char_advance(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | ':' | ';' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | ' ' | '-' => 0.35,
        'm' | 'w' | 'M' | 'W' => 0.85,
        '0'..='9' => 0.56,
        'A'..='Z' => 0.68,
        _ => 0.52,
    }
}

/// Estimate text dimensions in points.
pub fn measure_text(text: &str, style: &TextStyle) -> TextMetrics {
    let weight_factor = match style.weight {
        FontWeight::Regular => 1.0,
        FontWeight::Bold => 1.06,
    };
    let width: f64 = text.chars().map(char_advance).sum::<f64>() * style.size * weight_factor;
    let ascent = style.size * 0.78;
    TextMetrics { width, height: style.size * 1.0, ascent }
}
