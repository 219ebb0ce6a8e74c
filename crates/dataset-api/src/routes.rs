//! Endpoint paths of the dataset service. Every dynamic segment is
//! percent-encoded: labels are arbitrary characters and font names may
//! contain spaces.

use urlencoding::encode;

pub const DATASETS: &str = "/api/datasets";

pub fn dataset(name: &str) -> String {
    format!("{DATASETS}/{}", encode(name))
}

pub fn label(name: &str, label: &str) -> String {
    format!("{DATASETS}/{}/{}", encode(name), encode(label))
}

pub fn images(name: &str) -> String {
    format!("/api/images/{}", encode(name))
}

pub fn record_validity(name: &str, hash: &str, valid: bool) -> String {
    format!("/api/record/{}/{}/{}", validity(valid), encode(name), encode(hash))
}

pub fn font_validity(name: &str, font: &str, valid: bool) -> String {
    format!("/api/font/{}/{}/{}", validity(valid), encode(name), encode(font))
}

pub fn label_completion(name: &str, label: &str, completed: bool) -> String {
    let state = if completed { "complete" } else { "incomplete" };
    format!("/api/label/{state}/{}/{}", encode(name), encode(label))
}

/// Single-image endpoint, superseded by the bulk `images` route.
pub fn legacy_image(name: &str, hash: &str) -> String {
    format!("/images/{}/{}", encode(name), encode(hash))
}

fn validity(valid: bool) -> &'static str {
    if valid { "valid" } else { "invalid" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_segments() {
        assert_eq!(dataset("kanji-v1"), "/api/datasets/kanji-v1");
        assert_eq!(images("kanji-v1"), "/api/images/kanji-v1");
        assert_eq!(record_validity("d", "h1", false), "/api/record/invalid/d/h1");
        assert_eq!(record_validity("d", "h1", true), "/api/record/valid/d/h1");
        assert_eq!(label_completion("d", "a", true), "/api/label/complete/d/a");
        assert_eq!(label_completion("d", "a", false), "/api/label/incomplete/d/a");
        assert_eq!(legacy_image("d", "h1"), "/images/d/h1");
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        assert_eq!(label("kanji-v1", "あ"), "/api/datasets/kanji-v1/%E3%81%82");
        assert_eq!(
            font_validity("d", "MS Gothic", true),
            "/api/font/valid/d/MS%20Gothic"
        );
        assert_eq!(label("d", "/"), "/api/datasets/d/%2F");
    }
}
