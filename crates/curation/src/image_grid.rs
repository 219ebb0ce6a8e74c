use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dataset_api::{DatasetMetadata, DecodedImage, Fingerprint, Record};

/// Back-reference from a rendered tile to the record it shows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordBinding {
    pub hash: String,
    pub char: String,
    pub font: String,
}

impl From<&Record> for RecordBinding {
    fn from(r: &Record) -> Self {
        Self {
            hash: r.hash.clone(),
            char: r.char.clone(),
            font: r.font.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum TileContent {
    Image(Arc<DecodedImage>),
    /// The server returned no image for this hash.
    Placeholder,
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub binding: RecordBinding,
    pub content: TileContent,
    pub invalid: bool,
    /// Another tile in the grid decoded to the very same bytes.
    pub duplicate: bool,
    pub highlighted: bool,
}

impl Tile {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, TileContent::Placeholder)
    }
}

/// Image tiles of the active label. Holds the highlighted hash only; tiles
/// are derived from the current state each time they are rendered, so a
/// metadata refresh re-classifies them without fetching images again.
#[derive(Debug, Default)]
pub struct ImageGridView {
    highlighted: Option<String>,
}

impl ImageGridView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlight(&mut self, hash: &str) {
        self.highlighted = Some(hash.to_string());
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    pub fn clear(&mut self) {
        self.highlighted = None;
    }

    pub fn render(
        &self,
        records: &[Record],
        images: &HashMap<String, Arc<DecodedImage>>,
        metadata: &DatasetMetadata,
    ) -> Vec<Tile> {
        let dupes = duplicate_hashes(records, images);

        records
            .iter()
            .map(|r| Tile {
                binding: r.into(),
                content: match images.get(&r.hash) {
                    Some(img) => TileContent::Image(Arc::clone(img)),
                    None => TileContent::Placeholder,
                },
                invalid: metadata.is_invalid(r),
                duplicate: dupes.contains(r.hash.as_str()),
                highlighted: self.highlighted.as_deref() == Some(r.hash.as_str()),
            })
            .collect()
    }
}

/// Hashes of the records the image reply did not cover.
pub fn missing_hashes(records: &[Record], images: &HashMap<String, Arc<DecodedImage>>) -> Vec<String> {
    records
        .iter()
        .filter(|r| !images.contains_key(&r.hash))
        .map(|r| r.hash.clone())
        .collect()
}

/// Records whose images share a fingerprint with a different record.
pub fn duplicate_hashes<'a>(
    records: &'a [Record],
    images: &HashMap<String, Arc<DecodedImage>>,
) -> HashSet<&'a str> {
    let mut by_print: HashMap<Fingerprint, HashSet<&'a str>> = HashMap::new();
    for r in records {
        if let Some(img) = images.get(&r.hash) {
            by_print.entry(img.fingerprint).or_default().insert(r.hash.as_str());
        }
    }

    by_print
        .into_values()
        .filter(|hashes| hashes.len() > 1)
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset_api::ImageFormat;

    fn rec(hash: &str, font: &str) -> Record {
        Record { hash: hash.into(), char: "あ".into(), font: font.into() }
    }

    fn img(hash: &str, print: u8) -> (String, Arc<DecodedImage>) {
        let decoded = DecodedImage {
            hash: hash.into(),
            bytes: vec![print],
            format: ImageFormat::Png,
            width: 1,
            height: 1,
            fingerprint: [print; 32],
        };
        (hash.to_string(), Arc::new(decoded))
    }

    fn meta(records: &[&str], fonts: &[&str]) -> DatasetMetadata {
        DatasetMetadata {
            labels: vec!["あ".into()],
            invalid_records: records.iter().map(|s| s.to_string()).collect(),
            invalid_fonts: fonts.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_disjuncts() {
        let records = vec![rec("h1", "mincho"), rec("h2", "gothic"), rec("h3", "mincho")];
        let images: HashMap<_, _> = [img("h1", 1), img("h2", 2), img("h3", 3)].into_iter().collect();
        let view = ImageGridView::new();

        // record flagged, font fine / record fine, font flagged / neither
        let tiles = view.render(&records, &images, &meta(&["h1"], &["gothic"]));
        let invalid: Vec<bool> = tiles.iter().map(|t| t.invalid).collect();
        assert_eq!(invalid, vec![true, true, false]);
    }

    #[test]
    fn test_missing_image_renders_placeholder() {
        let records = vec![rec("h1", "mincho"), rec("h2", "gothic")];
        let images: HashMap<_, _> = [img("h1", 1)].into_iter().collect();

        let tiles = ImageGridView::new().render(&records, &images, &meta(&[], &[]));
        assert_eq!(tiles.len(), 2);
        assert!(!tiles[0].is_placeholder());
        assert!(tiles[1].is_placeholder());
        assert_eq!(tiles[1].binding.hash, "h2");
        assert_eq!(missing_hashes(&records, &images), vec!["h2"]);
    }

    #[test]
    fn test_highlight_is_exclusive() {
        let records = vec![rec("h1", "a"), rec("h2", "b"), rec("h3", "c")];
        let images = HashMap::new();
        let mut view = ImageGridView::new();

        view.highlight("h1");
        view.highlight("h3");
        let lit: Vec<String> = view
            .render(&records, &images, &meta(&[], &[]))
            .into_iter()
            .filter(|t| t.highlighted)
            .map(|t| t.binding.hash)
            .collect();
        assert_eq!(lit, vec!["h3"]);
    }

    #[test]
    fn test_duplicate_images_flagged() {
        let records = vec![rec("h1", "a"), rec("h2", "b"), rec("h3", "c")];
        let images: HashMap<_, _> = [img("h1", 7), img("h2", 7), img("h3", 9)].into_iter().collect();

        let tiles = ImageGridView::new().render(&records, &images, &meta(&[], &[]));
        let dup: Vec<bool> = tiles.iter().map(|t| t.duplicate).collect();
        assert_eq!(dup, vec![true, true, false]);
    }

    #[test]
    fn test_reclassify_after_metadata_change() {
        let records = vec![rec("h1", "mincho")];
        let images: HashMap<_, _> = [img("h1", 1)].into_iter().collect();
        let view = ImageGridView::new();

        assert!(!view.render(&records, &images, &meta(&[], &[]))[0].invalid);
        assert!(view.render(&records, &images, &meta(&[], &["mincho"]))[0].invalid);
    }
}
