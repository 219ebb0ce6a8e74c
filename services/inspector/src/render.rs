use std::fmt::Write as _;

use curation::{LabelEntry, LogEntry, OverlayView, Tile, TileContent};
use dataset_api::{DatasetMetadata, DatasetSummary};

pub fn datasets(list: &[DatasetSummary], active: Option<&str>) -> String {
    if list.is_empty() {
        return "(no datasets)".into();
    }
    list.iter()
        .map(|d| {
            let mark = if active == Some(d.name.as_str()) { '*' } else { ' ' };
            format!("{mark} {}", d.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header line plus one bracketed button per label. `[*x]` is active,
/// `[x+]` is completed.
pub fn labels(name: &str, meta: &DatasetMetadata, entries: &[LabelEntry]) -> String {
    let mut out = format!(
        "{name}: {} labels, {} invalid records, {} invalid fonts, {} completed\n",
        meta.labels.len(),
        meta.invalid_records.len(),
        meta.invalid_fonts.len(),
        meta.completed_labels.len(),
    );
    let buttons: Vec<String> = entries
        .iter()
        .map(|e| {
            format!(
                "[{}{}{}]",
                if e.active { "*" } else { "" },
                e.label,
                if e.completed { "+" } else { "" }
            )
        })
        .collect();
    out.push_str(&buttons.join(" "));
    out
}

pub fn tiles(tiles: &[Tile]) -> String {
    if tiles.is_empty() {
        return "(no images)".into();
    }
    let mut out = String::new();
    for t in tiles {
        let content = match &t.content {
            TileContent::Image(img) => format!(
                "{:?} {}x{} #{}",
                img.format,
                img.width,
                img.height,
                img.fingerprint_hex()
            ),
            TileContent::Placeholder => "(no image)".into(),
        };
        let mut flags = Vec::new();
        if t.invalid {
            flags.push("INVALID");
        }
        if t.duplicate {
            flags.push("DUPLICATE");
        }
        let _ = writeln!(
            out,
            "{} {} {} [{}] {} {}",
            if t.highlighted { '>' } else { ' ' },
            t.binding.hash,
            t.binding.char,
            t.binding.font,
            content,
            flags.join(" ")
        );
    }
    out.trim_end().to_string()
}

pub fn overlay(view: &OverlayView) -> String {
    let o = &view.overlay;
    let [record, font] = &view.actions;
    format!(
        "overlay at ({}, {}) for {} [{}]\n  record: {}\n  font:   {}",
        o.position.x, o.position.y, o.binding.hash, o.binding.font, record.caption, font.caption
    )
}

pub fn log(entries: &[LogEntry]) -> String {
    entries.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use curation::RecordBinding;

    fn tile(hash: &str, invalid: bool, highlighted: bool) -> Tile {
        Tile {
            binding: RecordBinding { hash: hash.into(), char: "あ".into(), font: "mincho".into() },
            content: TileContent::Placeholder,
            invalid,
            duplicate: false,
            highlighted,
        }
    }

    #[test]
    fn test_label_buttons() {
        let meta = DatasetMetadata {
            labels: vec!["あ".into(), "い".into()],
            ..Default::default()
        };
        let entries = vec![
            LabelEntry { label: "あ".into(), active: true, completed: false },
            LabelEntry { label: "い".into(), active: false, completed: true },
        ];
        let out = labels("kanji-v1", &meta, &entries);
        assert!(out.starts_with("kanji-v1: 2 labels"));
        assert!(out.ends_with("[*あ] [い+]"), "{out}");
    }

    #[test]
    fn test_tiles_mark_invalid_and_highlight() {
        let out = tiles(&[tile("h1", true, false), tile("h2", false, true)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("h1") && lines[0].contains("INVALID"));
        assert!(lines[1].starts_with("> h2"));
        assert!(!lines[1].contains("INVALID"));
    }

    #[test]
    fn test_datasets_marks_active() {
        let list = vec![DatasetSummary { name: "a".into() }, DatasetSummary { name: "b".into() }];
        assert_eq!(datasets(&list, Some("b")), "  a\n* b");
        assert_eq!(datasets(&[], None), "(no datasets)");
    }
}
