use curation::{Point, Toggle};

pub const HELP: &str = "\
commands:
  datasets              list datasets
  use <name>            open a dataset
  label <char>          open a label of the active dataset
  grid                  show the image tiles
  click <hash> <x> <y>  select an image, overlay opens at (x, y)
  tap <x> <y>           click somewhere; outside the overlay closes it
  esc                   close the overlay
  record                toggle the record's validity (overlay must be open)
  font                  toggle the font's validity (overlay must be open)
  done                  toggle completion of the active label
  refresh               re-read the dataset metadata
  log                   show or hide the log panel
  help                  this text
  quit                  exit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Datasets,
    Use(String),
    Label(String),
    Grid,
    Click { hash: String, at: Point },
    Tap(Point),
    Esc,
    Toggle(Toggle),
    Done,
    Refresh,
    Log,
    Help,
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let cmd = match (head, args.as_slice()) {
            ("datasets", []) => Command::Datasets,
            // dataset names may contain spaces
            ("use", [_, ..]) => Command::Use(args.join(" ")),
            ("label", [label]) => Command::Label(label.to_string()),
            ("grid", []) => Command::Grid,
            ("click", [hash, x, y]) => Command::Click { hash: hash.to_string(), at: point(x, y)? },
            ("tap", [x, y]) => Command::Tap(point(x, y)?),
            ("esc", []) => Command::Esc,
            ("record", []) => Command::Toggle(Toggle::Record),
            ("font", []) => Command::Toggle(Toggle::Font),
            ("done", []) => Command::Done,
            ("refresh", []) => Command::Refresh,
            ("log", []) => Command::Log,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            (
                "datasets" | "use" | "label" | "grid" | "click" | "tap" | "esc" | "record" | "font"
                | "done" | "refresh" | "log" | "help" | "quit",
                _,
            ) => return Err(format!("wrong arguments for {head:?}, see help")),
            _ => return Err(format!("unknown command {head:?}, see help")),
        };
        Ok(Some(cmd))
    }
}

fn point(x: &str, y: &str) -> Result<Point, String> {
    let x = x.parse().map_err(|_| format!("bad x coordinate {x:?}"))?;
    let y = y.parse().map_err(|_| format!("bad y coordinate {y:?}"))?;
    Ok(Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_navigation() {
        assert_eq!(parse("datasets"), Command::Datasets);
        assert_eq!(parse("use kanji-v1"), Command::Use("kanji-v1".into()));
        assert_eq!(parse("use  my  set"), Command::Use("my set".into()));
        assert_eq!(parse("label あ"), Command::Label("あ".into()));
    }

    #[test]
    fn test_overlay_commands() {
        assert_eq!(
            parse("click h1 10 -4"),
            Command::Click { hash: "h1".into(), at: Point::new(10, -4) }
        );
        assert_eq!(parse("tap 5 6"), Command::Tap(Point::new(5, 6)));
        assert_eq!(parse("record"), Command::Toggle(Toggle::Record));
        assert_eq!(parse("font"), Command::Toggle(Toggle::Font));
        assert_eq!(parse("esc"), Command::Esc);
    }

    #[test]
    fn test_errors() {
        assert!(Command::parse("label").unwrap_err().contains("wrong arguments"));
        assert!(Command::parse("click h1 x 3").unwrap_err().contains("bad x"));
        assert!(Command::parse("frobnicate").unwrap_err().contains("unknown command"));
    }
}
