use dataset_api::DatasetMetadata;

use crate::image_grid::RecordBinding;

pub const CANCEL_KEY: &str = "Escape";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Anchor the menu's top-left at the pointer while keeping the whole box
/// inside the viewport. Never negative.
pub fn clamp_position(pointer: Point, viewport: Size, menu: Size) -> Point {
    let left = pointer.x.min((viewport.width - menu.width).max(0));
    let top = pointer.y.min(viewport.height - menu.height);
    Point::new(left.max(0), top.max(0))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Record,
    Font,
}

/// What the server should be told once a toggle is chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub toggle: Toggle,
    /// Record hash or font name.
    pub target: String,
    pub valid: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayAction {
    pub toggle: Toggle,
    pub caption: &'static str,
    pub mutation: Mutation,
}

/// Build one toggle from the current validity of its target.
fn action(toggle: Toggle, binding: &RecordBinding, metadata: &DatasetMetadata) -> OverlayAction {
    let (target, invalid) = match toggle {
        Toggle::Record => (&binding.hash, metadata.is_record_invalid(&binding.hash)),
        Toggle::Font => (&binding.font, metadata.is_font_invalid(&binding.font)),
    };
    let caption = match (toggle, invalid) {
        (Toggle::Record, false) => "Mark record as invalid",
        (Toggle::Record, true) => "Mark record as valid",
        (Toggle::Font, false) => "Mark font as invalid",
        (Toggle::Font, true) => "Mark font as valid",
    };
    OverlayAction {
        toggle,
        caption,
        mutation: Mutation { toggle, target: target.clone(), valid: invalid },
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenOverlay {
    pub binding: RecordBinding,
    pub position: Point,
    pub size: Size,
}

impl OpenOverlay {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.position.x
            && p.x < self.position.x + self.size.width
            && p.y >= self.position.y
            && p.y < self.position.y + self.size.height
    }

    pub fn actions(&self, metadata: &DatasetMetadata) -> [OverlayAction; 2] {
        [
            action(Toggle::Record, &self.binding, metadata),
            action(Toggle::Font, &self.binding, metadata),
        ]
    }
}

/// Context menu opened on an image tile.
#[derive(Debug)]
pub struct InspectionOverlay {
    viewport: Size,
    menu: Size,
    open: Option<OpenOverlay>,
}

impl InspectionOverlay {
    pub fn new(viewport: Size, menu: Size) -> Self {
        Self { viewport, menu, open: None }
    }

    pub fn open(&mut self, binding: RecordBinding, pointer: Point) -> &OpenOverlay {
        let position = clamp_position(pointer, self.viewport, self.menu);
        self.open.insert(OpenOverlay { binding, position, size: self.menu })
    }

    pub fn close(&mut self) -> Option<OpenOverlay> {
        self.open.take()
    }

    pub fn current(&self) -> Option<&OpenOverlay> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn resize_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Returns true when the key dismissed the overlay.
    pub fn on_key(&mut self, key: &str) -> bool {
        if key == CANCEL_KEY && self.is_open() {
            self.open = None;
            return true;
        }
        false
    }

    /// Clicks outside the box dismiss it; clicks inside are ignored.
    pub fn on_click(&mut self, p: Point) -> bool {
        match &self.open {
            Some(o) if !o.contains(p) => {
                self.open = None;
                true
            }
            _ => false,
        }
    }

    /// Close the overlay and hand back the mutation for `toggle`.
    pub fn choose(&mut self, toggle: Toggle, metadata: &DatasetMetadata) -> Option<Mutation> {
        let open = self.open.take()?;
        let [record, font] = open.actions(metadata);
        Some(match toggle {
            Toggle::Record => record.mutation,
            Toggle::Font => font.mutation,
        })
    }
}
