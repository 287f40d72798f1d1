//! Sprite-sheet slicing.
//!
//! A one-time startup step: the sheet is cut into a grid of cells, fully
//! transparent cells are dropped, and every kept frame is cropped to the
//! union of the opaque bounding boxes of all cells so frames line up when
//! played back. Rows map to behavioral states; each non-empty row is one
//! animation variant of its state.

use crate::core::animation::{AnimationError, AnimationLibrary, FrameRef};
use crate::core::classifier::BehaviorState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BYTES_PER_PIXEL: usize = 4;

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect::new(x, y, right - x, bottom - y)
    }

    fn offset(&self, dx: u32, dy: u32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Borrowed RGBA8 image, row-major.
#[derive(Debug, Clone, Copy)]
pub struct RgbaImage<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> RgbaImage<'a> {
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Result<Self, SpriteError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(SpriteError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn alpha(&self, x: u32, y: u32) -> u8 {
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.pixels[offset + 3]
    }
}

/// Sheet decoded from an image file and converted to RGBA8.
#[derive(Debug, Clone)]
pub struct SheetImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SheetImage {
    /// Decode an encoded image (PNG). Sheets without an alpha channel are
    /// treated as fully opaque.
    pub fn decode(bytes: &[u8]) -> Result<Self, SpriteError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    /// Read and decode the sheet at `path`.
    pub fn open(path: &Path) -> Result<Self, SpriteError> {
        let bytes = std::fs::read(path).map_err(|source| SpriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    pub fn view(&self) -> RgbaImage<'_> {
        RgbaImage {
            width: self.width,
            height: self.height,
            pixels: &self.pixels,
        }
    }
}

/// Grid layout of a sprite sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub frames_per_row: u32,
    pub rows: u32,
    /// State each row animates, top to bottom
    pub row_states: Vec<BehaviorState>,
}

impl Default for SheetLayout {
    /// The bundled cat sheet: 8 frames by 10 rows.
    fn default() -> Self {
        use BehaviorState::*;
        Self {
            frames_per_row: 8,
            rows: 10,
            row_states: vec![
                Idle, Idle, Idle, Idle, Active, Active, Lazy, Interact, Interact, Lazy,
            ],
        }
    }
}

impl SheetLayout {
    /// Library assuming every row is fully drawn, for running without a sheet.
    pub fn full_library(&self) -> Result<AnimationLibrary, AnimationError> {
        let mut variants: HashMap<BehaviorState, Vec<usize>> = HashMap::new();
        for state in &self.row_states {
            variants
                .entry(*state)
                .or_default()
                .push(self.frames_per_row as usize);
        }
        AnimationLibrary::new(variants)
    }
}

/// Sprite slicing errors.
#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode sprite sheet: {0}")]
    Decode(#[from] image::ImageError),
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("sheet of {width}x{height} is too small for a {columns}x{rows} grid")]
    EmptyCell {
        width: u32,
        height: u32,
        columns: u32,
        rows: u32,
    },
    #[error("layout has {rows} rows but {states} row states")]
    RowStates { rows: u32, states: usize },
    #[error("sprite sheet is fully transparent")]
    Transparent,
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

/// Bounding box of non-transparent pixels within `cell`, relative to the
/// cell's top-left corner. `None` if every pixel is fully transparent.
pub fn opaque_bounds(image: &RgbaImage<'_>, cell: Rect) -> Option<Rect> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for y in 0..cell.height {
        for x in 0..cell.width {
            if image.alpha(cell.x + x, cell.y + y) == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, x, y, y),
                Some((min_x, max_x, min_y, max_y)) => {
                    (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
                }
            });
        }
    }

    bounds.map(|(min_x, max_x, min_y, max_y)| {
        Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    })
}

/// A sliced sheet: frame rectangles per state and variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlicedSheet {
    /// Crop applied to every cell, relative to the cell origin
    pub crop: Rect,
    /// Frame rectangles in sheet coordinates, per variant, per state
    pub variants: HashMap<BehaviorState, Vec<Vec<Rect>>>,
}

impl SlicedSheet {
    /// Sheet rectangle of the frame the state machine points at.
    pub fn frame(&self, frame: FrameRef) -> Option<Rect> {
        self.variants
            .get(&frame.state)?
            .get(frame.variant_index)?
            .get(frame.frame_index)
            .copied()
    }

    /// Frame counts for the animation state machine.
    pub fn library(&self) -> Result<AnimationLibrary, AnimationError> {
        let variants = self
            .variants
            .iter()
            .map(|(state, variants)| (*state, variants.iter().map(Vec::len).collect()))
            .collect();
        AnimationLibrary::new(variants)
    }
}

/// Slice `image` according to `layout`.
pub fn slice_sheet(image: &RgbaImage<'_>, layout: &SheetLayout) -> Result<SlicedSheet, SpriteError> {
    if layout.row_states.len() != layout.rows as usize {
        return Err(SpriteError::RowStates {
            rows: layout.rows,
            states: layout.row_states.len(),
        });
    }

    let cell_width = image.width.checked_div(layout.frames_per_row).unwrap_or(0);
    let cell_height = image.height.checked_div(layout.rows).unwrap_or(0);
    if cell_width == 0 || cell_height == 0 {
        return Err(SpriteError::EmptyCell {
            width: image.width,
            height: image.height,
            columns: layout.frames_per_row,
            rows: layout.rows,
        });
    }

    // First pass: keep opaque cells and grow the shared crop.
    let mut crop: Option<Rect> = None;
    let mut rows: Vec<(BehaviorState, Vec<(u32, u32)>)> = Vec::new();
    for (row, state) in layout.row_states.iter().enumerate() {
        let row = row as u32;
        let mut origins = Vec::new();
        for column in 0..layout.frames_per_row {
            let origin = (column * cell_width, row * cell_height);
            let cell = Rect::new(origin.0, origin.1, cell_width, cell_height);
            if let Some(bounds) = opaque_bounds(image, cell) {
                crop = Some(crop.map_or(bounds, |c| c.union(&bounds)));
                origins.push(origin);
            }
        }
        rows.push((*state, origins));
    }
    let crop = crop.ok_or(SpriteError::Transparent)?;

    // Second pass: crop every kept frame.
    let mut variants: HashMap<BehaviorState, Vec<Vec<Rect>>> = HashMap::new();
    for (state, origins) in rows {
        if origins.is_empty() {
            tracing::debug!(%state, "skipping fully transparent row");
            continue;
        }
        let frames = origins
            .into_iter()
            .map(|(x, y)| crop.offset(x, y))
            .collect();
        variants.entry(state).or_default().push(frames);
    }

    Ok(SlicedSheet { crop, variants })
}

/// Decode the sheet at `path` and slice it according to `layout`.
pub fn load_sheet(path: &Path, layout: &SheetLayout) -> Result<SlicedSheet, SpriteError> {
    let image = SheetImage::open(path)?;
    let sheet = slice_sheet(&image.view(), layout)?;
    tracing::info!(
        path = %path.display(),
        width = image.width,
        height = image.height,
        crop = ?sheet.crop,
        "sprite sheet loaded"
    );
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    /// Transparent sheet of `width` x `height` with helpers to paint pixels.
    struct Canvas {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    }

    impl Canvas {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize * BYTES_PER_PIXEL],
            }
        }

        fn paint(&mut self, x: u32, y: u32) {
            let offset = ((y * self.width + x) as usize) * BYTES_PER_PIXEL;
            self.pixels[offset..offset + 4].copy_from_slice(&[255, 128, 0, 255]);
        }

        fn image(&self) -> RgbaImage<'_> {
            RgbaImage::new(self.width, self.height, &self.pixels).unwrap()
        }

        fn png(&self) -> Vec<u8> {
            let buffer =
                image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone()).unwrap();
            let mut bytes = Cursor::new(Vec::new());
            buffer.write_to(&mut bytes, ImageFormat::Png).unwrap();
            bytes.into_inner()
        }
    }

    fn small_layout() -> SheetLayout {
        SheetLayout {
            frames_per_row: 2,
            rows: 4,
            row_states: vec![
                BehaviorState::Idle,
                BehaviorState::Active,
                BehaviorState::Lazy,
                BehaviorState::Interact,
            ],
        }
    }

    #[test]
    fn test_opaque_bounds() {
        let mut canvas = Canvas::new(8, 8);
        canvas.paint(2, 3);
        canvas.paint(5, 6);
        let image = canvas.image();

        assert_eq!(
            opaque_bounds(&image, Rect::new(0, 0, 8, 8)),
            Some(Rect::new(2, 3, 4, 4))
        );
        assert_eq!(
            opaque_bounds(&image, Rect::new(4, 4, 4, 4)),
            Some(Rect::new(1, 2, 1, 1))
        );
        assert_eq!(opaque_bounds(&image, Rect::new(0, 4, 4, 4)), None);
    }

    #[test]
    fn test_slice_crops_to_union_and_drops_blank_cells() {
        // 2 columns x 4 rows of 10x10 cells.
        let mut canvas = Canvas::new(20, 40);
        for row in 0..4 {
            canvas.paint(2, row * 10 + 4);
            canvas.paint(6, row * 10 + 7);
        }
        // Second column only drawn on the Idle row, with a wider sprite.
        canvas.paint(10 + 8, 5);
        let sheet = slice_sheet(&canvas.image(), &small_layout()).unwrap();

        assert_eq!(sheet.crop, Rect::new(2, 4, 7, 4));
        let idle = &sheet.variants[&BehaviorState::Idle];
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0], vec![Rect::new(2, 4, 7, 4), Rect::new(12, 4, 7, 4)]);
        assert_eq!(sheet.variants[&BehaviorState::Lazy][0], vec![Rect::new(2, 24, 7, 4)]);

        let library = sheet.library().unwrap();
        assert_eq!(library.frame_count(BehaviorState::Idle, 0), 2);
        assert_eq!(library.frame_count(BehaviorState::Interact, 0), 1);

        let frame = FrameRef {
            state: BehaviorState::Idle,
            variant_index: 0,
            frame_index: 1,
        };
        assert_eq!(sheet.frame(frame), Some(Rect::new(12, 4, 7, 4)));
    }

    #[test]
    fn test_blank_row_adds_no_variant() {
        let mut canvas = Canvas::new(20, 40);
        canvas.paint(1, 1);
        canvas.paint(1, 11);
        canvas.paint(1, 21);
        let sheet = slice_sheet(&canvas.image(), &small_layout()).unwrap();

        assert!(!sheet.variants.contains_key(&BehaviorState::Interact));
        assert!(matches!(
            sheet.library(),
            Err(AnimationError::MissingVariants(BehaviorState::Interact))
        ));
    }

    #[test]
    fn test_slice_errors() {
        let canvas = Canvas::new(20, 40);
        assert!(matches!(
            slice_sheet(&canvas.image(), &small_layout()),
            Err(SpriteError::Transparent)
        ));

        let mut layout = small_layout();
        layout.rows = 3;
        assert!(matches!(
            slice_sheet(&canvas.image(), &layout),
            Err(SpriteError::RowStates { rows: 3, states: 4 })
        ));

        let tiny = Canvas::new(1, 40);
        assert!(matches!(
            slice_sheet(&tiny.image(), &small_layout()),
            Err(SpriteError::EmptyCell { .. })
        ));

        assert!(matches!(
            RgbaImage::new(2, 2, &[0; 15]),
            Err(SpriteError::BufferSize {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn test_default_layout_library() {
        let library = SheetLayout::default().full_library().unwrap();
        assert_eq!(library.variant_count(BehaviorState::Idle), 4);
        assert_eq!(library.variant_count(BehaviorState::Active), 2);
        assert_eq!(library.variant_count(BehaviorState::Lazy), 2);
        assert_eq!(library.variant_count(BehaviorState::Interact), 2);
        assert_eq!(library.frame_count(BehaviorState::Lazy, 1), 8);
    }

    #[test]
    fn test_png_sheet_drives_library() {
        // Rows hold 2, 1, 1 and 2 drawn frames.
        let mut canvas = Canvas::new(20, 40);
        for (row, columns) in [2u32, 1, 1, 2].into_iter().enumerate() {
            for column in 0..columns {
                canvas.paint(column * 10 + 3, row as u32 * 10 + 3);
            }
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, canvas.png()).unwrap();

        let sheet = load_sheet(&path, &small_layout()).unwrap();
        assert_eq!(sheet.crop, Rect::new(3, 3, 1, 1));

        let library = sheet.library().unwrap();
        assert_eq!(library.frame_count(BehaviorState::Idle, 0), 2);
        assert_eq!(library.frame_count(BehaviorState::Active, 0), 1);
        assert_eq!(library.frame_count(BehaviorState::Lazy, 0), 1);
        assert_eq!(library.frame_count(BehaviorState::Interact, 0), 2);
    }

    #[test]
    fn test_sheet_without_alpha_is_opaque() {
        let rgb = image::RgbImage::from_pixel(20, 40, image::Rgb([10, 20, 30]));
        let mut bytes = Cursor::new(Vec::new());
        rgb.write_to(&mut bytes, ImageFormat::Png).unwrap();

        let image = SheetImage::decode(bytes.get_ref()).unwrap();
        let sheet = slice_sheet(&image.view(), &small_layout()).unwrap();
        assert_eq!(sheet.crop, Rect::new(0, 0, 10, 10));
        assert_eq!(sheet.variants[&BehaviorState::Active][0].len(), 2);
    }

    #[test]
    fn test_unreadable_sheet_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SheetImage::open(&dir.path().join("missing.png")),
            Err(SpriteError::Io { .. })
        ));
        assert!(matches!(
            SheetImage::decode(b"not a png"),
            Err(SpriteError::Decode(_))
        ));
    }
}
