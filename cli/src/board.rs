use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use shotorder_core::{Clock, PuzzleSession};

pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
pub const CORRECT_COLOR: Rgb<u8> = Rgb([0xac, 0xc1, 0x8a]);
pub const INCORRECT_COLOR: Rgb<u8> = Rgb([0xff, 0x56, 0x66]);
pub const FRAME_PADDING: u32 = 5;
pub const CELL_GAP: u32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardLayout {
    pub columns: u32,
    pub thumb_width: u32,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            columns: 4,
            thumb_width: 320,
        }
    }
}

/// Slot colour: none before the first check, green or red afterwards,
/// faded towards the background while the result is stale.
pub fn slot_color<T, C: Clock>(session: &PuzzleSession<T, C>, slot: usize) -> Rgb<u8> {
    let Some(verification) = session.verification() else {
        return BACKGROUND_COLOR;
    };
    let color = match verification.results.get(slot) {
        Some(true) => CORRECT_COLOR,
        Some(false) => INCORRECT_COLOR,
        None => return BACKGROUND_COLOR,
    };
    if session.is_verification_stale() {
        blend(color, BACKGROUND_COLOR)
    } else {
        color
    }
}

fn blend(a: Rgb<u8>, b: Rgb<u8>) -> Rgb<u8> {
    let mix = |x: u8, y: u8| ((u16::from(x) + u16::from(y)) / 2) as u8;
    Rgb([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
}

fn thumbnail(source: &RgbImage, width: u32) -> RgbImage {
    let width = width.max(1);
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return RgbImage::from_pixel(width, 1, BACKGROUND_COLOR);
    }
    let height = ((u64::from(src_h) * u64::from(width)) as f64 / f64::from(src_w))
        .round()
        .max(1.0) as u32;
    if (src_w, src_h) == (width, height) {
        return source.clone();
    }
    imageops::resize(source, width, height, FilterType::Triangle)
}

/// Contact sheet of the frames in display order, row-major.
pub fn render_board<T, C>(session: &PuzzleSession<T, C>, layout: BoardLayout) -> RgbImage
where
    T: AsRef<RgbImage>,
    C: Clock,
{
    let thumbs: Vec<RgbImage> = session
        .slot_frames()
        .map(|frame| thumbnail(frame.image.as_ref(), layout.thumb_width))
        .collect();
    let total = thumbs.len() as u32;
    let columns = layout.columns.clamp(1, total.max(1));
    let rows = total.div_ceil(columns).max(1);
    let thumb_width = layout.thumb_width.max(1);
    let max_thumb_height = thumbs.iter().map(RgbImage::height).max().unwrap_or(1);
    let cell_width = thumb_width + FRAME_PADDING * 2;
    let cell_height = max_thumb_height + FRAME_PADDING * 2;
    let canvas_width = columns * cell_width + (columns + 1) * CELL_GAP;
    let canvas_height = rows * cell_height + (rows + 1) * CELL_GAP;
    let mut canvas = RgbImage::from_pixel(canvas_width, canvas_height, BACKGROUND_COLOR);

    for (slot, thumb) in thumbs.iter().enumerate() {
        let col = slot as u32 % columns;
        let row = slot as u32 / columns;
        let x = CELL_GAP + col * (cell_width + CELL_GAP);
        let y = CELL_GAP + row * (cell_height + CELL_GAP);
        let color = slot_color(session, slot);
        let frame_height = thumb.height() + FRAME_PADDING * 2;
        for py in y..y + frame_height {
            for px in x..x + cell_width {
                canvas.put_pixel(px, py, color);
            }
        }
        imageops::replace(
            &mut canvas,
            thumb,
            i64::from(x + FRAME_PADDING),
            i64::from(y + FRAME_PADDING),
        );
    }
    canvas
}
