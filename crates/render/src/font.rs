use std::{path::PathBuf, sync::OnceLock};

use ab_glyph::{Font as _, FontVec, PxScale, ScaleFont as _};

use crate::{bitmap_font, frame::Frame};

/// Directories probed for the Inter faces, in order.
fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("./fonts")];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.join("fonts"));
        }
    }
    dirs.push(PathBuf::from("/var/task/fonts"));
    dirs
}

enum Face {
    /// The built-in 5x7 font, integer-scaled.
    Bitmap,
    Outline(FontVec),
}

pub struct Fonts {
    regular: Face,
    bold: Face,
}

static FONTS: OnceLock<Fonts> = OnceLock::new();

/// Loads Inter once per process, falling back to the built-in bitmap font
/// with a single warning. Rendering never fails over fonts.
pub fn fonts() -> &'static Fonts {
    FONTS.get_or_init(|| {
        let regular = load_face("Inter-Regular.ttf");
        let bold = load_face("Inter-Bold.ttf");
        if regular.is_none() || bold.is_none() {
            log::warn!("Inter fonts not found; using the built-in bitmap font");
        }
        Fonts {
            regular: regular.unwrap_or(Face::Bitmap),
            bold: bold.unwrap_or(Face::Bitmap),
        }
    })
}

fn load_face(file_name: &str) -> Option<Face> {
    for dir in font_dirs() {
        let path = dir.join(file_name);
        if let Ok(bytes) = std::fs::read(&path) {
            match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    log::info!("loaded font {}", path.display());
                    return Some(Face::Outline(font));
                }
                Err(why) => {
                    log::warn!("unreadable font {}: {why}", path.display());
                }
            }
        }
    }
    None
}

impl Fonts {
    fn face(&self, bold: bool) -> &Face {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    /// Advance width of a string at the given pixel size.
    pub fn text_width(&self, text: &str, size_px: u32, bold: bool) -> u32 {
        match self.face(bold) {
            Face::Bitmap => {
                let scale = bitmap_scale(size_px);
                text.chars().count() as u32 * bitmap_font::ADVANCE * scale
            }
            Face::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(size_px as f32));
                text.chars()
                    .map(|c| scaled.h_advance(scaled.scaled_glyph(c).id))
                    .sum::<f32>()
                    .ceil() as u32
            }
        }
    }

    /// Draws text with its top-left corner at (x, y). Outline glyphs are
    /// threshold-quantized; no pixel is ever partially covered, so 1-bit
    /// output carries no grey fringes.
    pub fn draw_text(
        &self,
        frame: &mut Frame,
        text: &str,
        x: i32,
        y: i32,
        size_px: u32,
        bold: bool,
        value: u8,
    ) {
        match self.face(bold) {
            Face::Bitmap => {
                let scale = bitmap_scale(size_px);
                let mut pen_x = x;
                for c in text.chars() {
                    let rows = bitmap_font::glyph(c);
                    for (row_index, row) in rows.iter().enumerate() {
                        for col in 0..bitmap_font::GLYPH_WIDTH {
                            if row & (0b10000 >> col) != 0 {
                                for sy in 0..scale {
                                    for sx in 0..scale {
                                        frame.set(
                                            pen_x
                                                + (col * scale + sx) as i32,
                                            y + (row_index as u32 * scale + sy)
                                                as i32,
                                            value,
                                        );
                                    }
                                }
                            }
                        }
                    }
                    pen_x += (bitmap_font::ADVANCE * scale) as i32;
                }
            }
            Face::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(size_px as f32));
                let ascent = scaled.ascent();
                let mut pen_x = x as f32;
                for c in text.chars() {
                    let mut glyph = scaled.scaled_glyph(c);
                    let advance = scaled.h_advance(glyph.id);
                    glyph.position = ab_glyph::point(pen_x, y as f32 + ascent);
                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|gx, gy, coverage| {
                            if coverage >= 0.5 {
                                frame.set(
                                    bounds.min.x as i32 + gx as i32,
                                    bounds.min.y as i32 + gy as i32,
                                    value,
                                );
                            }
                        });
                    }
                    pen_x += advance;
                }
            }
        }
    }
}

fn bitmap_scale(size_px: u32) -> u32 {
    (size_px / 8).max(1)
}
