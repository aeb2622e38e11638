/// The e-ink palette. Greys exist only on 8-bit targets; 1-bit frames
/// threshold them at write time.
pub const WHITE: u8 = 0xF5;
pub const BLACK: u8 = 0x1A;
pub const GREY: u8 = 0x88;
pub const LIGHT_GREY: u8 = 0xCC;

/// Values below this become black pixels on 1-bit targets.
pub const ONE_BIT_THRESHOLD: u8 = 128;

/// One canvas, the single full-frame allocation of a render. 8-bit
/// targets store a byte per pixel; 1-bit targets store packed rows (one
/// bit per pixel, set = black), so an 800x480 e-ink frame costs 48 000
/// bytes, not 384 000.
pub struct Frame {
    width: u32,
    height: u32,
    one_bit: bool,
    pixels: Vec<u8>,
}

fn packed_row_bytes(width: u32) -> usize {
    ((width + 7) / 8) as usize
}

impl Frame {
    /// An 8-bit greyscale canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            one_bit: false,
            pixels: vec![WHITE; (width * height) as usize],
        }
    }

    /// A packed 1-bit canvas for e-ink targets. Starts all white
    /// (no bits set).
    pub fn new_one_bit(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            one_bit: true,
            pixels: vec![0; packed_row_bytes(width) * height as usize],
        }
    }

    fn with_depth(width: u32, height: u32, one_bit: bool) -> Self {
        if one_bit {
            Self::new_one_bit(width, height)
        } else {
            Self::new(width, height)
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_one_bit(&self) -> bool {
        self.one_bit
    }

    /// The raw buffer: bytes for 8-bit frames, packed rows for 1-bit
    /// frames. Content hashes work over either.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn set(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if self.one_bit {
            let index = y as usize * packed_row_bytes(self.width) + (x / 8) as usize;
            let mask = 0x80 >> (x % 8);
            if value < ONE_BIT_THRESHOLD {
                self.pixels[index] |= mask;
            } else {
                self.pixels[index] &= !mask;
            }
        } else {
            self.pixels[(y * self.width + x) as usize] = value;
        }
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        if self.one_bit {
            let index = y as usize * packed_row_bytes(self.width) + (x / 8) as usize;
            let mask = 0x80 >> (x % 8);
            if self.pixels[index] & mask != 0 {
                BLACK
            } else {
                WHITE
            }
        } else {
            self.pixels[(y * self.width + x) as usize]
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, value: u8) {
        for yy in y..y + h as i32 {
            for xx in x..x + w as i32 {
                self.set(xx, yy, value);
            }
        }
    }

    pub fn rect_outline(&mut self, x: i32, y: i32, w: u32, h: u32, thickness: u32, value: u8) {
        let t = thickness as i32;
        self.fill_rect(x, y, w, thickness, value);
        self.fill_rect(x, y + h as i32 - t, w, thickness, value);
        self.fill_rect(x, y, thickness, h, value);
        self.fill_rect(x + w as i32 - t, y, thickness, h, value);
    }

    pub fn hline_dashed(&mut self, x: i32, y: i32, w: u32, value: u8) {
        for step in 0..w as i32 {
            // 3 on, 2 off
            if step % 5 < 3 {
                self.set(x + step, y, value);
            }
        }
    }

    pub fn vline_dashed(&mut self, x: i32, y: i32, h: u32, value: u8) {
        for step in 0..h as i32 {
            if step % 5 < 3 {
                self.set(x, y + step, value);
            }
        }
    }

    pub fn rect_dashed(&mut self, x: i32, y: i32, w: u32, h: u32, value: u8) {
        self.hline_dashed(x, y, w, value);
        self.hline_dashed(x, y + h as i32 - 1, w, value);
        self.vline_dashed(x, y, h, value);
        self.vline_dashed(x + w as i32 - 1, y, h, value);
    }

    /// Diagonal stripe fill for cancelled cards. Text goes on an opaque
    /// plate drawn over the stripes.
    pub fn stripes(&mut self, x: i32, y: i32, w: u32, h: u32, value: u8) {
        for yy in 0..h as i32 {
            for xx in 0..w as i32 {
                if (xx + yy) % 6 < 2 {
                    self.set(x + xx, y + yy, value);
                }
            }
        }
    }

    pub fn filled_circle(&mut self, cx: i32, cy: i32, radius: i32, value: u8) {
        for yy in -radius..=radius {
            for xx in -radius..=radius {
                if xx * xx + yy * yy <= radius * radius {
                    self.set(cx + xx, cy + yy, value);
                }
            }
        }
    }

    pub fn circle_outline(&mut self, cx: i32, cy: i32, radius: i32, value: u8) {
        let inner = (radius - 1) * (radius - 1);
        let outer = (radius + 1) * (radius + 1);
        for yy in -radius - 1..=radius + 1 {
            for xx in -radius - 1..=radius + 1 {
                let d = xx * xx + yy * yy;
                if d >= inner && d <= outer {
                    self.set(cx + xx, cy + yy, value);
                }
            }
        }
    }

    /// Dashed ring for skipped legs: the outline with gaps on a fixed
    /// cadence, so output stays deterministic.
    pub fn circle_dashed(&mut self, cx: i32, cy: i32, radius: i32, value: u8) {
        let inner = (radius - 1) * (radius - 1);
        let outer = (radius + 1) * (radius + 1);
        for yy in -radius - 1..=radius + 1 {
            for xx in -radius - 1..=radius + 1 {
                let d = xx * xx + yy * yy;
                if d >= inner && d <= outer && (xx + 2 * yy).rem_euclid(5) < 3 {
                    self.set(cx + xx, cy + yy, value);
                }
            }
        }
    }

    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, value: u8) {
        // Bresenham
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.set(x, y, value);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Copies a rectangle out of the frame, keeping its depth. Clamped to
    /// the frame bounds.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Frame {
        let mut out = Frame::with_depth(w, h, self.one_bit);
        for yy in 0..h {
            for xx in 0..w {
                let src_x = (x + xx).min(self.width - 1);
                let src_y = (y + yy).min(self.height - 1);
                out.set(xx as i32, yy as i32, self.get(src_x, src_y));
            }
        }
        out
    }

    /// Packs the frame into 1-bit rows, darkest-first: values under the
    /// threshold set the bit.
    pub fn to_one_bit_rows(&self) -> Vec<Vec<u8>> {
        let row_bytes = packed_row_bytes(self.width);
        let mut rows = Vec::with_capacity(self.height as usize);
        for y in 0..self.height {
            let mut row = vec![0u8; row_bytes];
            for x in 0..self.width {
                if self.get(x, y) < ONE_BIT_THRESHOLD {
                    row[(x / 8) as usize] |= 0x80 >> (x % 8);
                }
            }
            rows.push(row);
        }
        rows
    }
}
