//! Canvas-drawn mode glyphs. Everything is straight lines and rectangles
//! so the output is identical on every run and clean at 1 bit.

use model::ModeType;

use crate::frame::Frame;

/// Draws the glyph for a leg's mode in a size x size box at (x, y).
pub fn mode_glyph(frame: &mut Frame, mode: ModeType, x: i32, y: i32, size: u32, value: u8) {
    match mode {
        ModeType::Train | ModeType::VLine => train(frame, x, y, size, value),
        ModeType::Tram | ModeType::LightRail => tram(frame, x, y, size, value),
        ModeType::Bus => bus(frame, x, y, size, value),
        ModeType::Ferry => ferry(frame, x, y, size, value),
    }
}

/// A stick figure for walking legs.
pub fn walk_glyph(frame: &mut Frame, x: i32, y: i32, size: u32, value: u8) {
    let s = size as i32;
    let cx = x + s / 2;
    // head
    frame.filled_circle(cx, y + s / 6, s / 8, value);
    // torso
    frame.line(cx, y + s / 4, cx, y + s * 3 / 5, value);
    // arms
    frame.line(cx, y + s / 3, cx - s / 4, y + s / 2, value);
    frame.line(cx, y + s / 3, cx + s / 4, y + s / 5 + s / 4, value);
    // legs mid-stride
    frame.line(cx, y + s * 3 / 5, cx - s / 4, y + s - 1, value);
    frame.line(cx, y + s * 3 / 5, cx + s / 4, y + s - 1, value);
}

/// A cup with a handle and steam for the coffee leg.
pub fn coffee_glyph(frame: &mut Frame, x: i32, y: i32, size: u32, value: u8) {
    let s = size as i32;
    let cup_w = s * 5 / 8;
    let cup_h = s / 2;
    let cup_x = x + s / 8;
    let cup_y = y + s * 2 / 5;
    frame.fill_rect(cup_x, cup_y, cup_w as u32, cup_h as u32, value);
    // handle
    frame.rect_outline(cup_x + cup_w, cup_y + cup_h / 5, (s / 5) as u32, (cup_h * 3 / 5) as u32, 1, value);
    // steam
    frame.vline_dashed(cup_x + cup_w / 3, y + s / 10, (s / 4) as u32, value);
    frame.vline_dashed(cup_x + cup_w * 2 / 3, y + s / 10, (s / 4) as u32, value);
}

fn train(frame: &mut Frame, x: i32, y: i32, size: u32, value: u8) {
    let s = size as i32;
    // body
    frame.fill_rect(x + s / 8, y + s / 8, (s * 3 / 4) as u32, (s * 5 / 8) as u32, value);
    // window band, punched back out
    frame.fill_rect(
        x + s / 4,
        y + s / 4,
        (s / 2) as u32,
        (s / 6).max(2) as u32,
        crate::frame::WHITE,
    );
    // wheels
    frame.filled_circle(x + s / 4, y + s * 7 / 8, s / 10, value);
    frame.filled_circle(x + s * 3 / 4, y + s * 7 / 8, s / 10, value);
}

fn tram(frame: &mut Frame, x: i32, y: i32, size: u32, value: u8) {
    let s = size as i32;
    // pantograph
    frame.line(x + s / 3, y + s / 4, x + s / 2, y, value);
    frame.line(x + s / 2, y, x + s * 2 / 3, y + s / 4, value);
    // body, slimmer than a train
    frame.fill_rect(x + s / 6, y + s / 4, (s * 2 / 3) as u32, (s / 2) as u32, value);
    frame.fill_rect(
        x + s / 4,
        y + s * 3 / 8,
        (s / 2) as u32,
        (s / 8).max(2) as u32,
        crate::frame::WHITE,
    );
    // wheels
    frame.filled_circle(x + s / 3, y + s * 13 / 16, s / 12, value);
    frame.filled_circle(x + s * 2 / 3, y + s * 13 / 16, s / 12, value);
}

fn bus(frame: &mut Frame, x: i32, y: i32, size: u32, value: u8) {
    let s = size as i32;
    frame.fill_rect(x + s / 10, y + s / 5, (s * 4 / 5) as u32, (s / 2) as u32, value);
    // windscreen
    frame.fill_rect(
        x + s / 5,
        y + s * 3 / 10,
        (s / 5) as u32,
        (s / 6).max(2) as u32,
        crate::frame::WHITE,
    );
    frame.filled_circle(x + s / 4, y + s * 4 / 5, s / 10, value);
    frame.filled_circle(x + s * 3 / 4, y + s * 4 / 5, s / 10, value);
}

fn ferry(frame: &mut Frame, x: i32, y: i32, size: u32, value: u8) {
    let s = size as i32;
    // hull
    frame.line(x + s / 8, y + s / 2, x + s * 7 / 8, y + s / 2, value);
    frame.line(x + s / 8, y + s / 2, x + s / 4, y + s * 3 / 4, value);
    frame.line(x + s * 7 / 8, y + s / 2, x + s * 3 / 4, y + s * 3 / 4, value);
    frame.line(x + s / 4, y + s * 3 / 4, x + s * 3 / 4, y + s * 3 / 4, value);
    // cabin
    frame.fill_rect(x + s * 3 / 8, y + s / 4, (s / 4) as u32, (s / 4) as u32, value);
    // waves
    frame.hline_dashed(x + s / 8, y + s * 7 / 8, (s * 3 / 4) as u32, value);
}
