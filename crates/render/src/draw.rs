//! Paints the whole dashboard onto a frame in canonical coordinates,
//! scaled to the device. Zones are crops of this one deterministic
//! painting.

use model::{CoffeeReason, Leg, StatusKind};
use utility::clock::{format_12h, format_12h_parts, format_day_date};

use crate::{
    font::{fonts, Fonts},
    frame::{Frame, BLACK, GREY, WHITE},
    glyphs,
    layout::{CANONICAL_HEIGHT, CANONICAL_WIDTH},
    RenderData,
};

struct Painter<'a> {
    frame: &'a mut Frame,
    fonts: &'static Fonts,
    sx: f64,
    sy: f64,
}

impl Painter<'_> {
    fn x(&self, v: i32) -> i32 {
        (f64::from(v) * self.sx).round() as i32
    }

    fn y(&self, v: i32) -> i32 {
        (f64::from(v) * self.sy).round() as i32
    }

    fn w(&self, v: u32) -> u32 {
        (f64::from(v) * self.sx).round().max(1.0) as u32
    }

    fn h(&self, v: u32) -> u32 {
        (f64::from(v) * self.sy).round().max(1.0) as u32
    }

    fn font_px(&self, v: u32) -> u32 {
        (f64::from(v) * self.sx.min(self.sy)).round().max(6.0) as u32
    }

    fn text(&mut self, text: &str, x: i32, y: i32, size: u32, bold: bool, value: u8) {
        let size = self.font_px(size);
        let (x, y) = (self.x(x), self.y(y));
        self.fonts.draw_text(self.frame, text, x, y, size, bold, value);
    }

    fn text_right(&mut self, text: &str, right: i32, y: i32, size: u32, bold: bool, value: u8) {
        let size = self.font_px(size);
        let width = self.fonts.text_width(text, size, bold) as i32;
        let (x, y) = (self.x(right) - width, self.y(y));
        self.fonts.draw_text(self.frame, text, x, y, size, bold, value);
    }

    fn fill(&mut self, x: i32, y: i32, w: u32, h: u32, value: u8) {
        let (x, y, w, h) = (self.x(x), self.y(y), self.w(w), self.h(h));
        self.frame.fill_rect(x, y, w, h, value);
    }

    fn outline(&mut self, x: i32, y: i32, w: u32, h: u32, thickness: u32, value: u8) {
        let (x, y, w, h) = (self.x(x), self.y(y), self.w(w), self.h(h));
        self.frame.rect_outline(x, y, w, h, thickness, value);
    }

    fn dashed(&mut self, x: i32, y: i32, w: u32, h: u32, value: u8) {
        let (x, y, w, h) = (self.x(x), self.y(y), self.w(w), self.h(h));
        self.frame.rect_dashed(x, y, w, h, value);
    }
}

pub fn draw_frame(frame: &mut Frame, data: &RenderData) {
    let sx = f64::from(frame.width()) / f64::from(CANONICAL_WIDTH);
    let sy = f64::from(frame.height()) / f64::from(CANONICAL_HEIGHT);
    let mut p = Painter {
        frame,
        fonts: fonts(),
        sx,
        sy,
    };

    header(&mut p, data);
    status_bar(&mut p, data);
    legs_stack(&mut p, data);
    footer(&mut p, data);
}

fn header(p: &mut Painter<'_>, data: &RenderData) {
    // location line
    p.text(&data.home_label.to_uppercase(), 2, 4, 10, false, BLACK);

    // big clock
    let (clock, suffix) = format_12h_parts(data.now_local.time());
    p.text(&clock, 4, 30, 48, true, BLACK);
    let clock_width = {
        let size = p.font_px(48);
        p.fonts.text_width(&clock, size, true) as i32
    };
    let suffix_x = ((4.0 * p.sx) as i32 + clock_width + p.x(6)).min(p.x(130));
    let size = p.font_px(14);
    let y = p.y(62);
    p.fonts.draw_text(p.frame, &suffix.to_lowercase(), suffix_x, y, size, false, BLACK);

    // day and date
    p.text(&format_day_date(&data.now_local.date()), 150, 24, 14, true, BLACK);

    // status badges, both exactly the same box
    let disruption = matches!(
        data.journey.status,
        StatusKind::Disruption | StatusKind::Diversion
    );
    badge(p, 150, 48, disruption, if disruption { "DISRUPTION" } else { "SERVICES OK" });
    let fallback = data.journey.data_source == model::DataSource::FallbackTimetable;
    badge(
        p,
        150,
        70,
        fallback,
        if fallback { "TIMETABLE FALLBACK" } else { "LIVE DATA" },
    );

    coffee_box(p, data);
    weather_box(p, data);
}

/// Both header badges share one geometry: 115x16.
fn badge(p: &mut Painter<'_>, x: i32, y: i32, filled: bool, label: &str) {
    if filled {
        p.fill(x, y, 115, 16, BLACK);
        p.text(label, x + 6, y + 4, 8, true, WHITE);
    } else {
        p.outline(x, y, 115, 16, 1, BLACK);
        p.text(label, x + 6, y + 4, 8, false, BLACK);
    }
}

fn coffee_box(p: &mut Painter<'_>, data: &RenderData) {
    let Some((cafe_name, can_get, reason)) =
        data.journey.legs.iter().find_map(|leg| match leg {
            Leg::Coffee {
                cafe_name,
                can_get,
                reason,
                ..
            } => Some((cafe_name.clone(), *can_get, *reason)),
            _ => None,
        })
    else {
        return;
    };

    p.outline(384, 8, 232, 78, if can_get { 2 } else { 1 }, BLACK);
    glyphs::coffee_glyph(p.frame, p.x(392), p.y(20), p.w(40), BLACK);
    p.text("COFFEE", 440, 16, 12, true, BLACK);
    p.text(&cafe_name, 440, 34, 10, false, BLACK);
    let reason_label = match reason {
        CoffeeReason::TimeForCoffee => "TIME FOR COFFEE",
        CoffeeReason::ExtraTimeDisruption => "EXTRA TIME TODAY",
        CoffeeReason::FridayTreat => "FRIDAY TREAT",
        CoffeeReason::CafeClosed => "CAFE CLOSED",
        CoffeeReason::SkipRunningLate => "RUNNING LATE",
        CoffeeReason::NoSlack => "NO TIME TODAY",
    };
    p.text(reason_label, 440, 52, 10, false, if can_get { BLACK } else { GREY });
}

fn weather_box(p: &mut Painter<'_>, data: &RenderData) {
    let Some(weather) = &data.weather else {
        return;
    };
    p.text(
        &format!("{}\u{00B0}", weather.temperature_c),
        630,
        10,
        28,
        true,
        BLACK,
    );
    p.text(&weather.condition, 630, 48, 10, false, BLACK);
    if weather.rain_expected {
        p.fill(630, 64, 90, 16, BLACK);
        p.text("UMBRELLA", 636, 68, 8, true, WHITE);
    }
}

fn status_bar(p: &mut Painter<'_>, data: &RenderData) {
    p.fill(0, 96, 800, 28, BLACK);
    p.text(&data.journey.status_message(), 8, 102, 14, true, WHITE);

    if data.journey.cumulative_delay_minutes > 0 {
        let pill = format!("+{} min", data.journey.cumulative_delay_minutes);
        p.outline(600, 100, 76, 20, 1, WHITE);
        p.text(&pill, 608, 104, 10, false, WHITE);
    }

    p.text_right(
        &format!("{} MIN", data.journey.total_minutes),
        792,
        102,
        14,
        true,
        WHITE,
    );
}

fn legs_stack(p: &mut Painter<'_>, data: &RenderData) {
    let legs = &data.journey.legs;
    if legs.is_empty() {
        return;
    }
    let count = legs.len().min(7) as i32;
    let card_h = (440 - 132) / count - 14;
    let glyph_size: u32 = match count {
        0..=3 => 32,
        4..=5 => 26,
        _ => 20,
    };
    let title_size: u32 = if count <= 4 { 16 } else { 12 };
    let subtitle_size: u32 = if count <= 4 { 12 } else { 10 };
    let utc_offset = chrono::Duration::minutes(i64::from(data.utc_offset_minutes));

    for (index, leg) in legs.iter().take(7).enumerate() {
        let top = 132 + index as i32 * (card_h + 14);
        leg_card(
            p,
            leg,
            index,
            top,
            card_h,
            glyph_size,
            title_size,
            subtitle_size,
            utc_offset,
        );
        if index + 1 < count as usize {
            // arrow connector in the gap
            let cx = 30;
            p.fill(cx, top + card_h, 2, 10, BLACK);
            let (ax, ay) = (p.x(cx), p.y(top + card_h + 10));
            let half = p.w(4) as i32;
            p.frame.line(ax - half, ay - half, ax + 1, ay, BLACK);
            p.frame.line(ax + half + 1, ay - half, ax + 1, ay, BLACK);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn leg_card(
    p: &mut Painter<'_>,
    leg: &Leg,
    index: usize,
    top: i32,
    card_h: i32,
    glyph_size: u32,
    title_size: u32,
    subtitle_size: u32,
    utc_offset: chrono::Duration,
) {
    let cancelled = leg.is_suspended();
    let diverted = leg.is_diverted();
    let delayed = leg.is_delayed();
    let skipped = matches!(leg, Leg::Coffee { can_get: false, .. });
    let coffee_go = matches!(leg, Leg::Coffee { can_get: true, .. });

    // card background and border
    if cancelled || diverted {
        let (x, y, w, h) = (p.x(8), p.y(top), p.w(784), p.h(card_h as u32));
        p.frame.stripes(x, y, w, h, GREY);
    }
    if delayed {
        p.dashed(8, top, 784, card_h as u32, BLACK);
        p.dashed(9, top + 1, 782, card_h as u32 - 2, BLACK);
    } else if skipped {
        p.dashed(8, top, 784, card_h as u32, BLACK);
    } else {
        p.outline(8, top, 784, card_h as u32, if coffee_go { 2 } else { 1 }, BLACK);
    }

    let cy = top + card_h / 2;

    // numbered circle
    let radius = (card_h / 2 - 6).clamp(8, 14);
    let (ccx, ccy, cr) = (p.x(30), p.y(cy), p.w(radius as u32) as i32);
    if cancelled {
        p.frame.circle_outline(ccx, ccy, cr, BLACK);
        p.frame.line(ccx - cr / 2, ccy - cr / 2, ccx + cr / 2, ccy + cr / 2, BLACK);
        p.frame.line(ccx - cr / 2, ccy + cr / 2, ccx + cr / 2, ccy - cr / 2, BLACK);
    } else if skipped {
        p.frame.circle_dashed(ccx, ccy, cr, BLACK);
    } else {
        p.frame.filled_circle(ccx, ccy, cr, BLACK);
        let number = (index + 1).to_string();
        let size = p.font_px(10);
        let width = p.fonts.text_width(&number, size, true) as i32;
        p.fonts.draw_text(
            p.frame,
            &number,
            ccx - width / 2,
            ccy - size as i32 / 2,
            size,
            true,
            WHITE,
        );
    }

    // mode glyph
    let gy = cy - glyph_size as i32 / 2;
    match leg {
        Leg::Walk { .. } => {
            glyphs::walk_glyph(p.frame, p.x(56), p.y(gy), p.w(glyph_size), BLACK)
        }
        Leg::Transit { mode, .. } => {
            glyphs::mode_glyph(p.frame, *mode, p.x(56), p.y(gy), p.w(glyph_size), BLACK)
        }
        Leg::Coffee { .. } => {
            glyphs::coffee_glyph(p.frame, p.x(56), p.y(gy), p.w(glyph_size), BLACK)
        }
    }

    // title plate keeps text readable over stripes
    if cancelled || diverted {
        p.fill(94, top + 4, 380, (card_h - 8) as u32, WHITE);
    }

    let title_y = top + card_h / 2 - title_size as i32;
    let subtitle_y = top + card_h / 2 + 2;
    match leg {
        Leg::Walk {
            from_label,
            to_label,
            minutes,
            ..
        } => {
            p.text(&format!("Walk to {to_label}"), 96, title_y, title_size, true, BLACK);
            p.text(
                &format!("{minutes} min from {from_label}"),
                96,
                subtitle_y,
                subtitle_size,
                false,
                BLACK,
            );
        }
        Leg::Transit {
            line_name,
            origin,
            destination,
            next_departures,
            is_express,
            replacement_mode,
            scheduled_departure: _,
            ..
        } => {
            let mut title = line_name.clone();
            if *is_express {
                title.push_str(" EXPRESS");
            }
            if replacement_mode.is_some() {
                title.push_str(" (REPLACEMENT BUS)");
            }
            p.text(&title, 96, title_y, title_size, true, BLACK);
            let mut subtitle = format!("{} \u{2192} {}", origin.name, destination.name);
            if !next_departures.is_empty() {
                let alternates = next_departures
                    .iter()
                    .map(|minutes| minutes.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                subtitle.push_str(&format!("  then {alternates} min"));
            }
            p.text(&subtitle, 96, subtitle_y, subtitle_size, false, BLACK);
        }
        Leg::Coffee {
            cafe_name,
            interchange_stop_name,
            ..
        } => {
            p.text(cafe_name, 96, title_y, title_size, true, BLACK);
            let subtitle = match interchange_stop_name {
                Some(stop) => format!("at {stop}"),
                None => "Coffee stop".to_owned(),
            };
            p.text(&subtitle, 96, subtitle_y, subtitle_size, false, BLACK);
        }
    }

    // transit-only depart column, shifted from UTC to the user's wall clock
    if let Leg::Transit {
        scheduled_departure,
        delay_minutes,
        ..
    } = leg
    {
        let local = *scheduled_departure
            + chrono::Duration::minutes(i64::from(*delay_minutes))
            + utc_offset;
        p.text("DEPART", 560, top + 6, 8, false, GREY);
        p.text(
            &format_12h(local.time()),
            560,
            top + 18,
            title_size,
            true,
            BLACK,
        );
    }

    duration_box(p, leg, top, card_h);
}

fn duration_box(p: &mut Painter<'_>, leg: &Leg, top: i32, card_h: i32) {
    let x = 704;
    let w: u32 = 88;
    let y = top + 4;
    let h = (card_h - 8).max(12) as u32;

    if leg.is_suspended() {
        let (px, py, pw, ph) = (p.x(x), p.y(y), p.w(w), p.h(h));
        p.frame.stripes(px, py, pw, ph, BLACK);
        p.fill(x + 6, y + (h as i32 / 2) - 6, w - 12, 12, WHITE);
        p.text("CANCELLED", x + 8, y + h as i32 / 2 - 4, 8, true, BLACK);
        return;
    }
    if matches!(leg, Leg::Coffee { can_get: false, .. }) {
        p.dashed(x, y, w, h, BLACK);
        p.text("\u{2014}", x + 38, y + h as i32 / 2 - 4, 10, false, BLACK);
        return;
    }
    if leg.is_delayed() {
        p.fill(x, y, w, h, WHITE);
        p.outline(x, y, w, h, 1, BLACK);
        let (px, py, ph) = (p.x(x), p.y(y), p.h(h));
        p.frame.vline_dashed(px, py, ph, BLACK);
        p.frame.vline_dashed(px + 1, py, ph, BLACK);
        p.text(
            &format!("+{} min", leg.delay_minutes()),
            x + 8,
            y + h as i32 / 2 - 6,
            12,
            true,
            BLACK,
        );
        return;
    }
    p.fill(x, y, w, h, BLACK);
    p.text(
        &format!("{} MIN", leg.minutes()),
        x + 8,
        y + h as i32 / 2 - 6,
        12,
        true,
        WHITE,
    );
}

fn footer(p: &mut Painter<'_>, data: &RenderData) {
    p.fill(0, 448, 800, 32, BLACK);
    p.text(
        &data.destination_label.to_uppercase(),
        8,
        456,
        16,
        true,
        WHITE,
    );
    p.text_right(
        &format!("ARRIVE {}", format_12h(data.journey.arrival_time_local)),
        792,
        456,
        16,
        true,
        WHITE,
    );
}
