mod bitmap_font;
pub mod bmp;
pub mod device;
mod draw;
pub mod font;
pub mod frame;
mod glyphs;
pub mod layout;

use chrono::NaiveDateTime;
use model::Journey;
use xxhash_rust::xxh3::xxh3_64;

pub use device::{DeviceKind, ImageFormat};
pub use layout::Zone;

use frame::Frame;

/// The weather facts the header consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherInfo {
    pub temperature_c: i32,
    pub condition: String,
    pub rain_expected: bool,
}

/// Everything a frame is a pure function of. Two equal values render to
/// byte-identical output.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderData {
    pub journey: Journey,
    pub weather: Option<WeatherInfo>,
    /// The wall clock in the user's timezone.
    pub now_local: NaiveDateTime,
    /// Minutes to add to UTC instants for display.
    pub utc_offset_minutes: i32,
    pub home_label: String,
    pub destination_label: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown zone {0}")]
    UnknownZone(String),
    #[error("png encoding failed: {0}")]
    Png(String),
}

/// The zones present for this journey on this device.
pub fn list_zones(device: DeviceKind, data: &RenderData) -> Vec<Zone> {
    let (width, height) = device.dimensions();
    let has_coffee = data
        .journey
        .legs
        .iter()
        .any(|leg| matches!(leg, model::Leg::Coffee { .. }));
    layout::zones(width, height, has_coffee)
}

/// Draws the full dashboard for a device. One full-frame buffer per
/// call, packed to a bit per pixel on 1-bit targets.
fn paint(device: DeviceKind, data: &RenderData) -> Frame {
    let (width, height) = device.dimensions();
    let mut frame = match device.format() {
        ImageFormat::Bmp1 => Frame::new_one_bit(width, height),
        ImageFormat::Png8 => Frame::new(width, height),
    };
    draw::draw_frame(&mut frame, data);
    frame
}

/// Renders one named zone in the device's native format.
pub fn render_zone(
    device: DeviceKind,
    zone_id: &str,
    data: &RenderData,
) -> Result<Vec<u8>, RenderError> {
    let (width, height) = device.dimensions();
    let zone = layout::zone(width, height, zone_id)
        .ok_or_else(|| RenderError::UnknownZone(zone_id.to_owned()))?;
    let frame = paint(device, data);
    let crop = frame.crop(zone.x, zone.y, zone.w, zone.h);
    match device.format() {
        ImageFormat::Bmp1 => Ok(bmp::encode(&crop)),
        ImageFormat::Png8 => encode_png(&crop),
    }
}

/// Renders the full frame as an 8-bit greyscale PNG.
pub fn render_full_png(device: DeviceKind, data: &RenderData) -> Result<Vec<u8>, RenderError> {
    encode_png(&paint(device, data))
}

/// Renders the full frame in the device's native format.
pub fn render_full_native(
    device: DeviceKind,
    data: &RenderData,
) -> Result<Vec<u8>, RenderError> {
    let frame = paint(device, data);
    match device.format() {
        ImageFormat::Bmp1 => Ok(bmp::encode(&frame)),
        ImageFormat::Png8 => encode_png(&frame),
    }
}

/// Content hash of a zone, for conditional fetches. Computed over the
/// cropped pixels, so it changes exactly when the drawn zone changes.
pub fn zone_hash(
    device: DeviceKind,
    zone_id: &str,
    data: &RenderData,
) -> Result<u64, RenderError> {
    let (width, height) = device.dimensions();
    let zone = layout::zone(width, height, zone_id)
        .ok_or_else(|| RenderError::UnknownZone(zone_id.to_owned()))?;
    let frame = paint(device, data);
    let crop = frame.crop(zone.x, zone.y, zone.w, zone.h);
    let mut hashed = Vec::with_capacity(zone_id.len() + crop.pixels().len());
    hashed.extend_from_slice(zone_id.as_bytes());
    hashed.extend_from_slice(crop.pixels());
    Ok(xxh3_64(&hashed))
}

/// Hashes for every present zone, painting the frame once.
pub fn zone_hashes(device: DeviceKind, data: &RenderData) -> Vec<(Zone, u64)> {
    let frame = paint(device, data);
    list_zones(device, data)
        .into_iter()
        .map(|zone| {
            let crop = frame.crop(zone.x, zone.y, zone.w, zone.h);
            let mut hashed =
                Vec::with_capacity(zone.id.len() + crop.pixels().len());
            hashed.extend_from_slice(zone.id.as_bytes());
            hashed.extend_from_slice(crop.pixels());
            let hash = xxh3_64(&hashed);
            (zone, hash)
        })
        .collect()
}

/// A minimal valid image carrying an error line. The device always gets
/// something decodable, even when rasterization of real data failed.
pub fn render_error_frame(device: DeviceKind, message: &str) -> Vec<u8> {
    let (width, height) = device.dimensions();
    let mut frame = match device.format() {
        ImageFormat::Bmp1 => Frame::new_one_bit(width, height),
        ImageFormat::Png8 => Frame::new(width, height),
    };
    font::fonts().draw_text(
        &mut frame,
        "RENDER ERROR",
        8,
        8,
        16,
        true,
        frame::BLACK,
    );
    font::fonts().draw_text(&mut frame, message, 8, 32, 10, false, frame::BLACK);
    match device.format() {
        ImageFormat::Bmp1 => bmp::encode(&frame),
        // a png failure here has nothing left to fall back to; emit the
        // bmp bytes so the response is never empty
        ImageFormat::Png8 => encode_png(&frame).unwrap_or_else(|_| bmp::encode(&frame)),
    }
}

fn encode_png(frame: &Frame) -> Result<Vec<u8>, RenderError> {
    // a packed frame expands to grey bytes here; the 8-bit image is the
    // output of this path, so the byte-per-pixel buffer is its own
    let expanded;
    let bytes: &[u8] = if frame.is_one_bit() {
        expanded = (0..frame.height())
            .flat_map(|y| (0..frame.width()).map(move |x| frame.get(x, y)))
            .collect::<Vec<u8>>();
        &expanded
    } else {
        frame.pixels()
    };

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, frame.width(), frame.height());
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|why| RenderError::Png(why.to_string()))?;
        writer
            .write_image_data(bytes)
            .map_err(|why| RenderError::Png(why.to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use model::{DataSource, Journey, Leg, ModeType, Stop};

    fn journey(delay: u32) -> Journey {
        let legs = vec![
            Leg::Walk {
                from_label: "Home".to_owned(),
                to_label: "Brunswick Rd".to_owned(),
                minutes: 4,
                is_first: true,
                is_last: false,
            },
            Leg::Transit {
                mode: ModeType::Train,
                route_id: "vic-2-BEG".to_owned(),
                line_name: "Belgrave".to_owned(),
                origin: Stop::new("1001", "Brunswick Rd", ModeType::Train, -37.8, 144.96),
                destination: Stop::new(
                    "12204",
                    "Flinders Street",
                    ModeType::Train,
                    -37.818,
                    144.967,
                ),
                departure_minutes: 5,
                scheduled_departure: Utc
                    .with_ymd_and_hms(2026, 2, 2, 20, 15, 0)
                    .unwrap(),
                ride_minutes: 12,
                delay_minutes: delay,
                is_delayed: delay >= 1,
                is_suspended: false,
                is_diverted: false,
                is_express: false,
                next_departures: vec![12, 19],
                replacement_mode: None,
            },
            Leg::Walk {
                from_label: "Flinders Street".to_owned(),
                to_label: "Work".to_owned(),
                minutes: 5,
                is_first: false,
                is_last: true,
            },
        ];
        Journey::from_legs(
            legs,
            NaiveTime::from_hms_opt(7, 31, 0).unwrap(),
            NaiveTime::from_hms_opt(7, 10, 0).unwrap(),
            DataSource::Live,
            None,
        )
    }

    fn data(delay: u32) -> RenderData {
        RenderData {
            journey: journey(delay),
            weather: Some(WeatherInfo {
                temperature_c: 21,
                condition: "Partly cloudy".to_owned(),
                rain_expected: false,
            }),
            now_local: NaiveDate::from_ymd_opt(2026, 2, 3)
                .unwrap()
                .and_hms_opt(7, 10, 0)
                .unwrap(),
            utc_offset_minutes: 11 * 60,
            home_label: "12 Example St, Brunswick".to_owned(),
            destination_label: "Work".to_owned(),
        }
    }

    #[test]
    fn render_is_byte_deterministic() {
        let data = data(0);
        let a = render_zone(DeviceKind::TrmnlOg, "legs", &data).unwrap();
        let b = render_zone(DeviceKind::TrmnlOg, "legs", &data).unwrap();
        assert_eq!(a, b);
        let fa = render_full_png(DeviceKind::WebPreview, &data).unwrap();
        let fb = render_full_png(DeviceKind::WebPreview, &data).unwrap();
        assert_eq!(fa, fb);
    }

    #[test]
    fn one_bit_zone_has_exact_bmp_size() {
        let data = data(0);
        for zone in list_zones(DeviceKind::TrmnlOg, &data) {
            let bytes = render_zone(DeviceKind::TrmnlOg, zone.id, &data).unwrap();
            assert_eq!(
                bytes.len() as u32,
                bmp::file_size(zone.w, zone.h),
                "zone {}",
                zone.id
            );
            // devices reject oversized partial refreshes
            assert!(bytes.len() <= 40 * 1024, "zone {} too large", zone.id);
        }
    }

    #[test]
    fn zone_hash_changes_with_content() {
        let calm = data(0);
        let delayed = data(7);
        let a = zone_hash(DeviceKind::TrmnlOg, "status", &calm).unwrap();
        let b = zone_hash(DeviceKind::TrmnlOg, "status", &delayed).unwrap();
        assert_ne!(a, b);
        // unrelated zone stays stable
        let c = zone_hash(DeviceKind::TrmnlOg, "header.location", &calm).unwrap();
        let d = zone_hash(DeviceKind::TrmnlOg, "header.location", &delayed).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn fallback_data_changes_only_the_badge_region() {
        let live = data(0);
        let mut fallback = data(0);
        fallback.journey.data_source = DataSource::FallbackTimetable;

        // the header zones overlapping the badge rect change with it; the
        // rest of the frame must be pixel-identical
        let badge_region = ["header.statusBadges", "header.time", "header.dayDate"];
        for (zone, live_hash) in zone_hashes(DeviceKind::TrmnlOg, &live) {
            let fallback_hash =
                zone_hash(DeviceKind::TrmnlOg, zone.id, &fallback).unwrap();
            if zone.id == "header.statusBadges" {
                assert_ne!(live_hash, fallback_hash, "badge zone must change");
            } else if !badge_region.contains(&zone.id) {
                assert_eq!(live_hash, fallback_hash, "zone {} changed", zone.id);
            }
        }
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let data = data(0);
        assert!(matches!(
            render_zone(DeviceKind::TrmnlOg, "nope", &data),
            Err(RenderError::UnknownZone(_))
        ));
    }

    #[test]
    fn zone_list_has_no_coffee_box_without_coffee() {
        let data = data(0);
        assert!(list_zones(DeviceKind::TrmnlOg, &data)
            .iter()
            .all(|zone| zone.id != "header.coffeeBox"));
    }

    #[test]
    fn error_frame_decodes_as_bmp() {
        let bytes = render_error_frame(DeviceKind::TrmnlOg, "font machinery exploded");
        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(bytes.len() as u32, bmp::file_size(800, 480));
    }

    #[test]
    fn png_devices_get_png_zones() {
        let data = data(0);
        let bytes = render_zone(DeviceKind::KindlePw5, "status", &data).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
