//! Named zone geometry. The 800x480 layout is canonical; other device
//! sizes re-flow proportionally from it.

pub const CANONICAL_WIDTH: u32 = 800;
pub const CANONICAL_HEIGHT: u32 = 480;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: &'static str,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Canonical rects. Header sub-zones overlap by design; each is an
/// independently refreshable crop, not a tiling.
const CANONICAL: &[Zone] = &[
    Zone { id: "header.location", x: 0, y: 0, w: 380, h: 20 },
    Zone { id: "header.time", x: 0, y: 20, w: 380, h: 74 },
    Zone { id: "header.dayDate", x: 140, y: 20, w: 240, h: 74 },
    Zone { id: "header.statusBadges", x: 140, y: 40, w: 240, h: 54 },
    Zone { id: "header.coffeeBox", x: 380, y: 4, w: 240, h: 86 },
    Zone { id: "header.weather", x: 620, y: 4, w: 180, h: 86 },
    Zone { id: "status", x: 0, y: 96, w: 800, h: 28 },
    Zone { id: "legs", x: 0, y: 132, w: 800, h: 308 },
    Zone { id: "footer", x: 0, y: 448, w: 800, h: 32 },
];

/// The zones present for a journey on a device, scaled to its geometry.
/// The coffee box only exists when the journey carries a coffee leg.
pub fn zones(width: u32, height: u32, has_coffee: bool) -> Vec<Zone> {
    CANONICAL
        .iter()
        .filter(|zone| has_coffee || zone.id != "header.coffeeBox")
        .map(|zone| scale_zone(zone, width, height))
        .collect()
}

pub fn zone(width: u32, height: u32, id: &str) -> Option<Zone> {
    CANONICAL
        .iter()
        .find(|zone| zone.id == id)
        .map(|zone| scale_zone(zone, width, height))
}

fn scale_zone(zone: &Zone, width: u32, height: u32) -> Zone {
    let sx = f64::from(width) / f64::from(CANONICAL_WIDTH);
    let sy = f64::from(height) / f64::from(CANONICAL_HEIGHT);
    let x = (f64::from(zone.x) * sx).round() as u32;
    let y = (f64::from(zone.y) * sy).round() as u32;
    let w = ((f64::from(zone.w) * sx).round() as u32).max(1).min(width - x.min(width));
    let h = ((f64::from(zone.h) * sy).round() as u32).max(1).min(height - y.min(height));
    Zone {
        id: zone.id,
        x: x.min(width - 1),
        y: y.min(height - 1),
        w,
        h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_zones_identity_at_800x480() {
        let zones = zones(800, 480, true);
        assert_eq!(zones.len(), 9);
        let legs = zones.iter().find(|zone| zone.id == "legs").unwrap();
        assert_eq!((legs.x, legs.y, legs.w, legs.h), (0, 132, 800, 308));
    }

    #[test]
    fn coffee_box_only_with_coffee() {
        assert!(zones(800, 480, false)
            .iter()
            .all(|zone| zone.id != "header.coffeeBox"));
    }

    #[test]
    fn scaled_zones_stay_in_bounds() {
        for (w, h) in [(600u32, 448u32), (1236, 1648), (1072, 1448), (800, 600)] {
            for zone in zones(w, h, true) {
                assert!(zone.x + zone.w <= w, "{} exceeds width on {w}x{h}", zone.id);
                assert!(zone.y + zone.h <= h, "{} exceeds height on {w}x{h}", zone.id);
            }
        }
    }
}
