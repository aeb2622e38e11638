//! Geohash encoding, as the bureau's location API addresses places by
//! geohash rather than raw coordinates.

const BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

pub fn encode(latitude: f64, longitude: f64, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);

    let mut result = String::with_capacity(precision);
    let mut bits = 0u8;
    let mut bit_count = 0;
    let mut even_bit = true;

    while result.len() < precision {
        if even_bit {
            let mid = (lon_range.0 + lon_range.1) / 2.0;
            if longitude >= mid {
                bits = (bits << 1) | 1;
                lon_range.0 = mid;
            } else {
                bits <<= 1;
                lon_range.1 = mid;
            }
        } else {
            let mid = (lat_range.0 + lat_range.1) / 2.0;
            if latitude >= mid {
                bits = (bits << 1) | 1;
                lat_range.0 = mid;
            } else {
                bits <<= 1;
                lat_range.1 = mid;
            }
        }
        even_bit = !even_bit;
        bit_count += 1;
        if bit_count == 5 {
            result.push(BASE32[bits as usize] as char);
            bits = 0;
            bit_count = 0;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_geohashes() {
        // Melbourne CBD
        assert_eq!(encode(-37.8136, 144.9631, 6), "r1r0fs");
        // Sydney CBD
        assert_eq!(encode(-33.8688, 151.2093, 6), "r3gx2f");
    }
}
