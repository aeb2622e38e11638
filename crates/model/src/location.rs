use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Australian state or territory. Determines the transit authority and the
/// local timezone used for day-of-week decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuState {
    #[serde(rename = "VIC")]
    Vic,
    #[serde(rename = "NSW")]
    Nsw,
    #[serde(rename = "QLD")]
    Qld,
    #[serde(rename = "SA")]
    Sa,
    #[serde(rename = "WA")]
    Wa,
    #[serde(rename = "TAS")]
    Tas,
    #[serde(rename = "ACT")]
    Act,
    #[serde(rename = "NT")]
    Nt,
}

impl AuState {
    /// Infer the state from a postcode. The ACT ranges overlap the NSW
    /// block and win for 2600-2618 and 2900-2920.
    pub fn from_postcode(postcode: u32) -> Option<Self> {
        match postcode {
            2600..=2618 | 2900..=2920 => Some(Self::Act),
            2000..=2999 => Some(Self::Nsw),
            3000..=3999 | 8000..=8999 => Some(Self::Vic),
            4000..=4999 | 9000..=9999 => Some(Self::Qld),
            5000..=5999 => Some(Self::Sa),
            6000..=6999 => Some(Self::Wa),
            7000..=7999 => Some(Self::Tas),
            800..=999 => Some(Self::Nt),
            _ => None,
        }
    }

    pub fn timezone(&self) -> Tz {
        match self {
            Self::Vic => chrono_tz::Australia::Melbourne,
            Self::Nsw | Self::Act => chrono_tz::Australia::Sydney,
            Self::Qld => chrono_tz::Australia::Brisbane,
            Self::Sa => chrono_tz::Australia::Adelaide,
            Self::Wa => chrono_tz::Australia::Perth,
            Self::Tas => chrono_tz::Australia::Hobart,
            Self::Nt => chrono_tz::Australia::Darwin,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Vic => "VIC",
            Self::Nsw => "NSW",
            Self::Qld => "QLD",
            Self::Sa => "SA",
            Self::Wa => "WA",
            Self::Tas => "TAS",
            Self::Act => "ACT",
            Self::Nt => "NT",
        }
    }
}

/// A user-facing place: home, work or the coffee stop.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub state: Option<AuState>,
}

impl Location {
    pub fn new(
        formatted_address: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            formatted_address: formatted_address.into(),
            latitude,
            longitude,
            state: None,
        }
    }

    /// Resolve the state from an explicit field or the postcode embedded in
    /// the formatted address, explicit field winning.
    pub fn resolved_state(&self) -> Option<AuState> {
        self.state.or_else(|| {
            postcode_in_address(&self.formatted_address)
                .and_then(AuState::from_postcode)
        })
    }

    pub fn distance_metres_to(&self, other: &Location) -> f64 {
        utility::geo::haversine_metres(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Last 4-digit group in an address is taken as the postcode.
fn postcode_in_address(address: &str) -> Option<u32> {
    address
        .split(|c: char| !c.is_ascii_digit())
        .filter(|chunk| chunk.len() == 4)
        .last()
        .and_then(|chunk| chunk.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postcode_state_inference() {
        assert_eq!(AuState::from_postcode(3056), Some(AuState::Vic));
        assert_eq!(AuState::from_postcode(2000), Some(AuState::Nsw));
        assert_eq!(AuState::from_postcode(4000), Some(AuState::Qld));
        assert_eq!(AuState::from_postcode(872), Some(AuState::Nt));
        assert_eq!(AuState::from_postcode(1), None);
    }

    #[test]
    fn act_overrides_nsw_ranges() {
        assert_eq!(AuState::from_postcode(2600), Some(AuState::Act));
        assert_eq!(AuState::from_postcode(2618), Some(AuState::Act));
        assert_eq!(AuState::from_postcode(2900), Some(AuState::Act));
        assert_eq!(AuState::from_postcode(2920), Some(AuState::Act));
        assert_eq!(AuState::from_postcode(2619), Some(AuState::Nsw));
        assert_eq!(AuState::from_postcode(2899), Some(AuState::Nsw));
    }

    #[test]
    fn state_from_address_postcode() {
        let location =
            Location::new("12 Example St, Brunswick VIC 3056", -37.76, 144.96);
        assert_eq!(location.resolved_state(), Some(AuState::Vic));
    }
}
