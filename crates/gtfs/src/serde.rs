use serde::{Deserialize, Deserializer};

/// Deserializes empty csv cells into the type's default instead of failing.
pub fn default_if_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

pub mod gtfs_time {
    use serde::{Deserialize, Deserializer};

    use crate::data_model::GtfsTime;

    /// GTFS times are "HH:MM:SS" and may exceed 24:00:00 for trips that run
    /// past midnight. Empty cells become `None`.
    pub fn option<'de, D>(deserializer: D) -> Result<Option<GtfsTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse(text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("bad time {text:?}"))),
        }
    }

    pub fn parse(text: &str) -> Option<GtfsTime> {
        let mut parts = text.split(':');
        let hours: u32 = parts.next()?.parse().ok()?;
        let minutes: u32 = parts.next()?.parse().ok()?;
        let seconds: u32 = parts.next().unwrap_or("0").parse().ok()?;
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
            return None;
        }
        Some(GtfsTime(hours * 3600 + minutes * 60 + seconds))
    }
}

pub mod yyyymmdd {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(raw.trim(), "%Y%m%d").map_err(serde::de::Error::custom)
    }
}
