use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// 1-bit bottom-up BMP for e-ink microcontrollers.
    Bmp1,
    /// 8-bit greyscale PNG for tablet-class devices.
    Png8,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Bmp1 => "image/bmp",
            Self::Png8 => "image/png",
        }
    }
}

/// Output targets. Each device fetches frames in its native geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    #[serde(rename = "trmnl-og")]
    TrmnlOg,
    #[serde(rename = "trmnl-mini")]
    TrmnlMini,
    #[serde(rename = "kindle-pw5")]
    KindlePw5,
    #[serde(rename = "kindle-pw3")]
    KindlePw3,
    #[serde(rename = "inkplate-6")]
    Inkplate6,
    #[serde(rename = "web-preview")]
    WebPreview,
}

impl DeviceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trmnl-og" => Some(Self::TrmnlOg),
            "trmnl-mini" => Some(Self::TrmnlMini),
            "kindle-pw5" => Some(Self::KindlePw5),
            "kindle-pw3" => Some(Self::KindlePw3),
            "inkplate-6" => Some(Self::Inkplate6),
            "web-preview" => Some(Self::WebPreview),
            _ => None,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::TrmnlOg => (800, 480),
            Self::TrmnlMini => (600, 448),
            Self::KindlePw5 => (1236, 1648),
            Self::KindlePw3 => (1072, 1448),
            Self::Inkplate6 => (800, 600),
            Self::WebPreview => (800, 480),
        }
    }

    pub fn format(&self) -> ImageFormat {
        match self {
            Self::TrmnlOg | Self::TrmnlMini | Self::Inkplate6 => ImageFormat::Bmp1,
            Self::KindlePw5 | Self::KindlePw3 | Self::WebPreview => ImageFormat::Png8,
        }
    }

    pub fn is_one_bit(&self) -> bool {
        self.format() == ImageFormat::Bmp1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_serde_names() {
        for kind in [
            DeviceKind::TrmnlOg,
            DeviceKind::TrmnlMini,
            DeviceKind::KindlePw5,
            DeviceKind::KindlePw3,
            DeviceKind::Inkplate6,
            DeviceKind::WebPreview,
        ] {
            let name = serde_json::to_string(&kind).unwrap();
            let name = name.trim_matches('"');
            assert_eq!(DeviceKind::parse(name), Some(kind));
        }
        assert_eq!(DeviceKind::parse("toaster"), None);
    }
}
