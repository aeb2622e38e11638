use gtfs::AuthorityRules;
use model::{AuState, ModeType};

/// Everything authority-specific: realtime endpoints, the authentication
/// header, the CBD terminus set and the line-code table. Reference data
/// only; user geography never appears here.
pub struct Authority {
    pub id: &'static str,
    /// Header carrying the subscription key. Authenticated feeds never
    /// take the key as a query parameter.
    pub auth_header: &'static str,
    /// Prefix for the header value, where the authority wants a scheme
    /// in front of the key.
    auth_value_prefix: &'static str,
    base_url: &'static str,
    cbd_terminus_prefix: &'static str,
    cbd_terminus_ids: &'static [&'static str],
    line_codes: &'static [(&'static str, &'static str)],
}

/// Melbourne metropolitan line codes as they appear in Victorian route ids.
const VIC_LINE_CODES: &[(&str, &str)] = &[
    ("ALM", "Alamein"),
    ("BEG", "Belgrave"),
    ("CBE", "Cranbourne"),
    ("CGB", "Craigieburn"),
    ("FKN", "Frankston"),
    ("GWY", "Glen Waverley"),
    ("HBE", "Hurstbridge"),
    ("LIL", "Lilydale"),
    ("MDD", "Mernda"),
    ("PKM", "Pakenham"),
    ("SHM", "Sandringham"),
    ("SYM", "Sunbury"),
    ("UFD", "Upfield"),
    ("WBE", "Werribee"),
    ("WMN", "Williamstown"),
];

static VICTORIA: Authority = Authority {
    id: "vic-opendata",
    auth_header: "KeyId",
    auth_value_prefix: "",
    base_url: "https://opendata.transport.vic.gov.au/gtfsr/v1",
    cbd_terminus_prefix: "26",
    cbd_terminus_ids: &["12204", "12205"],
    line_codes: VIC_LINE_CODES,
};

static NSW: Authority = Authority {
    id: "nsw-opendata",
    auth_header: "Authorization",
    auth_value_prefix: "apikey ",
    base_url: "https://api.transport.nsw.gov.au/v2/gtfs/realtime",
    cbd_terminus_prefix: "2000",
    cbd_terminus_ids: &[],
    line_codes: &[],
};

impl Authority {
    pub fn for_state(state: AuState) -> &'static Authority {
        match state {
            AuState::Nsw | AuState::Act => &NSW,
            // remaining states ride on the Victorian endpoint shape until
            // their feeds are onboarded
            _ => &VICTORIA,
        }
    }

    pub fn auth_header_value(&self, api_key: &str) -> String {
        format!("{}{}", self.auth_value_prefix, api_key)
    }

    pub fn mode_path(mode: ModeType) -> &'static str {
        match mode {
            ModeType::Train => "metrotrain",
            ModeType::Tram => "tram",
            ModeType::Bus => "bus",
            ModeType::LightRail => "lightrail",
            ModeType::Ferry => "ferry",
            ModeType::VLine => "vline",
        }
    }

    pub fn trip_updates_url(&self, mode: ModeType) -> String {
        format!("{}/{}/tripupdates", self.base_url, Self::mode_path(mode))
    }

    pub fn alerts_url(&self, mode: ModeType) -> String {
        format!("{}/{}/servicealerts", self.base_url, Self::mode_path(mode))
    }

    /// The City Loop predicate: underground loop ids plus Flinders Street.
    pub fn is_city_loop_stop(&self, stop_id: &str) -> bool {
        stop_id.starts_with(self.cbd_terminus_prefix)
            || self.cbd_terminus_ids.contains(&stop_id)
    }

    /// Line code embedded in a Victorian-format route id, e.g.
    /// `vic-2-BEG` carries `BEG`.
    fn line_code(route_id: &str) -> Option<&str> {
        let mut parts = route_id.split('-');
        let prefix = parts.next()?;
        let digits = parts.next()?;
        let code = parts.next()?;
        if prefix != "vic"
            || digits.is_empty()
            || !digits.bytes().all(|b| b.is_ascii_digit())
            || code.is_empty()
            || !code.bytes().all(|b| b.is_ascii_uppercase())
        {
            return None;
        }
        Some(code)
    }

    pub fn line_name_known(&self, route_id: &str) -> Option<String> {
        let code = Self::line_code(route_id)?;
        self.line_codes
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, name)| (*name).to_owned())
    }
}

impl AuthorityRules for Authority {
    fn is_cbd_terminus(&self, stop_id: &str) -> bool {
        self.is_city_loop_stop(stop_id)
    }

    fn line_name(&self, route_id: &str) -> String {
        // unknown codes surface the raw code rather than guessing
        self.line_name_known(route_id).unwrap_or_else(|| {
            Self::line_code(route_id)
                .unwrap_or(route_id)
                .to_owned()
        })
    }

    fn mode_for_route(&self, route_id: &str) -> Option<ModeType> {
        let digits = route_id.split('-').nth(1)?;
        match digits {
            "1" => Some(ModeType::VLine),
            "2" => Some(ModeType::Train),
            "3" => Some(ModeType::Tram),
            "4" => Some(ModeType::Bus),
            _ => None,
        }
    }
}
