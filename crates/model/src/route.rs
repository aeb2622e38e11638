use serde::{Deserialize, Serialize};

use crate::stop::ModeType;

/// A transit line as displayed to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub route_id: String,
    pub line_name: String,
    pub mode: ModeType,
    pub terminus_ids: Vec<String>,
}

impl Route {
    /// A route is citybound when its final stop belongs to the authority's
    /// CBD terminus set. The predicate is authority-specific, so callers
    /// supply it.
    pub fn is_citybound(&self, is_cbd_terminus: impl Fn(&str) -> bool) -> bool {
        self.terminus_ids.iter().any(|id| is_cbd_terminus(id))
    }
}
