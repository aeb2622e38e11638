use chrono::{NaiveTime, Weekday};
use model::{CoffeePosition, CoffeeReason, JourneyConfig, Location};
use utility::geo::{haversine_metres, walk_minutes};

/// Minutes of slack that must remain after inserting the stop.
const SLACK_BUFFER_MINUTES: i64 = 2;

/// A disruption earns the coffee this much breathing room before it is
/// called extra time.
const DISRUPTION_SLACK_MINUTES: i64 = 5;

const ORIGIN_CAFE_MAX_METRES: f64 = 800.0;
const ORIGIN_DETOUR_MAX_MINUTES: u32 = 4;
const INTERCHANGE_CAFE_MAX_METRES: f64 = 250.0;
const DESTINATION_CAFE_MAX_METRES: f64 = 400.0;

pub const DEFAULT_PREP_MINUTES: u32 = 3;

/// What the planner needs to know about the chosen candidate to place a
/// coffee stop on it.
pub struct CoffeeInput<'a> {
    /// The candidate's total minutes, before coffee.
    pub journey_minutes: u32,
    /// Coordinates of the first boarding stop.
    pub first_stop: (f64, f64),
    /// A non-terminal interchange stop, when the candidate has one.
    pub interchange: Option<InterchangeStop<'a>>,
    /// Whether any transit leg of the candidate carries a disruption alert.
    pub has_disruption: bool,
    /// Local wall clock and weekday in the user's state.
    pub now_local: NaiveTime,
    pub weekday: Weekday,
    /// Cafe opening hours when known; `None` never closes.
    pub cafe_hours: Option<(NaiveTime, NaiveTime)>,
}

pub struct InterchangeStop<'a> {
    pub name: &'a str,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone)]
pub struct CoffeeDecision {
    pub can_get: bool,
    pub reason: CoffeeReason,
    pub position: Option<CoffeePosition>,
    pub cafe_name: String,
    /// Detour walk plus preparation; what the stop costs the journey.
    pub duration_minutes: u32,
    pub interchange_stop_name: Option<String>,
}

impl CoffeeDecision {
    fn skip(cafe_name: &str, reason: CoffeeReason) -> Self {
        Self {
            can_get: false,
            reason,
            position: None,
            cafe_name: cafe_name.to_owned(),
            duration_minutes: 0,
            interchange_stop_name: None,
        }
    }
}

struct Placement {
    position: CoffeePosition,
    added_minutes: u32,
}

/// Decides whether the coffee stop fits the journey's slack and where it
/// goes. Pure; every input is passed in.
pub fn place(config: &JourneyConfig, input: &CoffeeInput<'_>) -> CoffeeDecision {
    let Some(cafe) = &config.cafe else {
        return CoffeeDecision::skip("", CoffeeReason::NoSlack);
    };
    let cafe_name = cafe.formatted_address.as_str();
    let prep = DEFAULT_PREP_MINUTES;

    let slack_minutes = (config.arrival_time - input.now_local).num_minutes()
        - i64::from(input.journey_minutes);
    if slack_minutes < 0 {
        return CoffeeDecision::skip(cafe_name, CoffeeReason::SkipRunningLate);
    }

    let mut placements = Vec::new();

    // origin: near home and barely off the walk to the first stop
    let home_to_cafe = distance(&config.home, cafe);
    if home_to_cafe <= ORIGIN_CAFE_MAX_METRES {
        let direct = walk_minutes(location_distance(
            &config.home,
            input.first_stop.0,
            input.first_stop.1,
        ));
        let via_cafe = walk_minutes(home_to_cafe)
            + walk_minutes(location_distance(
                cafe,
                input.first_stop.0,
                input.first_stop.1,
            ));
        let walk_delta = via_cafe.saturating_sub(direct);
        if walk_delta <= ORIGIN_DETOUR_MAX_MINUTES {
            placements.push(Placement {
                position: CoffeePosition::Origin,
                added_minutes: walk_delta + prep,
            });
        }
    }

    // interchange: only with a non-terminal transit leg to break at
    if let Some(interchange) = &input.interchange {
        let stop_to_cafe =
            location_distance(cafe, interchange.latitude, interchange.longitude);
        if stop_to_cafe <= INTERCHANGE_CAFE_MAX_METRES {
            placements.push(Placement {
                position: CoffeePosition::Interchange,
                added_minutes: 2 * walk_minutes(stop_to_cafe) + prep,
            });
        }
    }

    // destination
    let work_to_cafe = distance(&config.work, cafe);
    if work_to_cafe <= DESTINATION_CAFE_MAX_METRES {
        placements.push(Placement {
            position: CoffeePosition::Destination,
            added_minutes: 2 * walk_minutes(work_to_cafe) + prep,
        });
    }

    placements.retain(|placement| {
        slack_minutes >= i64::from(placement.added_minutes) + SLACK_BUFFER_MINUTES
    });
    if placements.is_empty() {
        return CoffeeDecision::skip(cafe_name, CoffeeReason::NoSlack);
    }

    if let Some((open, close)) = input.cafe_hours {
        if input.now_local < open || input.now_local > close {
            return CoffeeDecision::skip(cafe_name, CoffeeReason::CafeClosed);
        }
    }

    // Fridays earn the treat at the destination end; other days prefer
    // coffee before boarding. Ties break on the smallest detour.
    let friday = input.weekday == Weekday::Fri;
    let preferred = if friday {
        CoffeePosition::Destination
    } else {
        CoffeePosition::Origin
    };
    placements.sort_by_key(|placement| {
        (placement.position != preferred, placement.added_minutes)
    });
    let chosen = &placements[0];

    let reason = if input.has_disruption
        && slack_minutes - i64::from(chosen.added_minutes) >= DISRUPTION_SLACK_MINUTES
    {
        CoffeeReason::ExtraTimeDisruption
    } else if friday && chosen.position == CoffeePosition::Destination {
        CoffeeReason::FridayTreat
    } else {
        CoffeeReason::TimeForCoffee
    };

    CoffeeDecision {
        can_get: true,
        reason,
        position: Some(chosen.position),
        cafe_name: cafe_name.to_owned(),
        duration_minutes: chosen.added_minutes,
        interchange_stop_name: match chosen.position {
            CoffeePosition::Interchange => input
                .interchange
                .as_ref()
                .map(|interchange| interchange.name.to_owned()),
            _ => None,
        },
    }
}

fn distance(a: &Location, b: &Location) -> f64 {
    haversine_metres(a.latitude, a.longitude, b.latitude, b.longitude)
}

fn location_distance(a: &Location, latitude: f64, longitude: f64) -> f64 {
    haversine_metres(a.latitude, a.longitude, latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ApiMode, AuState};
    use std::collections::BTreeMap;

    // offsets chosen so walking distances come out to a few minutes
    fn config(cafe: Option<Location>) -> JourneyConfig {
        JourneyConfig {
            home: Location::new("Home", -37.8000, 144.9600),
            work: Location::new("Work", -37.8150, 144.9650),
            cafe,
            arrival_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            coffee_enabled: true,
            api_mode: ApiMode::Live,
            state: AuState::Vic,
            transit_api_key: None,
            places_api_key: None,
            extensions: BTreeMap::new(),
        }
    }

    fn cafe_next_to_home() -> Location {
        // roughly 160 m from home
        Location::new("Corner Cafe", -37.8014, 144.9605)
    }

    fn input(journey_minutes: u32, now: NaiveTime, weekday: Weekday) -> CoffeeInput<'static> {
        CoffeeInput {
            journey_minutes,
            // first stop ~300 m south of home
            first_stop: (-37.8027, 144.9600),
            interchange: None,
            has_disruption: false,
            now_local: now,
            weekday,
            cafe_hours: None,
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn coffee_at_origin_with_slack() {
        let config = config(Some(cafe_next_to_home()));
        let decision = place(&config, &input(35, at(7, 10), Weekday::Tue));
        assert!(decision.can_get);
        assert_eq!(decision.position, Some(CoffeePosition::Origin));
        assert_eq!(decision.reason, CoffeeReason::TimeForCoffee);
        assert!(decision.duration_minutes >= DEFAULT_PREP_MINUTES);
    }

    #[test]
    fn running_late_skips_before_anything_else() {
        let config = config(Some(cafe_next_to_home()));
        // 25 minute journey with 20 minutes on the clock
        let decision = place(&config, &input(25, at(8, 40), Weekday::Tue));
        assert!(!decision.can_get);
        assert_eq!(decision.reason, CoffeeReason::SkipRunningLate);
    }

    #[test]
    fn tight_slack_is_no_slack() {
        let config = config(Some(cafe_next_to_home()));
        // slack of 3 minutes cannot cover detour + prep + buffer
        let decision = place(&config, &input(107, at(7, 10), Weekday::Tue));
        assert!(!decision.can_get);
        assert_eq!(decision.reason, CoffeeReason::NoSlack);
    }

    #[test]
    fn friday_prefers_the_destination() {
        let mut config = config(None);
        // cafe around the corner from work
        config.cafe = Some(Location::new("Work Cafe", -37.8152, 144.9670));
        let decision = place(&config, &input(35, at(7, 10), Weekday::Fri));
        assert!(decision.can_get);
        assert_eq!(decision.position, Some(CoffeePosition::Destination));
        assert_eq!(decision.reason, CoffeeReason::FridayTreat);
    }

    #[test]
    fn closed_cafe_is_reported() {
        let config = config(Some(cafe_next_to_home()));
        let mut input = input(35, at(7, 10), Weekday::Tue);
        input.cafe_hours = Some((at(8, 0), at(16, 0)));
        let decision = place(&config, &input);
        assert!(!decision.can_get);
        assert_eq!(decision.reason, CoffeeReason::CafeClosed);
    }

    #[test]
    fn disruption_grants_extra_time_reason() {
        let config = config(Some(cafe_next_to_home()));
        let mut input = input(35, at(7, 10), Weekday::Tue);
        input.has_disruption = true;
        let decision = place(&config, &input);
        assert!(decision.can_get);
        assert_eq!(decision.reason, CoffeeReason::ExtraTimeDisruption);
    }

    #[test]
    fn interchange_placement_when_cafe_sits_at_the_station() {
        let mut config = config(None);
        config.cafe = Some(Location::new("Platform Cafe", -37.8100, 144.9700));
        let mut input = input(35, at(7, 10), Weekday::Tue);
        input.interchange = Some(InterchangeStop {
            name: "Richmond",
            latitude: -37.8101,
            longitude: 144.9702,
        });
        let decision = place(&config, &input);
        assert!(decision.can_get);
        assert_eq!(decision.position, Some(CoffeePosition::Interchange));
        assert_eq!(decision.interchange_stop_name.as_deref(), Some("Richmond"));
    }
}
