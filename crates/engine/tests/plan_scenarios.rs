//! End-to-end planning scenarios against a scripted departure provider.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use engine::{DepartureProvider, Engine, PlanDefaults, StopGraph};
use gtfs::data_model::{
    calendar::{CalendarRow, ServiceAvailability},
    routes::{RouteRow, RouteType},
    stop_times::StopTimeRow,
    stops::StopRow,
    trips::TripRow,
    GtfsTime,
};
use gtfs::schedule::Schedule;
use model::{
    AlertEffect, AlertSeverity, ApiMode, AuState, DataSource, Departure, JourneyConfig,
    Leg, Location, ModeType, ServiceAlert, StatusKind,
};

const TRAM_ROUTE: &str = "vic-3-96";
const TRAIN_ROUTE: &str = "vic-2-BEG";

/// 07:10 Tuesday 2026-02-03 in Melbourne (AEDT), expressed in UTC.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 2, 20, 10, 0).unwrap()
}

fn stop(id: &str, name: &str, lat: f64, lon: f64) -> StopRow {
    StopRow {
        stop_id: id.to_owned(),
        stop_name: name.to_owned(),
        stop_lat: lat,
        stop_lon: lon,
        parent_station: None,
        platform_code: None,
    }
}

fn schedule() -> Schedule {
    let stops = vec![
        stop("t1", "Brunswick Rd", -37.8026, 144.9600),
        stop("t2", "Richmond Tram", -37.8230, 144.9900),
        stop("r1", "Richmond", -37.8239, 144.9900),
        stop("12204", "Flinders Street", -37.8183, 144.9671),
    ];
    let routes = vec![
        RouteRow {
            route_id: TRAM_ROUTE.to_owned(),
            agency_id: None,
            route_short_name: Some("Route 96".to_owned()),
            route_long_name: None,
            route_type: RouteType::Tram,
        },
        RouteRow {
            route_id: TRAIN_ROUTE.to_owned(),
            agency_id: None,
            route_short_name: Some("Belgrave".to_owned()),
            route_long_name: None,
            route_type: RouteType::Rail,
        },
    ];
    let trips = vec![
        TripRow {
            route_id: TRAM_ROUTE.to_owned(),
            service_id: "daily".to_owned(),
            trip_id: "tram-1".to_owned(),
            trip_headsign: None,
            direction_id: Some(0),
        },
        TripRow {
            route_id: TRAIN_ROUTE.to_owned(),
            service_id: "daily".to_owned(),
            trip_id: "train-1".to_owned(),
            trip_headsign: None,
            direction_id: Some(0),
        },
    ];
    let stop_time = |trip: &str, stop: &str, seq: u32, h: u32, m: u32| StopTimeRow {
        trip_id: trip.to_owned(),
        arrival_time: Some(GtfsTime::from_hms(h, m, 0)),
        departure_time: Some(GtfsTime::from_hms(h, m, 0)),
        stop_id: stop.to_owned(),
        stop_sequence: seq,
    };
    let calendar = CalendarRow {
        service_id: "daily".to_owned(),
        monday: ServiceAvailability::Available,
        tuesday: ServiceAvailability::Available,
        wednesday: ServiceAvailability::Available,
        thursday: ServiceAvailability::Available,
        friday: ServiceAvailability::Available,
        saturday: ServiceAvailability::Available,
        sunday: ServiceAvailability::Available,
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
    };
    Schedule::from_tables(
        stops,
        routes,
        trips,
        vec![
            stop_time("tram-1", "t1", 1, 7, 15),
            stop_time("tram-1", "t2", 2, 7, 23),
            stop_time("train-1", "r1", 1, 7, 25),
            stop_time("train-1", "12204", 2, 7, 37),
        ],
        Some(vec![calendar]),
        Vec::new(),
    )
}

fn engine() -> Engine {
    let schedule = schedule();
    let graph = StopGraph::from_schedule(&schedule, |_| None);
    Engine::new(graph, PlanDefaults::default())
}

fn config(coffee: bool) -> JourneyConfig {
    JourneyConfig {
        home: Location::new("Home", -37.8000, 144.9600),
        // work is a short walk from Flinders Street
        work: Location::new("Work", -37.8183, 144.9711),
        cafe: Some(Location::new("Corner Cafe", -37.8000, 144.9623)),
        arrival_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        coffee_enabled: coffee,
        api_mode: ApiMode::Live,
        state: AuState::Vic,
        transit_api_key: None,
        places_api_key: None,
        extensions: BTreeMap::new(),
    }
}

fn departure(
    stop_id: &str,
    route_id: &str,
    mode: ModeType,
    minutes_from_now: i64,
    delay_seconds: i64,
    trip_id: &str,
) -> Departure {
    let predicted = now() + chrono::Duration::minutes(minutes_from_now);
    Departure {
        stop_id: stop_id.to_owned(),
        route_id: route_id.to_owned(),
        line_name: if mode == ModeType::Tram {
            "Route 96".to_owned()
        } else {
            "Belgrave".to_owned()
        },
        mode,
        scheduled_time: predicted - chrono::Duration::seconds(delay_seconds),
        predicted_time: predicted,
        delay_seconds,
        minutes_until: minutes_from_now.max(0) as u32,
        destination_display: "City Loop".to_owned(),
        is_citybound: true,
        is_live: true,
        is_express: false,
        platform: None,
        trip_id: Some(trip_id.to_owned()),
        terminus_stop_id: "12204".to_owned(),
    }
}

#[derive(Default)]
struct ScriptedProvider {
    departures: HashMap<String, Vec<Departure>>,
    rides: HashMap<(String, String, String), u32>,
    alerts: Vec<ServiceAlert>,
}

impl ScriptedProvider {
    fn happy_path(tram_delay: i64, train_delay: i64) -> Self {
        let mut provider = Self::default();
        provider.departures.insert(
            "t1".to_owned(),
            vec![
                departure("t1", TRAM_ROUTE, ModeType::Tram, 5, tram_delay, "tram-1"),
                departure("t1", TRAM_ROUTE, ModeType::Tram, 17, 0, "tram-2"),
                departure("t1", TRAM_ROUTE, ModeType::Tram, 29, 0, "tram-3"),
            ],
        );
        provider.departures.insert(
            "r1".to_owned(),
            vec![
                departure("r1", TRAIN_ROUTE, ModeType::Train, 16, train_delay, "train-1"),
                departure("r1", TRAIN_ROUTE, ModeType::Train, 26, 0, "train-2"),
            ],
        );
        provider.rides.insert(
            (TRAM_ROUTE.to_owned(), "t1".to_owned(), "t2".to_owned()),
            8,
        );
        provider.rides.insert(
            (TRAIN_ROUTE.to_owned(), "r1".to_owned(), "12204".to_owned()),
            12,
        );
        provider
    }
}

#[async_trait]
impl DepartureProvider for ScriptedProvider {
    async fn departures(
        &self,
        stop_id: &str,
        _mode: ModeType,
        _now: DateTime<Utc>,
    ) -> Vec<Departure> {
        self.departures.get(stop_id).cloned().unwrap_or_default()
    }

    async fn alerts(&self, _mode: ModeType, _now: DateTime<Utc>) -> Vec<ServiceAlert> {
        self.alerts.clone()
    }

    async fn ride_minutes(
        &self,
        _trip_id: Option<&str>,
        route_id: &str,
        from_stop_id: &str,
        to_stop_id: &str,
        _mode: ModeType,
        _now: DateTime<Utc>,
    ) -> Option<u32> {
        self.rides
            .get(&(
                route_id.to_owned(),
                from_stop_id.to_owned(),
                to_stop_id.to_owned(),
            ))
            .copied()
    }
}

fn leg_kinds(journey: &model::Journey) -> Vec<&'static str> {
    journey
        .legs
        .iter()
        .map(|leg| match leg {
            Leg::Walk { .. } => "walk",
            Leg::Transit { mode, .. } => match mode {
                ModeType::Tram => "tram",
                ModeType::Train => "train",
                _ => "transit",
            },
            Leg::Coffee { .. } => "coffee",
        })
        .collect()
}

#[tokio::test]
async fn happy_path_with_coffee_at_origin() {
    let engine = engine();
    let provider = ScriptedProvider::happy_path(0, 0);
    let journey = engine.plan_journey(&config(true), now(), &provider).await;

    assert_eq!(
        leg_kinds(&journey),
        vec!["walk", "coffee", "walk", "tram", "walk", "train", "walk"],
    );
    assert_eq!(journey.status, StatusKind::LeaveNow);
    assert_eq!(journey.status_message(), "LEAVE NOW");
    assert_eq!(journey.cumulative_delay_minutes, 0);
    assert_eq!(journey.data_source, DataSource::Live);

    // sum invariants hold
    let leg_sum: u32 = journey.legs.iter().map(|leg| leg.minutes()).sum();
    assert_eq!(
        leg_sum + journey.cumulative_delay_minutes,
        journey.total_minutes
    );
    assert_eq!(
        journey.arrival_time_local - journey.leave_by_time_local,
        chrono::Duration::minutes(i64::from(journey.total_minutes))
    );
    // leaving now means the leave-by clock reads "now"
    assert_eq!(
        journey.leave_by_time_local,
        chrono::NaiveTime::from_hms_opt(7, 10, 0).unwrap()
    );
}

#[tokio::test]
async fn one_delayed_leg_reads_delay() {
    let engine = engine();
    let provider = ScriptedProvider::happy_path(0, 420);
    let journey = engine.plan_journey(&config(false), now(), &provider).await;

    assert_eq!(journey.status, StatusKind::Delay);
    assert_eq!(journey.cumulative_delay_minutes, 7);
    let message = journey.status_message();
    assert!(message.starts_with("DELAY \u{2192} Arrive "), "{message}");
    assert!(message.ends_with("(+7 min)"), "{message}");

    let delayed: Vec<&Leg> = journey.legs.iter().filter(|leg| leg.is_delayed()).collect();
    assert_eq!(delayed.len(), 1);
}

#[tokio::test]
async fn two_delayed_legs_read_delays() {
    let engine = engine();
    let provider = ScriptedProvider::happy_path(120, 240);
    let journey = engine.plan_journey(&config(false), now(), &provider).await;

    assert_eq!(journey.status, StatusKind::Delays);
    assert_eq!(journey.cumulative_delay_minutes, 6);
    let message = journey.status_message();
    assert!(message.starts_with("DELAYS \u{2192} Arrive "), "{message}");
    assert!(message.ends_with("(+6 min)"), "{message}");
}

#[tokio::test]
async fn running_late_skips_coffee() {
    let engine = engine();
    let provider = ScriptedProvider::happy_path(0, 0);
    let mut config = config(true);
    // target arrival only twenty minutes out
    config.arrival_time = chrono::NaiveTime::from_hms_opt(7, 30, 0).unwrap();
    let journey = engine.plan_journey(&config, now(), &provider).await;

    assert!(journey
        .legs
        .iter()
        .all(|leg| !matches!(leg, Leg::Coffee { .. })));
    assert_eq!(journey.status, StatusKind::LeaveNow);
}

#[tokio::test]
async fn suspended_route_reads_disruption() {
    let engine = engine();
    let mut provider = ScriptedProvider::happy_path(0, 0);
    provider.alerts = vec![ServiceAlert {
        alert_id: "a1".to_owned(),
        route_ids: vec![TRAIN_ROUTE.to_owned()],
        stop_ids: vec![],
        severity: AlertSeverity::Disruption,
        effect_from: Some(now() - chrono::Duration::hours(1)),
        effect_to: Some(now() + chrono::Duration::hours(4)),
        header_text: "Buses replace trains between Richmond and the city".to_owned(),
        description_text: None,
        mode: ModeType::Train,
        effect: Some(AlertEffect::NoService),
    }];
    let journey = engine.plan_journey(&config(false), now(), &provider).await;

    assert_eq!(journey.status, StatusKind::Disruption);
    assert!(journey
        .legs
        .iter()
        .any(|leg| leg.is_suspended()));
    let message = journey.status_message();
    assert!(message.starts_with("DISRUPTION \u{2192} "), "{message}");
    // the suspended train is flagged for bus replacement
    assert!(journey.legs.iter().any(|leg| matches!(
        leg,
        Leg::Transit {
            replacement_mode: Some(ModeType::Bus),
            ..
        }
    )));
}

#[tokio::test]
async fn no_reachable_stops_walks_the_whole_way() {
    let engine = engine();
    let provider = ScriptedProvider::default();
    let mut config = config(false);
    // somewhere on the Nullarbor, nowhere near the graph
    config.home = Location::new("Remote", -31.0, 129.0);
    config.work = Location::new("Also remote", -31.1, 129.1);
    let journey = engine.plan_journey(&config, now(), &provider).await;

    assert_eq!(journey.status, StatusKind::Disruption);
    assert_eq!(journey.disruption_text.as_deref(), Some("No services found"));
    assert_eq!(journey.legs.len(), 1);
    assert!(matches!(journey.legs[0], Leg::Walk { .. }));
    assert_eq!(journey.data_source, DataSource::FallbackTimetable);
}

#[tokio::test]
async fn status_text_never_says_leave_in() {
    let engine = engine();
    for (tram_delay, train_delay) in [(0, 0), (0, 420), (120, 240)] {
        let provider = ScriptedProvider::happy_path(tram_delay, train_delay);
        let journey = engine.plan_journey(&config(true), now(), &provider).await;
        assert!(!journey.status_message().contains("LEAVE IN"));
    }
}

#[tokio::test]
async fn next_departures_are_captured() {
    let engine = engine();
    let provider = ScriptedProvider::happy_path(0, 0);
    let journey = engine.plan_journey(&config(false), now(), &provider).await;

    let tram = journey
        .legs
        .iter()
        .find_map(|leg| match leg {
            Leg::Transit {
                mode: ModeType::Tram,
                next_departures,
                ..
            } => Some(next_departures.clone()),
            _ => None,
        })
        .expect("tram leg exists");
    assert_eq!(tram, vec![17, 29]);
}
