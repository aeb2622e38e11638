use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use model::{
    AlertEffect, CoffeePosition, DataSource, Departure, Journey, JourneyConfig, Leg,
    ModeType, ServiceAlert, Stop,
};
use utility::geo::{haversine_metres, walk_minutes};

use crate::{
    coffee::{self, CoffeeInput, InterchangeStop},
    graph::StopGraph,
    DepartureProvider,
};

pub struct PlanDefaults {
    pub max_walk_metres: f64,
    pub max_interchange_metres: f64,
    pub max_transit_legs: usize,
    /// How many nearby stops to consider on each side.
    pub max_stops_per_side: usize,
    /// How many candidates get live data before scoring.
    pub max_candidates: usize,
}

impl Default for PlanDefaults {
    fn default() -> Self {
        Self {
            max_walk_metres: 800.0,
            max_interchange_metres: 600.0,
            max_transit_legs: 2,
            max_stops_per_side: 5,
            max_candidates: 6,
        }
    }
}

/// The route and decision engine. Holds the read-only stop graph; all
/// per-request state lives on the stack of [`plan_journey`].
pub struct Engine {
    graph: StopGraph,
    defaults: PlanDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RideSpec {
    route: usize,
    from: usize,
    to: usize,
}

#[derive(Debug, Clone)]
struct Candidate {
    rides: Vec<RideSpec>,
    origin_walk_metres: f64,
    dest_walk_metres: f64,
}

impl Candidate {
    /// Cheap ranking before live data is spent on a candidate: walking,
    /// crow-flies riding and a transfer penalty.
    fn pre_score(&self, graph: &StopGraph) -> f64 {
        let walk = walk_minutes(self.origin_walk_metres)
            + walk_minutes(self.dest_walk_metres);
        let ride_metres: f64 = self
            .rides
            .iter()
            .map(|ride| graph.distance_metres(ride.from, ride.to))
            .sum();
        f64::from(walk) + ride_metres / 600.0 + 5.0 * (self.rides.len() as f64 - 1.0)
    }
}

struct PopulatedCandidate {
    legs: Vec<Leg>,
    walk_minutes: u32,
    transfer_count: u32,
    reliability_penalty: f64,
    all_live: bool,
    first_stop: usize,
    interchange: Option<usize>,
    disruption_header: Option<String>,
    first_departure: DateTime<Utc>,
}

impl PopulatedCandidate {
    fn total_minutes(&self) -> u32 {
        let base: u32 = self.legs.iter().map(|leg| leg.minutes()).sum();
        let delay: u32 = self.legs.iter().map(|leg| leg.delay_minutes()).sum();
        base + delay
    }

    fn score(&self) -> f64 {
        0.40 * f64::from(self.total_minutes())
            + 0.25 * (5.0 * f64::from(self.transfer_count))
            + 0.20 * f64::from(self.walk_minutes)
            + 0.15 * self.reliability_penalty
    }
}

impl Engine {
    pub fn new(graph: StopGraph, defaults: PlanDefaults) -> Self {
        Self { graph, defaults }
    }

    pub fn graph(&self) -> &StopGraph {
        &self.graph
    }

    /// Builds the journey for this configuration and instant. Never
    /// errors: any dead end degrades to the walking fallback journey.
    pub async fn plan_journey(
        &self,
        config: &JourneyConfig,
        now: DateTime<Utc>,
        provider: &dyn DepartureProvider,
    ) -> Journey {
        let timezone = config.state.timezone();
        let now_local = now.with_timezone(&timezone);

        let origins = self.truncate(self.graph.stops_near(
            config.home.latitude,
            config.home.longitude,
            self.defaults.max_walk_metres,
        ));
        let destinations = self.truncate(self.graph.stops_near(
            config.work.latitude,
            config.work.longitude,
            self.defaults.max_walk_metres,
        ));

        if origins.is_empty() || destinations.is_empty() {
            return self.walking_fallback(config, now_local.time());
        }

        let mut candidates = self.enumerate_candidates(&origins, &destinations);
        if candidates.is_empty() {
            return self.walking_fallback(config, now_local.time());
        }
        candidates.sort_by(|a, b| {
            a.pre_score(&self.graph).total_cmp(&b.pre_score(&self.graph))
        });
        candidates.truncate(self.defaults.max_candidates);

        // warm every feed the candidates will read, concurrently; the
        // data layer singleflights per key so this is one fetch each
        let mut prefetch: Vec<(String, ModeType)> = Vec::new();
        for candidate in &candidates {
            for ride in &candidate.rides {
                let stop_id = self.graph.stop(ride.from).id.clone();
                let mode = self.graph.route(ride.route).mode;
                if !prefetch.iter().any(|(id, m)| *id == stop_id && *m == mode) {
                    prefetch.push((stop_id, mode));
                }
            }
        }
        futures::future::join_all(
            prefetch
                .iter()
                .map(|(stop_id, mode)| provider.departures(stop_id, *mode, now)),
        )
        .await;

        let mut populated = Vec::new();
        for candidate in &candidates {
            if let Some(result) = self.populate(candidate, now, provider).await {
                populated.push(result);
            }
        }
        if populated.is_empty() {
            return self.walking_fallback(config, now_local.time());
        }

        populated.sort_by(|a, b| {
            a.score()
                .total_cmp(&b.score())
                .then(a.transfer_count.cmp(&b.transfer_count))
                .then(a.walk_minutes.cmp(&b.walk_minutes))
                .then(a.first_departure.cmp(&b.first_departure))
        });
        let mut best = populated.remove(0);

        if config.coffee_enabled && config.cafe.is_some() {
            self.insert_coffee(&mut best, config, now_local);
        }

        let total = best.total_minutes();
        let arrival = now_local.time() + chrono::Duration::minutes(i64::from(total));
        let data_source = if best.all_live {
            DataSource::Live
        } else {
            DataSource::FallbackTimetable
        };

        Journey::from_legs(
            best.legs,
            arrival,
            now_local.time(),
            data_source,
            best.disruption_header,
        )
    }

    fn truncate(&self, mut stops: Vec<(usize, f64)>) -> Vec<(usize, f64)> {
        stops.truncate(self.defaults.max_stops_per_side);
        stops
    }

    /// All valid candidate shapes between the two stop sets: direct rides
    /// and one-interchange pairs within the interchange walk limit.
    fn enumerate_candidates(
        &self,
        origins: &[(usize, f64)],
        destinations: &[(usize, f64)],
    ) -> Vec<Candidate> {
        let graph = &self.graph;
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        // direct rides
        for (origin, origin_metres) in origins {
            for (destination, dest_metres) in destinations {
                for route in &graph.stop(*origin).routes {
                    if graph.serves_in_order(*route, *origin, *destination)
                        && seen.insert(vec![(*route, *origin, *destination)])
                    {
                        candidates.push(Candidate {
                            rides: vec![RideSpec {
                                route: *route,
                                from: *origin,
                                to: *destination,
                            }],
                            origin_walk_metres: *origin_metres,
                            dest_walk_metres: *dest_metres,
                        });
                    }
                }
            }
        }

        if self.defaults.max_transit_legs < 2 {
            return candidates;
        }

        // one interchange: join the origin side's reachable stops with the
        // destination side's feeder stops at any walkable pair
        for (origin, origin_metres) in origins {
            for first_route in &graph.stop(*origin).routes {
                for alight in graph.downstream_of(*first_route, *origin) {
                    for (destination, dest_metres) in destinations {
                        for second_route in &graph.stop(*destination).routes {
                            if second_route == first_route {
                                continue;
                            }
                            // feeder stops: anything serving the second
                            // route ahead of the destination
                            let feeders: Vec<usize> = graph
                                .route(*second_route)
                                .patterns
                                .iter()
                                .flat_map(|pattern| {
                                    let cut = pattern
                                        .iter()
                                        .position(|stop| stop == destination);
                                    match cut {
                                        Some(cut) => pattern[..cut].to_vec(),
                                        None => Vec::new(),
                                    }
                                })
                                .collect();
                            for board in feeders {
                                if graph.interchange_metres(alight, board)
                                    > self.defaults.max_interchange_metres
                                {
                                    continue;
                                }
                                let signature = vec![
                                    (*first_route, *origin, alight),
                                    (*second_route, board, *destination),
                                ];
                                if !seen.insert(signature) {
                                    continue;
                                }
                                candidates.push(Candidate {
                                    rides: vec![
                                        RideSpec {
                                            route: *first_route,
                                            from: *origin,
                                            to: alight,
                                        },
                                        RideSpec {
                                            route: *second_route,
                                            from: board,
                                            to: *destination,
                                        },
                                    ],
                                    origin_walk_metres: *origin_metres,
                                    dest_walk_metres: *dest_metres,
                                });
                            }
                        }
                    }
                }
            }
        }

        candidates
    }

    /// Attaches live departures, delays and alerts to a candidate. `None`
    /// when no viable departure exists for one of its rides.
    async fn populate(
        &self,
        candidate: &Candidate,
        now: DateTime<Utc>,
        provider: &dyn DepartureProvider,
    ) -> Option<PopulatedCandidate> {
        let graph = &self.graph;
        let mut legs = Vec::new();
        let mut elapsed_minutes: u32 = 0;
        let mut walk_total: u32 = 0;
        let mut all_live = true;
        let mut reliability = 0.0;
        let mut disruption_header = None;
        let mut first_departure = None;

        let first_stop_name = graph.stop(candidate.rides[0].from).name.clone();
        let origin_walk = walk_minutes(candidate.origin_walk_metres);
        legs.push(Leg::Walk {
            from_label: "Home".to_owned(),
            to_label: first_stop_name,
            minutes: origin_walk,
            is_first: true,
            is_last: false,
        });
        elapsed_minutes += origin_walk;
        walk_total += origin_walk;

        for (index, ride) in candidate.rides.iter().enumerate() {
            let route = graph.route(ride.route);
            let origin = graph.stop(ride.from);
            let destination = graph.stop(ride.to);
            let mode = route.mode;

            let departures = provider.departures(&origin.id, mode, now).await;
            let viable: Vec<&Departure> = departures
                .iter()
                .filter(|departure| {
                    departure.route_id == route.id
                        && departure.predicted_time
                            >= now
                                + chrono::Duration::minutes(i64::from(
                                    elapsed_minutes,
                                ))
                })
                .collect();
            let chosen = *viable.first()?;
            first_departure.get_or_insert(chosen.predicted_time);

            let ride_minutes = match provider
                .ride_minutes(
                    chosen.trip_id.as_deref(),
                    &route.id,
                    &origin.id,
                    &destination.id,
                    mode,
                    now,
                )
                .await
            {
                Some(minutes) => minutes,
                None => estimate_ride_minutes(
                    graph.distance_metres(ride.from, ride.to),
                    mode,
                ),
            };

            let alerts = provider.alerts(mode, now).await;
            let relevant: Vec<&ServiceAlert> = alerts
                .iter()
                .filter(|alert| alert.affects_route(&route.id))
                .collect();
            let is_suspended = relevant
                .iter()
                .any(|alert| alert.effect == Some(AlertEffect::NoService));
            let is_diverted = relevant
                .iter()
                .any(|alert| alert.effect == Some(AlertEffect::Detour));
            let replacement_mode = (is_suspended
                && relevant.iter().any(|alert| {
                    alert.header_text.to_lowercase().contains("bus")
                }))
            .then_some(ModeType::Bus);
            if is_suspended || is_diverted {
                if let Some(alert) = relevant.first() {
                    disruption_header.get_or_insert(alert.header_text.clone());
                }
            }

            let delay_minutes = chosen.delay_minutes();
            reliability += if chosen.is_live {
                f64::from(delay_minutes)
            } else {
                0.0
            };
            if is_suspended || replacement_mode.is_some() {
                reliability += 10.0;
            }
            all_live &= chosen.is_live;

            let next_departures: Vec<u32> = viable
                .iter()
                .skip(1)
                .take(2)
                .map(|departure| departure.minutes_until)
                .collect();

            legs.push(Leg::Transit {
                mode,
                route_id: route.id.clone(),
                line_name: chosen.line_name.clone(),
                origin: graph_stop_to_model(origin, mode, &route.id, index > 0),
                destination: graph_stop_to_model(
                    destination,
                    mode,
                    &route.id,
                    index + 1 < candidate.rides.len(),
                ),
                departure_minutes: chosen.minutes_until,
                scheduled_departure: chosen.scheduled_time,
                ride_minutes,
                delay_minutes,
                is_delayed: delay_minutes >= 1,
                is_suspended,
                is_diverted,
                is_express: chosen.is_express,
                next_departures,
                replacement_mode,
            });
            elapsed_minutes = chosen.minutes_until + ride_minutes;

            if let Some(next) = candidate.rides.get(index + 1) {
                let metres = graph.interchange_metres(ride.to, next.from);
                let minutes = walk_minutes(metres).max(1);
                legs.push(Leg::Walk {
                    from_label: destination.name.clone(),
                    to_label: graph.stop(next.from).name.clone(),
                    minutes,
                    is_first: false,
                    is_last: false,
                });
                elapsed_minutes += minutes;
                walk_total += minutes;
            }
        }

        let last_stop = candidate.rides.last().expect("ride exists").to;
        let dest_walk = walk_minutes(candidate.dest_walk_metres);
        legs.push(Leg::Walk {
            from_label: graph.stop(last_stop).name.clone(),
            to_label: "Work".to_owned(),
            minutes: dest_walk,
            is_first: false,
            is_last: true,
        });
        walk_total += dest_walk;

        Some(PopulatedCandidate {
            legs,
            walk_minutes: walk_total,
            transfer_count: candidate.rides.len() as u32 - 1,
            reliability_penalty: reliability,
            all_live,
            first_stop: candidate.rides[0].from,
            interchange: candidate.rides.get(1).map(|ride| ride.from),
            disruption_header,
            first_departure: first_departure
                .expect("at least one transit leg was populated"),
        })
    }

    fn insert_coffee(
        &self,
        best: &mut PopulatedCandidate,
        config: &JourneyConfig,
        now_local: DateTime<chrono_tz::Tz>,
    ) {
        let first = self.graph.stop(best.first_stop);
        let interchange_stop = best.interchange.map(|index| self.graph.stop(index));
        let input = CoffeeInput {
            journey_minutes: best.total_minutes(),
            first_stop: (first.latitude, first.longitude),
            interchange: interchange_stop.map(|stop| InterchangeStop {
                name: &stop.name,
                latitude: stop.latitude,
                longitude: stop.longitude,
            }),
            has_disruption: best.disruption_header.is_some(),
            now_local: now_local.time(),
            weekday: now_local.weekday(),
            cafe_hours: None,
        };
        let decision = coffee::place(config, &input);
        log::debug!(
            "coffee decision: can_get={} reason={:?} position={:?}",
            decision.can_get,
            decision.reason,
            decision.position
        );
        if !decision.can_get {
            return;
        }
        let cafe = config.cafe.as_ref().expect("coffee requires a cafe");
        let prep = coffee::DEFAULT_PREP_MINUTES;

        match decision.position.expect("placed coffee has a position") {
            CoffeePosition::Origin => {
                // the direct walk becomes walk-coffee-walk via the cafe
                let walk_to_cafe = walk_minutes(haversine_metres(
                    config.home.latitude,
                    config.home.longitude,
                    cafe.latitude,
                    cafe.longitude,
                ));
                let walk_to_stop = walk_minutes(haversine_metres(
                    cafe.latitude,
                    cafe.longitude,
                    first.latitude,
                    first.longitude,
                ));
                let direct_walk = walk_minutes_of_first_walk(&best.legs);
                let replacement = vec![
                    Leg::Walk {
                        from_label: "Home".to_owned(),
                        to_label: decision.cafe_name.clone(),
                        minutes: walk_to_cafe,
                        is_first: true,
                        is_last: false,
                    },
                    Leg::Coffee {
                        cafe_name: decision.cafe_name.clone(),
                        duration_minutes: prep,
                        can_get: true,
                        position: CoffeePosition::Origin,
                        reason: decision.reason,
                        interchange_stop_name: None,
                    },
                    Leg::Walk {
                        from_label: decision.cafe_name.clone(),
                        to_label: first.name.clone(),
                        minutes: walk_to_stop,
                        is_first: false,
                        is_last: false,
                    },
                ];
                best.legs.splice(0..1, replacement);
                best.walk_minutes = (best.walk_minutes + walk_to_cafe + walk_to_stop)
                    .saturating_sub(direct_walk);
            }
            CoffeePosition::Interchange => {
                // after the first transit leg, before the interchange walk
                let at = best
                    .legs
                    .iter()
                    .position(|leg| leg.is_transit())
                    .map(|index| index + 1)
                    .unwrap_or(best.legs.len());
                best.legs.insert(
                    at,
                    Leg::Coffee {
                        cafe_name: decision.cafe_name.clone(),
                        duration_minutes: decision.duration_minutes,
                        can_get: true,
                        position: CoffeePosition::Interchange,
                        reason: decision.reason,
                        interchange_stop_name: decision.interchange_stop_name.clone(),
                    },
                );
            }
            CoffeePosition::Destination => {
                let last_stop_name = best
                    .legs
                    .iter()
                    .rev()
                    .find_map(|leg| match leg {
                        Leg::Transit { destination, .. } => {
                            Some(destination.name.clone())
                        }
                        _ => None,
                    })
                    .unwrap_or_else(|| "Station".to_owned());
                let walk_to_cafe = walk_minutes(haversine_metres(
                    config.work.latitude,
                    config.work.longitude,
                    cafe.latitude,
                    cafe.longitude,
                ));
                let replacement = vec![
                    Leg::Walk {
                        from_label: last_stop_name,
                        to_label: decision.cafe_name.clone(),
                        minutes: walk_to_cafe.max(1),
                        is_first: false,
                        is_last: false,
                    },
                    Leg::Coffee {
                        cafe_name: decision.cafe_name.clone(),
                        duration_minutes: prep,
                        can_get: true,
                        position: CoffeePosition::Destination,
                        reason: decision.reason,
                        interchange_stop_name: None,
                    },
                    Leg::Walk {
                        from_label: decision.cafe_name.clone(),
                        to_label: "Work".to_owned(),
                        minutes: walk_to_cafe.max(1),
                        is_first: false,
                        is_last: true,
                    },
                ];
                let last = best.legs.len() - 1;
                best.legs.splice(last..last + 1, replacement);
            }
        }
    }

    /// When nothing is reachable the journey is a single walk at the
    /// standard pace over the great-circle distance.
    fn walking_fallback(
        &self,
        config: &JourneyConfig,
        now_local: chrono::NaiveTime,
    ) -> Journey {
        let metres = haversine_metres(
            config.home.latitude,
            config.home.longitude,
            config.work.latitude,
            config.work.longitude,
        );
        let minutes = walk_minutes(metres).max(1);
        let legs = vec![Leg::Walk {
            from_label: "Home".to_owned(),
            to_label: "Work".to_owned(),
            minutes,
            is_first: true,
            is_last: true,
        }];
        let arrival = now_local + chrono::Duration::minutes(i64::from(minutes));
        Journey::from_legs(
            legs,
            arrival,
            now_local,
            DataSource::FallbackTimetable,
            Some("No services found".to_owned()),
        )
    }
}

fn walk_minutes_of_first_walk(legs: &[Leg]) -> u32 {
    match legs.first() {
        Some(Leg::Walk { minutes, .. }) => *minutes,
        _ => 0,
    }
}

fn graph_stop_to_model(
    stop: &crate::graph::GraphStop,
    mode: ModeType,
    route_id: &str,
    is_interchange: bool,
) -> Stop {
    Stop {
        id: stop.id.clone(),
        name: stop.name.clone(),
        mode,
        latitude: stop.latitude,
        longitude: stop.longitude,
        route_id: Some(route_id.to_owned()),
        is_interchange: is_interchange.then_some(true),
    }
}

fn estimate_ride_minutes(metres: f64, mode: ModeType) -> u32 {
    let metres_per_minute = match mode {
        ModeType::Train | ModeType::VLine => 800.0,
        ModeType::LightRail => 500.0,
        ModeType::Tram => 350.0,
        ModeType::Bus | ModeType::Ferry => 400.0,
    };
    ((metres / metres_per_minute).ceil() as u32).max(1)
}
