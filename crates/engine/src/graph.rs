use std::collections::HashMap;

use gtfs::schedule::Schedule;
use model::ModeType;
use utility::geo;

/// A stop in the arena. Routes are adjacency indices, never owned data.
#[derive(Debug, Clone)]
pub struct GraphStop {
    pub id: String,
    pub name: String,
    pub mode: ModeType,
    pub latitude: f64,
    pub longitude: f64,
    pub routes: Vec<usize>,
}

/// A route with its representative stop sequences (one per direction).
#[derive(Debug, Clone)]
pub struct GraphRoute {
    pub id: String,
    pub mode: ModeType,
    pub patterns: Vec<Vec<usize>>,
}

/// The in-memory stop/route graph the planner searches. Built once from
/// the static schedule; routes are discovered per call from adjacency,
/// never hardcoded.
pub struct StopGraph {
    stops: Vec<GraphStop>,
    routes: Vec<GraphRoute>,
    /// Extra interchange walks from the transfers table, in metres.
    transfers: Vec<(usize, usize, f64)>,
}

impl StopGraph {
    /// Builds the graph, resolving each route's mode through the supplied
    /// resolver (the authority refines what the bundle's route types
    /// cannot distinguish).
    pub fn from_schedule(
        schedule: &Schedule,
        mode_of: impl Fn(&str) -> Option<ModeType>,
    ) -> Self {
        let mut stops: Vec<GraphStop> = Vec::with_capacity(schedule.stop_count());
        let mut stop_index = HashMap::with_capacity(schedule.stop_count());

        let mut route_index: HashMap<String, usize> = HashMap::new();
        let mut routes: Vec<GraphRoute> = Vec::new();

        for pattern in schedule.patterns() {
            let mode = match mode_of(&pattern.route_id)
                .or_else(|| schedule.mode_of_route(&pattern.route_id))
            {
                Some(mode) => mode,
                None => continue,
            };

            let route_idx = *route_index
                .entry(pattern.route_id.clone())
                .or_insert_with(|| {
                    routes.push(GraphRoute {
                        id: pattern.route_id.clone(),
                        mode,
                        patterns: Vec::new(),
                    });
                    routes.len() - 1
                });

            let mut stop_indices = Vec::with_capacity(pattern.stop_ids.len());
            for stop_id in &pattern.stop_ids {
                let Some(row) = schedule.stop(stop_id) else {
                    continue;
                };
                let stop_idx = *stop_index.entry(stop_id.clone()).or_insert_with(|| {
                    stops.push(GraphStop {
                        id: row.stop_id.clone(),
                        name: row.stop_name.clone(),
                        mode,
                        latitude: row.stop_lat,
                        longitude: row.stop_lon,
                        routes: Vec::new(),
                    });
                    stops.len() - 1
                });
                if !stops[stop_idx].routes.contains(&route_idx) {
                    stops[stop_idx].routes.push(route_idx);
                }
                stop_indices.push(stop_idx);
            }
            routes[route_idx].patterns.push(stop_indices);
        }

        let transfers = schedule
            .transfers()
            .iter()
            .filter_map(|transfer| {
                let from = *stop_index.get(&transfer.from_stop_id)?;
                let to = *stop_index.get(&transfer.to_stop_id)?;
                // walking pace turns the table's seconds back into metres
                let metres = transfer
                    .min_transfer_time
                    .map(|seconds| f64::from(seconds) / 60.0 * 75.0)
                    .unwrap_or(0.0);
                Some((from, to, metres))
            })
            .collect();

        Self {
            stops,
            routes,
            transfers,
        }
    }

    pub fn stop(&self, index: usize) -> &GraphStop {
        &self.stops[index]
    }

    pub fn route(&self, index: usize) -> &GraphRoute {
        &self.routes[index]
    }

    /// Stops within the walk radius, nearest first. A bounding box culls
    /// the arena before any haversine is paid.
    pub fn stops_near(
        &self,
        latitude: f64,
        longitude: f64,
        max_metres: f64,
    ) -> Vec<(usize, f64)> {
        let keep = geo::bounding_box(latitude, longitude, max_metres);
        let mut found: Vec<(usize, f64)> = self
            .stops
            .iter()
            .enumerate()
            .filter(|(_, stop)| keep.contains(stop.latitude, stop.longitude))
            .filter_map(|(index, stop)| {
                let metres = geo::haversine_metres(
                    latitude,
                    longitude,
                    stop.latitude,
                    stop.longitude,
                );
                (metres <= max_metres).then_some((index, metres))
            })
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }

    pub fn distance_metres(&self, a: usize, b: usize) -> f64 {
        let (a, b) = (&self.stops[a], &self.stops[b]);
        geo::haversine_metres(a.latitude, a.longitude, b.latitude, b.longitude)
    }

    /// Walking distance between two stops for an interchange, honouring
    /// any explicit transfer entry over the crow-flies distance.
    pub fn interchange_metres(&self, from: usize, to: usize) -> f64 {
        if from == to {
            return 0.0;
        }
        self.transfers
            .iter()
            .find(|(a, b, _)| (*a == from && *b == to) || (*a == to && *b == from))
            .map(|(_, _, metres)| *metres)
            .unwrap_or_else(|| self.distance_metres(from, to))
    }

    /// Whether a route carries riders from one stop to the other, in that
    /// order, on any of its patterns.
    pub fn serves_in_order(&self, route_idx: usize, from: usize, to: usize) -> bool {
        self.routes[route_idx].patterns.iter().any(|pattern| {
            let from_pos = pattern.iter().position(|stop| *stop == from);
            let to_pos = pattern.iter().position(|stop| *stop == to);
            matches!((from_pos, to_pos), (Some(a), Some(b)) if a < b)
        })
    }

    /// Stops downstream of a given stop on any pattern of a route.
    pub fn downstream_of(&self, route_idx: usize, stop_idx: usize) -> Vec<usize> {
        let mut downstream = Vec::new();
        for pattern in &self.routes[route_idx].patterns {
            if let Some(position) = pattern.iter().position(|stop| *stop == stop_idx) {
                for stop in &pattern[position + 1..] {
                    if !downstream.contains(stop) {
                        downstream.push(*stop);
                    }
                }
            }
        }
        downstream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs::data_model::{
        routes::{RouteRow, RouteType},
        stop_times::StopTimeRow,
        stops::StopRow,
        transfers::TransferRow,
        trips::TripRow,
        GtfsTime,
    };

    fn stop(id: &str, lat: f64, lon: f64) -> StopRow {
        StopRow {
            stop_id: id.to_owned(),
            stop_name: id.to_owned(),
            stop_lat: lat,
            stop_lon: lon,
            parent_station: None,
            platform_code: None,
        }
    }

    fn graph() -> StopGraph {
        let stops = vec![
            stop("a", -37.8000, 144.9600),
            stop("b", -37.8050, 144.9600),
            stop("c", -37.8100, 144.9600),
        ];
        let routes = vec![RouteRow {
            route_id: "r1".to_owned(),
            agency_id: None,
            route_short_name: None,
            route_long_name: None,
            route_type: RouteType::Rail,
        }];
        let trips = vec![TripRow {
            route_id: "r1".to_owned(),
            service_id: "s".to_owned(),
            trip_id: "t".to_owned(),
            trip_headsign: None,
            direction_id: Some(0),
        }];
        let stop_time = |stop: &str, seq: u32| StopTimeRow {
            trip_id: "t".to_owned(),
            arrival_time: Some(GtfsTime::from_hms(7, seq, 0)),
            departure_time: Some(GtfsTime::from_hms(7, seq, 0)),
            stop_id: stop.to_owned(),
            stop_sequence: seq,
        };
        let transfers = vec![TransferRow {
            from_stop_id: "b".to_owned(),
            to_stop_id: "c".to_owned(),
            transfer_type: 2,
            min_transfer_time: Some(240),
        }];
        let schedule = gtfs::schedule::Schedule::from_tables(
            stops,
            routes,
            trips,
            vec![stop_time("a", 1), stop_time("b", 2), stop_time("c", 3)],
            None,
            transfers,
        );
        StopGraph::from_schedule(&schedule, |_| None)
    }

    #[test]
    fn radius_search_is_sorted_and_bounded() {
        let graph = graph();
        // 600 m around "a" reaches "b" (0.005 degrees of latitude,
        // roughly 556 m) but not "c" at twice that
        let near = graph.stops_near(-37.8000, 144.9600, 600.0);
        assert_eq!(near.len(), 2);
        assert_eq!(graph.stop(near[0].0).id, "a");
        assert_eq!(graph.stop(near[1].0).id, "b");
        assert!(near[0].1 < near[1].1);
        assert_eq!(graph.stops_near(-37.8000, 144.9600, 100.0).len(), 1);
    }

    #[test]
    fn order_and_downstream_follow_the_pattern() {
        let graph = graph();
        let route = 0;
        let a = graph.stops_near(-37.8000, 144.9600, 10.0)[0].0;
        let c = graph.stops_near(-37.8100, 144.9600, 10.0)[0].0;
        assert!(graph.serves_in_order(route, a, c));
        assert!(!graph.serves_in_order(route, c, a));
        assert_eq!(graph.downstream_of(route, a).len(), 2);
        assert!(graph.downstream_of(route, c).is_empty());
    }

    #[test]
    fn transfer_entries_override_crow_flies_distance() {
        let graph = graph();
        let b = graph.stops_near(-37.8050, 144.9600, 10.0)[0].0;
        let c = graph.stops_near(-37.8100, 144.9600, 10.0)[0].0;
        // 240 s at walking pace reads as 300 m, not the 556 m direct
        assert_eq!(graph.interchange_metres(b, c).round(), 300.0);
        assert_eq!(graph.interchange_metres(b, b), 0.0);
    }
}
