use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use gtfs::{
    data_model::GtfsTime,
    realtime,
    schedule::Schedule,
    AuthorityRules,
};
use model::{AuState, Departure, ModeType, ServiceAlert};
use tokio::time::timeout;

use crate::{
    authority::Authority,
    cache::{EntryStatus, FeedCache, FeedKind, Refresh, REFRESH_WAIT},
    fetch::{FeedFetcher, FetchError},
};

/// At most this many departures come back per stop.
pub const MAX_DEPARTURES: usize = 6;

pub use crate::cache::EntryStatus as FeedStatus;

/// The transit data layer. Hides fetching, decoding, caching and the
/// timetable fallback behind two operations; upstream failures never
/// surface past it.
pub struct TransitData {
    authority: &'static Authority,
    schedule: Arc<Schedule>,
    cache: Arc<FeedCache>,
    fetcher: Arc<dyn FeedFetcher>,
    timezone: chrono_tz::Tz,
}

impl TransitData {
    pub fn new(
        state: AuState,
        schedule: Arc<Schedule>,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self {
            authority: Authority::for_state(state),
            schedule,
            cache: Arc::new(FeedCache::new()),
            fetcher,
            timezone: state.timezone(),
        }
    }

    pub fn authority(&self) -> &'static Authority {
        self.authority
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_city_loop_stop(&self, stop_id: &str) -> bool {
        self.authority.is_city_loop_stop(stop_id)
    }

    /// The next departures for a stop, live when possible. An empty stop id
    /// is a no-op, not an error; every degradation answers with timetable
    /// entries flagged `is_live = false`.
    pub async fn departures(
        &self,
        stop_id: &str,
        mode: ModeType,
        now: DateTime<Utc>,
        api_key: Option<&str>,
    ) -> Vec<Departure> {
        if stop_id.is_empty() {
            return Vec::new();
        }

        if let Some(feed) = self
            .feed(FeedKind::TripUpdates, mode, api_key, now)
            .await
        {
            let scheduled = ScheduleTimes {
                schedule: &self.schedule,
                timezone: self.timezone,
                date: now.with_timezone(&self.timezone).date_naive(),
            };
            let live = realtime::departures_from_feed(
                &feed,
                stop_id,
                mode,
                now,
                self.authority,
                &scheduled,
            );
            if !live.is_empty() {
                return live.into_iter().take(MAX_DEPARTURES).collect();
            }
        }

        log::warn!(
            "no live departures for stop {stop_id} ({mode:?}); using timetable"
        );
        self.fallback_departures(stop_id, mode, now)
    }

    /// Currently active alerts for a mode. No feed means no alerts.
    pub async fn alerts(
        &self,
        mode: ModeType,
        now: DateTime<Utc>,
        api_key: Option<&str>,
    ) -> Vec<ServiceAlert> {
        match self.feed(FeedKind::Alerts, mode, api_key, now).await {
            Some(feed) => realtime::alerts_from_feed(&feed, mode, now),
            None => Vec::new(),
        }
    }

    /// Scheduled riding minutes between two stops, preferring the live
    /// trip's own stop times.
    pub async fn ride_minutes(
        &self,
        trip_id: Option<&str>,
        route_id: &str,
        from_stop_id: &str,
        to_stop_id: &str,
        mode: ModeType,
        now: DateTime<Utc>,
        api_key: Option<&str>,
    ) -> Option<u32> {
        if let Some(trip_id) = trip_id {
            if let Some(feed) = self
                .feed(FeedKind::TripUpdates, mode, api_key, now)
                .await
            {
                if let Some(minutes) = realtime::ride_minutes_from_feed(
                    &feed,
                    trip_id,
                    from_stop_id,
                    to_stop_id,
                ) {
                    return Some(minutes);
                }
            }
            if let Some(minutes) =
                self.schedule.ride_minutes(trip_id, from_stop_id, to_stop_id)
            {
                return Some(minutes);
            }
        }
        self.schedule
            .ride_minutes_on_route(route_id, from_stop_id, to_stop_id)
    }

    pub async fn feed_status(&self) -> Vec<EntryStatus> {
        self.cache.status().await
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.len().await
    }

    fn feed_key(&self, kind: FeedKind, mode: ModeType) -> String {
        format!(
            "feed:{}:{}:{}",
            self.authority.id,
            Authority::mode_path(mode),
            kind.key_part()
        )
    }

    /// The cached-or-refreshed feed for a key. At most one fetch is in
    /// flight per key; followers share its outcome up to a deadline. A
    /// missing api key skips fetching entirely.
    async fn feed(
        &self,
        kind: FeedKind,
        mode: ModeType,
        api_key: Option<&str>,
        _now: DateTime<Utc>,
    ) -> Option<Arc<realtime::transit_realtime::FeedMessage>> {
        let key = self.feed_key(kind, mode);

        if let Some(feed) = self.cache.fresh(&key, kind.ttl()).await {
            return Some(feed);
        }
        let Some(api_key) = api_key else {
            return self.cache.any(&key).await;
        };
        if self.cache.in_failure_window(&key).await {
            return self.cache.any(&key).await;
        }

        let signal = match self.cache.join_refresh(&key).await {
            Refresh::Leader(tx) => {
                let cache = self.cache.clone();
                let fetcher = self.fetcher.clone();
                let url = match kind {
                    FeedKind::TripUpdates => self.authority.trip_updates_url(mode),
                    FeedKind::Alerts => self.authority.alerts_url(mode),
                };
                let header_name = self.authority.auth_header;
                let header_value = self.authority.auth_header_value(api_key);
                let task_key = key.clone();
                let mut rx = tx.subscribe();
                // detached so a cancelled request still warms the cache
                tokio::spawn(async move {
                    refresh_feed(&cache, &*fetcher, &task_key, &url, header_name, &header_value)
                        .await;
                    cache.finish_refresh(&task_key, tx).await;
                });
                // leader waits on its own signal like everyone else
                let _ = rx.borrow_and_update();
                rx
            }
            Refresh::Follower(rx) => rx,
        };

        let mut rx = signal;
        let _ = timeout(REFRESH_WAIT, rx.changed()).await;

        self.cache.any(&key).await
    }

    /// Static-timetable departures with `is_live = false`. Never invents
    /// services outside the stop's scheduled hours.
    fn fallback_departures(
        &self,
        stop_id: &str,
        mode: ModeType,
        now: DateTime<Utc>,
    ) -> Vec<Departure> {
        let local = now.with_timezone(&self.timezone);
        let date = local.date_naive();
        let seconds_of_day =
            local.time().signed_duration_since(chrono::NaiveTime::MIN);
        let from = GtfsTime(seconds_of_day.num_seconds().max(0) as u32);

        let scheduled = self
            .schedule
            .departures_at(stop_id, date, from, MAX_DEPARTURES * 2);

        let mut departures = Vec::new();
        for entry in scheduled {
            let entry_mode = self
                .authority
                .mode_for_route(&entry.route_id)
                .or_else(|| self.schedule.mode_of_route(&entry.route_id));
            if entry_mode != Some(mode) {
                continue;
            }

            let Some(at_utc) = gtfs_time_to_utc(self.timezone, date, entry.departure)
            else {
                continue;
            };

            let line_name = self
                .authority
                .line_name_known(&entry.route_id)
                .or_else(|| {
                    self.schedule
                        .route(&entry.route_id)
                        .map(|route| route.display_name())
                })
                .unwrap_or_else(|| entry.route_id.clone());

            let is_citybound = self.authority.is_city_loop_stop(&entry.terminus_stop_id);
            let platform = self
                .schedule
                .stop(stop_id)
                .and_then(|stop| stop.platform_code.clone());

            let departure = Departure {
                stop_id: stop_id.to_owned(),
                route_id: entry.route_id,
                destination_display: if is_citybound {
                    "City Loop".to_owned()
                } else {
                    line_name.clone()
                },
                line_name,
                mode,
                scheduled_time: at_utc,
                predicted_time: at_utc,
                delay_seconds: 0,
                minutes_until: 0,
                is_citybound,
                is_live: false,
                is_express: false,
                platform,
                trip_id: Some(entry.trip_id),
                terminus_stop_id: entry.terminus_stop_id,
            };
            departures.push(departure.with_minutes_until(now));
            if departures.len() == MAX_DEPARTURES {
                break;
            }
        }
        departures
    }
}

/// Scheduled boarding instants on the current service day, for feed
/// entries that carry a delay without an absolute time.
struct ScheduleTimes<'a> {
    schedule: &'a Schedule,
    timezone: chrono_tz::Tz,
    date: chrono::NaiveDate,
}

impl realtime::ScheduledTimes for ScheduleTimes<'_> {
    fn boarding_time(&self, trip_id: &str, stop_id: &str) -> Option<DateTime<Utc>> {
        let time = self.schedule.stop_time_of(trip_id, stop_id)?;
        gtfs_time_to_utc(self.timezone, self.date, time)
    }
}

fn gtfs_time_to_utc(
    timezone: chrono_tz::Tz,
    date: chrono::NaiveDate,
    time: GtfsTime,
) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::new(date, chrono::NaiveTime::MIN)
        + chrono::Duration::seconds(i64::from(time.seconds()));
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

async fn refresh_feed(
    cache: &FeedCache,
    fetcher: &dyn FeedFetcher,
    key: &str,
    url: &str,
    header_name: &str,
    header_value: &str,
) {
    match fetcher.fetch(url, header_name, header_value).await {
        Ok(bytes) => match realtime::decode_feed(&bytes) {
            Ok(feed) => {
                cache.store(key, Arc::new(feed)).await;
            }
            Err(why) => {
                // a bad payload never clobbers a good cache entry
                log::warn!("feed {key} failed to decode: {why}");
                cache.mark_failure(key).await;
            }
        },
        Err(why @ FetchError::ClientError(_)) => {
            log::warn!("feed {key} rejected upstream: {why}");
            cache.mark_failure(key).await;
        }
        Err(why) => {
            log::warn!("feed {key} unreachable: {why}");
            cache.mark_failure(key).await;
        }
    }
}
