use chrono::{DateTime, TimeZone, Utc};
use model::{
    AlertEffect, AlertSeverity, Departure, ModeType, ServiceAlert,
};
use prost::Message as _;
use thiserror::Error;

use crate::AuthorityRules;

/// Generated protobuf types from gtfs-realtime.proto.
pub mod transit_realtime {
    include!(concat!(env!("OUT_DIR"), "/protobuf/transit_realtime.rs"));
}

use transit_realtime::{
    trip_descriptor, trip_update::stop_time_update, FeedMessage, TripUpdate,
};

#[derive(Debug, Error)]
pub enum FeedParseError {
    #[error("feed payload is not a valid FeedMessage: {0}")]
    Decode(#[from] prost::DecodeError),
}

pub fn decode_feed(bytes: &[u8]) -> Result<FeedMessage, FeedParseError> {
    Ok(FeedMessage::decode(bytes)?)
}

/// Scheduled boarding instants, for feed entries that carry a delay but
/// no absolute time. The transit layer backs this with the static
/// schedule; feeds without one use [`NoSchedule`].
pub trait ScheduledTimes: Send + Sync {
    fn boarding_time(&self, trip_id: &str, stop_id: &str) -> Option<DateTime<Utc>>;
}

/// No scheduled times available; delay-only entries are discarded.
pub struct NoSchedule;

impl ScheduledTimes for NoSchedule {
    fn boarding_time(&self, _trip_id: &str, _stop_id: &str) -> Option<DateTime<Utc>> {
        None
    }
}

/// Normalizes the trip updates of a feed into departures for one stop,
/// sorted by predicted time. The predicted instant comes from the
/// arrival time, then the departure time, then the scheduled time plus
/// the delay; entries with none of the three are discarded.
pub fn departures_from_feed(
    feed: &FeedMessage,
    stop_id: &str,
    mode: ModeType,
    now: DateTime<Utc>,
    rules: &dyn AuthorityRules,
    scheduled: &dyn ScheduledTimes,
) -> Vec<Departure> {
    let mut departures = Vec::new();

    for entity in &feed.entity {
        let Some(update) = &entity.trip_update else {
            continue;
        };
        if matches!(
            update.trip.schedule_relationship(),
            trip_descriptor::ScheduleRelationship::Canceled
                | trip_descriptor::ScheduleRelationship::Deleted
        ) {
            continue;
        }
        let Some(departure) =
            departure_at_stop(update, stop_id, mode, now, rules, scheduled)
        else {
            continue;
        };
        departures.push(departure);
    }

    departures.sort_by_key(|d| d.predicted_time);
    departures
}

fn departure_at_stop(
    update: &TripUpdate,
    stop_id: &str,
    mode: ModeType,
    now: DateTime<Utc>,
    rules: &dyn AuthorityRules,
    scheduled: &dyn ScheduledTimes,
) -> Option<Departure> {
    let stop = update
        .stop_time_update
        .iter()
        .find(|stu| stu.stop_id.as_deref() == Some(stop_id))?;
    if stop.schedule_relationship() == stop_time_update::ScheduleRelationship::Skipped
    {
        return None;
    }

    let delay_seconds = stop
        .arrival
        .as_ref()
        .and_then(|event| event.delay)
        .or_else(|| stop.departure.as_ref().and_then(|event| event.delay))
        .or(update.delay)
        .unwrap_or(0) as i64;

    let absolute_epoch = stop
        .arrival
        .as_ref()
        .and_then(|event| event.time)
        .or_else(|| stop.departure.as_ref().and_then(|event| event.time));
    let predicted_time = match absolute_epoch {
        Some(epoch) => Utc.timestamp_opt(epoch, 0).single()?,
        // delay-only entry: reconstruct from the scheduled boarding time
        None => {
            let trip_id = update.trip.trip_id.as_deref()?;
            scheduled.boarding_time(trip_id, stop_id)?
                + chrono::Duration::seconds(delay_seconds)
        }
    };
    if predicted_time < now {
        return None;
    }

    let route_id = update.trip.route_id.clone().unwrap_or_default();
    let line_name = rules.line_name(&route_id);

    let terminus_stop_id = update
        .stop_time_update
        .iter()
        .max_by_key(|stu| stu.stop_sequence.unwrap_or(0))
        .and_then(|stu| stu.stop_id.clone())
        .unwrap_or_else(|| stop_id.to_owned());
    let is_citybound = rules.is_cbd_terminus(&terminus_stop_id);
    let destination_display = if is_citybound {
        "City Loop".to_owned()
    } else {
        line_name.clone()
    };

    let own_sequence = stop.stop_sequence.unwrap_or(0);
    let is_express = update.stop_time_update.iter().any(|stu| {
        stu.stop_sequence.unwrap_or(0) > own_sequence
            && stu.schedule_relationship()
                == stop_time_update::ScheduleRelationship::Skipped
    });

    let departure = Departure {
        stop_id: stop_id.to_owned(),
        route_id: route_id.clone(),
        line_name,
        mode: rules.mode_for_route(&route_id).unwrap_or(mode),
        scheduled_time: predicted_time - chrono::Duration::seconds(delay_seconds),
        predicted_time,
        delay_seconds,
        minutes_until: 0,
        destination_display,
        is_citybound,
        is_live: true,
        is_express,
        platform: None,
        trip_id: update.trip.trip_id.clone(),
        terminus_stop_id,
    };
    Some(departure.with_minutes_until(now))
}

/// Scheduled riding time between two stops of a trip in the feed, where the
/// feed carries times for both.
pub fn ride_minutes_from_feed(
    feed: &FeedMessage,
    trip_id: &str,
    from_stop_id: &str,
    to_stop_id: &str,
) -> Option<u32> {
    let update = feed.entity.iter().find_map(|entity| {
        entity
            .trip_update
            .as_ref()
            .filter(|update| update.trip.trip_id.as_deref() == Some(trip_id))
    })?;
    let time_at = |stop_id: &str| {
        update
            .stop_time_update
            .iter()
            .find(|stu| stu.stop_id.as_deref() == Some(stop_id))
            .and_then(|stu| {
                stu.arrival
                    .as_ref()
                    .and_then(|event| event.time)
                    .or_else(|| stu.departure.as_ref().and_then(|event| event.time))
            })
    };
    let board = time_at(from_stop_id)?;
    let alight = time_at(to_stop_id)?;
    if alight <= board {
        return None;
    }
    Some(((alight - board) as f64 / 60.0).ceil() as u32)
}

/// Extracts the currently active service alerts of a feed.
pub fn alerts_from_feed(
    feed: &FeedMessage,
    mode: ModeType,
    now: DateTime<Utc>,
) -> Vec<ServiceAlert> {
    let mut alerts = Vec::new();

    for entity in &feed.entity {
        let Some(alert) = &entity.alert else {
            continue;
        };

        let window = alert.active_period.first();
        let effect_from = window
            .and_then(|range| range.start)
            .and_then(|epoch| Utc.timestamp_opt(epoch as i64, 0).single());
        let effect_to = window
            .and_then(|range| range.end)
            .and_then(|epoch| Utc.timestamp_opt(epoch as i64, 0).single());

        let mut route_ids = Vec::new();
        let mut stop_ids = Vec::new();
        for informed in &alert.informed_entity {
            if let Some(route_id) = &informed.route_id {
                route_ids.push(route_id.clone());
            }
            if let Some(stop_id) = &informed.stop_id {
                stop_ids.push(stop_id.clone());
            }
        }

        let header_text = alert
            .header_text
            .as_ref()
            .and_then(first_translation)
            .unwrap_or_default();
        let description_text =
            alert.description_text.as_ref().and_then(first_translation);

        let effect = map_effect(alert.effect());
        let parsed = ServiceAlert {
            alert_id: entity.id.clone(),
            route_ids,
            stop_ids,
            severity: map_severity(alert.severity_level(), effect),
            effect_from,
            effect_to,
            header_text,
            description_text,
            mode,
            effect: Some(effect),
        };
        if parsed.is_active(now) {
            alerts.push(parsed);
        }
    }

    alerts
}

fn first_translation(text: &transit_realtime::TranslatedString) -> Option<String> {
    text.translation
        .first()
        .map(|translation| translation.text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn map_effect(effect: transit_realtime::alert::Effect) -> AlertEffect {
    use transit_realtime::alert::Effect;
    match effect {
        Effect::NoService => AlertEffect::NoService,
        Effect::ReducedService => AlertEffect::ReducedService,
        Effect::SignificantDelays => AlertEffect::SignificantDelays,
        Effect::Detour => AlertEffect::Detour,
        _ => AlertEffect::Other,
    }
}

fn map_severity(
    level: transit_realtime::alert::SeverityLevel,
    effect: AlertEffect,
) -> AlertSeverity {
    use transit_realtime::alert::SeverityLevel;
    match level {
        SeverityLevel::Severe => AlertSeverity::Disruption,
        SeverityLevel::Warning => AlertSeverity::Major,
        SeverityLevel::Info => AlertSeverity::Info,
        SeverityLevel::UnknownSeverity => match effect {
            AlertEffect::NoService => AlertSeverity::Disruption,
            AlertEffect::ReducedService | AlertEffect::SignificantDelays => {
                AlertSeverity::Major
            }
            AlertEffect::Detour => AlertSeverity::Minor,
            AlertEffect::Other => AlertSeverity::Info,
        },
    }
}
