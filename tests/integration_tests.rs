use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use prost::Message;
use std::sync::Arc;

use station_announcer::announce::{compose, empty_message};
use station_announcer::arrivals::{Direction, FetchOutcome, aggregate, extract_arrivals};
use station_announcer::error::FetchFailure;
use station_announcer::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use station_announcer::gtfs_rt::{FeedEntity, FeedHeader, FeedMessage, TripDescriptor, TripUpdate};
use station_announcer::parser::parse_feed;
use station_announcer::pipeline::{FeedFetcher, FeedSource, collect_arrivals};

const STATION: &str = "Cathedral Parkway";
const SOURCES: &[&str] = &["ACE", "BDFM"];

fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Encodes a feed with one trip per `(route, stop_id, minutes_from_now)`,
/// the way it would arrive over the wire.
fn encoded_feed(trips: &[(&str, &str, i64)]) -> Vec<u8> {
    let feed = FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "1.0".to_string(),
            timestamp: Some(now().timestamp() as u64),
            incrementality: None,
            feed_version: None,
        },
        entity: trips
            .iter()
            .enumerate()
            .map(|(i, (route, stop_id, minutes))| FeedEntity {
                id: format!("{i:06}"),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        route_id: Some(route.to_string()),
                        ..Default::default()
                    },
                    stop_time_update: vec![
                        StopTimeUpdate {
                            stop_id: Some("A16N".to_string()),
                            arrival: Some(StopTimeEvent {
                                time: Some((now() + Duration::minutes(minutes - 1)).timestamp()),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                        StopTimeUpdate {
                            stop_id: Some(stop_id.to_string()),
                            arrival: Some(StopTimeEvent {
                                time: Some((now() + Duration::minutes(*minutes)).timestamp()),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect(),
    };
    feed.encode_to_vec()
}

#[test]
fn test_full_pipeline() {
    let ace = parse_feed(&encoded_feed(&[("A", "A17N", 5), ("C", "A17S", 2)]));
    let bdfm = parse_feed(&encoded_feed(&[("B", "A17S", 9)]));

    let merged = aggregate([
        extract_arrivals(&ace, "A17", "ACE", now()),
        extract_arrivals(&bdfm, "A17", "BDFM", now()),
    ]);

    let summary: Vec<(&str, Direction, i64)> = merged
        .iter()
        .map(|r| (r.route_id.as_str(), r.direction, r.minutes_until_arrival))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("C", Direction::Downtown, 2),
            ("A", Direction::Uptown, 5),
            ("B", Direction::Downtown, 9),
        ]
    );
    assert!(merged.iter().all(|r| r.arrival_instant > now()));
    assert!(merged.iter().all(|r| r.stop_id.starts_with("A17")));

    assert_eq!(
        compose(&merged, SOURCES, Some(Direction::Downtown), STATION),
        "Next Downtown trains at Cathedral Parkway: Downtown C train in 2 mins and Downtown B train in 9 mins"
    );
}

#[test]
fn test_one_failed_source() {
    let ace: FetchOutcome = Err(FetchFailure::Status { status: 500 });
    let bdfm = parse_feed(&encoded_feed(&[("F", "A17S", 4)]));

    let merged = aggregate([
        extract_arrivals(&ace, "A17", "ACE", now()),
        extract_arrivals(&bdfm, "A17", "BDFM", now()),
    ]);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].route_id, "F");
}

#[test]
fn test_corrupt_feed_counts_as_failure() {
    let ace = parse_feed(&[0xFF, 0xFE, 0x00, 0x01]);
    assert!(ace.is_err());

    let merged = aggregate([extract_arrivals(&ace, "A17", "ACE", now())]);

    assert!(merged.is_empty());
    assert_eq!(
        compose(&merged, SOURCES, None, STATION),
        empty_message(STATION, None)
    );
}

struct AlwaysDown;

#[async_trait]
impl FeedFetcher for AlwaysDown {
    async fn fetch(&self, _source: &FeedSource) -> FetchOutcome {
        Err(FetchFailure::Status { status: 503 })
    }
}

#[tokio::test]
async fn test_both_sources_down_is_empty_success() {
    let sources = vec![
        FeedSource::new("ACE", "https://example.invalid/ace"),
        FeedSource::new("BDFM", "https://example.invalid/bdfm"),
    ];

    let arrivals = collect_arrivals(Arc::new(AlwaysDown), &sources, "A17", Utc::now())
        .await
        .unwrap();

    assert!(arrivals.is_empty());
    assert_eq!(
        compose(&arrivals, SOURCES, Some(Direction::Uptown), STATION),
        "No upcoming Uptown trains found for Cathedral Parkway."
    );
}
