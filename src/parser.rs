//! Protobuf parser for GTFS Realtime feeds.

use prost::Message;

use crate::error::FetchFailure;
use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// Agency extensions (the NYCT trip and stop-time extensions, for example)
/// are skipped as unknown fields.
///
/// # Errors
///
/// Returns [`FetchFailure::Decode`] if the bytes are not a valid `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, FetchFailure> {
    Ok(FeedMessage::decode(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate};

    #[test]
    fn test_parse_empty_bytes_returns_default_feed() {
        // Required fields are not enforced by the decoder.
        let feed = parse_feed(&[]).unwrap();
        assert_eq!(feed.header.gtfs_realtime_version, "");
        assert!(feed.entity.is_empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        let result = parse_feed(&invalid_bytes);
        assert!(matches!(result, Err(FetchFailure::Decode(_))));
    }

    #[test]
    fn test_parse_trip_update_feed() {
        let feed = FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "1.0".to_string(),
                timestamp: Some(1_700_000_000),
                incrementality: None,
                feed_version: None,
            },
            entity: vec![FeedEntity {
                id: "000001A".to_string(),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        route_id: Some("A".to_string()),
                        ..Default::default()
                    },
                    stop_time_update: vec![StopTimeUpdate {
                        stop_id: Some("A17N".to_string()),
                        arrival: Some(StopTimeEvent {
                            time: Some(1_700_000_300),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };

        let parsed = parse_feed(&feed.encode_to_vec()).unwrap();

        let update = parsed.entity[0].trip_update.as_ref().unwrap();
        assert_eq!(update.trip.route_id.as_deref(), Some("A"));
        assert_eq!(
            update.stop_time_update[0].arrival.as_ref().unwrap().time,
            Some(1_700_000_300)
        );
    }
}
