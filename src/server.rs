//! HTTP routes.
//!
//! `GET /cathedral-parkway` returns the merged arrival list as JSON. The
//! `POST` broadcast routes and the smart-home webhook compose an
//! announcement and hand it to the delivery sink without waiting on
//! playback.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::announce;
use crate::arrivals::{ArrivalRecord, Direction};
use crate::config::Config;
use crate::delivery::{DeliverySink, spawn_delivery};
use crate::pipeline::{FeedFetcher, collect_arrivals, compose_announcement};
use crate::smarthome::{
    PowerStateEvent, RESET_DELAY, SwitchPlatform, schedule_reset, triggered_binding,
};

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub fetcher: Arc<dyn FeedFetcher>,
    pub sink: Arc<dyn DeliverySink>,
    pub platform: Arc<dyn SwitchPlatform>,
    pub reset_delay: Duration,
}

impl AppState {
    pub fn new(
        config: Config,
        fetcher: Arc<dyn FeedFetcher>,
        sink: Arc<dyn DeliverySink>,
        platform: Arc<dyn SwitchPlatform>,
    ) -> Self {
        Self {
            config,
            fetcher,
            sink,
            platform,
            reset_delay: RESET_DELAY,
        }
    }
}

#[derive(Serialize)]
struct StationArrivals<'a> {
    station: &'a str,
    timestamp: DateTime<Utc>,
    trains: Vec<ArrivalRecord>,
}

/// Registers every route on an actix `App`.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/cathedral-parkway", web::get().to(station_arrivals))
        .route("/uptown", web::post().to(broadcast_uptown))
        .route("/downtown", web::post().to(broadcast_downtown))
        .route("/broadcast-trains", web::post().to(broadcast_all))
        .route("/webhook", web::post().to(power_state_webhook));
}

async fn station_arrivals(state: web::Data<AppState>) -> HttpResponse {
    let config = &state.config;
    let now = Utc::now();

    match collect_arrivals(state.fetcher.clone(), &config.sources, &config.station.id, now).await {
        Ok(trains) => {
            debug!(count = trains.len(), "Serving arrivals");
            HttpResponse::Ok().json(StationArrivals {
                station: &config.station.name,
                timestamp: now,
                trains,
            })
        }
        Err(e) => {
            error!(error = %e, "Error fetching MTA data");
            HttpResponse::InternalServerError().json(json!({ "error": "Failed to fetch MTA data" }))
        }
    }
}

async fn broadcast_uptown(state: web::Data<AppState>) -> HttpResponse {
    broadcast(state, Some(Direction::Uptown)).await
}

async fn broadcast_downtown(state: web::Data<AppState>) -> HttpResponse {
    broadcast(state, Some(Direction::Downtown)).await
}

async fn broadcast_all(state: web::Data<AppState>) -> HttpResponse {
    broadcast(state, None).await
}

/// Composes the announcement for `filter`, starts playback and answers
/// with the composed text. The empty-result sentence is still spoken.
async fn broadcast(state: web::Data<AppState>, filter: Option<Direction>) -> HttpResponse {
    match announcement(&state, filter).await {
        Ok(Some(message)) => {
            spawn_delivery(state.sink.clone(), message.clone());
            HttpResponse::Ok().content_type("text/plain").body(message)
        }
        Ok(None) => {
            let spoken = announce::empty_message(&state.config.station.spoken_name, filter);
            spawn_delivery(state.sink.clone(), spoken);
            HttpResponse::Ok().content_type("text/plain").body("No trains found.")
        }
        Err(e) => {
            error!(error = %e, "Error in broadcast");
            HttpResponse::InternalServerError()
                .content_type("text/plain")
                .body("Error triggering broadcast")
        }
    }
}

async fn announcement(
    state: &AppState,
    filter: Option<Direction>,
) -> Result<Option<String>, crate::error::PipelineError> {
    let config = &state.config;
    compose_announcement(
        state.fetcher.clone(),
        &config.sources,
        &config.station.id,
        &config.station.spoken_name,
        filter,
    )
    .await
}

/// Smart-home callback. "On" from a registered switch starts the matching
/// broadcast in the background and schedules the switch reset; the
/// platform gets its acknowledgement immediately.
async fn power_state_webhook(
    state: web::Data<AppState>,
    event: web::Json<PowerStateEvent>,
) -> HttpResponse {
    let event = event.into_inner();

    match triggered_binding(&state.config.devices, &event) {
        Some(binding) => {
            info!(device_id = %event.device_id, ?binding, "Switch pressed");
            let filter = binding.filter();
            let background = state.clone();
            tokio::spawn(async move {
                let message = match announcement(&background, filter).await {
                    Ok(Some(message)) => message,
                    Ok(None) => {
                        announce::empty_message(&background.config.station.spoken_name, filter)
                    }
                    Err(e) => {
                        error!(error = %e, "Error composing switch announcement");
                        return;
                    }
                };
                spawn_delivery(background.sink.clone(), message);
            });
            schedule_reset(state.platform.clone(), event.device_id, state.reset_delay);
        }
        None => {
            debug!(
                device_id = %event.device_id,
                state = ?event.state,
                "Ignoring power state event"
            );
        }
    }

    HttpResponse::Ok().json(json!({ "success": true }))
}
