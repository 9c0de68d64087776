pub mod announce;
pub mod arrivals;
pub mod config;
pub mod delivery;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod smarthome;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
