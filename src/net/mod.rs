//! Network address utilities

pub mod address;

pub use address::{broadcast_address_for, format_hostname, peer_host, render_station_name};
