//! Run a station on the local network
//!
//! Run with: cargo run --example station HOST_IP [STATION_NAME]
//!
//! Examples:
//!   cargo run --example station 192.168.1.20
//!   cargo run --example station 192.168.1.20 "Kitchen on %hostname:%port"
//!
//! The station announces itself every second, lists the other stations it
//! hears, and streams a placeholder packet every 20ms to whoever subscribes.
//!
//! ## Subscribing by hand
//!
//!   nc 192.168.1.20 6601
//!   subscribe 5004
//!
//! and watch the packets arrive with `nc -ul 5004`.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rtp_station::{RtpBackend, StationConfig, UdpFanout};

fn print_usage() {
    eprintln!("Usage: station HOST_IP [STATION_NAME]");
    eprintln!();
    eprintln!("  HOST_IP       IPv4 address of the interface to advertise on");
    eprintln!("  STATION_NAME  announcement template (%hostname and %port are substituted)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let Some(host) = args.get(1) else {
        print_usage();
        std::process::exit(1);
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rtp_station=debug".parse()?)
                .add_directive("station=debug".parse()?),
        )
        .init();

    let mut config = StationConfig::default().hostname(host.as_str());
    if let Some(name) = args.get(2) {
        config = config.station_name(name.as_str());
    }

    let router = Arc::new(UdpFanout::bind(config.pipeline.clone()).await?);
    let mut backend = RtpBackend::start(config, router.clone()).await?;

    println!("Station running, sessions on {}", backend.session_addr());
    println!("Announcing to {}", backend.broadcast_target());
    println!();

    let producer = {
        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(20));
            let mut seq: u16 = 0;
            loop {
                ticker.tick().await;
                let mut packet = seq.to_be_bytes().to_vec();
                packet.extend_from_slice(&[0u8; 160]);
                router.publish(Bytes::from(packet));
                seq = seq.wrapping_add(1);
            }
        })
    };

    let library = backend.library();
    let mut report = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            _ = report.tick() => {
                let stations = library.browse().await?;
                let subscribers = backend.node().subscribers().await?;
                println!(
                    "{} station(s) heard, {} subscriber(s), {} branch(es)",
                    stations.len(),
                    subscribers.len(),
                    router.branch_count()
                );
                for station in stations {
                    println!("  {} -> {}", station.uri, station.name);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    producer.abort();
    backend.stop().await?;
    Ok(())
}
