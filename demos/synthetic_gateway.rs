//! Gateway fed by a synthetic H.264 source
//!
//! Run with: cargo run --example synthetic_gateway [CONFIG.json]
//!
//! Without a configuration file two channels are served, `/cam1` and `/cam2`.
//! The demo subscribes to `/cam1` for a while, printing every frame header,
//! then unsubscribes so the upstream stops again.
//!
//! Set `RUST_LOG` to override the verbosity from the configuration.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio::time::{Instant, Interval};

use rtsp2ws::source::NewSession;
use rtsp2ws::{
    ChannelHub, ChannelMessage, Gateway, GatewayConfig, PresentationTime, Query,
    SourceConnector, SourceEvent, SourceOptions, SourceSession,
};

/// 1080p High profile parameter sets
const SDP: &str = "m=video 0 RTP/AVP 96\r\n\
                   a=rtpmap:96 H264/90000\r\n\
                   a=fmtp:96 packetization-mode=1;sprop-parameter-sets=Z2QAH6zZQFA=,aOvjyw==\r\n";

const FRAME_INTERVAL: Duration = Duration::from_millis(40);
const GOP_LENGTH: u64 = 25;

/// Playback state of a started session
struct Playback {
    ticker: Interval,
    announced: bool,
    frame: u64,
}

/// Produces one H.264 session with a keyframe every second
struct SyntheticSession {
    url: String,
    playback: Option<Playback>,
}

impl SourceSession for SyntheticSession {
    fn start(&mut self, delay: Duration) {
        tracing::info!(url = %self.url, delay_secs = delay.as_secs(), "Synthetic source starting");
        self.playback = Some(Playback {
            ticker: tokio::time::interval_at(Instant::now() + delay, FRAME_INTERVAL),
            announced: false,
            frame: 0,
        });
    }

    fn stop(&mut self) {
        tracing::info!(url = %self.url, "Synthetic source stopped");
        self.playback = None;
    }

    async fn next_event(&mut self) -> SourceEvent {
        let Some(playback) = self.playback.as_mut() else {
            return std::future::pending().await;
        };
        playback.ticker.tick().await;

        if !playback.announced {
            playback.announced = true;
            // Acceptance is logged by the gateway; nothing to do with it here
            let (reply, _) = oneshot::channel();
            return SourceEvent::NewSession(NewSession {
                id: "video".into(),
                media: "video".into(),
                codec: "H264".into(),
                sdp: SDP.into(),
                clock_rate: 90_000,
                channels: 0,
                reply,
            });
        }

        let index = playback.frame;
        playback.frame += 1;
        let nal_header = if index % GOP_LENGTH == 0 { 0x65 } else { 0x41 };
        let mut payload = vec![0x00, 0x00, 0x00, 0x01, nal_header];
        payload.extend(std::iter::repeat((index & 0xFF) as u8).take(64));

        SourceEvent::Data {
            id: "video".into(),
            payload: Bytes::from(payload),
            presentation_time: PresentationTime::from(FRAME_INTERVAL * index as u32),
        }
    }
}

struct SyntheticConnector;

impl SourceConnector for SyntheticConnector {
    type Session = SyntheticSession;

    fn connect(&self, url: &str, options: &SourceOptions) -> rtsp2ws::Result<SyntheticSession> {
        tracing::debug!(url, rtp_transport = ?options.rtp_transport, "Creating synthetic session");
        Ok(SyntheticSession {
            url: url.to_string(),
            playback: None,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default()
            .stream("cam1", "rtsp://synthetic/cam1")
            .stream("cam2", "rtsp://synthetic/cam2")
            .verbose(1),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_filter())),
        )
        .init();

    let hub = Arc::new(ChannelHub::new());
    let mut gateway = Gateway::new(&config, &SyntheticConnector, hub.clone())?;
    println!("rtsp2ws {} serving {:?}", gateway.version(), hub.channels());
    println!("{}", gateway.query(Query::Help));

    let Some(path) = gateway.paths().next().map(str::to_string) else {
        println!("No channels configured");
        return Ok(());
    };

    let watcher = {
        let hub = hub.clone();
        tokio::spawn(async move {
            let mut sub = match hub.subscribe(&path) {
                Ok(sub) => sub,
                Err(e) => {
                    eprintln!("Subscribe failed: {}", e);
                    return;
                }
            };
            let deadline = tokio::time::sleep(Duration::from_secs(5));
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    message = sub.recv() => match message {
                        Some(ChannelMessage::Text(meta)) => println!("[{}] {}", path, meta),
                        Some(ChannelMessage::Binary(data)) => println!("[{}] {} bytes", path, data.len()),
                        None => break,
                    },
                }
            }
            println!("[{}] Unsubscribing", path);
        })
    };

    let mut report = tokio::time::interval(Duration::from_secs(2));
    tokio::select! {
        _ = async {
            loop {
                report.tick().await;
                println!("{}", gateway.query(Query::Streams));
            }
        } => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    watcher.abort();
    gateway.shutdown();
    Ok(())
}
