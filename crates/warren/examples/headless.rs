//! Headless run of the scheduling actor.
//!
//! Usage: `cargo run --example headless -- [kind] [ticks] [policy-path]`
//!
//! Steps the chosen environment, logs returns as episodes finish, and
//! prints the final frame as JSON. Set `RUST_LOG=debug` for lifecycle
//! logs.

use std::time::Duration;

use tracing::{info, warn};
use warren::prelude::*;

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut args = std::env::args().skip(1);
    let kind: EnvKind = match args.next().map(|s| s.parse()) {
        Some(Ok(kind)) => kind,
        Some(Err(e)) => {
            eprintln!("{e}; expected one of {:?}", EnvKind::ALL.map(EnvKind::name));
            std::process::exit(2);
        }
        None => EnvKind::GridWorld,
    };
    let ticks: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(200);

    let mut actor = match SimActor::spawn(SimConfig::for_kind(kind)) {
        Ok(actor) => actor,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = args.next() {
        actor
            .send(Command::LoadPolicy(PolicySource::Locator(path)))
            .unwrap();
    }
    actor.send(Command::Step(ticks)).unwrap();

    let mut last = None;
    let mut seen = 0;
    while seen < ticks {
        match actor.events().recv_timeout(Duration::from_secs(10)) {
            Ok(Event::State { frame, policy_ready }) => {
                seen += 1;
                if frame.all_done() {
                    info!(tick = %frame.tick, returns = ?frame.returns, policy_ready, "episode done");
                }
                last = Some(frame);
            }
            Ok(Event::Policy { ready, message }) => info!(ready, %message, "policy"),
            Ok(Event::Error { message }) => warn!(%message, "engine error"),
            Err(e) => {
                warn!(error = %e, "no event");
                break;
            }
        }
    }

    if let Some(frame) = last {
        println!("{}", serde_json::to_string_pretty(&frame).unwrap());
    }
    actor.dispose();
}
