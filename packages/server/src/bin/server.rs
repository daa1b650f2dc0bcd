//! Wortspiel game coordination server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin wortspiel-server
//! cargo run --bin wortspiel-server -- --host 0.0.0.0 --port 3000 --log-level debug
//! ```

use std::sync::Arc;

use clap::Parser;
use wortspiel_server::{
    config::GameTimings,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, registry::ConnectionRegistry,
        repository::InMemoryRoomRepository, scheduler::TransitionScheduler,
    },
    ui::Server,
    usecase::{Coordinator, Dispatcher, Fanout, GameRules},
};
use wortspiel_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "wortspiel-server")]
#[command(about = "Real-time game coordination server for Wortspiel", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Delay between a resolved round and the next one, in milliseconds
    #[arg(long, default_value_t = GameTimings::DEFAULT_ANSWER_REVEAL_MS)]
    answer_reveal_ms: u64,

    /// How long a memory turn stays on screen before it passes, in milliseconds
    #[arg(long, default_value_t = GameTimings::DEFAULT_TURN_DISPLAY_MS)]
    turn_display_ms: u64,

    /// Seconds a completed room is kept before it is evicted
    #[arg(long, default_value_t = GameTimings::DEFAULT_COMPLETED_ROOM_TTL_SECS)]
    completed_room_ttl_secs: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let timings = GameTimings::new(
        args.answer_reveal_ms,
        args.turn_display_ms,
        args.completed_room_ttl_secs,
    );
    tracing::debug!("Game timings: {:?}", timings);

    // Initialize dependencies in order:
    // 1. MessagePusher and ConnectionRegistry
    // 2. Coordinators
    // 3. Dispatcher
    // 4. Server

    // 1. Shared connection plumbing
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let fanout = Arc::new(Fanout::new(message_pusher.clone(), registry.clone()));

    // 2. Coordinators
    let duel = build_coordinator(&fanout, &registry, timings);
    let memory = build_coordinator(&fanout, &registry, timings);
    let word_search = build_coordinator(&fanout, &registry, timings);
    let slots = build_coordinator(&fanout, &registry, timings);

    // 3. Dispatcher
    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        message_pusher,
        duel,
        memory,
        word_search,
        slots,
    ));

    // 4. Create and run the server
    let server = Server::new(dispatcher);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Each game type gets its own room store and scheduler.
fn build_coordinator<G: GameRules>(
    fanout: &Arc<Fanout>,
    registry: &Arc<ConnectionRegistry>,
    timings: GameTimings,
) -> Arc<Coordinator<G>> {
    Arc::new(Coordinator::new(
        Arc::new(InMemoryRoomRepository::new()),
        Arc::new(TransitionScheduler::new()),
        fanout.clone(),
        registry.clone(),
        Arc::new(SystemClock),
        timings,
    ))
}
