//! Blast Arena demo driver
//!
//! Loads a controller config and an arena map, plays one scripted round
//! through the simulation hooks, then replays the recorded inputs and
//! checks the state hashes match.
//!
//! ```text
//! blast-arena [CONFIG.json] [MAP.txt | --generate SEED]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use blast_arena::{
    FIXED_STEP_RATE, FRAME_RATE, VERSION,
    core::fixed::{FIXED_HALF, FIXED_STEP_DURATION, FRAME_DURATION},
    game::{
        config::ArenaConfig,
        events::GameEventData,
        input::InputFrame,
        layout::ArenaLayout,
        match_state::MatchState,
        state::{ArenaBuilder, PlayerId},
        tick::{replay_round, ArenaSession, SimulationLoop},
    },
};

const BUNDLED_CONFIG: &str = include_str!("../config/arena.json");
const BUNDLED_MAP: &str = include_str!("../config/arena.map");

/// Frames the scripted round runs for.
const DEMO_FRAMES: u32 = 360;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Blast Arena v{}", VERSION);
    info!("Frame rate: {} Hz, fixed step: {} Hz", FRAME_RATE, FIXED_STEP_RATE);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let layout = load_layout(&args[args.len().min(1)..])?;

    demo_round(config, layout)
}

fn load_config(path: Option<&str>) -> Result<ArenaConfig> {
    let text = match path {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("reading config {path}"))?,
        None => BUNDLED_CONFIG.to_string(),
    };
    ArenaConfig::from_json_str(&text).context("loading arena config")
}

fn load_layout(args: &[String]) -> Result<ArenaLayout> {
    match args {
        [flag, seed, ..] if flag == "--generate" => {
            let seed: u64 = seed.parse().with_context(|| format!("bad seed {seed:?}"))?;
            ArenaLayout::generate(13, 11, seed, FIXED_HALF).context("generating arena")
        }
        [path, ..] => {
            let text = std::fs::read_to_string(Path::new(path))
                .with_context(|| format!("reading map {path}"))?;
            text.parse().with_context(|| format!("parsing map {path}"))
        }
        [] => BUNDLED_MAP.parse().context("parsing bundled map"),
    }
}

/// Scripted inputs: Player_1 drops a bomb and escapes down the left
/// corridor; Player_2 drops a bomb and stays on it.
fn scripted_input(id: PlayerId, frame: u32) -> InputFrame {
    let mut input = match (id, frame) {
        (PlayerId::One, 2..=27) => InputFrame::with_axes(0, -1),
        (PlayerId::One, 28..=40) => InputFrame::with_axes(1, 0),
        _ => InputFrame::new(),
    };
    if frame == 1 {
        input.set_place(true);
    }
    input
}

fn demo_round(config: ArenaConfig, layout: ArenaLayout) -> Result<()> {
    info!("=== Starting Demo Round ===");

    let arena = ArenaBuilder::new()
        .layout(layout)
        .config(config)
        .build()
        .context("building arena")?;
    let initial = arena.clone();
    info!("Initial State Hash: {}", hex::encode(arena.compute_hash()));

    let mut session = ArenaSession::new(arena);
    let mut match_state = MatchState::new();
    let mut total_events = 0;

    for frame in 1..=DEMO_FRAMES {
        for id in PlayerId::ALL {
            session.set_input(id, scripted_input(id, frame));
        }

        let mut events = session.on_frame(&mut match_state, FRAME_DURATION).events;
        events.extend(session.on_fixed_step(&mut match_state, FIXED_STEP_DURATION).events);
        total_events += events.len();

        for event in &events {
            match &event.data {
                GameEventData::BombPlaced { owner, cell, .. } => {
                    info!("Frame {}: {} placed a bomb at {}", event.frame, owner, cell);
                }
                GameEventData::BombExploded { owner, cell, segments, .. } => {
                    info!("Frame {}: {}'s bomb at {} exploded ({} cells)", event.frame, owner, cell, segments);
                }
                GameEventData::TileDestroyed { cell, .. } => {
                    info!("Frame {}: tile {} destroyed", event.frame, cell);
                }
                GameEventData::PlayerEliminated { victim_id, bomb_owner } => {
                    info!("Frame {}: {} eliminated by {}'s bomb", event.frame, victim_id, bomb_owner);
                }
                GameEventData::RoundFinished { winner_id, .. } => {
                    info!("Frame {}: round won by {}", event.frame, winner_id);
                }
                GameEventData::RoundRestarted { .. } => {}
            }
        }
    }

    info!("=== Round Results ===");
    let hash = session.arena().compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    for id in PlayerId::ALL {
        info!("{}: {} win(s)", id, match_state.wins(id));
    }
    info!("Total events: {}", total_events);

    info!("=== Verifying Determinism ===");
    let mut replay_match = MatchState::new();
    let (replayed, _) = replay_round(
        initial,
        &mut replay_match,
        session.recordings(),
        DEMO_FRAMES,
        FRAME_DURATION,
        FIXED_STEP_DURATION,
    );
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }

    // A finished round restarts on the restart key; otherwise force it
    let restarted = if match_state.is_paused() {
        let mut restart = InputFrame::new();
        restart.set_restart(true);
        session.set_input(PlayerId::One, restart);
        session.on_frame(&mut match_state, FRAME_DURATION).events
    } else {
        vec![session.restart_round(&mut match_state)]
    };
    for event in restarted {
        if let GameEventData::RoundRestarted { round } = event.data {
            info!("Round {} ready, {} bomb(s) pending", round, session.arena().bombs.len());
        }
    }

    Ok(())
}
