//! Simulation Loop
//!
//! The external driver calls two hooks: [`SimulationLoop::on_frame`] once
//! per rendered frame and [`SimulationLoop::on_fixed_step`] once per
//! physics step. Both are deterministic given the same inputs and the
//! same `dt` sequence.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::fixed::Fixed;
use crate::game::bomb::{detonate_bomb, pulse_bomb};
use crate::game::events::GameEvent;
use crate::game::explosion::{expire_blast, grow_blast, resolve_blast_hits};
use crate::game::input::{InputFrame, PlayerInputBuffer};
use crate::game::match_state::MatchState;
use crate::game::movement::{apply_inputs, update_movement};
use crate::game::placement::{request_placement, update_indicator};
use crate::game::scheduler::{FiredTimer, TimerTask};
use crate::game::state::{ArenaState, PlayerId};

/// Result of one hook invocation.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated during the call
    pub events: Vec<GameEvent>,
    /// Players eliminated during the call
    pub eliminated: Vec<PlayerId>,
    /// Winner, if this call finished the round
    pub round_winner: Option<PlayerId>,
}

impl TickResult {
    /// Did this call finish the round?
    pub fn round_finished(&self) -> bool {
        self.round_winner.is_some()
    }
}

/// Hooks an external driver invokes.
pub trait SimulationLoop {
    /// Per rendered frame: input, indicator, placement, timers, hits.
    fn on_frame(&mut self, match_state: &mut MatchState, dt: Fixed) -> TickResult;

    /// Per physics step: movement, then hits.
    fn on_fixed_step(&mut self, match_state: &mut MatchState, dt: Fixed) -> TickResult;
}

/// Run one fired timer task. Tasks whose entity is gone do nothing.
///
/// Repeating tasks get the timer's lateness so they stay on cadence.
pub fn run_timer_task(state: &mut ArenaState, timer: FiredTimer) {
    match timer.task {
        TimerTask::BombFuse(id) => {
            detonate_bomb(state, id);
        }
        TimerTask::BombPulse(id) => pulse_bomb(state, id, timer.overdue),
        TimerTask::BlastGrow(id) => grow_blast(state, id, timer.overdue),
        TimerTask::BlastExpire(id) => expire_blast(state, id),
    }
}

/// Resolve blast hits and feed them to the match controller.
fn process_blast_hits(state: &mut ArenaState, match_state: &mut MatchState, result: &mut TickResult) {
    if match_state.is_paused() {
        return;
    }

    for victim in resolve_blast_hits(state) {
        result.eliminated.push(victim);

        if let Some(winner) = match_state.record_elimination(victim) {
            state.push_event(GameEvent::round_finished(state.frame, match_state.round(), winner));
            state.freeze_players();
            result.round_winner = Some(winner);
        }
    }
}

/// Tear down the round and start the next one.
///
/// All timers are cancelled before anything is rebuilt, so a bomb that
/// was mid-fuse can never explode into the new round.
pub fn restart_round(state: &mut ArenaState, match_state: &mut MatchState) -> GameEvent {
    state.reset_round();
    match_state.begin_next_round();

    info!(round = match_state.round(), "round restarted");
    GameEvent::round_restarted(match_state.round())
}

/// One arena plus the input latched for each player.
#[derive(Clone, Debug)]
pub struct ArenaSession {
    arena: ArenaState,
    inputs: BTreeMap<PlayerId, InputFrame>,
    recordings: BTreeMap<PlayerId, PlayerInputBuffer>,
}

impl ArenaSession {
    /// Wrap a freshly built arena.
    pub fn new(arena: ArenaState) -> Self {
        let recordings = arena
            .players
            .keys()
            .map(|id| (*id, PlayerInputBuffer::new(*id)))
            .collect();
        Self {
            arena,
            inputs: BTreeMap::new(),
            recordings,
        }
    }

    /// The arena being simulated.
    pub fn arena(&self) -> &ArenaState {
        &self.arena
    }

    /// Mutable access for drivers and tests.
    pub fn arena_mut(&mut self) -> &mut ArenaState {
        &mut self.arena
    }

    /// Latch input for a player. Place-bomb and restart are consumed by
    /// the next frame.
    pub fn set_input(&mut self, id: PlayerId, input: InputFrame) {
        self.inputs.insert(id, input);
    }

    /// Inputs recorded this round.
    pub fn recordings(&self) -> &BTreeMap<PlayerId, PlayerInputBuffer> {
        &self.recordings
    }

    /// Restart the round and clear latched and recorded input.
    pub fn restart_round(&mut self, match_state: &mut MatchState) -> GameEvent {
        let event = restart_round(&mut self.arena, match_state);
        self.inputs.clear();
        for buffer in self.recordings.values_mut() {
            *buffer = PlayerInputBuffer::new(buffer.player_id);
        }
        event
    }
}

impl SimulationLoop for ArenaSession {
    fn on_frame(&mut self, match_state: &mut MatchState, dt: Fixed) -> TickResult {
        let mut result = TickResult::default();

        // Restart is only honoured once the round is over
        let restart = match_state.is_paused() && self.inputs.values().any(|i| i.restart_pressed());
        if restart {
            let event = self.restart_round(match_state);
            self.arena.push_event(event);
        }

        let state = &mut self.arena;

        // 0. Advance frame counter and record input
        state.frame += 1;
        for (id, buffer) in self.recordings.iter_mut() {
            let input = self.inputs.get(id).copied().unwrap_or_default();
            buffer.record(state.frame, input);
        }

        let paused = match_state.is_paused();

        // 1. Input -> velocity and facing
        if !paused {
            apply_inputs(state, &self.inputs);
        }

        if !paused {
            for id in PlayerId::ALL {
                // 2. Indicator preview
                update_indicator(state, id);

                // 3. Placement request
                let wants_bomb = self.inputs.get(&id).is_some_and(|i| i.place_pressed());
                if wants_bomb {
                    request_placement(state, id);
                }
            }
        }
        for input in self.inputs.values_mut() {
            input.set_place(false);
            input.set_restart(false);
        }

        // 4. Timers, in expiry order
        let fired = state.scheduler.advance(dt);
        if !fired.is_empty() {
            debug!(frame = state.frame, count = fired.len(), "timers fired");
        }
        for timer in fired {
            run_timer_task(state, timer);
        }

        // 5-6. Hits and round outcome
        process_blast_hits(state, match_state, &mut result);

        result.events = state.take_events();
        result
    }

    fn on_fixed_step(&mut self, match_state: &mut MatchState, dt: Fixed) -> TickResult {
        let mut result = TickResult::default();
        let state = &mut self.arena;

        if !match_state.is_paused() {
            update_movement(state, dt);
        }
        process_blast_hits(state, match_state, &mut result);

        result.events = state.take_events();
        result
    }
}

/// Re-simulate a round from recorded inputs.
///
/// Each frame runs `on_frame(frame_dt)` followed by
/// `on_fixed_step(fixed_dt)`. Returns the final arena and every event.
pub fn replay_round(
    initial: ArenaState,
    match_state: &mut MatchState,
    recordings: &BTreeMap<PlayerId, PlayerInputBuffer>,
    frames: u32,
    frame_dt: Fixed,
    fixed_dt: Fixed,
) -> (ArenaState, Vec<GameEvent>) {
    let mut session = ArenaSession::new(initial);
    let mut all_events = Vec::new();

    for _ in 0..frames {
        let next = session.arena.frame + 1;
        for (id, buffer) in recordings {
            session.set_input(*id, buffer.input_at(next));
        }

        all_events.extend(session.on_frame(match_state, frame_dt).events);
        all_events.extend(session.on_fixed_step(match_state, fixed_dt).events);
    }

    (session.arena, all_events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::Cell;
    use crate::core::fixed::{FIXED_STEP_DURATION, FRAME_DURATION};
    use crate::game::events::GameEventData;
    use crate::game::grid::Tile;
    use crate::game::state::test_arena;

    const MAP: &str = "\
#######
#1....#
#.#.#.#
#....2#
#######
";

    fn session() -> ArenaSession {
        ArenaSession::new(test_arena(MAP))
    }

    fn run_frames(session: &mut ArenaSession, match_state: &mut MatchState, n: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(session.on_frame(match_state, FRAME_DURATION).events);
            events.extend(session.on_fixed_step(match_state, FIXED_STEP_DURATION).events);
        }
        events
    }

    fn place_at(session: &mut ArenaSession, match_state: &mut MatchState, id: PlayerId, cell: Cell) -> TickResult {
        session.arena_mut().player_mut(id).unwrap().position = cell.to_world();
        let mut input = InputFrame::new();
        input.set_place(true);
        session.set_input(id, input);
        session.on_frame(match_state, FRAME_DURATION)
    }

    fn teleport(session: &mut ArenaSession, id: PlayerId, cell: Cell) {
        session.arena_mut().player_mut(id).unwrap().position = cell.to_world();
    }

    fn count_eliminations(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::PlayerEliminated { .. }))
            .count()
    }

    fn count_explosions(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::BombExploded { .. }))
            .count()
    }

    #[test]
    fn test_limit_one_through_fuse() {
        let mut session = session();
        let mut match_state = MatchState::new();

        let result = place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        assert!(result.events.iter().any(|e| matches!(e.data, GameEventData::BombPlaced { .. })));

        let result = place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(2, 3));
        assert!(result.events.is_empty(), "second bomb refused");
        assert_eq!(session.arena().controller(PlayerId::One).unwrap().active_count(), 1);

        teleport(&mut session, PlayerId::One, Cell::new(5, 3));
        let events = run_frames(&mut session, &mut match_state, 200);
        assert_eq!(count_explosions(&events), 1);
        assert_eq!(session.arena().controller(PlayerId::One).unwrap().active_count(), 0);

        let result = place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(5, 3));
        assert!(result.events.iter().any(|e| matches!(e.data, GameEventData::BombPlaced { .. })));
    }

    #[test]
    fn test_place_is_one_shot() {
        let mut session = session();
        let mut match_state = MatchState::new();
        let mut controller = session.arena().controller_config(PlayerId::One).unwrap().clone();
        controller.bomb.bomb_limit = 3;
        session.arena_mut().controllers.insert(
            PlayerId::One,
            crate::game::placement::BombController::new(controller),
        );

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        teleport(&mut session, PlayerId::One, Cell::new(2, 3));
        run_frames(&mut session, &mut match_state, 5);
        assert_eq!(session.arena().controller(PlayerId::One).unwrap().active_count(), 1);
    }

    #[test]
    fn test_both_players_eliminated_one_win() {
        let mut session = session();
        let mut match_state = MatchState::new();

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(3, 3));
        teleport(&mut session, PlayerId::One, Cell::new(2, 3));
        teleport(&mut session, PlayerId::Two, Cell::new(4, 3));

        let events = run_frames(&mut session, &mut match_state, 200);

        assert_eq!(count_eliminations(&events), 2);
        let finished: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::RoundFinished { .. }))
            .collect();
        assert_eq!(finished.len(), 1);

        // Player_1 is hit by the lower blast id, so Player_2 is credited
        assert_eq!(match_state.wins(PlayerId::Two), 1);
        assert_eq!(match_state.wins(PlayerId::One), 0);
        assert!(match_state.is_paused());
    }

    #[test]
    fn test_events_arrive_in_causal_order() {
        let mut session = session();
        let mut match_state = MatchState::new();

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(3, 3));
        teleport(&mut session, PlayerId::One, Cell::new(1, 1));
        teleport(&mut session, PlayerId::Two, Cell::new(3, 2));
        let events = run_frames(&mut session, &mut match_state, 200);

        let position = |pred: fn(&GameEventData) -> bool| events.iter().position(|e| pred(&e.data)).unwrap();
        let exploded = position(|d| matches!(d, GameEventData::BombExploded { .. }));
        let eliminated = position(|d| matches!(d, GameEventData::PlayerEliminated { .. }));
        let finished = position(|d| matches!(d, GameEventData::RoundFinished { .. }));
        assert!(exploded < eliminated);
        assert!(eliminated < finished);
    }

    #[test]
    fn test_restart_mid_fuse_no_stale_explosion() {
        let mut session = session();
        let mut match_state = MatchState::new();

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        run_frames(&mut session, &mut match_state, 60);
        assert_eq!(session.arena().bombs.len(), 1);

        let event = session.restart_round(&mut match_state);
        assert_eq!(event.data, GameEventData::RoundRestarted { round: 2 });
        assert_eq!(session.arena().controller(PlayerId::One).unwrap().active_count(), 0);
        assert!(session.arena().scheduler.is_empty());

        let events = run_frames(&mut session, &mut match_state, 300);
        assert_eq!(count_explosions(&events), 0);
        assert!(session.arena().bombs.is_empty());
        assert!(session.arena().blasts.is_empty());
    }

    #[test]
    fn test_fuse_reaches_zero_once() {
        let mut session = session();
        let mut match_state = MatchState::new();

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        teleport(&mut session, PlayerId::One, Cell::new(5, 3));
        let bomb = *session.arena().bombs.keys().next().unwrap();

        let mut last = session.arena().fuse_remaining(bomb).unwrap();
        let mut explosions = 0;
        let mut gone = false;
        for _ in 0..300 {
            let result = session.on_frame(&mut match_state, FRAME_DURATION);
            explosions += count_explosions(&result.events);

            match session.arena().fuse_remaining(bomb) {
                Some(remaining) => {
                    assert!(!gone, "fuse came back");
                    assert!(remaining < last);
                    last = remaining;
                }
                None => {
                    gone = true;
                    assert!(!session.arena().controller(PlayerId::One).unwrap().is_active(bomb));
                }
            }
        }
        assert!(gone);
        assert_eq!(explosions, 1);
    }

    #[test]
    fn test_players_outside_blast_survive() {
        let mut session = session();
        let mut match_state = MatchState::new();

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        teleport(&mut session, PlayerId::One, Cell::new(5, 3));

        let events = run_frames(&mut session, &mut match_state, 300);
        assert_eq!(count_explosions(&events), 1);
        assert_eq!(count_eliminations(&events), 0);
        assert!(!match_state.is_paused());
    }

    #[test]
    fn test_walking_into_live_blast_eliminates_once() {
        let mut session = session();
        let mut match_state = MatchState::new();

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        teleport(&mut session, PlayerId::One, Cell::new(5, 3));

        // Run until the explosion
        let mut exploded = false;
        for _ in 0..300 {
            let result = session.on_frame(&mut match_state, FRAME_DURATION);
            if count_explosions(&result.events) > 0 {
                exploded = true;
                break;
            }
        }
        assert!(exploded);

        // Player_2 steps into the down arm while it is still alive
        teleport(&mut session, PlayerId::Two, Cell::new(1, 2));
        let result = session.on_fixed_step(&mut match_state, FIXED_STEP_DURATION);
        assert_eq!(result.eliminated, vec![PlayerId::Two]);
        assert_eq!(result.round_winner, Some(PlayerId::One));

        let events = run_frames(&mut session, &mut match_state, 100);
        assert_eq!(count_eliminations(&events), 0);
        assert_eq!(match_state.wins(PlayerId::One), 1);
    }

    #[test]
    fn test_paused_round_ignores_input() {
        let mut session = session();
        let mut match_state = MatchState::new();
        match_state.record_elimination(PlayerId::Two);

        session.set_input(PlayerId::One, InputFrame::with_axes(1, 0));
        let start = session.arena().player(PlayerId::One).unwrap().position;
        run_frames(&mut session, &mut match_state, 10);

        assert_eq!(session.arena().player(PlayerId::One).unwrap().position, start);

        let result = place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_tallies_survive_restart() {
        let mut session = session();
        let mut match_state = MatchState::new();

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(3, 3));
        teleport(&mut session, PlayerId::One, Cell::new(1, 1));
        teleport(&mut session, PlayerId::Two, Cell::new(3, 2));
        run_frames(&mut session, &mut match_state, 200);
        assert_eq!(match_state.wins(PlayerId::One), 1);

        session.restart_round(&mut match_state);
        assert_eq!(match_state.wins(PlayerId::One), 1);
        assert!(!match_state.is_paused());
        assert!(session.arena().player(PlayerId::Two).unwrap().alive);
    }

    #[test]
    fn test_replay_determinism() {
        let mut session = session();
        let mut match_state = MatchState::new();

        // Player_1 drops a bomb and walks right; Player_2 walks left
        let mut place = InputFrame::new();
        place.set_place(true);
        session.set_input(PlayerId::One, place);
        session.set_input(PlayerId::Two, InputFrame::with_axes(-1, 0));
        run_frames(&mut session, &mut match_state, 1);

        session.set_input(PlayerId::One, InputFrame::with_axes(1, 0));
        run_frames(&mut session, &mut match_state, 30);
        session.set_input(PlayerId::One, InputFrame::new());
        session.set_input(PlayerId::Two, InputFrame::new());
        run_frames(&mut session, &mut match_state, 220);

        let recordings = session.recordings().clone();
        let frames = session.arena().frame;

        let mut replay_match = MatchState::new();
        let (replayed, _) = replay_round(
            test_arena(MAP),
            &mut replay_match,
            &recordings,
            frames,
            FRAME_DURATION,
            FIXED_STEP_DURATION,
        );

        assert_eq!(replayed.frame, frames);
        assert_eq!(replayed.compute_hash(), session.arena().compute_hash());
        assert_eq!(replay_match, match_state);
    }

    const DESTRUCTIBLE_MAP: &str = "\
#######
#1.+..#
#.#.#.#
#....2#
#######
";

    fn run_until_explosion(session: &mut ArenaSession, match_state: &mut MatchState) -> bool {
        for _ in 0..300 {
            let result = session.on_frame(match_state, FRAME_DURATION);
            if count_explosions(&result.events) > 0 {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_blast_reaches_full_size_before_expiry() {
        let mut session = session();
        let mut match_state = MatchState::new();

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        teleport(&mut session, PlayerId::One, Cell::new(5, 3));
        let steps = session.arena().bomb_config(PlayerId::One).unwrap().blast_steps;

        let mut max_step = 0;
        let mut seen_blast = false;
        for _ in 0..400 {
            session.on_frame(&mut match_state, FRAME_DURATION);
            for blast in session.arena().blasts.values() {
                seen_blast = true;
                max_step = max_step.max(blast.step);
            }
        }

        assert!(seen_blast);
        assert_eq!(max_step, steps);
        assert!(session.arena().blasts.is_empty());
    }

    #[test]
    fn test_restart_mid_blast_cancels_everything() {
        let mut session = ArenaSession::new(test_arena(DESTRUCTIBLE_MAP));
        let mut match_state = MatchState::new();
        let crate_cell = Cell::new(3, 3);

        place_at(&mut session, &mut match_state, PlayerId::One, Cell::new(1, 3));
        teleport(&mut session, PlayerId::One, Cell::new(5, 3));
        assert!(run_until_explosion(&mut session, &mut match_state));

        assert!(!session.arena().blasts.is_empty());
        assert_eq!(session.arena().grid.tile(crate_cell), Tile::Empty);

        session.restart_round(&mut match_state);
        assert!(session.arena().blasts.is_empty());
        assert!(session.arena().scheduler.is_empty());
        assert_eq!(session.arena().grid.tile(crate_cell), Tile::Destructible);

        // Stand where the right arm was
        teleport(&mut session, PlayerId::Two, Cell::new(2, 3));
        let events = run_frames(&mut session, &mut match_state, 200);
        assert_eq!(count_eliminations(&events), 0);
        assert_eq!(count_explosions(&events), 0);
        assert!(session.arena().player(PlayerId::Two).unwrap().alive);
        assert!(!match_state.is_paused());
    }

    #[test]
    fn test_restart_input_between_rounds() {
        let mut session = session();
        let mut match_state = MatchState::new();

        let mut restart = InputFrame::new();
        restart.set_restart(true);

        // Ignored while the round is running
        session.set_input(PlayerId::One, restart);
        let result = session.on_frame(&mut match_state, FRAME_DURATION);
        assert!(result.events.is_empty());
        assert_eq!(match_state.round(), 1);

        match_state.record_elimination(PlayerId::Two);
        session.arena_mut().eliminate_player(PlayerId::Two, Some(PlayerId::One));

        session.set_input(PlayerId::Two, restart);
        let result = session.on_frame(&mut match_state, FRAME_DURATION);
        assert!(result
            .events
            .iter()
            .any(|e| e.data == GameEventData::RoundRestarted { round: 2 }));
        assert!(!match_state.is_paused());
        assert_eq!(match_state.wins(PlayerId::One), 1);
        assert!(session.arena().player(PlayerId::Two).unwrap().alive);
        assert_eq!(session.arena().frame, 1);
    }
}
