//! Mini-Game Dispatcher - launches the mini-game a page asks for and
//! reports how it went.
//!
//! At most one mini-game is active. A finished game stays on screen for
//! the configured display delay before it is torn down; starting another
//! game first force-ends the active one as incomplete.

pub mod games;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

use story_content::{MiniGameResult, MiniGameType};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::events::StoryEvent;
use crate::scheduler::{Scheduler, TimerHandle};

pub use games::{ExternalGame, MiniGame, MiniGameInput, MiniGameOutcome};

/// Builds a fresh game instance.
pub type GameFactory = Box<dyn Fn() -> Box<dyn MiniGame>>;

struct Registration {
    factory: GameFactory,
    enabled: bool,
}

struct ActiveGame {
    run: u64,
    kind: MiniGameType,
    game: Box<dyn MiniGame>,
    started_at: DateTime<Utc>,
    finished: Option<(MiniGameResult, TimerHandle)>,
}

pub struct MiniGameDispatcher {
    clock: Rc<dyn Clock>,
    registry: BTreeMap<MiniGameType, Registration>,
    active: Option<ActiveGame>,
    next_run: u64,
    teardown: Scheduler<u64>,
    result_display: Duration,
    outbox: Vec<StoryEvent>,
}

impl MiniGameDispatcher {
    /// Create a dispatcher with an empty registry.
    pub fn new(config: &EngineConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            registry: BTreeMap::new(),
            active: None,
            next_run: 0,
            teardown: Scheduler::new(),
            result_display: config.result_display(),
            outbox: Vec::new(),
        }
    }

    /// Create a dispatcher with every built-in game registered.
    ///
    /// Games driven entirely by the host UI are registered as
    /// [`ExternalGame`]s and finish through [`Self::finish`].
    pub fn with_builtin_games(config: &EngineConfig, clock: Rc<dyn Clock>) -> Self {
        let mut dispatcher = Self::new(config, clock);
        dispatcher.register(MiniGameType::Counting, || {
            Box::new(games::CountingGame::new())
        });
        dispatcher.register(MiniGameType::TicTacToe, || {
            Box::new(games::TicTacToeGame::new())
        });
        dispatcher.register(MiniGameType::Sudoku, || Box::new(games::SudokuGame::new()));
        dispatcher.register(MiniGameType::Coloring, || {
            Box::new(games::ColoringGame::new())
        });
        for kind in [
            MiniGameType::Matching,
            MiniGameType::Memory,
            MiniGameType::Drawing,
            MiniGameType::Maze,
            MiniGameType::Puzzle,
        ] {
            dispatcher.register(kind, move || Box::new(ExternalGame::new(kind)));
        }
        dispatcher
    }

    /// Register (or replace) the factory for a mini-game type.
    pub fn register<F>(&mut self, kind: MiniGameType, factory: F)
    where
        F: Fn() -> Box<dyn MiniGame> + 'static,
    {
        self.registry.insert(
            kind,
            Registration {
                factory: Box::new(factory),
                enabled: true,
            },
        );
    }

    /// Enable or disable a registered type. Returns `false` if unregistered.
    pub fn set_enabled(&mut self, kind: MiniGameType, enabled: bool) -> bool {
        match self.registry.get_mut(&kind) {
            Some(registration) => {
                registration.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_available(&self, kind: MiniGameType) -> bool {
        self.registry.get(&kind).is_some_and(|r| r.enabled)
    }

    /// Launch a mini-game, handing it `config` unparsed.
    ///
    /// The `none` sentinel and unavailable types are logged and ignored.
    /// Returns whether a game started.
    pub fn start_mini_game(&mut self, kind: MiniGameType, config: &str) -> bool {
        if kind.is_none() {
            warn!("Ignoring request to start the 'none' mini-game");
            return false;
        }

        let Some(registration) = self.registry.get(&kind).filter(|r| r.enabled) else {
            warn!(kind = %kind, "Mini-game is not available");
            return false;
        };
        let mut game = (registration.factory)();

        if self.active.is_some() {
            self.abort();
        }

        if let Err(e) = game.configure(config) {
            warn!(kind = %kind, error = %e, "Mini-game configuration rejected; using defaults");
        }

        self.next_run += 1;
        self.active = Some(ActiveGame {
            run: self.next_run,
            kind,
            game,
            started_at: self.clock.now(),
            finished: None,
        });

        debug!(kind = %kind, run = self.next_run, "Mini-game started");
        self.outbox.push(StoryEvent::MiniGameStarted { kind });
        true
    }

    /// Feed input to the active game. Returns the result if it just finished.
    pub fn submit_input(&mut self, input: &MiniGameInput) -> Option<MiniGameResult> {
        let active = self.playing_mut()?;
        let outcome = active.game.handle_input(input)?;
        let attempts = active.game.attempts();
        self.finish_active(outcome, attempts)
    }

    /// Finish the active game with an outcome reported by the host UI.
    pub fn finish(&mut self, outcome: MiniGameOutcome, attempts: u32) -> Option<MiniGameResult> {
        self.playing_mut()?;
        self.finish_active(outcome, attempts.max(1))
    }

    /// Force-end the active game as incomplete and tear it down now.
    pub fn abort(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        match active.finished {
            Some((_, handle)) => {
                self.teardown.cancel(handle);
            }
            None => {
                let result = MiniGameResult::abandoned(
                    active.kind,
                    self.elapsed_since(active.started_at),
                    active.game.attempts(),
                );
                debug!(kind = %active.kind, "Mini-game ended early");
                self.outbox.push(StoryEvent::MiniGameFinished { result });
            }
        }

        self.outbox
            .push(StoryEvent::MiniGameClosed { kind: active.kind });
    }

    /// Advance the teardown timer.
    pub fn tick(&mut self, elapsed: Duration) {
        for run in self.teardown.advance(elapsed) {
            if self.active.as_ref().is_some_and(|a| a.run == run) {
                if let Some(active) = self.active.take() {
                    debug!(kind = %active.kind, "Mini-game closed");
                    self.outbox
                        .push(StoryEvent::MiniGameClosed { kind: active.kind });
                }
            }
        }
    }

    pub fn active_kind(&self) -> Option<MiniGameType> {
        self.active.as_ref().map(|a| a.kind)
    }

    /// A game is running and has not finished yet.
    pub fn is_playing(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.finished.is_none())
    }

    /// The finished game's result while it is still on screen.
    pub fn displayed_result(&self) -> Option<&MiniGameResult> {
        self.active
            .as_ref()
            .and_then(|a| a.finished.as_ref())
            .map(|(result, _)| result)
    }

    pub fn drain_events(&mut self) -> Vec<StoryEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn playing_mut(&mut self) -> Option<&mut ActiveGame> {
        match self.active.as_mut() {
            Some(active) if active.finished.is_none() => Some(active),
            Some(_) => {
                debug!("Mini-game already finished; ignoring input");
                None
            }
            None => {
                warn!("No active mini-game");
                None
            }
        }
    }

    fn finish_active(&mut self, outcome: MiniGameOutcome, attempts: u32) -> Option<MiniGameResult> {
        let (run, kind, started_at) = self
            .active
            .as_ref()
            .map(|a| (a.run, a.kind, a.started_at))?;

        let result = MiniGameResult::finished(
            kind,
            outcome.success,
            outcome.score,
            self.elapsed_since(started_at),
            attempts,
        );
        info!(
            kind = %kind,
            success = result.success(),
            score = result.score(),
            attempts,
            "Mini-game finished"
        );

        let handle = self.teardown.schedule(self.result_display, run);
        if let Some(active) = self.active.as_mut() {
            active.finished = Some((result.clone(), handle));
        }
        self.outbox.push(StoryEvent::MiniGameFinished {
            result: result.clone(),
        });
        Some(result)
    }

    fn elapsed_since(&self, started_at: DateTime<Utc>) -> f32 {
        let elapsed = self.clock.now() - started_at;
        elapsed.num_milliseconds().max(0) as f32 / 1000.0
    }
}
