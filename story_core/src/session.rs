//! Story session - the composition root.
//!
//! Builds the navigator, dispatcher, progress store and parental gate once,
//! routes events between them and publishes every event to observers.
//! Nothing here returns an error to the caller: failures are logged and
//! the operation becomes a no-op.

use serde_json::json;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

use story_content::{Choice, MiniGameResult, PageId, Story, StoryCatalog, StoryId};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dispatcher::{MiniGameDispatcher, MiniGameInput, MiniGameOutcome};
use crate::events::{EventBus, StoryEvent, StoryObserver};
use crate::navigator::{ChoiceOutcome, StoryNavigator};
use crate::parental::{ParentalGate, ParentalSettings};
use crate::persistence::{KeyValueStore, LocalProfile, ProfileMirror, ProfileSync};
use crate::progress::ProgressStore;

pub struct StorySession {
    config: EngineConfig,
    catalog: StoryCatalog,
    navigator: StoryNavigator,
    dispatcher: MiniGameDispatcher,
    progress: ProgressStore,
    gate: ParentalGate,
    profile: LocalProfile,
    bus: EventBus,
    /// Page whose mini-game the dispatcher is running.
    mini_game_page: Option<PageId>,
}

impl StorySession {
    /// Wire up every service over shared storage and clock.
    pub fn new(
        config: EngineConfig,
        catalog: StoryCatalog,
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            navigator: StoryNavigator::new(&config),
            dispatcher: MiniGameDispatcher::with_builtin_games(&config, clock.clone()),
            progress: ProgressStore::load(store.clone(), config.perfect_time_threshold_secs),
            gate: ParentalGate::load(store.clone(), clock, &config),
            profile: LocalProfile::new(store),
            bus: EventBus::new(),
            mini_game_page: None,
            catalog,
            config,
        }
    }

    pub fn subscribe(&mut self, observer: impl StoryObserver + 'static) {
        self.bus.subscribe(observer);
    }

    /// Start a catalog story by id.
    pub fn start_story(&mut self, id: &StoryId) -> bool {
        match self.catalog.get(id).cloned() {
            Some(story) => self.start(story),
            None => {
                warn!(story = %id, "Story not found in catalog");
                false
            }
        }
    }

    /// Start a story that is not part of the catalog.
    pub fn start_custom_story(&mut self, story: Story) -> bool {
        self.start(story)
    }

    pub fn make_choice(&mut self, choice: &Choice) -> ChoiceOutcome {
        if !self.check_play_allowed() {
            return ChoiceOutcome::Ignored;
        }
        let outcome = self.navigator.make_choice(choice);
        self.pump();
        outcome
    }

    pub fn make_choice_at(&mut self, index: usize) -> ChoiceOutcome {
        if !self.check_play_allowed() {
            return ChoiceOutcome::Ignored;
        }
        let outcome = self.navigator.make_choice_at(index);
        self.pump();
        outcome
    }

    pub fn set_story_flag(&mut self, name: impl Into<String>, value: bool) {
        self.navigator.set_story_flag(name, value);
        self.pump();
    }

    pub fn get_story_flag(&self, name: &str) -> bool {
        self.navigator.get_story_flag(name)
    }

    pub fn progress(&self) -> f32 {
        self.navigator.progress()
    }

    /// Route player input to the active mini-game.
    pub fn submit_mini_game_input(&mut self, input: &MiniGameInput) -> Option<MiniGameResult> {
        let result = self.dispatcher.submit_input(input);
        self.pump();
        result
    }

    /// Report the outcome of a mini-game played in the host UI.
    pub fn finish_mini_game(&mut self, outcome: MiniGameOutcome, attempts: u32) -> Option<MiniGameResult> {
        let result = self.dispatcher.finish(outcome, attempts);
        self.pump();
        result
    }

    /// Advance time: play-time budget, page pacing and mini-game teardown.
    pub fn tick(&mut self, elapsed: Duration) {
        self.gate.record_play_time(elapsed);
        self.navigator.tick(elapsed);
        self.dispatcher.tick(elapsed);
        self.pump();
    }

    pub fn request_access(&mut self, pin: &str) -> bool {
        let granted = self.gate.request_access(pin);
        self.pump();
        granted
    }

    pub fn update_settings(&mut self, update: impl FnOnce(&mut ParentalSettings)) -> bool {
        let applied = self.gate.update_settings(update);
        self.pump();
        applied
    }

    pub fn change_pin(&mut self, new_pin: &str) -> bool {
        let changed = self.gate.change_pin(new_pin);
        self.pump();
        changed
    }

    pub fn lock_settings(&mut self) {
        self.gate.lock();
    }

    pub fn is_play_allowed(&self) -> bool {
        self.gate.is_play_allowed()
    }

    /// Mirror the local profile remotely, if the parent consented.
    pub fn mirror_profile<S: ProfileSync>(&self, mirror: &ProfileMirror<S>, name: &str) -> bool {
        if !self.gate.settings().data_collection_consent {
            debug!("No data collection consent; skipping profile sync");
            return false;
        }

        let stats = serde_json::to_value(self.progress.record()).unwrap_or_default();
        let gamestate = json!({
            "story": self.navigator.story().map(|s| s.id.as_str()),
            "page": self.navigator.current_page_id().map(|p| p.as_str()),
            "progress": self.navigator.progress(),
            "stats": stats,
        });
        mirror.push(&self.profile.snapshot(name, gamestate))
    }

    /// Restore a remotely mirrored profile into local storage and apply
    /// its settings.
    pub fn restore_profile<S: ProfileSync>(&mut self, mirror: &ProfileMirror<S>, uid: &str) -> bool {
        let Some(payload) = mirror.pull(uid) else {
            return false;
        };
        self.profile.restore(&payload);
        if !payload.settings.is_null() {
            self.gate.reload_settings();
        }
        self.pump();
        true
    }

    /// End the session: close any mini-game and persist everything.
    pub fn shutdown(&mut self) {
        self.mini_game_page = None;
        self.dispatcher.abort();
        self.pump();
        self.gate.save();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &StoryCatalog {
        &self.catalog
    }

    pub fn navigator(&self) -> &StoryNavigator {
        &self.navigator
    }

    pub fn dispatcher(&self) -> &MiniGameDispatcher {
        &self.dispatcher
    }

    /// For registering custom mini-games.
    pub fn dispatcher_mut(&mut self) -> &mut MiniGameDispatcher {
        &mut self.dispatcher
    }

    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn gate(&self) -> &ParentalGate {
        &self.gate
    }

    pub fn profile(&self) -> &LocalProfile {
        &self.profile
    }

    fn start(&mut self, story: Story) -> bool {
        if !self.check_play_allowed() {
            return false;
        }
        self.mini_game_page = None;
        self.dispatcher.abort();
        let started = self.navigator.start_story(story).is_ok();
        self.pump();
        started
    }

    fn check_play_allowed(&self) -> bool {
        if self.gate.is_play_allowed() {
            return true;
        }
        warn!("Daily play time used up; ignoring request");
        false
    }

    fn collect(&mut self, queue: &mut VecDeque<StoryEvent>) {
        queue.extend(self.navigator.drain_events());
        queue.extend(self.dispatcher.drain_events());
        queue.extend(self.gate.drain_events());
    }

    /// Publish pending events in order, routing each to the service that reacts to it.
    fn pump(&mut self) {
        let mut queue = VecDeque::new();
        self.collect(&mut queue);

        while let Some(event) = queue.pop_front() {
            self.bus.publish(&event);
            queue.extend(self.route(&event));
            self.collect(&mut queue);
        }
    }

    fn route(&mut self, event: &StoryEvent) -> Vec<StoryEvent> {
        match event {
            StoryEvent::PageChanged { .. } => {
                // Leaving a page ends its mini-game.
                if self.mini_game_page.is_some() {
                    self.dispatcher.abort();
                }
                Vec::new()
            }
            StoryEvent::MiniGameRequested { page, mini_game } => {
                if self
                    .dispatcher
                    .start_mini_game(mini_game.kind, &mini_game.config)
                {
                    self.mini_game_page = Some(page.clone());
                } else {
                    self.navigator.on_mini_game_closed();
                }
                Vec::new()
            }
            StoryEvent::MiniGameFinished { result } => {
                let unlocked = self.progress.record_result(result);
                self.profile.set_score(self.progress.record().total_score);
                if result.success() {
                    self.navigator
                        .set_story_flag(result.kind().completed_flag(), true);
                }
                unlocked
                    .into_iter()
                    .map(|achievement| StoryEvent::AchievementUnlocked { achievement })
                    .collect()
            }
            StoryEvent::MiniGameClosed { .. } => {
                let page = self.mini_game_page.take();
                if page.is_some() && page.as_ref() == self.navigator.current_page_id() {
                    self.navigator.on_mini_game_closed();
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}
