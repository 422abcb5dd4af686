//! Story events and the observer bus that delivers them.
//!
//! Components buffer events in their own outbox; the session drains those
//! outboxes and publishes every event to subscribers synchronously, in order.

use std::cell::RefCell;
use std::rc::Rc;

use story_content::{Choice, MiniGameRef, MiniGameResult, MiniGameType, Page, PageId, StoryId};

use crate::progress::Achievement;

/// Notifications emitted while a story is played.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryEvent {
    StoryStarted {
        story: StoryId,
        theme_audio: Option<String>,
    },
    PageChanged {
        story: StoryId,
        page: Page,
    },
    ChoicesPresented {
        page: PageId,
        choices: Vec<Choice>,
    },
    MiniGameRequested {
        page: PageId,
        mini_game: MiniGameRef,
    },
    MiniGameStarted {
        kind: MiniGameType,
    },
    MiniGameFinished {
        result: MiniGameResult,
    },
    MiniGameClosed {
        kind: MiniGameType,
    },
    StoryFlagChanged {
        name: String,
        value: bool,
    },
    StoryCompleted {
        story: StoryId,
    },
    AchievementUnlocked {
        achievement: Achievement,
    },
    PinRequested,
    AccessGranted,
    AccessDenied,
    SettingsChanged,
    PlayTimeWarning {
        minutes_played: u32,
        limit_minutes: u32,
    },
    PlayTimeExceeded {
        minutes_played: u32,
        limit_minutes: u32,
    },
}

impl StoryEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            StoryEvent::StoryStarted { .. } => "story_started",
            StoryEvent::PageChanged { .. } => "page_changed",
            StoryEvent::ChoicesPresented { .. } => "choices_presented",
            StoryEvent::MiniGameRequested { .. } => "mini_game_requested",
            StoryEvent::MiniGameStarted { .. } => "mini_game_started",
            StoryEvent::MiniGameFinished { .. } => "mini_game_finished",
            StoryEvent::MiniGameClosed { .. } => "mini_game_closed",
            StoryEvent::StoryFlagChanged { .. } => "story_flag_changed",
            StoryEvent::StoryCompleted { .. } => "story_completed",
            StoryEvent::AchievementUnlocked { .. } => "achievement_unlocked",
            StoryEvent::PinRequested => "pin_requested",
            StoryEvent::AccessGranted => "access_granted",
            StoryEvent::AccessDenied => "access_denied",
            StoryEvent::SettingsChanged => "settings_changed",
            StoryEvent::PlayTimeWarning { .. } => "play_time_warning",
            StoryEvent::PlayTimeExceeded { .. } => "play_time_exceeded",
        }
    }
}

/// Receives every published event.
pub trait StoryObserver {
    fn notify(&mut self, event: &StoryEvent);
}

/// Adapts a closure into an observer.
pub struct FnObserver<F>(pub F);

impl<F> StoryObserver for FnObserver<F>
where
    F: FnMut(&StoryEvent),
{
    fn notify(&mut self, event: &StoryEvent) {
        (self.0)(event)
    }
}

/// Synchronous fan-out to subscribed observers.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn StoryObserver>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl StoryObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn publish(&mut self, event: &StoryEvent) {
        for observer in &mut self.observers {
            observer.notify(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

/// Shared, clonable record of published events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<StoryEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoryEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<StoryEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of recorded events matching a predicate.
    pub fn count(&self, predicate: impl Fn(&StoryEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| predicate(e)).count()
    }
}

impl StoryObserver for EventLog {
    fn notify(&mut self, event: &StoryEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
