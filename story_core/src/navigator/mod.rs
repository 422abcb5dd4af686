//! Story Navigator - walks a story page by page.
//!
//! The navigator owns the active story, the current page, the story flags
//! and the visited-page set. Presentation delays are scheduled on an
//! internal [`Scheduler`]; each delayed task remembers the page visit it
//! was created for and is dropped if that visit is no longer current.

mod state;

pub use state::*;

use std::time::Duration;
use tracing::{debug, info, warn};

use story_content::{Choice, Page, PageId, Story, StoryFlags, VisitedPages};

use crate::config::EngineConfig;
use crate::error::NavigationError;
use crate::events::StoryEvent;
use crate::scheduler::{Scheduler, TimerHandle};

/// Result of selecting a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// The target page is now current.
    Navigated(PageId),
    /// The target did not resolve, so the story ended.
    StoryCompleted,
    /// The choice is locked or its flags are not all set.
    Locked,
    /// No such choice, or no story is playing.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
enum PageTask {
    PresentChoices { page: PageId, visit: u64 },
    LaunchMiniGame { page: PageId, visit: u64 },
}

/// The branching story state machine.
pub struct StoryNavigator {
    story: Option<Story>,
    current: Option<PageId>,
    flags: StoryFlags,
    visited: VisitedPages,
    presented: Vec<Choice>,
    completed: bool,

    /// Incremented on every page visit; stale tasks carry an older value.
    visit: u64,
    timers: Scheduler<PageTask>,
    choices_timer: Option<TimerHandle>,
    mini_game_timer: Option<TimerHandle>,

    choice_delay: Duration,
    mini_game_delay: Duration,
    complete_on_terminal_page: bool,

    outbox: Vec<StoryEvent>,
}

impl StoryNavigator {
    /// Create a navigator with pacing taken from `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            story: None,
            current: None,
            flags: StoryFlags::new(),
            visited: VisitedPages::new(),
            presented: Vec::new(),
            completed: false,
            visit: 0,
            timers: Scheduler::new(),
            choices_timer: None,
            mini_game_timer: None,
            choice_delay: config.choice_delay(),
            mini_game_delay: config.mini_game_delay(),
            complete_on_terminal_page: config.complete_on_terminal_page,
            outbox: Vec::new(),
        }
    }

    /// Begin a new playthrough on the story's first page.
    ///
    /// Flags and visited pages are cleared before the first page activates.
    pub fn start_story(&mut self, story: Story) -> Result<(), NavigationError> {
        let first = match story.first_page() {
            Some(page) => page.id.clone(),
            None => {
                warn!(story = %story.id, "Cannot start a story without pages");
                return Err(NavigationError::EmptyStory(story.id));
            }
        };

        self.cancel_page_timers();
        self.flags.clear();
        self.visited.clear();
        self.presented.clear();
        self.completed = false;
        self.current = None;

        info!(story = %story.id, title = %story.title, "Starting story");
        self.outbox.push(StoryEvent::StoryStarted {
            story: story.id.clone(),
            theme_audio: story.theme_audio.clone(),
        });
        self.story = Some(story);

        self.navigate_to_page(&first);
        Ok(())
    }

    /// Make `page_id` the current page.
    ///
    /// Unknown pages are logged and ignored. Returns whether the page changed.
    pub fn navigate_to_page(&mut self, page_id: &PageId) -> bool {
        if self.completed {
            warn!(page = %page_id, "Story already complete; ignoring navigation");
            return false;
        }

        let Some(story) = self.story.as_ref() else {
            warn!(page = %page_id, "No story loaded; ignoring navigation");
            return false;
        };
        let Some(page) = story.page(page_id).cloned() else {
            warn!(story = %story.id, page = %page_id, "Page not found; ignoring navigation");
            return false;
        };
        let story_id = story.id.clone();

        self.cancel_page_timers();
        self.visit += 1;
        self.visited.insert(page.id.clone());
        self.presented.clear();
        self.current = Some(page.id.clone());

        debug!(story = %story_id, page = %page.id, "Page changed");
        self.outbox.push(StoryEvent::PageChanged {
            story: story_id,
            page: page.clone(),
        });

        if page.has_choices() {
            self.choices_timer = Some(self.timers.schedule(
                self.choice_delay,
                PageTask::PresentChoices {
                    page: page.id.clone(),
                    visit: self.visit,
                },
            ));
        }

        if page.active_mini_game().is_some() {
            self.mini_game_timer = Some(self.timers.schedule(
                self.mini_game_delay,
                PageTask::LaunchMiniGame {
                    page: page.id.clone(),
                    visit: self.visit,
                },
            ));
        }

        if page.is_terminal() && self.complete_on_terminal_page {
            self.complete_story();
        }

        true
    }

    /// Select a choice. Locked choices are ignored; a target that does not
    /// resolve ends the story.
    pub fn make_choice(&mut self, choice: &Choice) -> ChoiceOutcome {
        if self.completed || self.story.is_none() {
            warn!(choice = %choice.text, "No story playing; ignoring choice");
            return ChoiceOutcome::Ignored;
        }

        if !choice.is_available(&self.flags) {
            debug!(choice = %choice.text, "Choice is locked");
            return ChoiceOutcome::Locked;
        }

        let resolves = self
            .story
            .as_ref()
            .is_some_and(|story| story.contains_page(&choice.target));

        if resolves {
            self.navigate_to_page(&choice.target);
            ChoiceOutcome::Navigated(choice.target.clone())
        } else {
            debug!(target = %choice.target, "Choice target not found; story ends");
            self.complete_story();
            ChoiceOutcome::StoryCompleted
        }
    }

    /// Select one of the most recently presented choices by position.
    pub fn make_choice_at(&mut self, index: usize) -> ChoiceOutcome {
        match self.presented.get(index).cloned() {
            Some(choice) => self.make_choice(&choice),
            None => {
                warn!(index, presented = self.presented.len(), "No presented choice at index");
                ChoiceOutcome::Ignored
            }
        }
    }

    pub fn set_story_flag(&mut self, name: impl Into<String>, value: bool) {
        let name = name.into();
        let previous = self.flags.set(name.clone(), value);
        if previous != value {
            debug!(flag = %name, value, "Story flag changed");
            self.outbox.push(StoryEvent::StoryFlagChanged { name, value });
        }
    }

    pub fn get_story_flag(&self, name: &str) -> bool {
        self.flags.get(name)
    }

    /// Fraction of the story's pages visited in this playthrough.
    pub fn progress(&self) -> f32 {
        match &self.story {
            Some(story) => self.visited.coverage(story.total_pages()),
            None => 0.0,
        }
    }

    /// Advance presentation timers and act on the tasks that came due.
    pub fn tick(&mut self, elapsed: Duration) {
        for task in self.timers.advance(elapsed) {
            match task {
                PageTask::PresentChoices { page, visit } => {
                    self.choices_timer = None;
                    if self.is_current_visit(&page, visit) {
                        self.present_choices();
                    }
                }
                PageTask::LaunchMiniGame { page, visit } => {
                    self.mini_game_timer = None;
                    if !self.is_current_visit(&page, visit) {
                        continue;
                    }
                    if let Some(mini_game) = self
                        .current_page()
                        .and_then(|p| p.active_mini_game())
                        .cloned()
                    {
                        self.outbox
                            .push(StoryEvent::MiniGameRequested { page, mini_game });
                    }
                }
            }
        }
    }

    /// Present the current page's choices again, e.g. after flags changed.
    pub fn refresh_choices(&mut self) {
        if self.completed || self.choices_timer.is_some() {
            return;
        }
        if self.current_page().is_some_and(|p| p.has_choices()) {
            self.present_choices();
        }
    }

    /// The current page's mini-game has been torn down.
    ///
    /// A mini-game page without choices has nowhere else to go, so the
    /// story ends there.
    pub fn on_mini_game_closed(&mut self) {
        let Some(page) = self.current_page() else {
            return;
        };
        if page.has_choices() {
            self.refresh_choices();
        } else if self.complete_on_terminal_page {
            self.complete_story();
        }
    }

    pub fn state(&self) -> NavigatorState {
        if self.story.is_none() {
            NavigatorState::NoStory
        } else if self.completed {
            NavigatorState::StoryComplete
        } else if self.mini_game_timer.is_some() {
            NavigatorState::MiniGamePending
        } else if self.choices_timer.is_some() {
            NavigatorState::ChoicesPending
        } else {
            NavigatorState::PageActive
        }
    }

    pub fn is_choices_pending(&self) -> bool {
        self.choices_timer.is_some()
    }

    pub fn is_mini_game_pending(&self) -> bool {
        self.mini_game_timer.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    pub fn current_page(&self) -> Option<&Page> {
        let id = self.current.as_ref()?;
        self.story.as_ref()?.page(id)
    }

    pub fn current_page_id(&self) -> Option<&PageId> {
        self.current.as_ref()
    }

    /// Choices from the most recent presentation.
    pub fn available_choices(&self) -> &[Choice] {
        &self.presented
    }

    pub fn story_flags(&self) -> &StoryFlags {
        &self.flags
    }

    pub fn visited_pages(&self) -> &VisitedPages {
        &self.visited
    }

    /// Take the events buffered since the last drain.
    pub fn drain_events(&mut self) -> Vec<StoryEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn is_current_visit(&self, page: &PageId, visit: u64) -> bool {
        visit == self.visit && self.current.as_ref() == Some(page) && !self.completed
    }

    fn present_choices(&mut self) {
        let Some(page) = self.current_page() else {
            return;
        };
        let page_id = page.id.clone();
        let choices = page.available_choices(&self.flags);

        debug!(page = %page_id, count = choices.len(), "Presenting choices");
        self.presented = choices.clone();
        self.outbox.push(StoryEvent::ChoicesPresented {
            page: page_id,
            choices,
        });
    }

    fn cancel_page_timers(&mut self) {
        if let Some(handle) = self.choices_timer.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.mini_game_timer.take() {
            self.timers.cancel(handle);
        }
    }

    fn complete_story(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.cancel_page_timers();

        if let Some(story) = &self.story {
            info!(story = %story.id, progress = self.progress(), "Story completed");
            self.outbox.push(StoryEvent::StoryCompleted {
                story: story.id.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_content::MiniGameType;

    const CHOICE_DELAY: Duration = Duration::from_millis(1000);

    fn navigator() -> StoryNavigator {
        StoryNavigator::new(&EngineConfig::default())
    }

    /// A(choices -> B, C), B(choices -> D), C(no choices).
    fn scenario_story() -> Story {
        Story::new("walk", "A Short Walk")
            .with_page(
                Page::new("A", "Start")
                    .with_choice(Choice::new("To B", "B"))
                    .with_choice(Choice::new("To C", "C")),
            )
            .with_page(Page::new("B", "Middle").with_choice(Choice::new("To D", "D")))
            .with_page(Page::new("C", "Side"))
    }

    fn count_completed(events: &[StoryEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, StoryEvent::StoryCompleted { .. }))
            .count()
    }

    fn presented(events: &[StoryEvent]) -> Vec<Vec<String>> {
        events
            .iter()
            .filter_map(|e| match e {
                StoryEvent::ChoicesPresented { choices, .. } => {
                    Some(choices.iter().map(|c| c.text.clone()).collect())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_unresolvable_choice_completes_story_once() {
        let mut nav = navigator();
        nav.start_story(scenario_story()).unwrap();
        nav.tick(CHOICE_DELAY);

        assert_eq!(
            nav.make_choice_at(0),
            ChoiceOutcome::Navigated(PageId::from("B"))
        );
        nav.tick(CHOICE_DELAY);

        assert_eq!(nav.make_choice_at(0), ChoiceOutcome::StoryCompleted);
        assert_eq!(nav.make_choice(&Choice::new("To D", "D")), ChoiceOutcome::Ignored);

        let events = nav.drain_events();
        assert_eq!(count_completed(&events), 1);
        assert_eq!(nav.current_page_id(), Some(&PageId::from("B")));
        assert_eq!(nav.state(), NavigatorState::StoryComplete);
    }

    #[test]
    fn test_start_story_resets_session_state() {
        let mut nav = navigator();
        nav.start_story(scenario_story()).unwrap();
        nav.set_story_flag("lantern", true);
        nav.navigate_to_page(&PageId::from("B"));
        assert_eq!(nav.visited_pages().len(), 2);

        nav.start_story(scenario_story()).unwrap();
        assert!(!nav.get_story_flag("lantern"));
        assert!(nav.story_flags().is_empty());
        assert_eq!(nav.visited_pages().len(), 1);
        assert_eq!(nav.current_page_id(), Some(&PageId::from("A")));
    }

    #[test]
    fn test_empty_story_fails() {
        let mut nav = navigator();
        let result = nav.start_story(Story::new("empty", "Empty"));
        assert!(matches!(result, Err(NavigationError::EmptyStory(_))));
        assert_eq!(nav.state(), NavigatorState::NoStory);
    }

    #[test]
    fn test_locked_choice_never_presented() {
        let story = Story::new("s", "S")
            .with_page(
                Page::new("a", "A")
                    .with_choice(Choice::new("Open", "b"))
                    .with_choice(Choice::new("Hidden", "b").locked().requiring("key")),
            )
            .with_page(Page::new("b", "B"));

        let mut nav = navigator();
        nav.start_story(story).unwrap();
        nav.set_story_flag("key", true);
        nav.tick(CHOICE_DELAY);

        assert_eq!(presented(&nav.drain_events()), vec![vec!["Open".to_string()]]);
        let hidden = Choice::new("Hidden", "b").locked();
        assert_eq!(nav.make_choice(&hidden), ChoiceOutcome::Locked);
    }

    #[test]
    fn test_partially_satisfied_flags_hide_choice_until_next_presentation() {
        let story = Story::new("s", "S")
            .with_page(
                Page::new("a", "A")
                    .with_choice(Choice::new("Walk", "b"))
                    .with_choice(
                        Choice::new("Fly", "b")
                            .requiring("wings")
                            .requiring("courage"),
                    ),
            )
            .with_page(Page::new("b", "B"));

        let mut nav = navigator();
        nav.start_story(story).unwrap();
        nav.set_story_flag("wings", true);
        nav.tick(CHOICE_DELAY);
        assert_eq!(presented(&nav.drain_events()), vec![vec!["Walk".to_string()]]);

        nav.set_story_flag("courage", true);
        nav.refresh_choices();
        assert_eq!(
            presented(&nav.drain_events()),
            vec![vec!["Walk".to_string(), "Fly".to_string()]]
        );
    }

    #[test]
    fn test_progress() {
        let mut nav = navigator();
        assert_eq!(nav.progress(), 0.0);

        nav.start_story(scenario_story()).unwrap();
        assert!((nav.progress() - 1.0 / 3.0).abs() < 1e-6);

        nav.navigate_to_page(&PageId::from("B"));
        nav.navigate_to_page(&PageId::from("A"));
        assert!((nav.progress() - 2.0 / 3.0).abs() < 1e-6);

        nav.navigate_to_page(&PageId::from("C"));
        assert_eq!(nav.progress(), 1.0);
    }

    #[test]
    fn test_choices_wait_for_delay() {
        let mut nav = navigator();
        nav.start_story(scenario_story()).unwrap();
        assert_eq!(nav.state(), NavigatorState::ChoicesPending);

        nav.tick(Duration::from_millis(999));
        assert!(presented(&nav.drain_events()).is_empty());

        nav.tick(Duration::from_millis(1));
        assert_eq!(presented(&nav.drain_events()).len(), 1);
        assert_eq!(nav.state(), NavigatorState::PageActive);
    }

    #[test]
    fn test_stale_presentation_is_dropped_after_navigation() {
        let mut nav = navigator();
        nav.start_story(scenario_story()).unwrap();
        nav.tick(Duration::from_millis(500));

        nav.navigate_to_page(&PageId::from("B"));
        nav.drain_events();

        nav.tick(Duration::from_millis(600));
        assert!(presented(&nav.drain_events()).is_empty());

        nav.tick(Duration::from_millis(400));
        let events = nav.drain_events();
        assert!(matches!(
            events.as_slice(),
            [StoryEvent::ChoicesPresented { page, .. }] if page == &PageId::from("B")
        ));
    }

    #[test]
    fn test_revisiting_same_page_restarts_delay() {
        let mut nav = navigator();
        nav.start_story(scenario_story()).unwrap();
        nav.tick(Duration::from_millis(900));

        nav.navigate_to_page(&PageId::from("A"));
        nav.tick(Duration::from_millis(200));
        assert!(presented(&nav.drain_events()).is_empty());

        nav.tick(Duration::from_millis(800));
        assert_eq!(presented(&nav.drain_events()).len(), 1);
    }

    #[test]
    fn test_missing_page_is_a_no_op() {
        let mut nav = navigator();
        assert!(!nav.navigate_to_page(&PageId::from("A")));

        nav.start_story(scenario_story()).unwrap();
        nav.drain_events();
        assert!(!nav.navigate_to_page(&PageId::from("nowhere")));
        assert!(nav.drain_events().is_empty());
        assert_eq!(nav.current_page_id(), Some(&PageId::from("A")));
    }

    #[test]
    fn test_terminal_page_completes_story() {
        let mut nav = navigator();
        nav.start_story(scenario_story()).unwrap();
        nav.tick(CHOICE_DELAY);

        assert_eq!(
            nav.make_choice_at(1),
            ChoiceOutcome::Navigated(PageId::from("C"))
        );
        assert!(nav.is_complete());
        assert_eq!(count_completed(&nav.drain_events()), 1);
    }

    #[test]
    fn test_terminal_page_can_be_left_open() {
        let config = EngineConfig {
            complete_on_terminal_page: false,
            ..EngineConfig::default()
        };
        let mut nav = StoryNavigator::new(&config);
        nav.start_story(scenario_story()).unwrap();
        nav.navigate_to_page(&PageId::from("C"));

        assert!(!nav.is_complete());
        assert_eq!(nav.state(), NavigatorState::PageActive);
    }

    #[test]
    fn test_mini_game_requested_after_delay() {
        let story = Story::new("s", "S")
            .with_page(
                Page::new("a", "Count")
                    .with_mini_game(MiniGameType::Counting, r#"{"target": 3}"#)
                    .with_choice(Choice::new("Next", "b")),
            )
            .with_page(Page::new("b", "B"));

        let mut nav = navigator();
        nav.start_story(story).unwrap();
        assert_eq!(nav.state(), NavigatorState::MiniGamePending);
        assert!(nav.is_choices_pending());

        nav.tick(Duration::from_millis(1500));
        let requests: Vec<_> = nav
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                StoryEvent::MiniGameRequested { mini_game, .. } => Some(mini_game),
                _ => None,
            })
            .collect();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, MiniGameType::Counting);
        assert_eq!(nav.state(), NavigatorState::PageActive);
    }

    #[test]
    fn test_mini_game_page_without_choices_ends_on_close() {
        let story = Story::new("s", "S")
            .with_page(Page::new("a", "Count").with_mini_game(MiniGameType::Counting, "{}"));

        let mut nav = navigator();
        nav.start_story(story).unwrap();
        assert!(!nav.is_complete());

        nav.on_mini_game_closed();
        assert!(nav.is_complete());
    }

    #[test]
    fn test_flag_events_only_on_change() {
        let mut nav = navigator();
        nav.set_story_flag("x", true);
        nav.set_story_flag("x", true);
        nav.set_story_flag("x", false);

        let flags: Vec<_> = nav
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, StoryEvent::StoryFlagChanged { .. }))
            .collect();
        assert_eq!(flags.len(), 2);
    }
}
