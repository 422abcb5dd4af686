//! Navigator lifecycle states.

/// Where the navigator is in a playthrough.
///
/// Choices and a mini-game may both be pending on the same page; in that
/// case the navigator reports `MiniGamePending` and
/// [`super::StoryNavigator::is_choices_pending`] tells the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorState {
    /// No story has been started.
    NoStory,
    /// A page is shown and nothing is scheduled.
    PageActive,
    /// The page's choices are waiting for their presentation delay.
    ChoicesPending,
    /// The page's mini-game is waiting for its launch delay.
    MiniGamePending,
    /// The playthrough has ended. Only a new story leaves this state.
    StoryComplete,
}

impl NavigatorState {
    pub fn is_playing(&self) -> bool {
        !matches!(self, NavigatorState::NoStory | NavigatorState::StoryComplete)
    }
}
