use std::fmt;
use std::str::FromStr;

use bb_core::Thread;

/// Entries of a thread card's options menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CopyLink,
    MarkVisited,
    Mute,
    Unmute,
    Hide,
    Unhide,
}

impl MenuAction {
    /// Menu for `thread`. Logged-out viewers can only copy the link.
    pub fn for_thread(thread: &Thread, logged_in: bool) -> Vec<MenuAction> {
        let mut actions = vec![MenuAction::CopyLink];
        if logged_in {
            actions.push(MenuAction::MarkVisited);
            actions.push(if thread.muted {
                MenuAction::Unmute
            } else {
                MenuAction::Mute
            });
            actions.push(if thread.hidden {
                MenuAction::Unhide
            } else {
                MenuAction::Hide
            });
        }
        actions
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::CopyLink => "Copy Link",
            MenuAction::MarkVisited => "Mark Visited",
            MenuAction::Mute => "Mute",
            MenuAction::Unmute => "Unmute",
            MenuAction::Hide => "Hide",
            MenuAction::Unhide => "Unhide",
        }
    }

    /// Stable identifier used in rendered markup and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            MenuAction::CopyLink => "copy-link",
            MenuAction::MarkVisited => "mark-visited",
            MenuAction::Mute => "mute",
            MenuAction::Unmute => "unmute",
            MenuAction::Hide => "hide",
            MenuAction::Unhide => "unhide",
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MenuAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            MenuAction::CopyLink,
            MenuAction::MarkVisited,
            MenuAction::Mute,
            MenuAction::Unmute,
            MenuAction::Hide,
            MenuAction::Unhide,
        ]
        .into_iter()
        .find(|action| action.id() == s)
        .ok_or_else(|| format!("unknown menu action: {s}"))
    }
}
