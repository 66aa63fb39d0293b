//! Input event vocabulary for physical braille-display keys.
//!
//! Plain data shared with display-driver collaborators; the engine itself
//! neither consumes nor produces these events. A collaborator combines a
//! routed `Route` event's cell position with a translation's position map
//! to find the text offset under the routing key.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Closed set of command codes a braille display can emit.
///
/// Discriminants are part of the wire vocabulary and stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Command {
    NavLinePrevious = 1,
    NavLineNext = 2,
    NavItemPrevious = 3,
    NavItemNext = 4,
    NavPanLeft = 5,
    NavPanRight = 6,
    NavTop = 7,
    NavBottom = 8,
    ActivateCurrent = 20,
    LongPressCurrent = 21,
    ScrollBackward = 30,
    ScrollForward = 31,
    SelectionStart = 40,
    SelectionEnd = 41,
    SelectionSelectAll = 42,
    SelectionCut = 43,
    SelectionCopy = 44,
    SelectionPaste = 45,
    Route = 50,
    LongPressRoute = 51,
    BrailleKey = 60,
    KeyEnter = 70,
    KeyDel = 71,
    KeyForwardDel = 72,
    GlobalBack = 90,
    GlobalHome = 91,
    GlobalRecents = 92,
    GlobalNotifications = 93,
    Help = 100,
    SectionNext = 110,
    SectionPrevious = 111,
    ControlNext = 112,
    ControlPrevious = 113,
    ListNext = 114,
    ListPrevious = 115,
    ToggleIncrementalSearch = 116,
    ToggleBrailleMenu = 117,
    ToggleBrailleGrade = 118,
}

/// What a command's argument field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    None,
    /// Bit mask of pressed dot keys
    Dots,
    /// A cell position on the display
    Position,
}

// One ordered list of (code, name) pairs; both lookup directions are
// derived from it once and never mutated afterwards
const COMMANDS: &[(Command, &str)] = &[
    (Command::NavLinePrevious, "NAV_LINE_PREVIOUS"),
    (Command::NavLineNext, "NAV_LINE_NEXT"),
    (Command::NavItemPrevious, "NAV_ITEM_PREVIOUS"),
    (Command::NavItemNext, "NAV_ITEM_NEXT"),
    (Command::NavPanLeft, "NAV_PAN_LEFT"),
    (Command::NavPanRight, "NAV_PAN_RIGHT"),
    (Command::NavTop, "NAV_TOP"),
    (Command::NavBottom, "NAV_BOTTOM"),
    (Command::ActivateCurrent, "ACTIVATE_CURRENT"),
    (Command::LongPressCurrent, "LONG_PRESS_CURRENT"),
    (Command::ScrollBackward, "SCROLL_BACKWARD"),
    (Command::ScrollForward, "SCROLL_FORWARD"),
    (Command::SelectionStart, "SELECTION_START"),
    (Command::SelectionEnd, "SELECTION_END"),
    (Command::SelectionSelectAll, "SELECTION_SELECT_ALL"),
    (Command::SelectionCut, "SELECTION_CUT"),
    (Command::SelectionCopy, "SELECTION_COPY"),
    (Command::SelectionPaste, "SELECTION_PASTE"),
    (Command::Route, "ROUTE"),
    (Command::LongPressRoute, "LONG_PRESS_ROUTE"),
    (Command::BrailleKey, "BRAILLE_KEY"),
    (Command::KeyEnter, "KEY_ENTER"),
    (Command::KeyDel, "KEY_DEL"),
    (Command::KeyForwardDel, "KEY_FORWARD_DEL"),
    (Command::GlobalBack, "GLOBAL_BACK"),
    (Command::GlobalHome, "GLOBAL_HOME"),
    (Command::GlobalRecents, "GLOBAL_RECENTS"),
    (Command::GlobalNotifications, "GLOBAL_NOTIFICATIONS"),
    (Command::Help, "HELP"),
    (Command::SectionNext, "SECTION_NEXT"),
    (Command::SectionPrevious, "SECTION_PREVIOUS"),
    (Command::ControlNext, "CONTROL_NEXT"),
    (Command::ControlPrevious, "CONTROL_PREVIOUS"),
    (Command::ListNext, "LIST_NEXT"),
    (Command::ListPrevious, "LIST_PREVIOUS"),
    (Command::ToggleIncrementalSearch, "TOGGLE_INCREMENTAL_SEARCH"),
    (Command::ToggleBrailleMenu, "TOGGLE_BRAILLE_MENU"),
    (Command::ToggleBrailleGrade, "TOGGLE_BRAILLE_GRADE"),
];

static COMMAND_NAMES: Lazy<HashMap<Command, &'static str>> =
    Lazy::new(|| COMMANDS.iter().copied().collect());

static NAMES_TO_COMMANDS: Lazy<HashMap<&'static str, Command>> =
    Lazy::new(|| COMMANDS.iter().map(|&(cmd, name)| (name, cmd)).collect());

impl Command {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn name(&self) -> &'static str {
        COMMAND_NAMES.get(self).copied().unwrap_or("(unknown)")
    }

    pub fn from_name(name: &str) -> Option<Command> {
        NAMES_TO_COMMANDS.get(name).copied()
    }

    pub fn from_code(code: i32) -> Option<Command> {
        COMMANDS
            .iter()
            .find(|&&(cmd, _)| cmd.code() == code)
            .map(|&(cmd, _)| cmd)
    }

    pub fn argument_kind(&self) -> ArgumentKind {
        match self {
            Command::SelectionStart
            | Command::SelectionEnd
            | Command::Route
            | Command::LongPressRoute => ArgumentKind::Position,
            Command::BrailleKey => ArgumentKind::Dots,
            _ => ArgumentKind::None,
        }
    }
}

/// One key event from a braille display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrailleInputEvent {
    pub command: Command,
    /// Meaning depends on `command.argument_kind()`
    pub argument: i32,
    pub event_time_ms: u64,
}

impl BrailleInputEvent {
    pub fn new(command: Command, argument: i32, event_time_ms: u64) -> Self {
        BrailleInputEvent {
            command,
            argument,
            event_time_ms,
        }
    }
}

impl std::fmt::Display for BrailleInputEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BrailleInputEvent {{cmd={}, arg={}}}",
            self.command.name(),
            self.argument
        )
    }
}
