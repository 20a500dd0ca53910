//! Picker vocabulary shared by the query loop and its host.

use std::fmt;

use crate::tags::TagRecord;

/// Administrative actions offered in command mode (query starting with `>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
    GenerateTags,
    ShowCommand,
    InstallGitHook,
}

impl AdminAction {
    pub const ALL: [AdminAction; 3] = [
        AdminAction::GenerateTags,
        AdminAction::ShowCommand,
        AdminAction::InstallGitHook,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AdminAction::GenerateTags => "Generate tags",
            AdminAction::ShowCommand => "Display ctags command",
            AdminAction::InstallGitHook => "Add/update ctags command in git hook",
        }
    }
}

/// One row of the picker
#[derive(Debug, Clone, PartialEq)]
pub enum PickerItem {
    Tag(TagRecord),
    Action(AdminAction),
}

impl PickerItem {
    pub fn admin_actions() -> Vec<PickerItem> {
        AdminAction::ALL.into_iter().map(PickerItem::Action).collect()
    }
}

impl fmt::Display for PickerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerItem::Tag(record) => write!(f, "{}", record),
            PickerItem::Action(action) => write!(f, "{}", action.label()),
        }
    }
}

/// User interaction reported by the host picker
#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    /// The query text changed
    Input(String),
    Select(PickerItem),
    Dismiss,
}

/// Display side of the picker, implemented by the host.
pub trait Presenter {
    /// Replaces the visible list
    fn show_items(&mut self, items: Vec<PickerItem>);

    fn set_busy(&mut self, _busy: bool) {}

    /// Sets the query text without it counting as user input
    fn set_value(&mut self, _value: &str) {}

    /// Informational message, e.g. "Nothing found for X"
    fn notify(&mut self, message: &str);
}

/// How a query session ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Selected(TagRecord),
    Action(AdminAction),
    Cancelled,
}
