//! Keyboard shortcut constants for consistent documentation.

pub const HELP: &str = "F1";
pub const CATEGORY: &str = "F2";
pub const FILTER_EDIT: &str = "F3";
pub const CLEAR_FILTERS: &str = "F4";
pub const THEME: &str = "F5";
pub const QUIT: &str = "Esc/F10";

// Query
pub const ADD_TERM: &str = "Enter";
pub const REMOVE_LAST_TERM: &str = "Ctrl+W";
pub const ACCEPT_SUGGESTION: &str = "Tab";

// Paging
pub const PREV_PAGE: &str = "PgUp";
pub const NEXT_PAGE: &str = "PgDn";
pub const JUMP_PAGE: &str = "Alt+1-9";

// Actions
pub const TOGGLE_SELECT: &str = "Ctrl+X";
pub const ADD_TO_COLLECTION: &str = "Ctrl+A";
pub const SAVE_SEARCH: &str = "Ctrl+S";
pub const NEW_COLLECTION: &str = "N";
