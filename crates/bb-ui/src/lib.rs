//! # bb-ui
//!
//! Presentation components. Each one turns cached data into a view model,
//! renders it through an askama template, and forwards user gestures to the
//! query and mutation layers.

pub mod boards;
pub mod feed;
pub mod menu;
pub mod relative;
pub mod sidebar;
pub mod toast;
pub mod view;

#[cfg(test)]
mod test_support;

pub use askama::Template;
pub use boards::{BoardTile, BoardsDisplay};
pub use feed::{BoardFeed, Dispatched};
pub use menu::MenuAction;
pub use sidebar::BoardSidebarView;
pub use toast::{Toast, ToastKind, ToastQueue};
pub use view::{PostCard, ThreadCard};
