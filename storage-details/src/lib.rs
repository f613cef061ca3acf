// SPDX-License-Identifier: GPL-3.0-only

//! Detail view for one block device, RAID array or volume group
//!
//! Everything here is a projection of a [`StorageSnapshot`]: the content
//! tree, the action menus and the header/sidebar regions are rebuilt from
//! scratch on every render. User actions go out through a
//! [`StorageDaemon`] implementation.
//!
//! - [`entries`]: the recursive device / partition / volume tree
//! - [`actions`]: the closed set of actions and the per-row menus
//! - [`dialogs`]: dialog input, validation and call plans
//! - [`dispatch`]: runs an action against the daemon
//! - [`render`]: header, sidebar, content and jobs regions
//! - [`controller`]: `show`/`hide`, re-render on change, volume group polling
//!
//! [`StorageSnapshot`]: storage_types::StorageSnapshot
//! [`StorageDaemon`]: storage_contracts::StorageDaemon

pub mod actions;
pub mod controller;
pub mod describe;
pub mod dialogs;
pub mod dispatch;
pub mod entries;
pub mod error;
pub mod render;

pub use actions::{Action, ActionMenu, Availability, MenuItem, MenuTarget, block_action_menu};
pub use controller::{ControllerConfig, DetailController, Notice, ViewState};
pub use describe::Description;
pub use dialogs::{DialogHeader, DialogInput, UsageAlert, UsageKind};
pub use dispatch::{Dispatcher, Location, Outcome, Request};
pub use entries::{ContentEntry, block_content_entries, volume_group_content_entries};
pub use error::{DetailsError, ValidationError};
pub use render::{RenderedView, Selection, SelectionKind, check_offered, render};
