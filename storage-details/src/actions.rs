// SPDX-License-Identifier: GPL-3.0-only

//! Actions offered on rows and headers, and the menus that carry them

use serde::{Deserialize, Serialize};
use storage_types::{BlockRecord, LogicalVolumeRecord, StorageSnapshot};

/// Everything the detail view can ask the daemon to do.
///
/// Each variant carries the object paths it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    FormatDisk {
        block: String,
    },
    /// Create a partition in a free-space gap of the table on `block`
    CreatePartition {
        block: String,
        start: u64,
        size: u64,
        enable_dos_extended: bool,
    },
    Mount {
        block: String,
    },
    Unmount {
        block: String,
    },
    FilesystemOptions {
        block: String,
    },
    Lock {
        block: String,
    },
    Unlock {
        block: String,
    },
    EncryptionOptions {
        block: String,
    },
    MdRaidStart {
        mdraid: String,
    },
    MdRaidStop {
        mdraid: String,
    },
    MdRaidStartScrub {
        mdraid: String,
    },
    MdRaidStopScrub {
        mdraid: String,
    },
    MdRaidToggleBitmap {
        mdraid: String,
    },
    MdRaidAddDisk {
        mdraid: String,
    },
    /// Remove the member `block` from the array it belongs to
    MdRaidRemoveDisk {
        block: String,
    },
    MdRaidDelete {
        mdraid: String,
    },
    Resize {
        lvol: String,
    },
    Rename {
        lvol: String,
    },
    CreateSnapshot {
        lvol: String,
    },
    Activate {
        lvol: String,
    },
    Deactivate {
        lvol: String,
    },
    CreateThin {
        pool: String,
    },
    VolumeGroupRename {
        vgroup: String,
    },
    VolumeGroupDelete {
        vgroup: String,
    },
    VolumeGroupCreateLogicalVolume {
        vgroup: String,
    },
    VolumeGroupAddDisk {
        vgroup: String,
    },
    PhysicalVolumeEmptyAndRemove {
        block: String,
    },
    PhysicalVolumeRemove {
        block: String,
    },
    /// Format a block, or the block of an active logical volume
    Format {
        target: String,
    },
    /// Delete a partition or a logical volume (given by its block or itself)
    Delete {
        target: String,
    },
    CancelJob {
        job: String,
    },
}

impl Action {
    /// Stable identifier, as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::FormatDisk { .. } => "format_disk",
            Self::CreatePartition { .. } => "create_partition",
            Self::Mount { .. } => "mount",
            Self::Unmount { .. } => "unmount",
            Self::FilesystemOptions { .. } => "fsys_options",
            Self::Lock { .. } => "lock",
            Self::Unlock { .. } => "unlock",
            Self::EncryptionOptions { .. } => "crypto_options",
            Self::MdRaidStart { .. } => "mdraid_start",
            Self::MdRaidStop { .. } => "mdraid_stop",
            Self::MdRaidStartScrub { .. } => "mdraid_start_scrub",
            Self::MdRaidStopScrub { .. } => "mdraid_stop_scrub",
            Self::MdRaidToggleBitmap { .. } => "mdraid_toggle_bitmap",
            Self::MdRaidAddDisk { .. } => "mdraid_add_disk",
            Self::MdRaidRemoveDisk { .. } => "mdraid_remove_disk",
            Self::MdRaidDelete { .. } => "mdraid_delete",
            Self::Resize { .. } => "resize",
            Self::Rename { .. } => "rename",
            Self::CreateSnapshot { .. } => "create_snapshot",
            Self::Activate { .. } => "activate",
            Self::Deactivate { .. } => "deactivate",
            Self::CreateThin { .. } => "create_thin",
            Self::VolumeGroupRename { .. } => "vgroup_rename",
            Self::VolumeGroupDelete { .. } => "vgroup_delete",
            Self::VolumeGroupCreateLogicalVolume { .. } => "vgroup_create_lvol",
            Self::VolumeGroupAddDisk { .. } => "vgroup_add_disk",
            Self::PhysicalVolumeEmptyAndRemove { .. } => "pvol_empty_and_remove",
            Self::PhysicalVolumeRemove { .. } => "pvol_remove",
            Self::Format { .. } => "format",
            Self::Delete { .. } => "delete",
            Self::CancelJob { .. } => "job_cancel",
        }
    }

    /// The object path the action is invoked on
    pub fn target(&self) -> &str {
        match self {
            Self::FormatDisk { block }
            | Self::CreatePartition { block, .. }
            | Self::Mount { block }
            | Self::Unmount { block }
            | Self::FilesystemOptions { block }
            | Self::Lock { block }
            | Self::Unlock { block }
            | Self::EncryptionOptions { block }
            | Self::MdRaidRemoveDisk { block }
            | Self::PhysicalVolumeEmptyAndRemove { block }
            | Self::PhysicalVolumeRemove { block } => block,
            Self::MdRaidStart { mdraid }
            | Self::MdRaidStop { mdraid }
            | Self::MdRaidStartScrub { mdraid }
            | Self::MdRaidStopScrub { mdraid }
            | Self::MdRaidToggleBitmap { mdraid }
            | Self::MdRaidAddDisk { mdraid }
            | Self::MdRaidDelete { mdraid } => mdraid,
            Self::Resize { lvol }
            | Self::Rename { lvol }
            | Self::CreateSnapshot { lvol }
            | Self::Activate { lvol }
            | Self::Deactivate { lvol } => lvol,
            Self::CreateThin { pool } => pool,
            Self::VolumeGroupRename { vgroup }
            | Self::VolumeGroupDelete { vgroup }
            | Self::VolumeGroupCreateLogicalVolume { vgroup }
            | Self::VolumeGroupAddDisk { vgroup } => vgroup,
            Self::Format { target } | Self::Delete { target } => target,
            Self::CancelJob { job } => job,
        }
    }

    /// Whether the user has to fill in or confirm a dialog first
    pub fn needs_dialog(&self) -> bool {
        match self {
            Self::FormatDisk { .. }
            | Self::CreatePartition { .. }
            | Self::FilesystemOptions { .. }
            | Self::Unlock { .. }
            | Self::EncryptionOptions { .. }
            | Self::MdRaidAddDisk { .. }
            | Self::MdRaidDelete { .. }
            | Self::Resize { .. }
            | Self::Rename { .. }
            | Self::CreateSnapshot { .. }
            | Self::CreateThin { .. }
            | Self::VolumeGroupRename { .. }
            | Self::VolumeGroupDelete { .. }
            | Self::VolumeGroupCreateLogicalVolume { .. }
            | Self::VolumeGroupAddDisk { .. }
            | Self::Format { .. }
            | Self::Delete { .. } => true,
            Self::Mount { .. }
            | Self::Unmount { .. }
            | Self::Lock { .. }
            | Self::MdRaidStart { .. }
            | Self::MdRaidStop { .. }
            | Self::MdRaidStartScrub { .. }
            | Self::MdRaidStopScrub { .. }
            | Self::MdRaidToggleBitmap { .. }
            | Self::MdRaidRemoveDisk { .. }
            | Self::Activate { .. }
            | Self::Deactivate { .. }
            | Self::PhysicalVolumeEmptyAndRemove { .. }
            | Self::PhysicalVolumeRemove { .. }
            | Self::CancelJob { .. } => false,
        }
    }

    /// Build a dialog-free action from its command-line name and target path
    pub fn direct(name: &str, target: impl Into<String>) -> Option<Self> {
        let target = target.into();
        let action = match name {
            "mount" => Self::Mount { block: target },
            "unmount" => Self::Unmount { block: target },
            "lock" => Self::Lock { block: target },
            "mdraid_start" => Self::MdRaidStart { mdraid: target },
            "mdraid_stop" => Self::MdRaidStop { mdraid: target },
            "mdraid_start_scrub" => Self::MdRaidStartScrub { mdraid: target },
            "mdraid_stop_scrub" => Self::MdRaidStopScrub { mdraid: target },
            "mdraid_toggle_bitmap" => Self::MdRaidToggleBitmap { mdraid: target },
            "mdraid_remove_disk" => Self::MdRaidRemoveDisk { block: target },
            "activate" => Self::Activate { lvol: target },
            "deactivate" => Self::Deactivate { lvol: target },
            "pvol_empty_and_remove" => Self::PhysicalVolumeEmptyAndRemove { block: target },
            "pvol_remove" => Self::PhysicalVolumeRemove { block: target },
            "job_cancel" => Self::CancelJob { job: target },
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Availability {
    Enabled,
    /// Shown but inert; `reason` explains structural constraints
    Disabled { reason: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub title: String,
    pub action: Action,
    pub availability: Availability,
}

impl MenuItem {
    pub fn enabled(title: impl Into<String>, action: Action) -> Self {
        Self {
            title: title.into(),
            action,
            availability: Availability::Enabled,
        }
    }

    /// Enabled unless `disabled` holds; no reason is given
    pub fn unless(title: impl Into<String>, action: Action, disabled: bool) -> Self {
        Self {
            title: title.into(),
            action,
            availability: if disabled {
                Availability::Disabled { reason: None }
            } else {
                Availability::Enabled
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.availability == Availability::Enabled
    }
}

/// A button with a default action and an optional drop-down of the rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMenu {
    pub default: MenuItem,

    /// All entries in display order, the default included
    pub items: Vec<MenuItem>,
}

impl ActionMenu {
    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.title.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.action.name() == name)
    }
}

/// A single-action button
pub fn simple_button(title: impl Into<String>, action: Action) -> ActionMenu {
    let item = MenuItem::enabled(title, action);
    ActionMenu {
        default: item.clone(),
        items: vec![item],
    }
}

/// A single-action button that cannot be pressed, with the reason why
pub fn disabled_button(
    title: impl Into<String>,
    action: Action,
    excuse: impl Into<String>,
) -> ActionMenu {
    let item = MenuItem {
        title: title.into(),
        action,
        availability: Availability::Disabled {
            reason: Some(excuse.into()),
        },
    };
    ActionMenu {
        default: item.clone(),
        items: vec![item],
    }
}

/// What a block row menu is built for
#[derive(Debug, Clone, Copy)]
pub enum MenuTarget<'a> {
    Block(&'a BlockRecord),
    /// A logical volume without a block (inactive, pool or unsupported)
    LogicalVolume(&'a LogicalVolumeRecord),
}

impl MenuTarget<'_> {
    fn path(&self) -> &str {
        match self {
            Self::Block(block) => &block.path,
            Self::LogicalVolume(lvol) => &lvol.path,
        }
    }
}

/// The menu of a block or logical volume row.
///
/// Filesystem actions come first, then encryption, format, logical volume
/// actions and delete. The default is mount/unmount for filesystems,
/// unlock/lock for encrypted blocks, else format, else the volume
/// lifecycle action, else delete. Creating thin volumes is always the
/// default on a pool. Returns `None` when nothing applies.
pub fn block_action_menu(
    snapshot: &StorageSnapshot,
    target: MenuTarget<'_>,
    crypto_locked: bool,
    is_partition: bool,
) -> Option<ActionMenu> {
    let block = match target {
        MenuTarget::Block(block) => Some(block),
        MenuTarget::LogicalVolume(_) => None,
    };
    let lvol = match target {
        MenuTarget::LogicalVolume(lvol) => Some(lvol),
        MenuTarget::Block(_) => None,
    };

    let lvol_path = match (lvol, block) {
        (Some(lvol), _) => Some(lvol.path.clone()),
        (None, Some(block)) => snapshot
            .block_lvm2
            .get(&block.path)
            .and_then(|b| b.logical_volume.clone()),
        (None, None) => None,
    };

    let is_filesystem = block.is_some_and(|b| b.is_filesystem());
    let is_mounted = block
        .and_then(|b| snapshot.filesystem(&b.path))
        .is_some_and(|fs| fs.is_mounted());
    let is_crypto = block.is_some_and(|b| b.is_crypto());
    let is_pool = lvol.is_some_and(|lv| lv.is_pool());
    let is_active = block.is_some() || lvol.is_some_and(|lv| lv.active);
    let is_extended = block
        .and_then(|b| snapshot.partition(&b.path))
        .is_some_and(|p| p.is_container);
    let is_formattable = block.is_some_and(|b| !b.read_only) && !is_extended;

    let mut items = Vec::new();
    let mut default: Option<usize> = None;

    if let Some(block) = block.filter(|_| is_filesystem) {
        let path = &block.path;
        items.push(MenuItem::unless(
            "Mount",
            Action::Mount { block: path.clone() },
            is_mounted,
        ));
        items.push(MenuItem::unless(
            "Unmount",
            Action::Unmount { block: path.clone() },
            !is_mounted,
        ));
        items.push(MenuItem::enabled(
            "Filesystem Options",
            Action::FilesystemOptions { block: path.clone() },
        ));
        default = Some(if is_mounted { 1 } else { 0 });
    } else if let Some(block) = block.filter(|_| is_crypto) {
        let path = &block.path;
        items.push(MenuItem::unless(
            "Lock",
            Action::Lock { block: path.clone() },
            crypto_locked,
        ));
        items.push(MenuItem::unless(
            "Unlock",
            Action::Unlock { block: path.clone() },
            !crypto_locked,
        ));
        items.push(MenuItem::enabled(
            "Encryption Options",
            Action::EncryptionOptions { block: path.clone() },
        ));
        default = Some(if crypto_locked { 1 } else { 0 });
    }

    if is_formattable {
        items.push(MenuItem::enabled(
            "Format",
            Action::Format {
                target: target.path().to_string(),
            },
        ));
        default.get_or_insert(items.len() - 1);
    }

    if let Some(lvol_path) = &lvol_path {
        items.push(MenuItem::enabled(
            "Resize",
            Action::Resize {
                lvol: lvol_path.clone(),
            },
        ));
        items.push(MenuItem::enabled(
            "Rename",
            Action::Rename {
                lvol: lvol_path.clone(),
            },
        ));

        if is_pool {
            items.push(MenuItem::enabled(
                "Create Thin Volume",
                Action::CreateThin {
                    pool: lvol_path.clone(),
                },
            ));
            default = Some(items.len() - 1);
        } else {
            items.push(MenuItem::enabled(
                "Create Snapshot",
                Action::CreateSnapshot {
                    lvol: lvol_path.clone(),
                },
            ));
            items.push(MenuItem::unless(
                "Activate",
                Action::Activate {
                    lvol: lvol_path.clone(),
                },
                is_active,
            ));
            items.push(MenuItem::unless(
                "Deactivate",
                Action::Deactivate {
                    lvol: lvol_path.clone(),
                },
                !is_active,
            ));
            let deactivate = items.len() - 1;
            default.get_or_insert(if is_active { deactivate } else { deactivate - 1 });
        }
    }

    if is_partition || lvol_path.is_some() {
        items.push(MenuItem::enabled(
            "Delete",
            Action::Delete {
                target: target.path().to_string(),
            },
        ));
        default.get_or_insert(items.len() - 1);
    }

    let default = items.get(default?)?.clone();
    Some(ActionMenu { default, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_types::{
        BlockLvm2Record, FilesystemRecord, IdUsage, LogicalVolumeType, PartitionRecord,
    };

    fn fs_block(snapshot: &mut StorageSnapshot, mounted: bool) -> BlockRecord {
        let block = BlockRecord {
            path: "/b/sda1".into(),
            device: "/dev/sda1".into(),
            id_usage: IdUsage::Filesystem,
            id_type: "ext4".into(),
            ..Default::default()
        };
        snapshot.insert(block.clone());
        snapshot.insert(FilesystemRecord {
            path: block.path.clone(),
            mount_points: if mounted { vec!["/mnt".into()] } else { vec![] },
        });
        block
    }

    #[test]
    fn filesystem_default_follows_mount_state() {
        let mut snapshot = StorageSnapshot::default();
        let block = fs_block(&mut snapshot, false);
        let menu = block_action_menu(&snapshot, MenuTarget::Block(&block), false, true).unwrap();
        assert_eq!(menu.default.title, "Mount");
        assert_eq!(
            menu.titles(),
            vec!["Mount", "Unmount", "Filesystem Options", "Format", "Delete"]
        );
        assert!(!menu.find("unmount").unwrap().is_enabled());

        let block = fs_block(&mut snapshot, true);
        let menu = block_action_menu(&snapshot, MenuTarget::Block(&block), false, true).unwrap();
        assert_eq!(menu.default.title, "Unmount");
        assert!(!menu.find("mount").unwrap().is_enabled());
    }

    #[test]
    fn locked_crypto_defaults_to_unlock() {
        let snapshot = StorageSnapshot::default();
        let block = BlockRecord {
            path: "/b/sda2".into(),
            id_usage: IdUsage::Crypto,
            id_type: "crypto_LUKS".into(),
            ..Default::default()
        };
        let menu = block_action_menu(&snapshot, MenuTarget::Block(&block), true, false).unwrap();
        assert_eq!(menu.default.action, Action::Unlock { block: "/b/sda2".into() });
        assert!(!menu.find("lock").unwrap().is_enabled());

        let menu = block_action_menu(&snapshot, MenuTarget::Block(&block), false, false).unwrap();
        assert_eq!(menu.default.title, "Lock");
    }

    #[test]
    fn extended_partition_offers_only_delete() {
        let mut snapshot = StorageSnapshot::default();
        let block = BlockRecord {
            path: "/b/sda2".into(),
            ..Default::default()
        };
        snapshot.insert(PartitionRecord {
            path: block.path.clone(),
            is_container: true,
            ..Default::default()
        });
        let menu = block_action_menu(&snapshot, MenuTarget::Block(&block), false, true).unwrap();
        assert_eq!(menu.titles(), vec!["Delete"]);
        assert_eq!(menu.default.title, "Delete");
    }

    #[test]
    fn read_only_whole_disk_has_no_menu() {
        let snapshot = StorageSnapshot::default();
        let block = BlockRecord {
            path: "/b/sr0".into(),
            read_only: true,
            ..Default::default()
        };
        assert!(block_action_menu(&snapshot, MenuTarget::Block(&block), false, false).is_none());
    }

    #[test]
    fn pool_defaults_to_create_thin_volume() {
        let snapshot = StorageSnapshot::default();
        let pool = LogicalVolumeRecord {
            path: "/lv/pool".into(),
            lv_type: LogicalVolumeType::Pool,
            active: true,
            ..Default::default()
        };
        let menu =
            block_action_menu(&snapshot, MenuTarget::LogicalVolume(&pool), false, false).unwrap();
        assert_eq!(
            menu.titles(),
            vec!["Resize", "Rename", "Create Thin Volume", "Delete"]
        );
        assert_eq!(menu.default.title, "Create Thin Volume");
    }

    #[test]
    fn inactive_volume_defaults_to_activate() {
        let snapshot = StorageSnapshot::default();
        let lvol = LogicalVolumeRecord {
            path: "/lv/home".into(),
            lv_type: LogicalVolumeType::Block,
            active: false,
            ..Default::default()
        };
        let menu =
            block_action_menu(&snapshot, MenuTarget::LogicalVolume(&lvol), false, false).unwrap();
        assert_eq!(menu.default.title, "Activate");
        assert!(!menu.find("deactivate").unwrap().is_enabled());
    }

    #[test]
    fn volume_block_acts_on_its_volume() {
        let mut snapshot = StorageSnapshot::default();
        let block = BlockRecord {
            path: "/b/dm0".into(),
            ..Default::default()
        };
        snapshot.insert(BlockLvm2Record {
            path: block.path.clone(),
            logical_volume: Some("/lv/root".into()),
        });
        let menu = block_action_menu(&snapshot, MenuTarget::Block(&block), false, false).unwrap();
        assert_eq!(
            menu.titles(),
            vec![
                "Format",
                "Resize",
                "Rename",
                "Create Snapshot",
                "Activate",
                "Deactivate",
                "Delete"
            ]
        );
        assert_eq!(menu.default.title, "Format");
        assert_eq!(
            menu.find("resize").unwrap().action,
            Action::Resize { lvol: "/lv/root".into() }
        );
        assert_eq!(
            menu.find("delete").unwrap().action,
            Action::Delete { target: "/b/dm0".into() }
        );
    }

    #[test]
    fn direct_actions_resolve_by_name() {
        assert_eq!(
            Action::direct("mount", "/b/sda1"),
            Some(Action::Mount { block: "/b/sda1".into() })
        );
        assert!(Action::direct("format", "/b/sda1").is_none());
        for name in ["mount", "lock", "mdraid_stop", "job_cancel", "pvol_remove"] {
            let action = Action::direct(name, "/x").unwrap();
            assert!(!action.needs_dialog());
            assert_eq!(action.name(), name);
        }
    }
}
