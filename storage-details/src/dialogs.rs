// SPDX-License-Identifier: GPL-3.0-only

//! Dialog input, validation and the daemon calls it turns into
//!
//! Validation happens here, before anything is sent: a [`ValidationError`]
//! is shown next to the dialog and no call is made.

use std::fmt;

use serde::{Deserialize, Serialize};
use storage_types::{
    BlockRecord, ConfigItem, CrypttabEntry, DOS_EXTENDED_TYPE, DiskPartitioning, EraseMode,
    FormatOptions, FstabEntry, IdUsage, LogicalVolumeRecord, ManagerRecord, ResizeOptions,
    StorageSnapshot, VolumeGroupRecord, fmt_size, round_up, strip_parent_options,
    validate_lvm2_name,
};

use crate::actions::Action;
use crate::describe::{lvol_name, mdraid_name};
use crate::error::ValidationError;

// ----------------------------------------------------------------------------
// Usage alerts
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Mounted,
    MdRaidMember,
    PhysicalVolume,
}

/// Something that uses a device about to be destroyed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageAlert {
    pub kind: UsageKind,
    pub message: String,
}

/// Objects directly below `path`: cleartext, partitions, logical partitions
/// of an extended partition and the blocks of a group's volumes
fn children(snapshot: &StorageSnapshot, path: &str) -> Vec<String> {
    let mut children = Vec::new();

    if let Some(cleartext) = snapshot.cleartext_of(path) {
        children.push(cleartext.path.clone());
    }

    if snapshot.partition_table(path).is_some() {
        children.extend(
            snapshot
                .partitions_of(path)
                .into_iter()
                .filter(|p| !p.is_container)
                .map(|p| p.path.clone()),
        );
    }

    if let Some(container) = snapshot.partition(path).filter(|p| p.is_container) {
        children.extend(
            snapshot
                .partitions_of(&container.table)
                .into_iter()
                .filter(|p| p.is_contained)
                .map(|p| p.path.clone()),
        );
    }

    if snapshot.volume_group(path).is_some() {
        children.extend(
            snapshot
                .lvols_of(path)
                .into_iter()
                .filter_map(|lv| snapshot.block_of_lvol(&lv.path))
                .map(|b| b.path.clone()),
        );
    }

    children
}

/// Mounted filesystems, RAID and volume group memberships at or below `path`
pub fn usage_alerts(snapshot: &StorageSnapshot, path: &str) -> Vec<UsageAlert> {
    let mut alerts: Vec<UsageAlert> = children(snapshot, path)
        .iter()
        .flat_map(|child| usage_alerts(snapshot, child))
        .collect();

    let Some(block) = snapshot.block(path) else {
        return alerts;
    };

    if let Some(dir) = snapshot
        .filesystem(path)
        .and_then(|fs| fs.mount_points.first())
    {
        alerts.push(UsageAlert {
            kind: UsageKind::Mounted,
            message: format!("Device {} is mounted on {}", block.name(), dir),
        });
    }

    if let Some(mdraid) = block
        .mdraid_member
        .as_deref()
        .and_then(|md| snapshot.mdraid(md))
    {
        alerts.push(UsageAlert {
            kind: UsageKind::MdRaidMember,
            message: format!(
                "Device {} is a member of RAID Array {}",
                block.name(),
                mdraid_name(mdraid)
            ),
        });
    }

    if let Some(vgroup) = snapshot
        .physical_volume(path)
        .and_then(|pv| pv.volume_group.as_deref())
        .and_then(|vg| snapshot.volume_group(vg))
    {
        alerts.push(UsageAlert {
            kind: UsageKind::PhysicalVolume,
            message: format!(
                "Device {} is a physical volume of {}",
                block.name(),
                vgroup.name
            ),
        });
    }

    alerts
}

// ----------------------------------------------------------------------------
// Dialog headers
// ----------------------------------------------------------------------------

/// Title, warning and usage alerts shown above a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogHeader {
    pub title: String,
    pub danger: Option<String>,
    pub alerts: Vec<UsageAlert>,
}

impl DialogHeader {
    fn plain(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            danger: None,
            alerts: Vec::new(),
        }
    }

    fn confirm(
        snapshot: &StorageSnapshot,
        name: &str,
        danger: &str,
        alerts_of: Option<&str>,
    ) -> Self {
        Self {
            title: format!("Please confirm deletion of {name}"),
            danger: Some(danger.to_string()),
            alerts: alerts_of
                .map(|path| usage_alerts(snapshot, path))
                .unwrap_or_default(),
        }
    }
}

/// The block a format action works on: the block itself or the block of
/// an active logical volume
pub fn format_target<'a>(snapshot: &'a StorageSnapshot, path: &str) -> Option<&'a BlockRecord> {
    snapshot
        .block(path)
        .or_else(|| snapshot.block_of_lvol(path))
}

/// Header of the dialog `action` opens; `None` when the action has no
/// dialog or its object is gone
pub fn dialog_header(snapshot: &StorageSnapshot, action: &Action) -> Option<DialogHeader> {
    let header = match action {
        Action::FormatDisk { block } => {
            let block = snapshot.block(block)?;
            DialogHeader {
                title: format!("Format Disk {}", block.name()),
                danger: Some("Formatting a disk will erase all data on it.".to_string()),
                alerts: usage_alerts(snapshot, &block.path),
            }
        }
        Action::CreatePartition { block, .. } => {
            let block = snapshot.block(block)?;
            DialogHeader {
                title: format!("Create partition on {}", block.name()),
                danger: None,
                alerts: usage_alerts(snapshot, &block.path),
            }
        }
        Action::Format { target } => {
            let block = format_target(snapshot, target)?;
            DialogHeader {
                title: format!("Format {}", block.name()),
                danger: Some("Formatting a storage device will erase all data on it.".to_string()),
                alerts: usage_alerts(snapshot, &block.path),
            }
        }
        Action::FilesystemOptions { block } => {
            snapshot.filesystem(block)?;
            DialogHeader::plain("Filesystem Options")
        }
        Action::Unlock { block } => {
            snapshot.encrypted_of(block)?;
            DialogHeader::plain("Unlock")
        }
        Action::EncryptionOptions { block } => {
            snapshot.block(block)?;
            DialogHeader::plain("Encryption Options")
        }
        Action::MdRaidAddDisk { mdraid } => {
            snapshot.mdraid(mdraid)?;
            DialogHeader::plain("Add Disks")
        }
        Action::VolumeGroupAddDisk { vgroup } => {
            snapshot.volume_group(vgroup)?;
            DialogHeader::plain("Add Disks")
        }
        Action::MdRaidDelete { mdraid } => {
            let record = snapshot.mdraid(mdraid)?;
            let block = snapshot.mdraid_block(mdraid);
            DialogHeader::confirm(
                snapshot,
                &mdraid_name(record),
                "Deleting a RAID device will erase all data on it.",
                block.map(|b| b.path.as_str()),
            )
        }
        Action::Resize { lvol } => {
            snapshot.logical_volume(lvol)?;
            DialogHeader::plain("Resize Logical Volume")
        }
        Action::Rename { lvol } => {
            snapshot.logical_volume(lvol)?;
            DialogHeader::plain("Rename Logical Volume")
        }
        Action::CreateSnapshot { lvol } => {
            snapshot.logical_volume(lvol)?;
            DialogHeader::plain("Create Snapshot")
        }
        Action::CreateThin { pool } => {
            let pool = snapshot.logical_volume(pool)?;
            snapshot.volume_group(&pool.volume_group)?;
            DialogHeader::plain("Create Thin Volume")
        }
        Action::VolumeGroupRename { vgroup } => {
            snapshot.volume_group(vgroup)?;
            DialogHeader::plain("Rename Volume Group")
        }
        Action::VolumeGroupDelete { vgroup } => {
            let record = snapshot.volume_group(vgroup)?;
            DialogHeader::confirm(
                snapshot,
                &record.name,
                "Deleting a volume group will erase all data on it.",
                Some(vgroup),
            )
        }
        Action::VolumeGroupCreateLogicalVolume { vgroup } => {
            snapshot.volume_group(vgroup)?;
            DialogHeader::plain("Create Logical Volume")
        }
        Action::Delete { target } => {
            if let Some(lvol) = deletable_lvol(snapshot, target) {
                DialogHeader::confirm(
                    snapshot,
                    &lvol_name(snapshot, lvol),
                    "Deleting a logical volume will delete all data in it.",
                    Some(target),
                )
            } else {
                let block = snapshot.block(target)?;
                snapshot.partition(target)?;
                DialogHeader::confirm(
                    snapshot,
                    block.name(),
                    "Deleting a partition will delete all data in it.",
                    Some(target),
                )
            }
        }
        Action::Mount { .. }
        | Action::Unmount { .. }
        | Action::Lock { .. }
        | Action::MdRaidStart { .. }
        | Action::MdRaidStop { .. }
        | Action::MdRaidStartScrub { .. }
        | Action::MdRaidStopScrub { .. }
        | Action::MdRaidToggleBitmap { .. }
        | Action::MdRaidRemoveDisk { .. }
        | Action::Activate { .. }
        | Action::Deactivate { .. }
        | Action::PhysicalVolumeEmptyAndRemove { .. }
        | Action::PhysicalVolumeRemove { .. }
        | Action::CancelJob { .. } => return None,
    };
    Some(header)
}

/// The logical volume a delete on `target` removes, given either the
/// volume itself or its block
pub fn deletable_lvol<'a>(
    snapshot: &'a StorageSnapshot,
    target: &str,
) -> Option<&'a LogicalVolumeRecord> {
    if snapshot.block(target).is_some() {
        snapshot.lvol_of_block(target)
    } else {
        snapshot.logical_volume(target)
    }
}

// ----------------------------------------------------------------------------
// Dialog input
// ----------------------------------------------------------------------------

/// Values collected by the dialog of an action
#[derive(Debug, Clone, Default)]
pub enum DialogInput {
    /// Dialog-free action
    #[default]
    None,

    /// A confirmation without fields
    Confirm,

    Format(FormatValues),
    FormatDisk(FormatDiskValues),
    FilesystemOptions(FilesystemOptionsValues),
    Passphrase(PassphraseValues),
    EncryptionOptions(EncryptionOptionsValues),
    Size(SizeValues),
    Name(NameValues),
    SizedName(SizedNameValues),
    LogicalVolume(LogicalVolumeValues),
    Disks(DisksValues),
}

/// Type choice of the format dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilesystemChoice {
    #[default]
    #[serde(rename = "xfs")]
    Xfs,
    #[serde(rename = "ext4")]
    Ext4,
    #[serde(rename = "luks+xfs")]
    LuksXfs,
    #[serde(rename = "luks+ext4")]
    LuksExt4,
    #[serde(rename = "vfat")]
    Vfat,
    #[serde(rename = "ntfs")]
    Ntfs,
    #[serde(rename = "dos-extended")]
    DosExtended,
    #[serde(rename = "empty")]
    Empty,
    #[serde(rename = "custom")]
    Custom,
}

impl FilesystemChoice {
    pub const ALL: [FilesystemChoice; 9] = [
        Self::Xfs,
        Self::Ext4,
        Self::LuksXfs,
        Self::LuksExt4,
        Self::Vfat,
        Self::Ntfs,
        Self::DosExtended,
        Self::Empty,
        Self::Custom,
    ];

    pub fn value(self) -> &'static str {
        match self {
            Self::Xfs => "xfs",
            Self::Ext4 => "ext4",
            Self::LuksXfs => "luks+xfs",
            Self::LuksExt4 => "luks+ext4",
            Self::Vfat => "vfat",
            Self::Ntfs => "ntfs",
            Self::DosExtended => "dos-extended",
            Self::Empty => "empty",
            Self::Custom => "custom",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Xfs => "XFS - Red Hat Enterprise Linux 7 default",
            Self::Ext4 => "ext4 - Red Hat Enterprise Linux 6 default",
            Self::LuksXfs => "Encrypted XFS (LUKS)",
            Self::LuksExt4 => "Encrypted EXT4 (LUKS)",
            Self::Vfat => "VFAT - Compatible with all systems and devices",
            Self::Ntfs => "NTFS - Compatible with most systems",
            Self::DosExtended => "Extended Partition",
            Self::Empty => "No Filesystem",
            Self::Custom => "Custom (Enter filesystem type)",
        }
    }

    /// Filesystem the daemon must support for this choice
    fn requires(self) -> Option<&'static str> {
        match self {
            Self::Xfs | Self::LuksXfs => Some("xfs"),
            Self::Ext4 | Self::LuksExt4 => Some("ext4"),
            Self::Vfat => Some("vfat"),
            Self::Ntfs => Some("ntfs"),
            Self::DosExtended | Self::Empty | Self::Custom => None,
        }
    }

    pub fn is_encrypted(self) -> bool {
        matches!(self, Self::LuksXfs | Self::LuksExt4)
    }

    pub fn is_filesystem(self) -> bool {
        !matches!(self, Self::Empty | Self::DosExtended)
    }

    fn is_offered_by(self, manager: &ManagerRecord) -> bool {
        match self.requires() {
            Some(fs) => manager.supported_filesystems.is_empty() || manager.supports(fs),
            None => true,
        }
    }
}

impl fmt::Display for FilesystemChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilesystemOption {
    pub choice: FilesystemChoice,
    pub title: &'static str,
    pub enabled: bool,
}

/// Type choices of the format dialog, limited to what the daemon can create
pub fn filesystem_options(
    manager: &ManagerRecord,
    create_partition: bool,
    enable_dos_extended: bool,
) -> Vec<FilesystemOption> {
    FilesystemChoice::ALL
        .into_iter()
        .filter(|choice| choice.is_offered_by(manager))
        .map(|choice| FilesystemOption {
            choice,
            title: choice.title(),
            enabled: choice != FilesystemChoice::DosExtended
                || (create_partition && enable_dos_extended),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mounting", rename_all = "snake_case")]
pub enum Mounting {
    /// Mounted by the desktop on demand
    #[default]
    Default,

    /// An fstab entry
    Custom {
        mount_point: String,
        mount_options: String,
    },
}

impl Mounting {
    fn validated(&self) -> Result<Option<(&str, &str)>, ValidationError> {
        match self {
            Self::Default => Ok(None),
            Self::Custom {
                mount_point,
                mount_options,
            } => {
                let dir = mount_point.trim();
                if dir.is_empty() {
                    return Err(ValidationError::EmptyMountPoint);
                }
                if !dir.starts_with('/') {
                    return Err(ValidationError::RelativeMountPoint);
                }
                Ok(Some((dir, mount_options.trim())))
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct FormatValues {
    /// Size of the new partition; the whole gap when unset
    pub size: Option<u64>,
    pub erase: EraseMode,
    pub fs: FilesystemChoice,

    /// Filesystem type for [`FilesystemChoice::Custom`]
    pub custom_type: String,

    /// Filesystem label
    pub name: String,

    pub passphrase: String,
    pub passphrase_confirm: String,

    /// Keep the passphrase in the crypttab entry
    pub store_passphrase: bool,
    pub crypto_options: String,
    pub mounting: Mounting,
}

impl fmt::Debug for FormatValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatValues")
            .field("size", &self.size)
            .field("erase", &self.erase)
            .field("fs", &self.fs)
            .field("custom_type", &self.custom_type)
            .field("name", &self.name)
            .field("store_passphrase", &self.store_passphrase)
            .field("crypto_options", &self.crypto_options)
            .field("mounting", &self.mounting)
            .finish_non_exhaustive()
    }
}

/// The free-space gap a new partition goes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSlot {
    pub start: u64,
    pub size: u64,
    pub enable_dos_extended: bool,
}

/// Daemon calls a format dialog ends in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatPlan {
    Format {
        block: String,
        fs_type: String,
        options: FormatOptions,
    },
    CreatePartition {
        table_block: String,
        offset: u64,
        size: u64,
        type_id: String,
    },
    CreatePartitionAndFormat {
        table_block: String,
        offset: u64,
        size: u64,
        fs_type: String,
        options: FormatOptions,
    },
}

/// Validate the format / create-partition dialog.
///
/// `slot` is set when creating a partition in a gap of the table on
/// `block`; otherwise `block` itself is formatted.
pub fn plan_format(
    manager: &ManagerRecord,
    block: &str,
    slot: Option<PartitionSlot>,
    values: &FormatValues,
) -> Result<FormatPlan, ValidationError> {
    let choice = values.fs;

    if choice == FilesystemChoice::DosExtended && !slot.is_some_and(|s| s.enable_dos_extended) {
        return Err(ValidationError::ExtendedNotAllowed);
    }
    if !choice.is_offered_by(manager) {
        return Err(ValidationError::UnsupportedFilesystem(choice.value().to_string()));
    }

    let fs_type = match choice {
        FilesystemChoice::Custom => {
            let custom = values.custom_type.trim();
            if custom.is_empty() {
                return Err(ValidationError::EmptyFilesystemType);
            }
            custom.to_string()
        }
        FilesystemChoice::LuksXfs => "xfs".to_string(),
        FilesystemChoice::LuksExt4 => "ext4".to_string(),
        other => other.value().to_string(),
    };

    if choice.is_encrypted() {
        if values.passphrase.is_empty() {
            return Err(ValidationError::EmptyPassphrase);
        }
        if values.passphrase != values.passphrase_confirm {
            return Err(ValidationError::PassphraseMismatch);
        }
    }

    let mount = if choice.is_filesystem() {
        values.mounting.validated()?
    } else {
        None
    };

    let mut options = FormatOptions {
        no_block: true,
        dry_run_first: true,
        tear_down: true,
        erase: values.erase,
        ..Default::default()
    };

    let label = values.name.trim();
    if choice.is_filesystem() && !label.is_empty() {
        options.label = Some(label.to_string());
    }

    if let Some((dir, opts)) = mount {
        options
            .config_items
            .push(ConfigItem::Fstab(FstabEntry::custom(dir, opts)));
    }

    if choice.is_encrypted() {
        options.encrypt_passphrase = Some(values.passphrase.clone());
        let stored = values
            .store_passphrase
            .then_some(values.passphrase.as_str());
        options
            .config_items
            .push(ConfigItem::Crypttab(CrypttabEntry::new(
                &values.crypto_options,
                stored,
            )));
    }

    let Some(slot) = slot else {
        return Ok(FormatPlan::Format {
            block: block.to_string(),
            fs_type,
            options,
        });
    };

    let size = values.size.unwrap_or(slot.size);
    if size == 0 {
        return Err(ValidationError::ZeroSize);
    }
    if size > slot.size {
        return Err(ValidationError::TooLarge(fmt_size(slot.size)));
    }

    let table_block = block.to_string();
    let plan = match choice {
        FilesystemChoice::DosExtended => FormatPlan::CreatePartition {
            table_block,
            offset: slot.start,
            size,
            type_id: DOS_EXTENDED_TYPE.to_string(),
        },
        FilesystemChoice::Empty => FormatPlan::CreatePartition {
            table_block,
            offset: slot.start,
            size,
            type_id: String::new(),
        },
        _ => FormatPlan::CreatePartitionAndFormat {
            table_block,
            offset: slot.start,
            size,
            fs_type,
            options,
        },
    };
    Ok(plan)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDiskValues {
    pub erase: EraseMode,
    pub partitioning: DiskPartitioning,
}

/// Whole-disk format: a new partition table, or none
pub fn plan_format_disk(block: &str, values: &FormatDiskValues) -> FormatPlan {
    FormatPlan::Format {
        block: block.to_string(),
        fs_type: values.partitioning.as_udisks_str().to_string(),
        options: FormatOptions {
            no_block: true,
            tear_down: true,
            erase: values.erase,
            ..Default::default()
        },
    }
}

/// How a stored configuration item changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Add(ConfigItem),
    Remove(ConfigItem),
    Update { old: ConfigItem, new: ConfigItem },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemOptionsValues {
    pub name: String,
    pub mounting: Mounting,
}

impl FilesystemOptionsValues {
    /// Dialog values as currently stored for `block`
    pub fn current(block: &BlockRecord) -> Self {
        let mounting = match block.fstab_entry() {
            Some(entry) => Mounting::Custom {
                mount_point: entry.dir.clone(),
                mount_options: strip_parent_options(&entry.opts),
            },
            None => Mounting::Default,
        };
        Self {
            name: block.id_label.clone(),
            mounting,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesystemOptionsPlan {
    pub set_label: Option<String>,
    pub config: Option<ConfigChange>,
}

/// Label change and fstab edit; unchanged parts are left alone
pub fn plan_filesystem_options(
    block: &BlockRecord,
    values: &FilesystemOptionsValues,
) -> Result<FilesystemOptionsPlan, ValidationError> {
    let set_label = (values.name != block.id_label).then(|| values.name.clone());

    let old = block
        .configuration
        .iter()
        .find(|item| matches!(item, ConfigItem::Fstab(_)));

    let new = values.mounting.validated()?;

    let config = match (old, new) {
        (None, None) => None,
        (None, Some((dir, opts))) => Some(ConfigChange::Add(ConfigItem::Fstab(
            FstabEntry::custom(dir, opts),
        ))),
        (Some(old), None) => Some(ConfigChange::Remove(old.clone())),
        (Some(old), Some((dir, opts))) => {
            let changed = match old {
                ConfigItem::Fstab(entry) => {
                    entry.dir != dir || strip_parent_options(&entry.opts) != opts
                }
                _ => true,
            };
            changed.then(|| ConfigChange::Update {
                old: old.clone(),
                new: ConfigItem::Fstab(FstabEntry::custom(dir, opts)),
            })
        }
    };

    Ok(FilesystemOptionsPlan { set_label, config })
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct PassphraseValues {
    pub passphrase: String,
}

impl fmt::Debug for PassphraseValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PassphraseValues { .. }")
    }
}

pub fn plan_unlock(values: &PassphraseValues) -> Result<&str, ValidationError> {
    if values.passphrase.is_empty() {
        return Err(ValidationError::EmptyPassphrase);
    }
    Ok(&values.passphrase)
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct EncryptionOptionsValues {
    /// Stored passphrase, empty to not store one
    pub passphrase: String,
    pub options: String,
}

impl fmt::Debug for EncryptionOptionsValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionOptionsValues")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn crypttab_of(items: &[ConfigItem]) -> Option<(&ConfigItem, &CrypttabEntry)> {
    items.iter().find_map(|item| match item {
        ConfigItem::Crypttab(entry) => Some((item, entry)),
        _ => None,
    })
}

impl EncryptionOptionsValues {
    /// Dialog values from the block's secret configuration
    pub fn current(secret_items: &[ConfigItem]) -> Self {
        match crypttab_of(secret_items) {
            Some((_, entry)) => Self {
                passphrase: entry.passphrase_contents.clone(),
                options: strip_parent_options(&entry.options),
            },
            None => Self::default(),
        }
    }
}

/// crypttab edit, `None` when neither passphrase nor options changed
pub fn plan_encryption_options(
    secret_items: &[ConfigItem],
    values: &EncryptionOptionsValues,
) -> Option<ConfigChange> {
    let options = values.options.trim();
    let old = crypttab_of(secret_items);

    let unchanged = old.is_some_and(|(_, entry)| {
        entry.passphrase_contents == values.passphrase
            && strip_parent_options(&entry.options) == options
    });
    if unchanged {
        return None;
    }

    let new = ConfigItem::Crypttab(CrypttabEntry::new(options, Some(&values.passphrase)));
    Some(match old {
        Some((item, _)) => ConfigChange::Update {
            old: item.clone(),
            new,
        },
        None => ConfigChange::Add(new),
    })
}

// ----------------------------------------------------------------------------
// Logical volumes
// ----------------------------------------------------------------------------

/// Range of a size slider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeLimits {
    pub value: u64,
    pub max: u64,

    /// Sizes are rounded up to this (the extent size)
    pub round: u64,

    /// Sizes above `max` are allowed (thin volumes)
    pub allow_infinite: bool,
}

impl SizeLimits {
    fn check(&self, requested: u64) -> Result<u64, ValidationError> {
        let size = round_up(requested, self.round)
            .ok_or_else(|| ValidationError::TooLarge(fmt_size(self.max)))?;
        if size == 0 {
            return Err(ValidationError::ZeroSize);
        }
        if !self.allow_infinite && size > self.max {
            return Err(ValidationError::TooLarge(fmt_size(self.max)));
        }
        Ok(size)
    }
}

fn extent_size(snapshot: &StorageSnapshot, lvol: &LogicalVolumeRecord) -> u64 {
    snapshot
        .volume_group(&lvol.volume_group)
        .map(|vg| vg.extent_size)
        .unwrap_or(0)
}

/// Thin volumes may grow to three times their pool; others by the free
/// space of their group
pub fn resize_limits(snapshot: &StorageSnapshot, lvol: &LogicalVolumeRecord) -> SizeLimits {
    let pool = lvol
        .thin_pool
        .as_deref()
        .and_then(|p| snapshot.logical_volume(p));
    let free = snapshot
        .volume_group(&lvol.volume_group)
        .map(|vg| vg.free_size)
        .unwrap_or(0);

    SizeLimits {
        value: lvol.size,
        max: match pool {
            Some(pool) => pool.size.saturating_mul(3),
            None => lvol.size.saturating_add(free),
        },
        round: extent_size(snapshot, lvol),
        allow_infinite: pool.is_some(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeValues {
    pub size: u64,
}

/// A volume without a filesystem cannot shrink; one with a filesystem is
/// always resized together with it
pub fn plan_resize(
    snapshot: &StorageSnapshot,
    lvol: &LogicalVolumeRecord,
    values: &SizeValues,
) -> Result<(u64, ResizeOptions), ValidationError> {
    let has_filesystem = snapshot
        .block_of_lvol(&lvol.path)
        .is_some_and(|b| b.is_filesystem());

    let size = resize_limits(snapshot, lvol).check(values.size)?;
    if !has_filesystem && size < lvol.size {
        return Err(ValidationError::CannotShrink);
    }

    Ok((
        size,
        ResizeOptions {
            resize_fsys: has_filesystem,
        },
    ))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValues {
    pub name: String,
}

pub fn plan_name(values: &NameValues) -> Result<&str, ValidationError> {
    validate_lvm2_name(&values.name)?;
    Ok(&values.name)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizedNameValues {
    pub name: String,

    /// Defaults apply when unset
    pub size: Option<u64>,
}

/// Snapshot slider: 20% of the volume by default, up to its size
pub fn snapshot_limits(snapshot: &StorageSnapshot, lvol: &LogicalVolumeRecord) -> SizeLimits {
    let round = extent_size(snapshot, lvol);
    SizeLimits {
        value: round_up(lvol.size / 5, round).unwrap_or(lvol.size),
        max: lvol.size,
        round,
        allow_infinite: false,
    }
}

/// Name and size of a new snapshot; thin snapshots take no size
pub fn plan_snapshot(
    snapshot: &StorageSnapshot,
    lvol: &LogicalVolumeRecord,
    values: &SizedNameValues,
) -> Result<(String, u64), ValidationError> {
    validate_lvm2_name(&values.name)?;
    if lvol.thin_pool.is_some() {
        return Ok((values.name.clone(), 0));
    }
    let limits = snapshot_limits(snapshot, lvol);
    let size = limits.check(values.size.unwrap_or(limits.value))?;
    Ok((values.name.clone(), size))
}

pub fn thin_volume_limits(snapshot: &StorageSnapshot, pool: &LogicalVolumeRecord) -> SizeLimits {
    SizeLimits {
        value: pool.size,
        max: pool.size.saturating_mul(3),
        round: extent_size(snapshot, pool),
        allow_infinite: true,
    }
}

pub fn plan_thin_volume(
    snapshot: &StorageSnapshot,
    pool: &LogicalVolumeRecord,
    values: &SizedNameValues,
) -> Result<(String, u64), ValidationError> {
    validate_lvm2_name(&values.name)?;
    let limits = thin_volume_limits(snapshot, pool);
    let size = limits.check(values.size.unwrap_or(limits.value))?;
    Ok((values.name.clone(), size))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LvPurpose {
    /// Block device for filesystems
    #[default]
    Block,

    /// Pool for thinly provisioned volumes
    Pool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalVolumeValues {
    pub name: String,
    pub purpose: LvPurpose,
    pub size: u64,
}

/// First of "lvol0" .. "lvol999" not used in the group
pub fn default_lvol_name(snapshot: &StorageSnapshot, vgroup: &str) -> String {
    let lvols = snapshot.lvols_of(vgroup);
    (0..1000)
        .map(|i| format!("lvol{i}"))
        .find(|name| !lvols.iter().any(|lv| &lv.name == name))
        .unwrap_or_else(|| "lvol999".to_string())
}

/// Pre-filled values for a new volume: default name, all free space
pub fn logical_volume_defaults(
    snapshot: &StorageSnapshot,
    vgroup: &VolumeGroupRecord,
) -> LogicalVolumeValues {
    LogicalVolumeValues {
        name: default_lvol_name(snapshot, &vgroup.path),
        purpose: LvPurpose::Block,
        size: vgroup.free_size,
    }
}

pub fn plan_logical_volume(
    snapshot: &StorageSnapshot,
    vgroup: &VolumeGroupRecord,
    values: &LogicalVolumeValues,
) -> Result<u64, ValidationError> {
    validate_lvm2_name(&values.name)?;
    if snapshot
        .lvols_of(&vgroup.path)
        .iter()
        .any(|lv| lv.name == values.name)
    {
        return Err(ValidationError::NameInUse);
    }
    SizeLimits {
        value: vgroup.free_size,
        max: vgroup.free_size,
        round: vgroup.extent_size,
        allow_infinite: false,
    }
    .check(values.size)
}

// ----------------------------------------------------------------------------
// Disks
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisksValues {
    /// Block object paths
    pub disks: Vec<String>,
}

pub fn plan_disks(values: &DisksValues) -> Result<&[String], ValidationError> {
    if values.disks.is_empty() {
        return Err(ValidationError::NoDisks);
    }
    Ok(&values.disks)
}

/// A block offered in an "Add Disks" dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockChoice {
    pub path: String,
    pub name: String,
    pub description: String,
}

fn is_free(snapshot: &StorageSnapshot, block: &BlockRecord) -> bool {
    // An LVM label only counts when the group it names is known
    let has_label = match block.id_usage {
        IdUsage::Unknown => false,
        _ if block.id_type == "LVM2_member" => snapshot
            .physical_volume(&block.path)
            .and_then(|pv| pv.volume_group.as_deref())
            .and_then(|vg| snapshot.volume_group(vg))
            .is_some(),
        _ => true,
    };
    let is_container = snapshot
        .partition(&block.path)
        .is_some_and(|p| p.is_container);

    block.size > 0
        && !has_label
        && snapshot.partition_table(&block.path).is_none()
        && !is_container
}

fn block_choice(snapshot: &StorageSnapshot, block: &BlockRecord) -> BlockChoice {
    let size = fmt_size(block.size);
    let description = if let Some(part) = snapshot.partition(&block.path) {
        let parent = snapshot
            .block(&part.table)
            .map(|table| {
                table
                    .drive
                    .as_deref()
                    .and_then(|d| snapshot.drive(d))
                    .map(|d| d.display_name())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| table.name().to_string())
            })
            .unwrap_or_default();
        format!("{size} Partition of {parent}")
    } else if let Some(lvol) = snapshot.lvol_of_block(&block.path) {
        format!("{size} Logical Volume {}", lvol_name(snapshot, lvol))
    } else if let Some(drive) = block.drive.as_deref().and_then(|d| snapshot.drive(d)) {
        format!("{size} {}", drive.display_name())
    } else {
        format!("{size} Block Device")
    };

    BlockChoice {
        path: block.path.clone(),
        name: block.name().to_string(),
        description,
    }
}

/// Blocks that hold nothing and can become RAID members or physical volumes
pub fn free_block_devices(snapshot: &StorageSnapshot) -> Vec<BlockChoice> {
    let mut choices: Vec<BlockChoice> = snapshot
        .blocks
        .values()
        .filter(|b| is_free(snapshot, b))
        .map(|b| block_choice(snapshot, b))
        .collect();
    choices.sort_by(|a, b| a.name.cmp(&b.name));
    choices
}

/// A partition counts as the block its table lives on
fn owning_block<'a>(snapshot: &'a StorageSnapshot, path: &str) -> Option<&'a BlockRecord> {
    match snapshot.partition(path) {
        Some(part) => snapshot.block(&part.table),
        None => snapshot.block(path),
    }
}

/// Free blocks that are not part of the array's own device
pub fn mdraid_disk_candidates(snapshot: &StorageSnapshot, mdraid: &str) -> Vec<BlockChoice> {
    free_block_devices(snapshot)
        .into_iter()
        .filter(|choice| {
            owning_block(snapshot, &choice.path)
                .is_some_and(|b| b.mdraid.as_deref() != Some(mdraid))
        })
        .collect()
}

/// Free blocks that are not carved out of the group itself
pub fn vgroup_disk_candidates(snapshot: &StorageSnapshot, vgroup: &str) -> Vec<BlockChoice> {
    free_block_devices(snapshot)
        .into_iter()
        .filter(|choice| {
            owning_block(snapshot, &choice.path)
                .and_then(|b| snapshot.lvol_of_block(&b.path))
                .is_none_or(|lv| lv.volume_group != vgroup)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_types::{
        BlockLvm2Record, EncryptedRecord, FilesystemRecord, GIB, IdUsage, MIB, MdRaidRecord,
        PartitionRecord, PartitionTableRecord, PartitionTableType, PhysicalVolumeRecord,
        VolumeGroupRecord,
    };

    fn manager(supported: &[&str]) -> ManagerRecord {
        ManagerRecord {
            version: "2.10.1".into(),
            supported_filesystems: supported.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn slot() -> PartitionSlot {
        PartitionSlot {
            start: MIB,
            size: 4 * GIB,
            enable_dos_extended: false,
        }
    }

    #[test]
    fn options_follow_supported_filesystems() {
        let options = filesystem_options(&manager(&["ext4", "vfat"]), true, false);
        let values: Vec<_> = options.iter().map(|o| o.choice.value()).collect();
        assert_eq!(
            values,
            vec!["ext4", "luks+ext4", "vfat", "dos-extended", "empty", "custom"]
        );
        let extended = options
            .iter()
            .find(|o| o.choice == FilesystemChoice::DosExtended)
            .unwrap();
        assert!(!extended.enabled);

        let all = filesystem_options(&manager(&[]), true, true);
        assert_eq!(all.len(), 9);
        assert!(all.iter().all(|o| o.enabled));
    }

    #[test]
    fn encrypted_format_needs_matching_passphrases() {
        let mut values = FormatValues {
            fs: FilesystemChoice::LuksExt4,
            ..Default::default()
        };
        let m = manager(&[]);
        assert_eq!(
            plan_format(&m, "/b/sda1", None, &values),
            Err(ValidationError::EmptyPassphrase)
        );
        values.passphrase = "secret".into();
        values.passphrase_confirm = "secrte".into();
        assert_eq!(
            plan_format(&m, "/b/sda1", None, &values),
            Err(ValidationError::PassphraseMismatch)
        );
    }

    #[test]
    fn encrypted_format_carries_config_items() {
        let values = FormatValues {
            fs: FilesystemChoice::LuksXfs,
            name: "data".into(),
            passphrase: "secret".into(),
            passphrase_confirm: "secret".into(),
            crypto_options: "discard".into(),
            mounting: Mounting::Custom {
                mount_point: "/srv/data".into(),
                mount_options: String::new(),
            },
            ..Default::default()
        };
        let plan = plan_format(&manager(&[]), "/b/sda1", None, &values).unwrap();
        let FormatPlan::Format {
            block,
            fs_type,
            options,
        } = plan
        else {
            panic!("expected a format plan");
        };
        assert_eq!(block, "/b/sda1");
        assert_eq!(fs_type, "xfs");
        assert!(options.no_block && options.dry_run_first && options.tear_down);
        assert_eq!(options.label.as_deref(), Some("data"));
        assert_eq!(options.encrypt_passphrase.as_deref(), Some("secret"));
        assert_eq!(options.config_items.len(), 2);

        match &options.config_items[0] {
            ConfigItem::Fstab(entry) => {
                assert_eq!(entry.dir, "/srv/data");
                assert_eq!(entry.opts, "defaults");
                assert_eq!(entry.fs_type, "auto");
            }
            other => panic!("unexpected item {other:?}"),
        }
        match &options.config_items[1] {
            ConfigItem::Crypttab(entry) => {
                assert_eq!(entry.options, "discard");
                assert_eq!(entry.passphrase_contents, "");
                assert!(entry.track_parents);
            }
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn create_partition_plans() {
        let m = manager(&[]);
        let values = FormatValues {
            fs: FilesystemChoice::Empty,
            size: Some(GIB),
            ..Default::default()
        };
        assert_eq!(
            plan_format(&m, "/b/sda", Some(slot()), &values),
            Ok(FormatPlan::CreatePartition {
                table_block: "/b/sda".into(),
                offset: MIB,
                size: GIB,
                type_id: String::new(),
            })
        );

        let values = FormatValues {
            fs: FilesystemChoice::DosExtended,
            ..Default::default()
        };
        assert_eq!(
            plan_format(&m, "/b/sda", Some(slot()), &values),
            Err(ValidationError::ExtendedNotAllowed)
        );
        let dos = PartitionSlot {
            enable_dos_extended: true,
            ..slot()
        };
        assert_eq!(
            plan_format(&m, "/b/sda", Some(dos), &values),
            Ok(FormatPlan::CreatePartition {
                table_block: "/b/sda".into(),
                offset: MIB,
                size: 4 * GIB,
                type_id: "0x05".into(),
            })
        );

        let values = FormatValues {
            fs: FilesystemChoice::Ext4,
            size: Some(8 * GIB),
            ..Default::default()
        };
        assert!(matches!(
            plan_format(&m, "/b/sda", Some(slot()), &values),
            Err(ValidationError::TooLarge(_))
        ));
    }

    #[test]
    fn custom_type_replaces_choice() {
        let values = FormatValues {
            fs: FilesystemChoice::Custom,
            custom_type: " btrfs ".into(),
            ..Default::default()
        };
        let plan = plan_format(&manager(&["xfs"]), "/b/sdb", None, &values).unwrap();
        assert!(matches!(plan, FormatPlan::Format { fs_type, .. } if fs_type == "btrfs"));

        let empty = FormatValues {
            fs: FilesystemChoice::Custom,
            ..Default::default()
        };
        assert_eq!(
            plan_format(&manager(&[]), "/b/sdb", None, &empty),
            Err(ValidationError::EmptyFilesystemType)
        );
    }

    #[test]
    fn format_disk_uses_partitioning_as_type() {
        let plan = plan_format_disk(
            "/b/sda",
            &FormatDiskValues {
                erase: EraseMode::Zero,
                partitioning: DiskPartitioning::Dos,
            },
        );
        let FormatPlan::Format {
            fs_type, options, ..
        } = plan
        else {
            panic!("expected a format plan");
        };
        assert_eq!(fs_type, "dos");
        assert!(options.no_block && options.tear_down && !options.dry_run_first);
        assert_eq!(options.erase, EraseMode::Zero);
    }

    fn fstab_block(opts: &str) -> BlockRecord {
        BlockRecord {
            path: "/b/sda1".into(),
            id_label: "old".into(),
            configuration: vec![ConfigItem::Fstab(FstabEntry {
                fsname: "UUID=1234".into(),
                dir: "/data".into(),
                fs_type: "auto".into(),
                opts: opts.into(),
                track_parents: true,
                ..Default::default()
            })],
            ..Default::default()
        }
    }

    #[test]
    fn filesystem_options_only_touch_what_changed() {
        let block = fstab_block("noauto,x-parent=abc");
        let values = FilesystemOptionsValues::current(&block);
        assert_eq!(
            values.mounting,
            Mounting::Custom {
                mount_point: "/data".into(),
                mount_options: "noauto".into(),
            }
        );
        let plan = plan_filesystem_options(&block, &values).unwrap();
        assert_eq!(plan, FilesystemOptionsPlan::default());

        let renamed = FilesystemOptionsValues {
            name: "new".into(),
            mounting: Mounting::Default,
        };
        let plan = plan_filesystem_options(&block, &renamed).unwrap();
        assert_eq!(plan.set_label.as_deref(), Some("new"));
        assert_eq!(
            plan.config,
            Some(ConfigChange::Remove(block.configuration[0].clone()))
        );

        let moved = FilesystemOptionsValues {
            name: "old".into(),
            mounting: Mounting::Custom {
                mount_point: "/srv".into(),
                mount_options: "noauto".into(),
            },
        };
        match plan_filesystem_options(&block, &moved).unwrap().config {
            Some(ConfigChange::Update { old, new }) => {
                assert_eq!(old, block.configuration[0]);
                assert!(matches!(new, ConfigItem::Fstab(e) if e.dir == "/srv"));
            }
            other => panic!("unexpected change {other:?}"),
        }
    }

    #[test]
    fn relative_mount_point_is_rejected() {
        let block = BlockRecord::default();
        let values = FilesystemOptionsValues {
            name: String::new(),
            mounting: Mounting::Custom {
                mount_point: "data".into(),
                mount_options: String::new(),
            },
        };
        assert_eq!(
            plan_filesystem_options(&block, &values),
            Err(ValidationError::RelativeMountPoint)
        );
    }

    #[test]
    fn encryption_options_add_or_update() {
        let values = EncryptionOptionsValues {
            passphrase: String::new(),
            options: "discard".into(),
        };
        assert!(matches!(
            plan_encryption_options(&[], &values),
            Some(ConfigChange::Add(ConfigItem::Crypttab(_)))
        ));

        let old = ConfigItem::Crypttab(CrypttabEntry {
            name: "luks-1".into(),
            options: "discard,x-parent=1".into(),
            passphrase_contents: String::new(),
            track_parents: true,
            ..Default::default()
        });
        let secret = vec![old.clone()];
        assert_eq!(EncryptionOptionsValues::current(&secret), values);
        assert_eq!(plan_encryption_options(&secret, &values), None);

        let stored = EncryptionOptionsValues {
            passphrase: "secret".into(),
            options: "discard".into(),
        };
        match plan_encryption_options(&secret, &stored) {
            Some(ConfigChange::Update { old: o, new }) => {
                assert_eq!(o, old);
                assert!(matches!(new, ConfigItem::Crypttab(e) if e.passphrase_contents == "secret"));
            }
            other => panic!("unexpected change {other:?}"),
        }
    }

    fn lvm_snapshot() -> StorageSnapshot {
        let mut snapshot = StorageSnapshot::default();
        snapshot.insert(VolumeGroupRecord {
            path: "/vg/0".into(),
            name: "vg0".into(),
            size: 20 * GIB,
            free_size: 6 * GIB,
            extent_size: 4 * MIB,
            ..Default::default()
        });
        snapshot.insert(LogicalVolumeRecord {
            path: "/lv/raw".into(),
            name: "lvol0".into(),
            size: 4 * GIB,
            active: true,
            volume_group: "/vg/0".into(),
            ..Default::default()
        });
        snapshot
    }

    #[test]
    fn volume_without_filesystem_cannot_shrink() {
        let snapshot = lvm_snapshot();
        let lvol = snapshot.logical_volume("/lv/raw").unwrap().clone();

        assert_eq!(
            plan_resize(&snapshot, &lvol, &SizeValues { size: 2 * GIB }),
            Err(ValidationError::CannotShrink)
        );
        assert_eq!(
            plan_resize(&snapshot, &lvol, &SizeValues { size: 6 * GIB + 1 }),
            Ok((6 * GIB + 4 * MIB, ResizeOptions { resize_fsys: false }))
        );
        assert!(matches!(
            plan_resize(&snapshot, &lvol, &SizeValues { size: 11 * GIB }),
            Err(ValidationError::TooLarge(_))
        ));
    }

    #[test]
    fn size_near_the_integer_limit_is_too_large() {
        let snapshot = lvm_snapshot();
        let lvol = snapshot.logical_volume("/lv/raw").unwrap().clone();
        let limits = resize_limits(&snapshot, &lvol);

        assert!(matches!(
            limits.check(u64::MAX - 1),
            Err(ValidationError::TooLarge(_))
        ));
        let thin = SizeLimits {
            allow_infinite: true,
            ..limits
        };
        assert!(matches!(
            thin.check(u64::MAX),
            Err(ValidationError::TooLarge(_))
        ));
        assert!(matches!(
            plan_resize(&snapshot, &lvol, &SizeValues { size: u64::MAX }),
            Err(ValidationError::TooLarge(_))
        ));
    }

    #[test]
    fn volume_with_filesystem_resizes_it() {
        let mut snapshot = lvm_snapshot();
        snapshot.insert(BlockRecord {
            path: "/b/dm0".into(),
            id_usage: IdUsage::Filesystem,
            id_type: "xfs".into(),
            ..Default::default()
        });
        snapshot.insert(BlockLvm2Record {
            path: "/b/dm0".into(),
            logical_volume: Some("/lv/raw".into()),
        });
        let lvol = snapshot.logical_volume("/lv/raw").unwrap().clone();
        assert_eq!(
            plan_resize(&snapshot, &lvol, &SizeValues { size: 2 * GIB }),
            Ok((2 * GIB, ResizeOptions { resize_fsys: true }))
        );
    }

    #[test]
    fn snapshot_size_defaults_to_a_fifth() {
        let snapshot = lvm_snapshot();
        let lvol = snapshot.logical_volume("/lv/raw").unwrap().clone();
        let values = SizedNameValues {
            name: "snap".into(),
            size: None,
        };
        let (name, size) = plan_snapshot(&snapshot, &lvol, &values).unwrap();
        assert_eq!(name, "snap");
        assert_eq!(Some(size), round_up(4 * GIB / 5, 4 * MIB));

        let thin = LogicalVolumeRecord {
            thin_pool: Some("/lv/pool".into()),
            ..lvol
        };
        assert_eq!(plan_snapshot(&snapshot, &thin, &values), Ok(("snap".into(), 0)));

        let bad = SizedNameValues {
            name: "snapshot1".into(),
            size: None,
        };
        assert!(matches!(
            plan_snapshot(&snapshot, &thin, &bad),
            Err(ValidationError::InvalidName(_))
        ));
    }

    #[test]
    fn default_volume_name_skips_used_ones() {
        let snapshot = lvm_snapshot();
        assert_eq!(default_lvol_name(&snapshot, "/vg/0"), "lvol1");
        let vgroup = snapshot.volume_group("/vg/0").unwrap().clone();
        let defaults = logical_volume_defaults(&snapshot, &vgroup);
        assert_eq!(defaults.size, 6 * GIB);

        let taken = LogicalVolumeValues {
            name: "lvol0".into(),
            ..defaults.clone()
        };
        assert_eq!(
            plan_logical_volume(&snapshot, &vgroup, &taken),
            Err(ValidationError::NameInUse)
        );
        assert_eq!(plan_logical_volume(&snapshot, &vgroup, &defaults), Ok(6 * GIB));
    }

    #[test]
    fn adding_disks_needs_one() {
        assert_eq!(
            plan_disks(&DisksValues::default()),
            Err(ValidationError::NoDisks)
        );
    }

    #[test]
    fn alerts_walk_cleartext_and_partitions() {
        let mut snapshot = StorageSnapshot::default();
        snapshot.insert(BlockRecord {
            path: "/b/sda".into(),
            device: "/dev/sda".into(),
            size: 10 * GIB,
            ..Default::default()
        });
        snapshot.insert(PartitionTableRecord {
            path: "/b/sda".into(),
            table_type: PartitionTableType::Gpt,
        });
        snapshot.insert(BlockRecord {
            path: "/b/sda1".into(),
            device: "/dev/sda1".into(),
            id_usage: IdUsage::Crypto,
            ..Default::default()
        });
        snapshot.insert(PartitionRecord {
            path: "/b/sda1".into(),
            table: "/b/sda".into(),
            size: GIB,
            ..Default::default()
        });
        snapshot.insert(EncryptedRecord {
            path: "/b/sda1".into(),
            cleartext_device: Some("/b/dm0".into()),
        });
        snapshot.insert(BlockRecord {
            path: "/b/dm0".into(),
            device: "/dev/dm-0".into(),
            id_usage: IdUsage::Filesystem,
            ..Default::default()
        });
        snapshot.insert(FilesystemRecord {
            path: "/b/dm0".into(),
            mount_points: vec!["/home".into()],
        });
        snapshot.insert(BlockRecord {
            path: "/b/sda2".into(),
            device: "/dev/sda2".into(),
            id_usage: IdUsage::Raid,
            mdraid_member: Some("/md/0".into()),
            ..Default::default()
        });
        snapshot.insert(PartitionRecord {
            path: "/b/sda2".into(),
            table: "/b/sda".into(),
            offset: GIB,
            size: GIB,
            ..Default::default()
        });
        snapshot.insert(MdRaidRecord {
            path: "/md/0".into(),
            name: "md0".into(),
            ..Default::default()
        });

        let alerts = usage_alerts(&snapshot, "/b/sda");
        let messages: Vec<_> = alerts.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Device /dev/dm-0 is mounted on /home",
                "Device /dev/sda2 is a member of RAID Array md0",
            ]
        );

        let header = dialog_header(
            &snapshot,
            &Action::FormatDisk {
                block: "/b/sda".into(),
            },
        )
        .unwrap();
        assert_eq!(header.title, "Format Disk /dev/sda");
        assert_eq!(header.alerts.len(), 2);
    }

    #[test]
    fn free_devices_skip_used_and_partitioned_blocks() {
        let mut snapshot = StorageSnapshot::default();
        snapshot.insert(BlockRecord {
            path: "/b/sdb".into(),
            device: "/dev/sdb".into(),
            size: GIB,
            ..Default::default()
        });
        snapshot.insert(BlockRecord {
            path: "/b/sdc".into(),
            device: "/dev/sdc".into(),
            size: GIB,
            id_usage: IdUsage::Filesystem,
            ..Default::default()
        });
        snapshot.insert(BlockRecord {
            path: "/b/sdd".into(),
            device: "/dev/sdd".into(),
            size: GIB,
            id_usage: IdUsage::Raid,
            id_type: "LVM2_member".into(),
            ..Default::default()
        });
        snapshot.insert(PhysicalVolumeRecord {
            path: "/b/sdd".into(),
            volume_group: None,
            ..Default::default()
        });
        snapshot.insert(BlockRecord {
            path: "/b/md0".into(),
            device: "/dev/md0".into(),
            size: GIB,
            mdraid: Some("/md/0".into()),
            ..Default::default()
        });

        let names: Vec<_> = free_block_devices(&snapshot)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["/dev/md0", "/dev/sdb", "/dev/sdd"]);

        let names: Vec<_> = mdraid_disk_candidates(&snapshot, "/md/0")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["/dev/sdb", "/dev/sdd"]);
    }
}
