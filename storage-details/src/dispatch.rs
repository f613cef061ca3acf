// SPDX-License-Identifier: GPL-3.0-only

//! Turns actions into daemon calls
//!
//! Every action looks its objects up in the snapshot it was offered from.
//! An object that has vanished in the meantime makes the action a no-op
//! ([`Outcome::Skipped`]) rather than an error.

use std::sync::Arc;

use serde::Serialize;
use storage_contracts::{StorageDaemon, StorageError};
use storage_types::{
    FormatOptions, MdRaidStartOptions, RemoveDeviceOptions, StorageSnapshot, TearDown,
};

use crate::actions::Action;
use crate::dialogs::{
    ConfigChange, DialogInput, FormatPlan, LvPurpose, PartitionSlot, deletable_lvol,
    format_target, plan_disks, plan_encryption_options, plan_filesystem_options, plan_format,
    plan_format_disk, plan_logical_volume, plan_name, plan_resize, plan_snapshot,
    plan_thin_volume, plan_unlock,
};
use crate::error::{DetailsError, ValidationError};
use crate::render::check_offered;

/// An action together with what its dialog collected
#[derive(Debug, Clone)]
pub struct Request {
    pub action: Action,
    pub input: DialogInput,
}

impl Request {
    pub fn new(action: Action, input: DialogInput) -> Self {
        Self { action, input }
    }

    /// A dialog-free action
    pub fn direct(action: Action) -> Self {
        Self {
            action,
            input: DialogInput::None,
        }
    }
}

/// Where the view should go after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "location", content = "name", rename_all = "snake_case")]
pub enum Location {
    Overview,
    VolumeGroup(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,

    /// The object the action refers to is gone
    Skipped,

    /// Done, and the selected object no longer exists under its name
    Navigate(Location),
}

macro_rules! dialog_input {
    ($request:expr, $variant:ident) => {
        match &$request.input {
            DialogInput::$variant(values) => values,
            _ => {
                return Err(ValidationError::MissingInput($request.action.name()).into());
            }
        }
    };
}

macro_rules! confirmed {
    ($request:expr) => {
        if !matches!($request.input, DialogInput::Confirm) {
            return Err(ValidationError::MissingInput($request.action.name()).into());
        }
    };
}

macro_rules! lookup {
    ($found:expr, $what:literal, $path:expr) => {
        match $found {
            Some(found) => found,
            None => {
                tracing::debug!("{} {} is gone, nothing to do", $what, $path);
                return Ok(Outcome::Skipped);
            }
        }
    };
}

pub struct Dispatcher<D: ?Sized> {
    daemon: Arc<D>,
}

impl<D: ?Sized> Clone for Dispatcher<D> {
    fn clone(&self) -> Self {
        Self {
            daemon: Arc::clone(&self.daemon),
        }
    }
}

impl<D: StorageDaemon + ?Sized> Dispatcher<D> {
    pub fn new(daemon: Arc<D>) -> Self {
        Self { daemon }
    }

    pub fn daemon(&self) -> &Arc<D> {
        &self.daemon
    }

    /// [`Dispatcher::execute`] for requests that do not come from a menu:
    /// the action must be an enabled item on some page of `snapshot`.
    pub async fn execute_offered(
        &self,
        snapshot: &StorageSnapshot,
        request: &Request,
    ) -> Result<Outcome, DetailsError> {
        if let Err(e) = check_offered(snapshot, &request.action) {
            tracing::debug!(
                "Refusing {} on {}: {e}",
                request.action.name(),
                request.action.target()
            );
            return Err(e.into());
        }
        self.execute(snapshot, request).await
    }

    /// Validate `request` and make the calls it stands for.
    ///
    /// Validation failures return before any call is made. Calls that
    /// belong together run one after the other and stop at the first
    /// failure.
    pub async fn execute(
        &self,
        snapshot: &StorageSnapshot,
        request: &Request,
    ) -> Result<Outcome, DetailsError> {
        let daemon = self.daemon.as_ref();
        tracing::debug!("Executing {} on {}", request.action.name(), request.action.target());

        match &request.action {
            Action::FormatDisk { block } => {
                let block = lookup!(snapshot.block(block), "Block", block);
                let values = dialog_input!(request, FormatDisk);
                tracing::info!(
                    "Formatting disk {} with {} partitioning",
                    block.name(),
                    values.partitioning.as_udisks_str()
                );
                self.run_format(plan_format_disk(&block.path, values)).await?;
            }

            Action::CreatePartition {
                block,
                start,
                size,
                enable_dos_extended,
            } => {
                let block = lookup!(snapshot.block(block), "Block", block);
                let values = dialog_input!(request, Format);
                let slot = PartitionSlot {
                    start: *start,
                    size: *size,
                    enable_dos_extended: *enable_dos_extended,
                };
                let plan = plan_format(&snapshot.manager, &block.path, Some(slot), values)?;
                tracing::info!("Creating partition on {} at offset {}", block.name(), start);
                self.run_format(plan).await?;
            }

            Action::Format { target } => {
                let block = lookup!(format_target(snapshot, target), "Block", target);
                let values = dialog_input!(request, Format);
                let plan = plan_format(&snapshot.manager, &block.path, None, values)?;
                tracing::info!("Formatting {} as {}", block.name(), values.fs);
                self.run_format(plan).await?;
            }

            Action::Mount { block } => {
                lookup!(snapshot.filesystem(block), "Filesystem", block);
                let mount_point = daemon.mount(block).await?;
                tracing::info!("Mounted {block} on {mount_point}");
            }

            Action::Unmount { block } => {
                lookup!(snapshot.filesystem(block), "Filesystem", block);
                daemon.unmount(block).await?;
                tracing::info!("Unmounted {block}");
            }

            Action::FilesystemOptions { block } => {
                let record = lookup!(snapshot.block(block), "Block", block);
                let values = dialog_input!(request, FilesystemOptions);
                let plan = plan_filesystem_options(record, values)?;
                if let Some(label) = &plan.set_label {
                    tracing::info!("Setting label of {} to {label:?}", record.name());
                    daemon.set_label(block, label).await?;
                }
                if let Some(change) = &plan.config {
                    self.apply_config_change(block, change).await?;
                }
            }

            Action::Lock { block } => {
                lookup!(snapshot.encrypted_of(block), "Encrypted block", block);
                daemon.lock(block).await?;
                tracing::info!("Locked {block}");
            }

            Action::Unlock { block } => {
                lookup!(snapshot.encrypted_of(block), "Encrypted block", block);
                let passphrase = plan_unlock(dialog_input!(request, Passphrase))?;
                let cleartext = daemon.unlock(block, passphrase).await?;
                tracing::info!("Unlocked {block} as {cleartext}");
            }

            Action::EncryptionOptions { block } => {
                lookup!(snapshot.block(block), "Block", block);
                let values = dialog_input!(request, EncryptionOptions);
                let secret = daemon.secret_configuration(block).await?;
                match plan_encryption_options(&secret, values) {
                    Some(change) => self.apply_config_change(block, &change).await?,
                    None => tracing::debug!("Encryption options of {block} unchanged"),
                }
            }

            Action::MdRaidStart { mdraid } => {
                lookup!(snapshot.mdraid(mdraid), "RAID array", mdraid);
                daemon
                    .mdraid_start(
                        mdraid,
                        MdRaidStartOptions {
                            start_degraded: true,
                        },
                    )
                    .await?;
            }

            Action::MdRaidStop { mdraid } => {
                lookup!(snapshot.mdraid(mdraid), "RAID array", mdraid);
                daemon.mdraid_stop(mdraid).await?;
            }

            Action::MdRaidStartScrub { mdraid } => {
                lookup!(snapshot.mdraid(mdraid), "RAID array", mdraid);
                daemon.mdraid_request_sync_action(mdraid, "repair").await?;
            }

            Action::MdRaidStopScrub { mdraid } => {
                lookup!(snapshot.mdraid(mdraid), "RAID array", mdraid);
                daemon.mdraid_request_sync_action(mdraid, "idle").await?;
            }

            Action::MdRaidToggleBitmap { mdraid } => {
                let record = lookup!(snapshot.mdraid(mdraid), "RAID array", mdraid);
                let location = if record.bitmap_location == "none" {
                    "internal"
                } else {
                    "none"
                };
                tracing::info!("Setting bitmap of {mdraid} to {location}");
                daemon.mdraid_set_bitmap_location(mdraid, location).await?;
            }

            Action::MdRaidAddDisk { mdraid } => {
                lookup!(snapshot.mdraid(mdraid), "RAID array", mdraid);
                for disk in plan_disks(dialog_input!(request, Disks))? {
                    tracing::info!("Adding {disk} to {mdraid}");
                    daemon.mdraid_add_device(mdraid, disk).await?;
                }
            }

            Action::MdRaidRemoveDisk { block } => {
                let record = lookup!(snapshot.block(block), "Block", block);
                let mdraid = lookup!(record.mdraid_member.as_deref(), "Array of", block);
                tracing::info!("Removing {} from {mdraid}", record.name());
                daemon
                    .mdraid_remove_device(mdraid, block, RemoveDeviceOptions { wipe: true })
                    .await?;
            }

            Action::MdRaidDelete { mdraid } => {
                let record = lookup!(snapshot.mdraid(mdraid), "RAID array", mdraid);
                confirmed!(request);
                match daemon.mdraid_delete(mdraid, TearDown::YES).await {
                    Ok(()) => {}
                    Err(e) if e.is_unsupported() => {
                        tracing::info!("Daemon cannot delete arrays, stopping and wiping {mdraid}");
                        if !record.active_devices.is_empty() {
                            daemon.mdraid_stop(mdraid).await?;
                        }
                        for member in snapshot.mdraid_members(mdraid) {
                            daemon
                                .format(&member.path, "empty", &FormatOptions::default())
                                .await?;
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
                return Ok(Outcome::Navigate(Location::Overview));
            }

            Action::Resize { lvol } => {
                let record = lookup!(snapshot.logical_volume(lvol), "Logical volume", lvol);
                let (size, options) =
                    plan_resize(snapshot, record, dialog_input!(request, Size))?;
                tracing::info!("Resizing {} to {size} bytes", record.name);
                daemon.lv_resize(lvol, size, options).await?;
            }

            Action::Rename { lvol } => {
                let record = lookup!(snapshot.logical_volume(lvol), "Logical volume", lvol);
                let name = plan_name(dialog_input!(request, Name))?;
                tracing::info!("Renaming {} to {name}", record.name);
                daemon.lv_rename(lvol, name).await?;
            }

            Action::CreateSnapshot { lvol } => {
                let record = lookup!(snapshot.logical_volume(lvol), "Logical volume", lvol);
                let (name, size) =
                    plan_snapshot(snapshot, record, dialog_input!(request, SizedName))?;
                tracing::info!("Creating snapshot {name} of {}", record.name);
                daemon.lv_create_snapshot(lvol, &name, size).await?;
            }

            Action::Activate { lvol } => {
                lookup!(snapshot.logical_volume(lvol), "Logical volume", lvol);
                daemon.lv_activate(lvol).await?;
            }

            Action::Deactivate { lvol } => {
                lookup!(snapshot.logical_volume(lvol), "Logical volume", lvol);
                daemon.lv_deactivate(lvol).await?;
            }

            Action::CreateThin { pool } => {
                let record = lookup!(snapshot.logical_volume(pool), "Thin pool", pool);
                let vgroup = lookup!(
                    snapshot.volume_group(&record.volume_group),
                    "Volume group",
                    record.volume_group
                );
                let (name, size) =
                    plan_thin_volume(snapshot, record, dialog_input!(request, SizedName))?;
                tracing::info!("Creating thin volume {name} in pool {}", record.name);
                daemon
                    .vg_create_thin_volume(&vgroup.path, &name, size, pool)
                    .await?;
            }

            Action::VolumeGroupRename { vgroup } => {
                let record = lookup!(snapshot.volume_group(vgroup), "Volume group", vgroup);
                let name = plan_name(dialog_input!(request, Name))?;
                tracing::info!("Renaming volume group {} to {name}", record.name);
                daemon.vg_rename(vgroup, name).await?;
                return Ok(Outcome::Navigate(Location::VolumeGroup(name.to_string())));
            }

            Action::VolumeGroupDelete { vgroup } => {
                let record = lookup!(snapshot.volume_group(vgroup), "Volume group", vgroup);
                confirmed!(request);
                tracing::info!("Deleting volume group {}", record.name);
                daemon.vg_delete(vgroup, true, TearDown::YES).await?;
                return Ok(Outcome::Navigate(Location::Overview));
            }

            Action::VolumeGroupCreateLogicalVolume { vgroup } => {
                let record = lookup!(snapshot.volume_group(vgroup), "Volume group", vgroup);
                let values = dialog_input!(request, LogicalVolume);
                let size = plan_logical_volume(snapshot, record, values)?;
                tracing::info!(
                    "Creating logical volume {} ({:?}) in {}",
                    values.name,
                    values.purpose,
                    record.name
                );
                match values.purpose {
                    LvPurpose::Block => {
                        daemon
                            .vg_create_plain_volume(vgroup, &values.name, size)
                            .await?;
                    }
                    LvPurpose::Pool => {
                        daemon
                            .vg_create_thin_pool_volume(vgroup, &values.name, size)
                            .await?;
                    }
                }
            }

            Action::VolumeGroupAddDisk { vgroup } => {
                lookup!(snapshot.volume_group(vgroup), "Volume group", vgroup);
                for disk in plan_disks(dialog_input!(request, Disks))? {
                    tracing::info!("Adding {disk} to {vgroup}");
                    daemon.vg_add_device(vgroup, disk).await?;
                }
            }

            Action::PhysicalVolumeEmptyAndRemove { block } => {
                let pvol = lookup!(snapshot.physical_volume(block), "Physical volume", block);
                let vgroup = lookup!(pvol.volume_group.as_deref(), "Group of", block);
                tracing::info!("Moving data off {block} before removing it from {vgroup}");
                daemon.vg_empty_device(vgroup, block).await?;
                daemon
                    .vg_remove_device(vgroup, block, RemoveDeviceOptions { wipe: true })
                    .await?;
            }

            Action::PhysicalVolumeRemove { block } => {
                let pvol = lookup!(snapshot.physical_volume(block), "Physical volume", block);
                let vgroup = lookup!(pvol.volume_group.as_deref(), "Group of", block);
                tracing::info!("Removing {block} from {vgroup}");
                daemon
                    .vg_remove_device(vgroup, block, RemoveDeviceOptions { wipe: true })
                    .await?;
            }

            Action::Delete { target } => {
                if let Some(lvol) = deletable_lvol(snapshot, target) {
                    confirmed!(request);
                    tracing::info!("Deleting logical volume {}", lvol.name);
                    daemon.lv_delete(&lvol.path, TearDown::YES).await?;
                } else {
                    lookup!(snapshot.partition(target), "Partition", target);
                    confirmed!(request);
                    tracing::info!("Deleting partition {target}");
                    daemon.delete_partition(target, TearDown::YES).await?;
                }
            }

            Action::CancelJob { job } => {
                lookup!(snapshot.job(job), "Job", job);
                tracing::info!("Cancelling job {job}");
                daemon.cancel_job(job).await?;
            }
        }

        Ok(Outcome::Done)
    }

    async fn run_format(&self, plan: FormatPlan) -> Result<(), StorageError> {
        let daemon = self.daemon.as_ref();
        match plan {
            FormatPlan::Format {
                block,
                fs_type,
                options,
            } => daemon.format(&block, &fs_type, &options).await,
            FormatPlan::CreatePartition {
                table_block,
                offset,
                size,
                type_id,
            } => daemon
                .create_partition(&table_block, offset, size, &type_id, "")
                .await
                .map(|path| tracing::debug!("Created partition {path}")),
            FormatPlan::CreatePartitionAndFormat {
                table_block,
                offset,
                size,
                fs_type,
                options,
            } => daemon
                .create_partition_and_format(
                    &table_block,
                    offset,
                    size,
                    "",
                    "",
                    &fs_type,
                    &options,
                )
                .await
                .map(|path| tracing::debug!("Created partition {path}")),
        }
    }

    async fn apply_config_change(
        &self,
        block: &str,
        change: &ConfigChange,
    ) -> Result<(), StorageError> {
        let daemon = self.daemon.as_ref();
        match change {
            ConfigChange::Add(item) => {
                tracing::info!("Adding {} entry for {block}", item.kind());
                daemon.add_configuration_item(block, item).await
            }
            ConfigChange::Remove(item) => {
                tracing::info!("Removing {} entry of {block}", item.kind());
                daemon.remove_configuration_item(block, item).await
            }
            ConfigChange::Update { old, new } => {
                tracing::info!("Updating {} entry of {block}", new.kind());
                daemon.update_configuration_item(block, old, new).await
            }
        }
    }
}
