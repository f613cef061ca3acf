// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storage_contracts::{
    BlockOpsAdapter, JobOpsAdapter, LvmOpsAdapter, MdRaidOpsAdapter, SnapshotSource, StorageError,
};
use storage_types::{
    ActiveDevice, BlockLvm2Record, BlockRecord, ConfigItem, DriveRecord, FilesystemRecord,
    FormatOptions, GIB, IdUsage, LogicalVolumeRecord, LogicalVolumeType, MIB, ManagerRecord,
    MdRaidRecord, MdRaidStartOptions, PartitionRecord, PartitionTableRecord, PartitionTableType,
    PhysicalVolumeRecord, RemoveDeviceOptions, ResizeOptions, StorageSnapshot, TearDown,
    VolumeGroupRecord,
};

pub fn block_path(name: &str) -> String {
    format!("/org/freedesktop/UDisks2/block_devices/{name}")
}

pub const DRIVE: &str = "/org/freedesktop/UDisks2/drives/Disk_One";
pub const VGROUP: &str = "/org/freedesktop/UDisks2/lvm/vg0";
pub const MDRAID: &str = "/org/freedesktop/UDisks2/mdraid/md0";

pub fn lvol_path(name: &str) -> String {
    format!("{VGROUP}/{name}")
}

/// Daemon double that records every call as "method arg..." and answers
/// with canned results.
#[derive(Default)]
pub struct RecordingDaemon {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, StorageError>>,
    secret: Mutex<Vec<ConfigItem>>,
    snapshot: Mutex<StorageSnapshot>,
    last_format: Mutex<Option<FormatOptions>>,
}

impl RecordingDaemon {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Make every later call of `method` fail with `error`
    pub fn fail(&self, method: &'static str, error: StorageError) {
        self.failures.lock().unwrap().insert(method, error);
    }

    pub fn set_secret_configuration(&self, items: Vec<ConfigItem>) {
        *self.secret.lock().unwrap() = items;
    }

    pub fn set_snapshot(&self, snapshot: StorageSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn last_format_options(&self) -> Option<FormatOptions> {
        self.last_format.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, call: String) -> Result<(), StorageError> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlockOpsAdapter for RecordingDaemon {
    async fn format(
        &self,
        block: &str,
        fs_type: &str,
        options: &FormatOptions,
    ) -> Result<(), StorageError> {
        *self.last_format.lock().unwrap() = Some(options.clone());
        self.record("format", format!("format {block} {fs_type}"))
    }

    async fn add_configuration_item(
        &self,
        block: &str,
        item: &ConfigItem,
    ) -> Result<(), StorageError> {
        self.record(
            "add_configuration_item",
            format!("add_configuration_item {block} {}", item.kind()),
        )
    }

    async fn update_configuration_item(
        &self,
        block: &str,
        _old: &ConfigItem,
        new: &ConfigItem,
    ) -> Result<(), StorageError> {
        self.record(
            "update_configuration_item",
            format!("update_configuration_item {block} {}", new.kind()),
        )
    }

    async fn remove_configuration_item(
        &self,
        block: &str,
        item: &ConfigItem,
    ) -> Result<(), StorageError> {
        self.record(
            "remove_configuration_item",
            format!("remove_configuration_item {block} {}", item.kind()),
        )
    }

    async fn secret_configuration(&self, block: &str) -> Result<Vec<ConfigItem>, StorageError> {
        self.record("secret_configuration", format!("secret_configuration {block}"))?;
        Ok(self.secret.lock().unwrap().clone())
    }

    async fn create_partition(
        &self,
        table_block: &str,
        offset: u64,
        size: u64,
        type_id: &str,
        _name: &str,
    ) -> Result<String, StorageError> {
        self.record(
            "create_partition",
            format!("create_partition {table_block} {offset} {size} {type_id:?}"),
        )?;
        Ok(block_path("new1"))
    }

    async fn create_partition_and_format(
        &self,
        table_block: &str,
        offset: u64,
        size: u64,
        _type_id: &str,
        _name: &str,
        fs_type: &str,
        options: &FormatOptions,
    ) -> Result<String, StorageError> {
        *self.last_format.lock().unwrap() = Some(options.clone());
        self.record(
            "create_partition_and_format",
            format!("create_partition_and_format {table_block} {offset} {size} {fs_type}"),
        )?;
        Ok(block_path("new1"))
    }

    async fn delete_partition(
        &self,
        partition: &str,
        options: TearDown,
    ) -> Result<(), StorageError> {
        self.record(
            "delete_partition",
            format!("delete_partition {partition} tear_down={}", options.tear_down),
        )
    }

    async fn mount(&self, filesystem: &str) -> Result<String, StorageError> {
        self.record("mount", format!("mount {filesystem}"))?;
        Ok("/run/media/user/data".to_string())
    }

    async fn unmount(&self, filesystem: &str) -> Result<(), StorageError> {
        self.record("unmount", format!("unmount {filesystem}"))
    }

    async fn set_label(&self, filesystem: &str, label: &str) -> Result<(), StorageError> {
        self.record("set_label", format!("set_label {filesystem} {label}"))
    }

    async fn lock(&self, encrypted: &str) -> Result<(), StorageError> {
        self.record("lock", format!("lock {encrypted}"))
    }

    async fn unlock(&self, encrypted: &str, _passphrase: &str) -> Result<String, StorageError> {
        self.record("unlock", format!("unlock {encrypted}"))?;
        Ok(block_path("dm-9"))
    }
}

#[async_trait]
impl MdRaidOpsAdapter for RecordingDaemon {
    async fn mdraid_start(
        &self,
        mdraid: &str,
        options: MdRaidStartOptions,
    ) -> Result<(), StorageError> {
        self.record(
            "mdraid_start",
            format!("mdraid_start {mdraid} degraded={}", options.start_degraded),
        )
    }

    async fn mdraid_stop(&self, mdraid: &str) -> Result<(), StorageError> {
        self.record("mdraid_stop", format!("mdraid_stop {mdraid}"))
    }

    async fn mdraid_request_sync_action(
        &self,
        mdraid: &str,
        action: &str,
    ) -> Result<(), StorageError> {
        self.record(
            "mdraid_request_sync_action",
            format!("mdraid_request_sync_action {mdraid} {action}"),
        )
    }

    async fn mdraid_set_bitmap_location(
        &self,
        mdraid: &str,
        location: &str,
    ) -> Result<(), StorageError> {
        self.record(
            "mdraid_set_bitmap_location",
            format!("mdraid_set_bitmap_location {mdraid} {location}"),
        )
    }

    async fn mdraid_add_device(&self, mdraid: &str, block: &str) -> Result<(), StorageError> {
        self.record("mdraid_add_device", format!("mdraid_add_device {mdraid} {block}"))
    }

    async fn mdraid_remove_device(
        &self,
        mdraid: &str,
        block: &str,
        options: RemoveDeviceOptions,
    ) -> Result<(), StorageError> {
        self.record(
            "mdraid_remove_device",
            format!("mdraid_remove_device {mdraid} {block} wipe={}", options.wipe),
        )
    }

    async fn mdraid_delete(&self, mdraid: &str, options: TearDown) -> Result<(), StorageError> {
        self.record(
            "mdraid_delete",
            format!("mdraid_delete {mdraid} tear_down={}", options.tear_down),
        )
    }
}

#[async_trait]
impl LvmOpsAdapter for RecordingDaemon {
    async fn vg_rename(&self, vgroup: &str, new_name: &str) -> Result<String, StorageError> {
        self.record("vg_rename", format!("vg_rename {vgroup} {new_name}"))?;
        Ok(format!("/org/freedesktop/UDisks2/lvm/{new_name}"))
    }

    async fn vg_delete(
        &self,
        vgroup: &str,
        wipe: bool,
        options: TearDown,
    ) -> Result<(), StorageError> {
        self.record(
            "vg_delete",
            format!("vg_delete {vgroup} wipe={wipe} tear_down={}", options.tear_down),
        )
    }

    async fn vg_create_plain_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError> {
        self.record(
            "vg_create_plain_volume",
            format!("vg_create_plain_volume {vgroup} {name} {size}"),
        )?;
        Ok(format!("{vgroup}/{name}"))
    }

    async fn vg_create_thin_pool_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError> {
        self.record(
            "vg_create_thin_pool_volume",
            format!("vg_create_thin_pool_volume {vgroup} {name} {size}"),
        )?;
        Ok(format!("{vgroup}/{name}"))
    }

    async fn vg_create_thin_volume(
        &self,
        vgroup: &str,
        name: &str,
        size: u64,
        pool: &str,
    ) -> Result<String, StorageError> {
        self.record(
            "vg_create_thin_volume",
            format!("vg_create_thin_volume {vgroup} {name} {size} {pool}"),
        )?;
        Ok(format!("{vgroup}/{name}"))
    }

    async fn vg_add_device(&self, vgroup: &str, block: &str) -> Result<(), StorageError> {
        self.record("vg_add_device", format!("vg_add_device {vgroup} {block}"))
    }

    async fn vg_remove_device(
        &self,
        vgroup: &str,
        block: &str,
        options: RemoveDeviceOptions,
    ) -> Result<(), StorageError> {
        self.record(
            "vg_remove_device",
            format!("vg_remove_device {vgroup} {block} wipe={}", options.wipe),
        )
    }

    async fn vg_empty_device(&self, vgroup: &str, block: &str) -> Result<(), StorageError> {
        self.record("vg_empty_device", format!("vg_empty_device {vgroup} {block}"))
    }

    async fn vg_poll(&self, vgroup: &str) -> Result<(), StorageError> {
        self.record("vg_poll", format!("vg_poll {vgroup}"))
    }

    async fn lv_resize(
        &self,
        lvol: &str,
        new_size: u64,
        options: ResizeOptions,
    ) -> Result<(), StorageError> {
        self.record(
            "lv_resize",
            format!("lv_resize {lvol} {new_size} resize_fsys={}", options.resize_fsys),
        )
    }

    async fn lv_rename(&self, lvol: &str, new_name: &str) -> Result<String, StorageError> {
        self.record("lv_rename", format!("lv_rename {lvol} {new_name}"))?;
        Ok(lvol_path(new_name))
    }

    async fn lv_create_snapshot(
        &self,
        lvol: &str,
        name: &str,
        size: u64,
    ) -> Result<String, StorageError> {
        self.record(
            "lv_create_snapshot",
            format!("lv_create_snapshot {lvol} {name} {size}"),
        )?;
        Ok(lvol_path(name))
    }

    async fn lv_activate(&self, lvol: &str) -> Result<String, StorageError> {
        self.record("lv_activate", format!("lv_activate {lvol}"))?;
        Ok(block_path("dm-5"))
    }

    async fn lv_deactivate(&self, lvol: &str) -> Result<(), StorageError> {
        self.record("lv_deactivate", format!("lv_deactivate {lvol}"))
    }

    async fn lv_delete(&self, lvol: &str, options: TearDown) -> Result<(), StorageError> {
        self.record(
            "lv_delete",
            format!("lv_delete {lvol} tear_down={}", options.tear_down),
        )
    }
}

#[async_trait]
impl JobOpsAdapter for RecordingDaemon {
    async fn cancel_job(&self, job: &str) -> Result<(), StorageError> {
        self.record("cancel_job", format!("cancel_job {job}"))
    }
}

#[async_trait]
impl SnapshotSource for RecordingDaemon {
    async fn snapshot(&self) -> Result<StorageSnapshot, StorageError> {
        if let Some(error) = self.failures.lock().unwrap().get("snapshot") {
            return Err(error.clone());
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }
}

// ----------------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------------

pub fn manager() -> ManagerRecord {
    ManagerRecord {
        version: "2.10.1".to_string(),
        supported_filesystems: ["xfs", "ext4", "vfat", "swap"]
            .map(String::from)
            .to_vec(),
    }
}

pub fn block(name: &str, size: u64) -> BlockRecord {
    BlockRecord {
        path: block_path(name),
        device: format!("/dev/{name}"),
        preferred_device: format!("/dev/{name}"),
        size,
        ..Default::default()
    }
}

/// A 10 GiB GPT disk "sda": sda1 covers [0, 4 GiB) with ext4, sda2 covers
/// [5 GiB, 9 GiB) with nothing recognized on it.
pub fn partitioned_disk(sda1_mounted: bool) -> StorageSnapshot {
    let mut snapshot = StorageSnapshot {
        manager: manager(),
        ..Default::default()
    };

    snapshot.insert(DriveRecord {
        path: DRIVE.to_string(),
        vendor: "ACME".to_string(),
        model: "Disk One".to_string(),
        size: 10 * GIB,
        ..Default::default()
    });
    snapshot.insert(BlockRecord {
        drive: Some(DRIVE.to_string()),
        ..block("sda", 10 * GIB)
    });
    snapshot.insert(PartitionTableRecord {
        path: block_path("sda"),
        table_type: PartitionTableType::Gpt,
    });

    snapshot.insert(BlockRecord {
        id_usage: IdUsage::Filesystem,
        id_type: "ext4".to_string(),
        id_label: "data".to_string(),
        ..block("sda1", 4 * GIB)
    });
    snapshot.insert(FilesystemRecord {
        path: block_path("sda1"),
        mount_points: if sda1_mounted {
            vec!["/data".to_string()]
        } else {
            Vec::new()
        },
    });
    snapshot.insert(partition("sda1", 1, 0, 4 * GIB));

    snapshot.insert(block("sda2", 4 * GIB));
    snapshot.insert(partition("sda2", 2, 5 * GIB, 4 * GIB));

    snapshot
}

pub fn partition(name: &str, number: u32, offset: u64, size: u64) -> PartitionRecord {
    PartitionRecord {
        path: block_path(name),
        table: block_path("sda"),
        offset,
        size,
        number,
        ..Default::default()
    }
}

/// Group "vg0" on sdb and sdc with a plain xfs volume "lv0" (block dm-0), a
/// thin pool "pool0" and an inactive thin volume "thin0" in it.
pub fn volume_group(needs_polling: bool) -> StorageSnapshot {
    let mut snapshot = StorageSnapshot {
        manager: manager(),
        ..Default::default()
    };

    snapshot.insert(VolumeGroupRecord {
        path: VGROUP.to_string(),
        name: "vg0".to_string(),
        uuid: "vg0-uuid".to_string(),
        size: 20 * GIB,
        free_size: 4 * GIB,
        extent_size: 4 * MIB,
        needs_polling,
    });

    for name in ["sdb", "sdc"] {
        snapshot.insert(BlockRecord {
            id_usage: IdUsage::Raid,
            id_type: "LVM2_member".to_string(),
            ..block(name, 10 * GIB)
        });
        snapshot.insert(PhysicalVolumeRecord {
            path: block_path(name),
            volume_group: Some(VGROUP.to_string()),
            size: 10 * GIB,
            free_size: 2 * GIB,
        });
    }

    snapshot.insert(LogicalVolumeRecord {
        path: lvol_path("lv0"),
        name: "lv0".to_string(),
        size: 8 * GIB,
        active: true,
        volume_group: VGROUP.to_string(),
        ..Default::default()
    });
    snapshot.insert(BlockRecord {
        id_usage: IdUsage::Filesystem,
        id_type: "xfs".to_string(),
        ..block("dm-0", 8 * GIB)
    });
    snapshot.insert(FilesystemRecord {
        path: block_path("dm-0"),
        mount_points: Vec::new(),
    });
    snapshot.insert(BlockLvm2Record {
        path: block_path("dm-0"),
        logical_volume: Some(lvol_path("lv0")),
    });

    snapshot.insert(LogicalVolumeRecord {
        path: lvol_path("pool0"),
        name: "pool0".to_string(),
        size: 6 * GIB,
        active: true,
        lv_type: LogicalVolumeType::Pool,
        volume_group: VGROUP.to_string(),
        data_allocated_ratio: 0.25,
        ..Default::default()
    });
    snapshot.insert(LogicalVolumeRecord {
        path: lvol_path("thin0"),
        name: "thin0".to_string(),
        size: 10 * GIB,
        active: false,
        volume_group: VGROUP.to_string(),
        thin_pool: Some(lvol_path("pool0")),
        ..Default::default()
    });

    snapshot
}

/// Running two-disk RAID 1 "md0" on sdd and sde with its block md127
pub fn raid_array() -> StorageSnapshot {
    let mut snapshot = StorageSnapshot {
        manager: manager(),
        ..Default::default()
    };

    let members = ["sdd", "sde"];
    snapshot.insert(MdRaidRecord {
        path: MDRAID.to_string(),
        uuid: "md0-uuid".to_string(),
        name: "host:md0".to_string(),
        level: "raid1".to_string(),
        num_devices: 2,
        size: 10 * GIB,
        bitmap_location: "internal".to_string(),
        running: Some(true),
        active_devices: members
            .iter()
            .zip(0..)
            .map(|(name, slot)| ActiveDevice {
                block: block_path(name),
                slot,
                states: vec!["in_sync".to_string()],
                ..Default::default()
            })
            .collect(),
        sync_action: "idle".to_string(),
        ..Default::default()
    });
    snapshot.insert(BlockRecord {
        mdraid: Some(MDRAID.to_string()),
        ..block("md127", 10 * GIB)
    });
    for name in members {
        snapshot.insert(BlockRecord {
            id_usage: IdUsage::Raid,
            id_type: "linux_raid_member".to_string(),
            mdraid_member: Some(MDRAID.to_string()),
            ..block(name, 10 * GIB)
        });
    }

    snapshot
}
