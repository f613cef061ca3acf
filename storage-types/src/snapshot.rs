//! A point-in-time copy of every object the storage daemon exports
//!
//! Records are keyed by object path. Iteration follows path order, which is
//! the order the daemon hands objects out in. Lookups return `Option`: an
//! object may vanish between a change notification and the next reload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    BlockLvm2Record, BlockRecord, DriveAtaRecord, DriveRecord, EncryptedRecord,
    FilesystemRecord, JobRecord, LogicalVolumeRecord, ManagerRecord, MdRaidRecord,
    PartitionRecord, PartitionTableRecord, PhysicalVolumeRecord, VolumeGroupRecord,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSnapshot {
    pub manager: ManagerRecord,
    pub blocks: BTreeMap<String, BlockRecord>,
    pub filesystems: BTreeMap<String, FilesystemRecord>,
    pub partitions: BTreeMap<String, PartitionRecord>,
    pub partition_tables: BTreeMap<String, PartitionTableRecord>,
    pub encrypted: BTreeMap<String, EncryptedRecord>,
    pub physical_volumes: BTreeMap<String, PhysicalVolumeRecord>,
    pub block_lvm2: BTreeMap<String, BlockLvm2Record>,
    pub volume_groups: BTreeMap<String, VolumeGroupRecord>,
    pub logical_volumes: BTreeMap<String, LogicalVolumeRecord>,
    pub mdraids: BTreeMap<String, MdRaidRecord>,
    pub drives: BTreeMap<String, DriveRecord>,
    pub drives_ata: BTreeMap<String, DriveAtaRecord>,
    pub jobs: BTreeMap<String, JobRecord>,
}

/// A record that can be stored in a [`StorageSnapshot`] under its own path
pub trait ObjectRecord {
    fn object_path(&self) -> &str;
    fn store(self, snapshot: &mut StorageSnapshot);
}

macro_rules! object_record {
    ($record:ty, $field:ident) => {
        impl ObjectRecord for $record {
            fn object_path(&self) -> &str {
                &self.path
            }

            fn store(self, snapshot: &mut StorageSnapshot) {
                snapshot.$field.insert(self.path.clone(), self);
            }
        }
    };
}

object_record!(BlockRecord, blocks);
object_record!(FilesystemRecord, filesystems);
object_record!(PartitionRecord, partitions);
object_record!(PartitionTableRecord, partition_tables);
object_record!(EncryptedRecord, encrypted);
object_record!(PhysicalVolumeRecord, physical_volumes);
object_record!(BlockLvm2Record, block_lvm2);
object_record!(VolumeGroupRecord, volume_groups);
object_record!(LogicalVolumeRecord, logical_volumes);
object_record!(MdRaidRecord, mdraids);
object_record!(DriveRecord, drives);
object_record!(DriveAtaRecord, drives_ata);
object_record!(JobRecord, jobs);

impl StorageSnapshot {
    pub fn insert<R: ObjectRecord>(&mut self, record: R) {
        record.store(self);
    }

    pub fn block(&self, path: &str) -> Option<&BlockRecord> {
        self.blocks.get(path)
    }

    pub fn filesystem(&self, path: &str) -> Option<&FilesystemRecord> {
        self.filesystems.get(path)
    }

    pub fn partition(&self, path: &str) -> Option<&PartitionRecord> {
        self.partitions.get(path)
    }

    pub fn partition_table(&self, path: &str) -> Option<&PartitionTableRecord> {
        self.partition_tables.get(path)
    }

    pub fn encrypted_of(&self, path: &str) -> Option<&EncryptedRecord> {
        self.encrypted.get(path)
    }

    pub fn physical_volume(&self, path: &str) -> Option<&PhysicalVolumeRecord> {
        self.physical_volumes.get(path)
    }

    pub fn volume_group(&self, path: &str) -> Option<&VolumeGroupRecord> {
        self.volume_groups.get(path)
    }

    pub fn logical_volume(&self, path: &str) -> Option<&LogicalVolumeRecord> {
        self.logical_volumes.get(path)
    }

    pub fn mdraid(&self, path: &str) -> Option<&MdRaidRecord> {
        self.mdraids.get(path)
    }

    pub fn drive(&self, path: &str) -> Option<&DriveRecord> {
        self.drives.get(path)
    }

    pub fn drive_ata(&self, path: &str) -> Option<&DriveAtaRecord> {
        self.drives_ata.get(path)
    }

    pub fn job(&self, path: &str) -> Option<&JobRecord> {
        self.jobs.get(path)
    }

    /// Partitions of the table on `table_path`, ascending by offset
    pub fn partitions_of(&self, table_path: &str) -> Vec<&PartitionRecord> {
        let mut parts: Vec<_> = self
            .partitions
            .values()
            .filter(|p| p.table == table_path)
            .collect();
        parts.sort_by_key(|p| (p.offset, p.number));
        parts
    }

    /// The unlocked counterpart of an encrypted block
    pub fn cleartext_of(&self, path: &str) -> Option<&BlockRecord> {
        self.blocks
            .values()
            .find(|b| b.crypto_backing_device.as_deref() == Some(path))
            .or_else(|| {
                self.encrypted
                    .get(path)
                    .and_then(|e| e.cleartext_device.as_deref())
                    .and_then(|c| self.blocks.get(c))
            })
    }

    /// The logical volume a block is exposing
    pub fn lvol_of_block(&self, block_path: &str) -> Option<&LogicalVolumeRecord> {
        self.block_lvm2
            .get(block_path)
            .and_then(|b| b.logical_volume.as_deref())
            .and_then(|lv| self.logical_volumes.get(lv))
    }

    /// The block device of an (active) logical volume
    pub fn block_of_lvol(&self, lvol_path: &str) -> Option<&BlockRecord> {
        self.block_lvm2
            .values()
            .find(|b| b.logical_volume.as_deref() == Some(lvol_path))
            .and_then(|b| self.blocks.get(&b.path))
    }

    /// All logical volumes of a group, by name
    pub fn lvols_of(&self, vgroup_path: &str) -> Vec<&LogicalVolumeRecord> {
        let mut lvols: Vec<_> = self
            .logical_volumes
            .values()
            .filter(|lv| lv.volume_group == vgroup_path)
            .collect();
        lvols.sort_by(|a, b| a.name.cmp(&b.name));
        lvols
    }

    /// Thin volumes provisioned from `pool_path`, by name
    pub fn pool_members(&self, pool_path: &str) -> Vec<&LogicalVolumeRecord> {
        let mut members: Vec<_> = self
            .logical_volumes
            .values()
            .filter(|lv| lv.thin_pool.as_deref() == Some(pool_path))
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        members
    }

    /// Physical volumes of a group
    pub fn pvols_of(&self, vgroup_path: &str) -> Vec<&PhysicalVolumeRecord> {
        self.physical_volumes
            .values()
            .filter(|pv| pv.volume_group.as_deref() == Some(vgroup_path))
            .collect()
    }

    /// Blocks that are members of a RAID array
    pub fn mdraid_members(&self, mdraid_path: &str) -> Vec<&BlockRecord> {
        self.blocks
            .values()
            .filter(|b| b.mdraid_member.as_deref() == Some(mdraid_path))
            .collect()
    }

    /// The block device of a running RAID array
    pub fn mdraid_block(&self, mdraid_path: &str) -> Option<&BlockRecord> {
        self.blocks
            .values()
            .find(|b| b.mdraid.as_deref() == Some(mdraid_path))
    }

    /// Resolve a device name ("sda", "/dev/sda", "mapper/x") to its block
    pub fn block_by_name(&self, name: &str) -> Option<&BlockRecord> {
        self.blocks.values().find(|b| b.matches_dev_name(name))
    }

    pub fn volume_group_by_name(&self, name: &str) -> Option<&VolumeGroupRecord> {
        self.volume_groups.values().find(|vg| vg.name == name)
    }

    pub fn mdraid_by_uuid(&self, uuid: &str) -> Option<&MdRaidRecord> {
        self.mdraids.values().find(|md| md.uuid == uuid)
    }

    fn whole_blocks_of_drive(&self, drive_path: &str) -> Vec<&BlockRecord> {
        self.blocks
            .values()
            .filter(|b| b.drive.as_deref() == Some(drive_path))
            .filter(|b| !self.partitions.contains_key(&b.path))
            .filter(|b| b.crypto_backing_device.is_none())
            .collect()
    }

    /// The block that represents a whole drive.
    ///
    /// With several paths to the same drive, the device-mapper multipath
    /// device is the one to use.
    pub fn drive_block(&self, drive_path: &str) -> Option<&BlockRecord> {
        let blocks = self.whole_blocks_of_drive(drive_path);
        blocks
            .iter()
            .find(|b| blocks.len() > 1 && b.device.starts_with("/dev/dm-"))
            .or_else(|| blocks.first())
            .copied()
    }

    /// The other paths to a multipath drive
    pub fn multipath_blocks(&self, drive_path: &str) -> Vec<&BlockRecord> {
        let main = self.drive_block(drive_path).map(|b| b.path.as_str());
        self.whole_blocks_of_drive(drive_path)
            .into_iter()
            .filter(|b| Some(b.path.as_str()) != main)
            .collect()
    }

    /// Jobs acting on any of `paths`
    pub fn jobs_for(&self, paths: &[&str]) -> Vec<&JobRecord> {
        self.jobs
            .values()
            .filter(|job| paths.iter().any(|p| job.touches(p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LogicalVolumeType, GIB};

    fn block(path: &str, device: &str) -> BlockRecord {
        BlockRecord {
            path: path.into(),
            device: device.into(),
            ..Default::default()
        }
    }

    #[test]
    fn partitions_sorted_by_offset() {
        let mut snap = StorageSnapshot::default();
        for (path, offset, number) in [("/p2", 5 * GIB, 2), ("/p1", 0, 1)] {
            snap.insert(PartitionRecord {
                path: path.into(),
                table: "/disk".into(),
                offset,
                size: GIB,
                number,
                ..Default::default()
            });
        }
        snap.insert(PartitionRecord {
            path: "/other".into(),
            table: "/elsewhere".into(),
            ..Default::default()
        });

        let parts: Vec<_> = snap.partitions_of("/disk").iter().map(|p| p.path.clone()).collect();
        assert_eq!(parts, vec!["/p1", "/p2"]);
    }

    #[test]
    fn cleartext_found_via_backing_device_or_encrypted_link() {
        let mut snap = StorageSnapshot::default();
        snap.insert(block("/crypt", "/dev/sda1"));
        snap.insert(EncryptedRecord {
            path: "/crypt".into(),
            cleartext_device: Some("/clear".into()),
        });
        snap.insert(block("/clear", "/dev/dm-0"));
        assert_eq!(snap.cleartext_of("/crypt").map(|b| b.path.as_str()), Some("/clear"));

        let mut snap = StorageSnapshot::default();
        snap.insert(block("/crypt", "/dev/sda1"));
        snap.insert(BlockRecord {
            crypto_backing_device: Some("/crypt".into()),
            ..block("/clear2", "/dev/dm-1")
        });
        assert_eq!(snap.cleartext_of("/crypt").map(|b| b.path.as_str()), Some("/clear2"));
        assert!(snap.cleartext_of("/clear2").is_none());
    }

    #[test]
    fn lvol_indexes() {
        let mut snap = StorageSnapshot::default();
        snap.insert(LogicalVolumeRecord {
            path: "/lv/pool".into(),
            volume_group: "/vg".into(),
            lv_type: LogicalVolumeType::Pool,
            ..Default::default()
        });
        snap.insert(LogicalVolumeRecord {
            path: "/lv/thin".into(),
            volume_group: "/vg".into(),
            thin_pool: Some("/lv/pool".into()),
            ..Default::default()
        });
        snap.insert(block("/b/thin", "/dev/dm-2"));
        snap.insert(BlockLvm2Record {
            path: "/b/thin".into(),
            logical_volume: Some("/lv/thin".into()),
        });

        assert_eq!(snap.lvols_of("/vg").len(), 2);
        assert_eq!(snap.pool_members("/lv/pool")[0].path, "/lv/thin");
        assert_eq!(snap.block_of_lvol("/lv/thin").map(|b| b.path.as_str()), Some("/b/thin"));
        assert!(snap.block_of_lvol("/lv/pool").is_none());
        assert_eq!(snap.lvol_of_block("/b/thin").map(|l| l.path.as_str()), Some("/lv/thin"));
    }

    #[test]
    fn lvols_are_listed_by_name() {
        let mut snap = StorageSnapshot::default();
        for (path, name) in [("/lv/a", "zeta"), ("/lv/b", "alpha"), ("/lv/c", "mid")] {
            snap.insert(LogicalVolumeRecord {
                path: path.into(),
                name: name.into(),
                volume_group: "/vg".into(),
                ..Default::default()
            });
        }

        let names: Vec<_> = snap.lvols_of("/vg").iter().map(|lv| lv.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn multipath_prefers_device_mapper_block() {
        let mut snap = StorageSnapshot::default();
        for (path, dev) in [("/b/sda", "/dev/sda"), ("/b/sdb", "/dev/sdb"), ("/b/dm", "/dev/dm-0")] {
            snap.insert(BlockRecord {
                drive: Some("/drive".into()),
                ..block(path, dev)
            });
        }

        assert_eq!(snap.drive_block("/drive").map(|b| b.path.as_str()), Some("/b/dm"));
        let others: Vec<_> = snap.multipath_blocks("/drive").iter().map(|b| b.path.clone()).collect();
        assert_eq!(others, vec!["/b/sda", "/b/sdb"]);
    }

    #[test]
    fn lookups_by_name() {
        let mut snap = StorageSnapshot::default();
        snap.insert(block("/b/sda", "/dev/sda"));
        snap.insert(VolumeGroupRecord {
            path: "/vg/x".into(),
            name: "vgx".into(),
            ..Default::default()
        });
        snap.insert(MdRaidRecord {
            path: "/md/0".into(),
            uuid: "abcd".into(),
            ..Default::default()
        });

        assert!(snap.block_by_name("sda").is_some());
        assert!(snap.block_by_name("sdz").is_none());
        assert!(snap.volume_group_by_name("vgx").is_some());
        assert!(snap.mdraid_by_uuid("abcd").is_some());
        assert!(snap.mdraid_by_uuid("ffff").is_none());
    }
}
