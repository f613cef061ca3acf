// SPDX-License-Identifier: GPL-3.0-only

//! Content rows of a device or volume group
//!
//! The walk goes device → partition table → partitions (descending into
//! extended partitions) → cleartext devices of unlocked encrypted blocks,
//! and volume group → logical volumes → thin pool members. Every function
//! returns its rows; callers concatenate them in depth-first order.

use serde::Serialize;
use storage_types::{
    BlockRecord, ByteRange, LogicalVolumeRecord, MIN_FREE_SPACE_BYTES, PartitionRecord,
    StorageSnapshot, VolumeGroupRecord, fmt_size,
};

use crate::actions::{Action, ActionMenu, MenuTarget, block_action_menu, simple_button};
use crate::describe::{Description, block_description, lvol_name};

/// One row of the content tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEntry {
    /// Nesting depth, 0 for top-level rows
    pub level: usize,

    pub name: Option<String>,

    pub description: Description,

    pub menu: Option<ActionMenu>,

    /// Object whose jobs belong to this row
    pub job_object: Option<String>,
}

impl ContentEntry {
    fn new(
        level: usize,
        name: Option<String>,
        description: Description,
        menu: Option<ActionMenu>,
        job_object: Option<String>,
    ) -> Self {
        Self {
            level,
            name,
            description,
            menu,
            job_object,
        }
    }

    /// The free-space gap this row offers to fill, as `(start, size)`
    pub fn free_space(&self) -> Option<(u64, u64)> {
        match self.menu.as_ref().map(|m| &m.default.action) {
            Some(Action::CreatePartition { start, size, .. }) => Some((*start, *size)),
            _ => None,
        }
    }
}

/// Rows for a block device and everything below it
pub fn block_content_entries(
    snapshot: &StorageSnapshot,
    block: &BlockRecord,
    level: usize,
) -> Vec<ContentEntry> {
    device_entries(snapshot, block, level)
}

/// Rows for the logical volumes of a group, then its free space
pub fn volume_group_content_entries(
    snapshot: &StorageSnapshot,
    vgroup: &VolumeGroupRecord,
    level: usize,
) -> Vec<ContentEntry> {
    let mut entries: Vec<ContentEntry> = snapshot
        .lvols_of(&vgroup.path)
        .into_iter()
        .filter(|lvol| lvol.thin_pool.is_none())
        .flat_map(|lvol| logical_volume_entries(snapshot, lvol, level))
        .collect();

    if vgroup.free_size > 0 {
        entries.push(ContentEntry::new(
            level,
            None,
            Description::single(format!(
                "{} Free Space for Logical Volumes",
                fmt_size(vgroup.free_size)
            )),
            Some(simple_button(
                "Create Logical Volume",
                Action::VolumeGroupCreateLogicalVolume {
                    vgroup: vgroup.path.clone(),
                },
            )),
            None,
        ));
    }

    entries
}

fn device_entries(snapshot: &StorageSnapshot, block: &BlockRecord, level: usize) -> Vec<ContentEntry> {
    match snapshot.partition_table(&block.path) {
        Some(table) => PartitionWalk {
            snapshot,
            table_block: block,
            is_dos: table.table_type.is_dos(),
            device_level: level,
            partitions: snapshot.partitions_of(&block.path),
        }
        .level_entries(level, ByteRange::new(0, block.size)),
        None => leaf_entries(snapshot, block, level, None),
    }
}

/// A block without a partition table, followed by its cleartext device
fn leaf_entries(
    snapshot: &StorageSnapshot,
    block: &BlockRecord,
    level: usize,
    partition_label: Option<&str>,
) -> Vec<ContentEntry> {
    let cleartext = if block.is_crypto() {
        snapshot.cleartext_of(&block.path)
    } else {
        None
    };

    let menu = block_action_menu(
        snapshot,
        MenuTarget::Block(block),
        cleartext.is_none(),
        partition_label.is_some(),
    );

    let name = if !block.id_label.is_empty() {
        Some(block.id_label.clone())
    } else if menu.is_some() {
        Some("—".to_string())
    } else {
        None
    };

    let description = block_description(snapshot, block, partition_label, cleartext.is_some());

    let mut entries = vec![ContentEntry::new(
        level,
        name,
        description,
        menu,
        Some(block.path.clone()),
    )];
    if let Some(cleartext) = cleartext {
        entries.extend(device_entries(snapshot, cleartext, level + 1));
    }
    entries
}

struct PartitionWalk<'a> {
    snapshot: &'a StorageSnapshot,
    table_block: &'a BlockRecord,
    is_dos: bool,
    device_level: usize,
    partitions: Vec<&'a PartitionRecord>,
}

impl PartitionWalk<'_> {
    /// Partitions and gaps inside `container`, at `level`
    fn level_entries(&self, level: usize, container: ByteRange) -> Vec<ContentEntry> {
        let mut entries = Vec::new();
        let mut last_end = container.start;

        for partition in &self.partitions {
            let Some(block) = self.snapshot.block(&partition.path) else {
                continue;
            };
            if level == self.device_level && partition.is_contained {
                continue;
            }
            if level == self.device_level + 1 && !partition.is_contained {
                continue;
            }
            if !container.contains(&partition.extent()) {
                continue;
            }

            entries.extend(self.free_space(level, last_end, partition.offset.saturating_sub(last_end)));
            if partition.is_container {
                entries.extend(self.extended_entries(level, block, partition));
            } else {
                let label = self.partition_label(level);
                entries.extend(leaf_entries(self.snapshot, block, level, Some(label)));
            }
            last_end = partition.end();
        }

        entries.extend(self.free_space(level, last_end, container.end.saturating_sub(last_end)));
        entries
    }

    fn extended_entries(
        &self,
        level: usize,
        block: &BlockRecord,
        partition: &PartitionRecord,
    ) -> Vec<ContentEntry> {
        let mut entries = vec![ContentEntry::new(
            level,
            None,
            Description::single(format!("{} Extended Partition", fmt_size(partition.size))),
            block_action_menu(self.snapshot, MenuTarget::Block(block), false, true),
            Some(block.path.clone()),
        )];
        entries.extend(self.level_entries(level + 1, partition.extent()));
        entries
    }

    fn free_space(&self, level: usize, start: u64, size: u64) -> Option<ContentEntry> {
        if size < MIN_FREE_SPACE_BYTES {
            return None;
        }

        let mut enable_dos_extended = false;
        let caption = if !self.is_dos {
            format!("{} Free Space", fmt_size(size))
        } else if level > self.device_level {
            format!("{} Free Space for Logical Partitions", fmt_size(size))
        } else {
            enable_dos_extended = true;
            format!("{} Free Space for Primary Partitions", fmt_size(size))
        };

        Some(ContentEntry::new(
            level,
            None,
            Description::single(caption),
            Some(simple_button(
                "Create Partition",
                Action::CreatePartition {
                    block: self.table_block.path.clone(),
                    start,
                    size,
                    enable_dos_extended,
                },
            )),
            None,
        ))
    }

    fn partition_label(&self, level: usize) -> &'static str {
        match (self.is_dos, level > self.device_level) {
            (true, true) => "Logical Partition",
            (true, false) => "Primary Partition",
            (false, _) => "Partition",
        }
    }
}

fn logical_volume_entries(
    snapshot: &StorageSnapshot,
    lvol: &LogicalVolumeRecord,
    level: usize,
) -> Vec<ContentEntry> {
    if lvol.is_pool() {
        let mut entries = vec![ContentEntry::new(
            level,
            None,
            Description::with_secondary(
                format!("{} {}", fmt_size(lvol.size), lvol_name(snapshot, lvol)),
                format!("{}% full", lvol.pool_usage_percent()),
            ),
            block_action_menu(snapshot, MenuTarget::LogicalVolume(lvol), false, false),
            Some(lvol.path.clone()),
        )];
        for member in snapshot.pool_members(&lvol.path) {
            entries.extend(logical_volume_entries(snapshot, member, level + 1));
        }
        return entries;
    }

    match snapshot.block_of_lvol(&lvol.path) {
        Some(block) if snapshot.partition_table(&block.path).is_some() => {
            let mut entries = vec![ContentEntry::new(
                level,
                None,
                Description::with_secondary(
                    format!("{} {}", fmt_size(block.size), lvol.name),
                    block.name(),
                ),
                block_action_menu(snapshot, MenuTarget::Block(block), false, false),
                Some(block.path.clone()),
            )];
            entries.extend(device_entries(snapshot, block, level + 1));
            entries
        }
        Some(block) => leaf_entries(snapshot, block, level, None),
        None => {
            // An active volume without a block means something below the
            // daemon is misbehaving.
            let state = if lvol.active {
                "active, but unsupported"
            } else {
                "inactive"
            };
            vec![ContentEntry::new(
                level,
                None,
                Description::with_secondary(
                    format!("{} {}", fmt_size(lvol.size), lvol_name(snapshot, lvol)),
                    format!("({state})"),
                ),
                block_action_menu(snapshot, MenuTarget::LogicalVolume(lvol), false, false),
                Some(lvol.path.clone()),
            )]
        }
    }
}
