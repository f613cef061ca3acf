// SPDX-License-Identifier: GPL-3.0-only

//! Captions for content rows

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;
use storage_types::{
    BlockRecord, IdUsage, LogicalVolumeRecord, MdRaidRecord, StorageSnapshot, fmt_size,
};

/// Two-line row description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Description {
    pub primary: String,
    pub secondary: Option<String>,
}

impl Description {
    pub fn single(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    pub fn with_secondary(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: Some(secondary.into()),
        }
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary {
            Some(secondary) => write!(f, "{} / {}", self.primary, secondary),
            None => f.write_str(&self.primary),
        }
    }
}

/// What the block is used for ("ext4 File System", "LVM2 Physical Volume of vg0", ...)
pub fn usage_caption(snapshot: &StorageSnapshot, block: &BlockRecord) -> String {
    match block.id_usage {
        IdUsage::Filesystem => format!("{} File System", block.id_type),
        IdUsage::Raid => {
            let mut usage = match block.id_type.as_str() {
                "linux_raid_member" => "Linux MD-RAID Component",
                "LVM2_member" => "LVM2 Physical Volume",
                _ => "RAID Member",
            }
            .to_string();

            let vgroup = snapshot
                .physical_volume(&block.path)
                .and_then(|pv| pv.volume_group.as_deref())
                .and_then(|vg| snapshot.volume_group(vg));
            let mdraid = block
                .mdraid_member
                .as_deref()
                .and_then(|md| snapshot.mdraid(md));

            if let Some(vgroup) = vgroup {
                usage.push_str(&format!(" of {}", vgroup.name));
            } else if let Some(mdraid) = mdraid {
                usage.push_str(&format!(" of {}", mdraid_name(mdraid)));
            }
            usage
        }
        IdUsage::Crypto => match block.id_type.as_str() {
            "crypto_LUKS" => "LUKS Encrypted".to_string(),
            _ => "Encrypted".to_string(),
        },
        IdUsage::Other => match block.id_type.as_str() {
            "swap" => "Swap Space".to_string(),
            _ => "Other Data".to_string(),
        },
        IdUsage::Unknown => "Unrecognized Data".to_string(),
    }
}

/// Description of a leaf block row.
///
/// `partition_label` is set for partitions ("Primary Partition", ...);
/// `unlocked` tells whether an encrypted block has a cleartext device.
pub fn block_description(
    snapshot: &StorageSnapshot,
    block: &BlockRecord,
    partition_label: Option<&str>,
    unlocked: bool,
) -> Description {
    let usage = usage_caption(snapshot, block);

    let primary = if let Some(label) = partition_label {
        format!("{} {} ({})", fmt_size(block.size), label, usage)
    } else if let Some(lvol) = snapshot.lvol_of_block(&block.path) {
        format!(
            "{} {} ({})",
            fmt_size(block.size),
            lvol_name(snapshot, lvol),
            usage
        )
    } else {
        usage
    };

    let mut secondary = block.name().to_string();
    match block.id_usage {
        IdUsage::Filesystem => {
            let mount_point = snapshot
                .filesystem(&block.path)
                .and_then(|fs| fs.mount_points.first());
            match mount_point {
                Some(dir) => secondary.push_str(&format!(", mounted on {dir}")),
                None => secondary.push_str(", not mounted"),
            }
        }
        IdUsage::Crypto => {
            secondary.push_str(if unlocked { ", unlocked" } else { ", locked" });
        }
        _ => {}
    }

    Description::with_secondary(primary, secondary)
}

/// "vg/lv"
pub fn lvol_name(snapshot: &StorageSnapshot, lvol: &LogicalVolumeRecord) -> String {
    match snapshot.volume_group(&lvol.volume_group) {
        Some(vgroup) => format!("{}/{}", vgroup.name, lvol.name),
        None => lvol.name.clone(),
    }
}

/// Display name of an array, dropping the host part for local arrays
pub fn mdraid_name(mdraid: &MdRaidRecord) -> String {
    mdraid_name_on(mdraid, local_hostname())
}

pub fn mdraid_name_on(mdraid: &MdRaidRecord, local_host: &str) -> String {
    match mdraid.name.split_once(':') {
        Some((host, name)) if !name.contains(':') => {
            if host == local_host {
                name.to_string()
            } else {
                format!("{name} (from {host})")
            }
        }
        _ => mdraid.name.clone(),
    }
}

fn local_hostname() -> &'static str {
    static HOSTNAME: OnceLock<String> = OnceLock::new();
    HOSTNAME.get_or_init(|| {
        std::fs::read_to_string("/proc/sys/kernel/hostname")
            .map(|name| name.trim().to_string())
            .unwrap_or_default()
    })
}
