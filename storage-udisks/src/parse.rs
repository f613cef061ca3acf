//! Property dictionaries → typed records
//!
//! Every parser takes the property map of one interface. Missing or
//! mistyped properties fall back to the record's defaults.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use storage_types::{
    ActiveDevice, BlockLvm2Record, BlockRecord, DriveAtaRecord, DriveRecord, EncryptedRecord,
    FilesystemRecord, IdUsage, JobRecord, LogicalVolumeRecord, LogicalVolumeType, MdRaidRecord,
    PartitionRecord, PartitionTableRecord, PartitionTableType, PhysicalVolumeRecord,
    StorageSnapshot, VolumeGroupRecord,
};
use tracing::debug;
use zbus::zvariant::{OwnedObjectPath, OwnedValue};

use crate::convert::config_item_from_dbus;
use crate::dbus::bytestring as bs;
use crate::dbus::proxies::ConfigurationItem;

pub const BLOCK_IFACE: &str = "org.freedesktop.UDisks2.Block";
pub const FILESYSTEM_IFACE: &str = "org.freedesktop.UDisks2.Filesystem";
pub const PARTITION_IFACE: &str = "org.freedesktop.UDisks2.Partition";
pub const PARTITION_TABLE_IFACE: &str = "org.freedesktop.UDisks2.PartitionTable";
pub const ENCRYPTED_IFACE: &str = "org.freedesktop.UDisks2.Encrypted";
pub const PHYSICAL_VOLUME_IFACE: &str = "org.freedesktop.UDisks2.PhysicalVolume";
pub const BLOCK_LVM2_IFACE: &str = "org.freedesktop.UDisks2.Block.LVM2";
pub const VOLUME_GROUP_IFACE: &str = "org.freedesktop.UDisks2.VolumeGroup";
pub const LOGICAL_VOLUME_IFACE: &str = "org.freedesktop.UDisks2.LogicalVolume";
pub const MDRAID_IFACE: &str = "org.freedesktop.UDisks2.MDRaid";
pub const DRIVE_IFACE: &str = "org.freedesktop.UDisks2.Drive";
pub const DRIVE_ATA_IFACE: &str = "org.freedesktop.UDisks2.Drive.Ata";
pub const JOB_IFACE: &str = "org.freedesktop.UDisks2.Job";

pub type Properties = HashMap<String, OwnedValue>;

/// Object path → interface name → properties, in object path order
pub type ManagedObjects = BTreeMap<String, BTreeMap<String, Properties>>;

fn as_string(value: &OwnedValue) -> Option<String> {
    String::try_from(value.clone()).ok()
}

fn as_u64(value: &OwnedValue) -> Option<u64> {
    if let Ok(parsed) = u64::try_from(value.clone()) {
        Some(parsed)
    } else {
        u32::try_from(value.clone()).ok().map(u64::from)
    }
}

fn as_i64(value: &OwnedValue) -> Option<i64> {
    if let Ok(parsed) = i64::try_from(value.clone()) {
        Some(parsed)
    } else {
        i32::try_from(value.clone()).ok().map(i64::from)
    }
}

fn as_u32(value: &OwnedValue) -> Option<u32> {
    u32::try_from(value.clone()).ok()
}

fn as_f64(value: &OwnedValue) -> Option<f64> {
    f64::try_from(value.clone()).ok()
}

fn as_bool(value: &OwnedValue) -> Option<bool> {
    bool::try_from(value.clone()).ok()
}

/// An object reference; the daemon uses "/" for "none"
fn as_object_ref(value: &OwnedValue) -> Option<String> {
    let path = OwnedObjectPath::try_from(value.clone())
        .map(|p| p.as_str().to_string())
        .ok()
        .or_else(|| as_string(value))?;
    if path == "/" || path.is_empty() {
        None
    } else {
        Some(path)
    }
}

fn as_object_refs(value: &OwnedValue) -> Vec<String> {
    Vec::<OwnedObjectPath>::try_from(value.clone())
        .map(|paths| {
            paths
                .into_iter()
                .map(|p| p.as_str().to_string())
                .filter(|p| p != "/")
                .collect()
        })
        .unwrap_or_default()
}

fn as_bytestring(value: &OwnedValue) -> Option<String> {
    bs::owned_value_to_bytestring(value)
}

/// Microseconds since the epoch, 0 meaning unknown
fn as_timestamp(value: &OwnedValue) -> Option<DateTime<Utc>> {
    let usec = as_u64(value).filter(|v| *v > 0)?;
    DateTime::<Utc>::from_timestamp_micros(i64::try_from(usec).ok()?)
}

fn get<'a>(props: &'a Properties, key: &str) -> Option<&'a OwnedValue> {
    props.get(key)
}

fn string(props: &Properties, key: &str) -> String {
    get(props, key).and_then(as_string).unwrap_or_default()
}

fn object_ref(props: &Properties, key: &str) -> Option<String> {
    get(props, key).and_then(as_object_ref)
}

pub fn parse_block(path: &str, props: &Properties) -> BlockRecord {
    let configuration = get(props, "Configuration")
        .and_then(|v| Vec::<ConfigurationItem>::try_from(v.clone()).ok())
        .map(|items| items.iter().map(config_item_from_dbus).collect())
        .unwrap_or_default();

    BlockRecord {
        path: path.to_string(),
        device: get(props, "Device").and_then(as_bytestring).unwrap_or_default(),
        preferred_device: get(props, "PreferredDevice")
            .and_then(as_bytestring)
            .unwrap_or_default(),
        size: get(props, "Size").and_then(as_u64).unwrap_or(0),
        read_only: get(props, "ReadOnly").and_then(as_bool).unwrap_or(false),
        id_usage: IdUsage::from_udisks(&string(props, "IdUsage")),
        id_type: string(props, "IdType"),
        id_label: string(props, "IdLabel"),
        drive: object_ref(props, "Drive"),
        mdraid: object_ref(props, "MDRaid"),
        mdraid_member: object_ref(props, "MDRaidMember"),
        crypto_backing_device: object_ref(props, "CryptoBackingDevice"),
        configuration,
    }
}

pub fn parse_filesystem(path: &str, props: &Properties) -> FilesystemRecord {
    let mount_points = get(props, "MountPoints")
        .and_then(|v| Vec::<Vec<u8>>::try_from(v.clone()).ok())
        .map(bs::decode_mount_points)
        .unwrap_or_default();

    FilesystemRecord {
        path: path.to_string(),
        mount_points,
    }
}

pub fn parse_partition(path: &str, props: &Properties) -> PartitionRecord {
    PartitionRecord {
        path: path.to_string(),
        table: object_ref(props, "Table").unwrap_or_default(),
        offset: get(props, "Offset").and_then(as_u64).unwrap_or(0),
        size: get(props, "Size").and_then(as_u64).unwrap_or(0),
        number: get(props, "Number").and_then(as_u32).unwrap_or(0),
        name: string(props, "Name"),
        type_id: string(props, "Type"),
        is_container: get(props, "IsContainer").and_then(as_bool).unwrap_or(false),
        is_contained: get(props, "IsContained").and_then(as_bool).unwrap_or(false),
    }
}

pub fn parse_partition_table(path: &str, props: &Properties) -> PartitionTableRecord {
    PartitionTableRecord {
        path: path.to_string(),
        table_type: PartitionTableType::from_udisks(&string(props, "Type")),
    }
}

pub fn parse_encrypted(path: &str, props: &Properties) -> EncryptedRecord {
    EncryptedRecord {
        path: path.to_string(),
        cleartext_device: object_ref(props, "CleartextDevice"),
    }
}

pub fn parse_physical_volume(path: &str, props: &Properties) -> PhysicalVolumeRecord {
    PhysicalVolumeRecord {
        path: path.to_string(),
        volume_group: object_ref(props, "VolumeGroup"),
        size: get(props, "Size").and_then(as_u64).unwrap_or(0),
        free_size: get(props, "FreeSize").and_then(as_u64).unwrap_or(0),
    }
}

pub fn parse_block_lvm2(path: &str, props: &Properties) -> BlockLvm2Record {
    BlockLvm2Record {
        path: path.to_string(),
        logical_volume: object_ref(props, "LogicalVolume"),
    }
}

pub fn parse_volume_group(path: &str, props: &Properties) -> VolumeGroupRecord {
    VolumeGroupRecord {
        path: path.to_string(),
        name: string(props, "Name"),
        uuid: string(props, "UUID"),
        size: get(props, "Size").and_then(as_u64).unwrap_or(0),
        free_size: get(props, "FreeSize").and_then(as_u64).unwrap_or(0),
        extent_size: get(props, "ExtentSize").and_then(as_u64).unwrap_or(0),
        needs_polling: get(props, "NeedsPolling").and_then(as_bool).unwrap_or(false),
    }
}

pub fn parse_logical_volume(path: &str, props: &Properties) -> LogicalVolumeRecord {
    LogicalVolumeRecord {
        path: path.to_string(),
        name: string(props, "Name"),
        uuid: string(props, "UUID"),
        size: get(props, "Size").and_then(as_u64).unwrap_or(0),
        active: get(props, "Active").and_then(as_bool).unwrap_or(false),
        lv_type: LogicalVolumeType::from_udisks(&string(props, "Type")),
        volume_group: object_ref(props, "VolumeGroup").unwrap_or_default(),
        thin_pool: object_ref(props, "ThinPool"),
        origin: object_ref(props, "Origin"),
        data_allocated_ratio: get(props, "DataAllocatedRatio")
            .and_then(as_f64)
            .unwrap_or(0.0),
        metadata_allocated_ratio: get(props, "MetadataAllocatedRatio")
            .and_then(as_f64)
            .unwrap_or(0.0),
    }
}

type RawActiveDevice = (OwnedObjectPath, i32, Vec<String>, u64, Properties);

pub fn parse_mdraid(path: &str, props: &Properties) -> MdRaidRecord {
    let active_devices = get(props, "ActiveDevices")
        .and_then(|v| Vec::<RawActiveDevice>::try_from(v.clone()).ok())
        .map(|devices| {
            devices
                .into_iter()
                .map(|(block, slot, states, errors, _)| ActiveDevice {
                    block: block.as_str().to_string(),
                    slot,
                    states,
                    num_read_errors: errors,
                })
                .collect()
        })
        .unwrap_or_default();

    MdRaidRecord {
        path: path.to_string(),
        uuid: string(props, "UUID"),
        name: string(props, "Name"),
        level: string(props, "Level"),
        num_devices: get(props, "NumDevices").and_then(as_u32).unwrap_or(0),
        size: get(props, "Size").and_then(as_u64).unwrap_or(0),
        chunk_size: get(props, "ChunkSize").and_then(as_u64).unwrap_or(0),
        degraded: get(props, "Degraded").and_then(as_u32).unwrap_or(0),
        bitmap_location: get(props, "BitmapLocation")
            .and_then(as_bytestring)
            .unwrap_or_default(),
        running: get(props, "Running").and_then(as_bool),
        active_devices,
        sync_action: string(props, "SyncAction"),
        sync_completed: get(props, "SyncCompleted").and_then(as_f64).unwrap_or(0.0),
    }
}

pub fn parse_drive(path: &str, props: &Properties) -> DriveRecord {
    DriveRecord {
        path: path.to_string(),
        vendor: string(props, "Vendor"),
        model: string(props, "Model"),
        revision: string(props, "Revision"),
        serial: string(props, "Serial"),
        wwn: string(props, "WWN"),
        size: get(props, "Size").and_then(as_u64).unwrap_or(0),
        removable: get(props, "Removable").and_then(as_bool).unwrap_or(false),
    }
}

pub fn parse_drive_ata(path: &str, props: &Properties) -> DriveAtaRecord {
    DriveAtaRecord {
        path: path.to_string(),
        smart_supported: get(props, "SmartSupported").and_then(as_bool).unwrap_or(false),
        smart_enabled: get(props, "SmartEnabled").and_then(as_bool).unwrap_or(false),
        smart_failing: get(props, "SmartFailing").and_then(as_bool).unwrap_or(false),
        smart_temperature: get(props, "SmartTemperature").and_then(as_f64).unwrap_or(0.0),
        smart_num_bad_sectors: get(props, "SmartNumBadSectors")
            .and_then(as_i64)
            .unwrap_or(0),
    }
}

pub fn parse_job(path: &str, props: &Properties) -> JobRecord {
    let progress_valid = get(props, "ProgressValid").and_then(as_bool).unwrap_or(false);
    JobRecord {
        path: path.to_string(),
        operation: string(props, "Operation"),
        progress: if progress_valid {
            get(props, "Progress").and_then(as_f64)
        } else {
            None
        },
        objects: get(props, "Objects").map(as_object_refs).unwrap_or_default(),
        cancelable: get(props, "Cancelable").and_then(as_bool).unwrap_or(false),
        start_time: get(props, "StartTime").and_then(as_timestamp),
        expected_end_time: get(props, "ExpectedEndTime").and_then(as_timestamp),
    }
}

/// Build a snapshot from managed objects. Unknown interfaces are ignored.
pub fn build_snapshot(objects: &ManagedObjects) -> StorageSnapshot {
    let mut snapshot = StorageSnapshot::default();

    for (path, interfaces) in objects {
        for (interface, props) in interfaces {
            match interface.as_str() {
                BLOCK_IFACE => snapshot.insert(parse_block(path, props)),
                FILESYSTEM_IFACE => snapshot.insert(parse_filesystem(path, props)),
                PARTITION_IFACE => snapshot.insert(parse_partition(path, props)),
                PARTITION_TABLE_IFACE => snapshot.insert(parse_partition_table(path, props)),
                ENCRYPTED_IFACE => snapshot.insert(parse_encrypted(path, props)),
                PHYSICAL_VOLUME_IFACE => snapshot.insert(parse_physical_volume(path, props)),
                BLOCK_LVM2_IFACE => snapshot.insert(parse_block_lvm2(path, props)),
                VOLUME_GROUP_IFACE => snapshot.insert(parse_volume_group(path, props)),
                LOGICAL_VOLUME_IFACE => snapshot.insert(parse_logical_volume(path, props)),
                MDRAID_IFACE => snapshot.insert(parse_mdraid(path, props)),
                DRIVE_IFACE => snapshot.insert(parse_drive(path, props)),
                DRIVE_ATA_IFACE => snapshot.insert(parse_drive_ata(path, props)),
                JOB_IFACE => snapshot.insert(parse_job(path, props)),
                other => debug!("ignoring interface {other} on {path}"),
            }
        }
    }

    snapshot
}
