//! MD RAID array records (`org.freedesktop.UDisks2.MDRaid`)

use serde::{Deserialize, Serialize};

/// One entry of `MDRaid.ActiveDevices`: `(block, slot, state, errors, expansion)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveDevice {
    /// Member block object
    pub block: String,

    /// Slot number, negative when the device has no slot (spare)
    pub slot: i32,

    /// md state flags ("in_sync", "faulty", "spare", ...)
    pub states: Vec<String>,

    /// Read errors counted by the kernel
    pub num_read_errors: u64,
}

impl ActiveDevice {
    pub fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MdRaidRecord {
    pub path: String,

    pub uuid: String,

    /// Array name ("host:name")
    pub name: String,

    /// RAID level ("raid0", "raid1", ..., "raid10")
    pub level: String,

    pub num_devices: u32,

    /// Size in bytes
    pub size: u64,

    /// Chunk size in bytes (0 when not applicable)
    pub chunk_size: u64,

    /// Number of missing devices
    pub degraded: u32,

    /// Write-intent bitmap location ("internal", "none", ...)
    pub bitmap_location: String,

    /// Older daemons do not report `Running`
    pub running: Option<bool>,

    pub active_devices: Vec<ActiveDevice>,

    /// Current sync action ("idle", "check", "repair", "resync", ...)
    pub sync_action: String,

    /// Progress of the sync action (0.0 to 1.0)
    pub sync_completed: f64,
}

impl MdRaidRecord {
    /// Whether the array runs, falling back to active devices for old daemons
    pub fn is_running(&self) -> bool {
        self.running.unwrap_or(!self.active_devices.is_empty())
    }

    pub fn has_internal_bitmap(&self) -> bool {
        self.bitmap_location == "internal"
    }

    pub fn is_syncing(&self) -> bool {
        !self.sync_action.is_empty() && self.sync_action != "idle"
    }

    /// Human-readable level ("RAID 1", "RAID 10", "RAID (linear)")
    pub fn level_title(&self) -> String {
        match self.level.as_str() {
            "raid0" | "raid1" | "raid4" | "raid5" | "raid6" | "raid10" => {
                format!("RAID {}", &self.level[4..])
            }
            other => format!("RAID ({})", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_title_formats_known_levels() {
        let raid = MdRaidRecord {
            level: "raid10".into(),
            ..Default::default()
        };
        assert_eq!(raid.level_title(), "RAID 10");

        let linear = MdRaidRecord {
            level: "linear".into(),
            ..Default::default()
        };
        assert_eq!(linear.level_title(), "RAID (linear)");
    }

    #[test]
    fn running_falls_back_to_active_devices() {
        let mut raid = MdRaidRecord::default();
        assert!(!raid.is_running());
        raid.active_devices.push(ActiveDevice::default());
        assert!(raid.is_running());
        raid.running = Some(false);
        assert!(!raid.is_running());
    }
}
