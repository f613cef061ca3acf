//! Drive, job and manager records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `org.freedesktop.UDisks2.Drive`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveRecord {
    pub path: String,
    pub vendor: String,
    pub model: String,
    pub revision: String,
    pub serial: String,
    pub wwn: String,

    /// Size in bytes
    pub size: u64,

    pub removable: bool,
}

impl DriveRecord {
    /// "Vendor Model", skipping empty parts
    pub fn display_name(&self) -> String {
        [self.vendor.trim(), self.model.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `org.freedesktop.UDisks2.Drive.Ata` (SMART data)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveAtaRecord {
    pub path: String,
    pub smart_supported: bool,
    pub smart_enabled: bool,

    /// The drive predicts its own failure
    pub smart_failing: bool,

    /// Temperature in kelvin, 0 when unknown
    pub smart_temperature: f64,

    pub smart_num_bad_sectors: i64,
}

/// `org.freedesktop.UDisks2.Job`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub path: String,

    /// Operation name ("format-mkfs", "mdraid-check-job", ...)
    pub operation: String,

    /// Progress from 0.0 to 1.0, when known
    pub progress: Option<f64>,

    /// Objects the job acts on
    pub objects: Vec<String>,

    pub cancelable: bool,

    pub start_time: Option<DateTime<Utc>>,

    /// Expected end, when the daemon can estimate it
    pub expected_end_time: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn touches(&self, path: &str) -> bool {
        self.objects.iter().any(|o| o == path)
    }

    /// Human-readable operation title
    pub fn title(&self) -> String {
        match self.operation.as_str() {
            "ata-smart-selftest" => "SMART self-test".to_string(),
            "drive-eject" => "Ejecting".to_string(),
            "encrypted-unlock" => "Unlocking".to_string(),
            "encrypted-lock" => "Locking".to_string(),
            "encrypted-modify" => "Modifying".to_string(),
            "swapspace-start" => "Starting swapspace".to_string(),
            "swapspace-stop" => "Stopping swapspace".to_string(),
            "filesystem-mount" => "Mounting".to_string(),
            "filesystem-unmount" => "Unmounting".to_string(),
            "filesystem-modify" => "Modifying".to_string(),
            "format-erase" => "Erasing".to_string(),
            "format-mkfs" => "Creating filesystem".to_string(),
            "loop-setup" => "Setting up loop device".to_string(),
            "partition-modify" => "Modifying".to_string(),
            "partition-delete" => "Deleting".to_string(),
            "partition-create" => "Creating".to_string(),
            "cleanup" => "Cleaning up".to_string(),
            "ata-secure-erase" => "Erasing".to_string(),
            "ata-enhanced-secure-erase" => "Erasing".to_string(),
            "md-raid-stop" => "Stopping RAID Device".to_string(),
            "md-raid-start" => "Starting RAID Device".to_string(),
            "md-raid-fault-device" => "Marking Disk as Faulty".to_string(),
            "md-raid-remove-device" => "Removing Disk from RAID Device".to_string(),
            "md-raid-create" => "Creating RAID Device".to_string(),
            "mdraid-check-job" => "Checking RAID Device".to_string(),
            "mdraid-repair-job" => "Checking and Repairing RAID Device".to_string(),
            "mdraid-recover-job" => "Recovering RAID Device".to_string(),
            "mdraid-sync-job" => "Synchronizing RAID Device".to_string(),
            "lvm-lvol-delete" => "Deleting".to_string(),
            "lvm-lvol-activate" => "Activating".to_string(),
            "lvm-lvol-deactivate" => "Deactivating".to_string(),
            "lvm-lvol-snapshot-create" => "Creating snapshot".to_string(),
            "lvm-vg-create" => "Creating volume group".to_string(),
            "lvm-vg-delete" => "Deleting volume group".to_string(),
            "lvm-vg-add-device" => "Adding physical volume".to_string(),
            "lvm-vg-rem-device" => "Removing physical volume".to_string(),
            "lvm-vg-empty-device" => "Emptying physical volume".to_string(),
            "lvm-lvol-create" => "Creating logical volume".to_string(),
            "lvm-lvol-rename" => "Renaming".to_string(),
            "lvm-lvol-resize" => "Resizing".to_string(),
            other => other.to_string(),
        }
    }

    /// Remaining time until the expected end, relative to `now`
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.expected_end_time
            .map(|end| end - now)
            .filter(|d| *d > chrono::Duration::zero())
    }
}

/// `org.freedesktop.UDisks2.Manager`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerRecord {
    pub version: String,

    /// Filesystem types the daemon can create
    pub supported_filesystems: Vec<String>,
}

impl ManagerRecord {
    pub fn supports(&self, fs_type: &str) -> bool {
        self.supported_filesystems.iter().any(|f| f == fs_type)
    }
}

/// Format a duration as "N minutes" / "N seconds" style remaining text
pub fn format_remaining(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    if secs >= 3600 {
        format!("{} h {} min remaining", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{} min remaining", secs / 60)
    } else {
        format!("{} s remaining", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn drive_display_name_skips_empty_vendor() {
        let drive = DriveRecord {
            model: "Samsung SSD 860".into(),
            ..Default::default()
        };
        assert_eq!(drive.display_name(), "Samsung SSD 860");
    }

    #[test]
    fn remaining_time_is_relative_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let job = JobRecord {
            expected_end_time: Some(now + chrono::Duration::seconds(150)),
            ..Default::default()
        };
        let left = job.remaining(now).unwrap();
        assert_eq!(format_remaining(left), "2 min remaining");

        assert!(job.remaining(now + chrono::Duration::hours(1)).is_none());
    }
}
