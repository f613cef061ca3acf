// SPDX-License-Identifier: GPL-3.0-only

//! Plain-text rendering of the detail page

use std::fmt::Write;

use storage_details::render::{Content, Header, JobRow, Sidebar};
use storage_details::{ActionMenu, Availability, ViewState};

const INDENT: &str = "    ";

pub fn print_state(state: &ViewState) -> String {
    let mut out = String::new();
    match state {
        ViewState::Hidden => out.push_str("Nothing selected\n"),
        ViewState::NotFound { selection } => {
            let _ = writeln!(out, "Not found: {selection}");
        }
        ViewState::Shown { view, .. } => {
            header(&mut out, &view.header);
            if let Some(sidebar) = &view.sidebar {
                out.push('\n');
                self::sidebar(&mut out, sidebar);
            }
            if let Some(content) = &view.content {
                out.push('\n');
                self::content(&mut out, content);
            }
            if !view.jobs.is_empty() {
                out.push('\n');
                jobs(&mut out, &view.jobs);
            }
        }
    }
    out
}

fn field(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{label:<12}{value}");
}

/// "[Default] Other, (Disabled)"
fn menu(menu: &ActionMenu) -> String {
    let others: Vec<String> = menu
        .items
        .iter()
        .filter(|item| item.title != menu.default.title)
        .map(|item| match &item.availability {
            Availability::Enabled => item.title.clone(),
            Availability::Disabled { .. } => format!("({})", item.title),
        })
        .collect();

    let default = match &menu.default.availability {
        Availability::Enabled => format!("[{}]", menu.default.title),
        Availability::Disabled { reason: Some(reason) } => {
            format!("[({})] {reason}", menu.default.title)
        }
        Availability::Disabled { reason: None } => format!("[({})]", menu.default.title),
    };

    if others.is_empty() {
        default
    } else {
        format!("{default} {}", others.join(", "))
    }
}

fn header(out: &mut String, header: &Header) {
    match header {
        Header::Block(block) => {
            let _ = writeln!(out, "{}", block.name);
            match &block.drive {
                Some(drive) => {
                    field(out, "Model", &drive.model);
                    if let Some(size) = &drive.size {
                        field(out, "Capacity", size);
                    }
                    if let Some(assessment) = &drive.assessment {
                        let mut text = if assessment.failing {
                            "DISK IS FAILING".to_string()
                        } else {
                            "Disk is OK".to_string()
                        };
                        if let Some(temperature) = &assessment.temperature {
                            let _ = write!(text, " ({temperature})");
                        }
                        field(out, "Assessment", text);
                    }
                    if let Some(device) = &drive.device {
                        field(out, "Device File", device);
                    }
                    if !drive.multipath_devices.is_empty() {
                        field(out, "Multipath", drive.multipath_devices.join(" "));
                    }
                }
                None => field(out, "Capacity", &block.size),
            }
        }
        Header::MdRaid(mdraid) => {
            let _ = writeln!(out, "{}  {}", mdraid.name, menu(&mdraid.menu));
            if let Some(device) = &mdraid.device {
                field(out, "Device", device);
            }
            field(out, "Capacity", &mdraid.size);
            field(out, "RAID Level", &mdraid.level);
            if let Some(bitmap) = mdraid.bitmap {
                field(out, "Bitmap", if bitmap { "On" } else { "Off" });
            }
            field(out, "State", &mdraid.state);
            if let Some(degraded) = &mdraid.degraded {
                let _ = writeln!(out, "! {degraded}");
            }
        }
        Header::VolumeGroup(vgroup) => {
            let _ = writeln!(out, "{}  {}", vgroup.name, menu(&vgroup.menu));
            field(out, "Capacity", &vgroup.size);
        }
    }
}

fn sidebar(out: &mut String, sidebar: &Sidebar) {
    match sidebar {
        Sidebar::MdRaidMembers { members, add, .. } => {
            out.push_str("Disks");
            if let Some(add) = add {
                let _ = write!(out, "  {}", self::menu(add));
            }
            out.push('\n');
            for member in members {
                let slot = member.slot.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
                let states: Vec<String> = member
                    .states
                    .iter()
                    .map(|s| {
                        if s.danger {
                            format!("!{}", s.description)
                        } else {
                            s.description.clone()
                        }
                    })
                    .collect();
                let _ = write!(out, "{INDENT}{slot:>3} {} {}", member.device, states.join(", "));
                if let Some(remove) = &member.remove {
                    let _ = write!(out, "  {}", self::menu(remove));
                }
                out.push('\n');
            }
        }
        Sidebar::PhysicalVolumes { pvols, add } => {
            let _ = writeln!(out, "Physical Volumes  {}", self::menu(add));
            for pvol in pvols {
                let _ = writeln!(
                    out,
                    "{INDENT}{} {}  {}",
                    pvol.device,
                    pvol.sizes,
                    self::menu(&pvol.remove)
                );
            }
        }
    }
}

fn content(out: &mut String, content: &Content) {
    let _ = writeln!(out, "{}", content.title);
    for entry in &content.entries {
        let indent = INDENT.repeat(entry.level + 1);
        let _ = write!(out, "{indent}");
        if let Some(name) = &entry.name {
            let _ = write!(out, "{name}: ");
        }
        let _ = write!(out, "{}", entry.description);
        if let Some(entry_menu) = &entry.menu {
            let _ = write!(out, "  {}", menu(entry_menu));
        }
        out.push('\n');
    }
}

fn jobs(out: &mut String, jobs: &[JobRow]) {
    out.push_str("Jobs\n");
    for job in jobs {
        let _ = write!(out, "{INDENT}{}", job.title);
        if let Some(progress) = job.progress {
            let _ = write!(out, "  {progress}%");
        }
        if let Some(remaining) = &job.remaining {
            let _ = write!(out, "  {remaining}");
        }
        if job.cancel.is_some() {
            out.push_str("  [Cancel]");
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_details::{Selection, render};
    use storage_types::{
        BlockRecord, FilesystemRecord, GIB, IdUsage, PartitionRecord, PartitionTableRecord,
        PartitionTableType, StorageSnapshot,
    };

    fn disk() -> StorageSnapshot {
        let mut snapshot = StorageSnapshot::default();
        let block = |name: &str, size: u64| BlockRecord {
            path: format!("/b/{name}"),
            device: format!("/dev/{name}"),
            size,
            ..Default::default()
        };
        snapshot.insert(block("sda", 2 * GIB));
        snapshot.insert(PartitionTableRecord {
            path: "/b/sda".into(),
            table_type: PartitionTableType::Gpt,
        });
        snapshot.insert(BlockRecord {
            id_usage: IdUsage::Filesystem,
            id_type: "ext4".into(),
            id_label: "home".into(),
            ..block("sda1", GIB)
        });
        snapshot.insert(FilesystemRecord {
            path: "/b/sda1".into(),
            mount_points: vec!["/home".into()],
        });
        snapshot.insert(PartitionRecord {
            path: "/b/sda1".into(),
            table: "/b/sda".into(),
            size: GIB,
            number: 1,
            ..Default::default()
        });
        snapshot
    }

    #[test]
    fn block_page_lists_rows_with_their_menus() {
        let snapshot = disk();
        let selection = Selection::Block("sda".into());
        let view = render(&snapshot, &selection).unwrap();
        let text = print_state(&ViewState::Shown {
            selection,
            view: Box::new(view),
        });

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "/dev/sda");
        assert!(lines.contains(&"Content"));
        assert!(lines.iter().any(|l| {
            l.starts_with("    home: 1.0 GiB Partition (ext4 File System) / /dev/sda1, mounted on /home  [Unmount]")
        }));
        assert!(lines.iter().any(|l| l.contains("1.0 GiB Free Space  [Create Partition]")));
    }

    #[test]
    fn missing_selection_is_reported() {
        let text = print_state(&ViewState::NotFound {
            selection: Selection::VolumeGroup("vg9".into()),
        });
        assert_eq!(text, "Not found: vgroup vg9\n");
    }
}
