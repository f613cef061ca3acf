// SPDX-License-Identifier: GPL-3.0-only

//! The three regions of the detail page (header, sidebar, content) plus
//! the jobs running on what is shown

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storage_types::{
    ActiveDevice, BlockRecord, MdRaidRecord, PhysicalVolumeRecord, StorageSnapshot,
    VolumeGroupRecord, fmt_size, fmt_size_long, format_remaining, format_temperature,
};
use thiserror::Error;

use crate::actions::{
    Action, ActionMenu, Availability, MenuItem, disabled_button, simple_button,
};
use crate::describe::mdraid_name;
use crate::entries::{ContentEntry, block_content_entries, volume_group_content_entries};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    Block,
    #[serde(rename = "mdraid")]
    MdRaid,
    #[serde(rename = "vgroup")]
    VolumeGroup,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown kind \"{0}\" (expected block, mdraid or vgroup)")]
pub struct UnknownSelectionKind(pub String);

impl FromStr for SelectionKind {
    type Err = UnknownSelectionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Self::Block),
            "mdraid" => Ok(Self::MdRaid),
            "vgroup" => Ok(Self::VolumeGroup),
            other => Err(UnknownSelectionKind(other.to_string())),
        }
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Block => "block",
            Self::MdRaid => "mdraid",
            Self::VolumeGroup => "vgroup",
        })
    }
}

/// What the page shows: a block by device name, an array by UUID or a
/// volume group by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Selection {
    Block(String),
    #[serde(rename = "mdraid")]
    MdRaid(String),
    #[serde(rename = "vgroup")]
    VolumeGroup(String),
}

impl Selection {
    pub fn new(kind: SelectionKind, name: impl Into<String>) -> Self {
        let name = name.into();
        match kind {
            SelectionKind::Block => Self::Block(name),
            SelectionKind::MdRaid => Self::MdRaid(name),
            SelectionKind::VolumeGroup => Self::VolumeGroup(name),
        }
    }

    pub fn kind(&self) -> SelectionKind {
        match self {
            Self::Block(_) => SelectionKind::Block,
            Self::MdRaid(_) => SelectionKind::MdRaid,
            Self::VolumeGroup(_) => SelectionKind::VolumeGroup,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Block(name) | Self::MdRaid(name) | Self::VolumeGroup(name) => name,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    pub header: Header,
    pub sidebar: Option<Sidebar>,
    pub content: Option<Content>,
    pub jobs: Vec<JobRow>,
}

impl RenderedView {
    /// Every menu on the page: header, sidebar, content rows and jobs
    pub fn menus(&self) -> Vec<&ActionMenu> {
        let mut menus = Vec::new();
        match &self.header {
            Header::Block(_) => {}
            Header::MdRaid(header) => menus.push(&header.menu),
            Header::VolumeGroup(header) => menus.push(&header.menu),
        }
        match &self.sidebar {
            Some(Sidebar::MdRaidMembers { members, add, .. }) => {
                menus.extend(add);
                menus.extend(members.iter().filter_map(|m| m.remove.as_ref()));
            }
            Some(Sidebar::PhysicalVolumes { pvols, add }) => {
                menus.push(add);
                menus.extend(pvols.iter().map(|p| &p.remove));
            }
            None => {}
        }
        if let Some(content) = &self.content {
            menus.extend(content.entries.iter().filter_map(|e| e.menu.as_ref()));
        }
        menus.extend(self.jobs.iter().filter_map(|j| j.cancel.as_ref()));
        menus
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Header {
    Block(BlockHeader),
    MdRaid(MdRaidHeader),
    VolumeGroup(VolumeGroupHeader),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub name: String,
    pub size: String,
    pub drive: Option<DriveHeader>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveHeader {
    pub model: String,
    pub size: Option<String>,
    pub assessment: Option<Assessment>,

    /// Block that represents the whole drive
    pub device: Option<String>,

    /// Other paths to a multipath drive
    pub multipath_devices: Vec<String>,
}

/// SMART state of an ATA drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub failing: bool,
    pub temperature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MdRaidHeader {
    pub name: String,
    pub size: String,

    /// "RAID 5, 3 Disks, 512.0 KiB Chunk Size"
    pub level: String,

    /// Whether a write-intent bitmap is on; `None` when not reported
    pub bitmap: Option<bool>,

    pub degraded: Option<String>,
    pub state: String,
    pub device: Option<String>,
    pub menu: ActionMenu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeGroupHeader {
    pub name: String,
    pub size: String,
    pub menu: ActionMenu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sidebar {
    MdRaidMembers {
        members: Vec<MemberRow>,

        /// Members can be added and removed (all levels but raid0)
        dynamic: bool,
        add: Option<ActionMenu>,
    },
    PhysicalVolumes {
        pvols: Vec<PhysicalVolumeRow>,
        add: ActionMenu,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRow {
    pub path: String,
    pub device: String,
    pub slot: Option<i32>,
    pub states: Vec<MemberState>,
    pub remove: Option<ActionMenu>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberState {
    pub description: String,
    pub danger: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhysicalVolumeRow {
    pub path: String,
    pub device: String,

    /// "SIZE, FREE free"
    pub sizes: String,
    pub remove: ActionMenu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub title: String,
    pub entries: Vec<ContentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRow {
    pub path: String,
    pub title: String,

    /// Percent done, when the job reports progress
    pub progress: Option<u32>,
    pub remaining: Option<String>,
    pub cancel: Option<ActionMenu>,
}

/// Build the page for `selection`; `None` when it does not exist
pub fn render(snapshot: &StorageSnapshot, selection: &Selection) -> Option<RenderedView> {
    render_at(snapshot, selection, Utc::now())
}

/// [`render`] with remaining job times relative to `now`
pub fn render_at(
    snapshot: &StorageSnapshot,
    selection: &Selection,
    now: DateTime<Utc>,
) -> Option<RenderedView> {
    let (view, mut watched) = match selection {
        Selection::Block(name) => render_block(snapshot, snapshot.block_by_name(name)?),
        Selection::MdRaid(uuid) => render_mdraid(snapshot, snapshot.mdraid_by_uuid(uuid)?),
        Selection::VolumeGroup(name) => {
            render_vgroup(snapshot, snapshot.volume_group_by_name(name)?)
        }
    };

    if let Some(content) = &view.content {
        watched.extend(content.entries.iter().filter_map(|e| e.job_object.clone()));
    }

    Some(RenderedView {
        jobs: job_rows(snapshot, &watched, now),
        ..view
    })
}

/// Every page the snapshot can show: blocks by device, arrays by UUID and
/// groups by name
pub fn selections(snapshot: &StorageSnapshot) -> Vec<Selection> {
    let blocks = snapshot
        .blocks
        .values()
        .map(|b| Selection::Block(b.device.clone()));
    let mdraids = snapshot
        .mdraids
        .values()
        .map(|md| Selection::MdRaid(md.uuid.clone()));
    let vgroups = snapshot
        .volume_groups
        .values()
        .map(|vg| Selection::VolumeGroup(vg.name.clone()));
    blocks.chain(mdraids).chain(vgroups).collect()
}

/// Check that some page offers `action` as an enabled menu item.
///
/// A disabled item is refused with its reason; an action no page shows is
/// refused as not offered.
pub fn check_offered(snapshot: &StorageSnapshot, action: &Action) -> Result<(), ValidationError> {
    let mut disabled: Option<MenuItem> = None;
    for selection in selections(snapshot) {
        let Some(view) = render(snapshot, &selection) else {
            continue;
        };
        for menu in view.menus() {
            for item in menu.items.iter().filter(|i| i.action == *action) {
                if item.is_enabled() {
                    return Ok(());
                }
                if disabled.is_none() {
                    disabled = Some(item.clone());
                }
            }
        }
    }

    match disabled {
        Some(MenuItem {
            availability: Availability::Disabled {
                reason: Some(reason),
            },
            ..
        }) => Err(ValidationError::Unavailable(reason)),
        Some(item) => Err(ValidationError::Unavailable(format!(
            "{} is not available",
            item.title
        ))),
        None => Err(ValidationError::NotOffered(action.name())),
    }
}

/// A view without jobs, plus the objects whose jobs belong on the page
type Partial = (RenderedView, Vec<String>);

fn view(header: Header, sidebar: Option<Sidebar>, content: Option<Content>) -> RenderedView {
    RenderedView {
        header,
        sidebar,
        content,
        jobs: Vec::new(),
    }
}

fn render_block(snapshot: &StorageSnapshot, block: &BlockRecord) -> Partial {
    let mut watched = vec![block.path.clone()];

    let drive = block.drive.as_deref().and_then(|d| snapshot.drive(d));
    let drive_block = drive.and_then(|d| snapshot.drive_block(&d.path));

    let drive_header = drive.map(|drive| {
        watched.push(drive.path.clone());
        let assessment = snapshot.drive_ata(&drive.path).map(|ata| Assessment {
            failing: ata.smart_failing,
            temperature: (ata.smart_temperature > 0.0)
                .then(|| format_temperature(ata.smart_temperature)),
        });
        DriveHeader {
            model: drive.display_name(),
            size: (drive.size > 0).then(|| fmt_size_long(drive.size)),
            assessment,
            device: drive_block.map(|b| b.name().to_string()),
            multipath_devices: snapshot
                .multipath_blocks(&drive.path)
                .into_iter()
                .map(|b| b.name().to_string())
                .collect(),
        }
    });

    // Without a drive the block is its own content; with one, the drive's
    // main block is, which may be missing
    let content_block = match drive {
        Some(_) => drive_block,
        None => Some(block),
    };
    let content = content_block.map(|b| {
        if b.path != block.path {
            watched.push(b.path.clone());
        }
        Content {
            title: "Content".to_string(),
            entries: block_content_entries(snapshot, b, 0),
        }
    });

    let header = Header::Block(BlockHeader {
        name: block.name().to_string(),
        size: fmt_size_long(block.size),
        drive: drive_header,
    });
    (view(header, None, content), watched)
}

fn mdraid_level(mdraid: &MdRaidRecord) -> String {
    let mut level = mdraid.level_title();
    if mdraid.num_devices > 0 {
        level.push_str(&format!(", {} Disks", mdraid.num_devices));
    }
    if mdraid.chunk_size > 0 {
        level.push_str(&format!(", {} Chunk Size", fmt_size(mdraid.chunk_size)));
    }
    level
}

fn degraded_message(missing: u32) -> Option<String> {
    match missing {
        0 => None,
        1 => Some("1 disk is missing".to_string()),
        n => Some(format!("{n} disks are missing")),
    }
}

fn member_state(state: &str, slot: i32) -> MemberState {
    let description = match state {
        "faulty" => "FAILED".to_string(),
        "in_sync" => "In Sync".to_string(),
        "spare" if slot < 0 => "Spare".to_string(),
        "spare" => "Recovering".to_string(),
        "write_mostly" => "Write-mostly".to_string(),
        "blocked" => "Blocked".to_string(),
        other => format!("Unknown ({other})"),
    };
    MemberState {
        description,
        danger: state == "faulty",
    }
}

fn mdraid_menu(mdraid: &MdRaidRecord) -> ActionMenu {
    let path = || mdraid.path.clone();
    let items = vec![
        MenuItem::enabled("Start", Action::MdRaidStart { mdraid: path() }),
        MenuItem::enabled("Stop", Action::MdRaidStop { mdraid: path() }),
        MenuItem::enabled("Start Scrubbing", Action::MdRaidStartScrub { mdraid: path() }),
        MenuItem::enabled("Stop Scrubbing", Action::MdRaidStopScrub { mdraid: path() }),
        MenuItem::enabled("Delete", Action::MdRaidDelete { mdraid: path() }),
    ];
    let default = if mdraid.is_running() {
        items[1].clone()
    } else {
        items[0].clone()
    };
    ActionMenu { default, items }
}

fn render_mdraid(snapshot: &StorageSnapshot, mdraid: &MdRaidRecord) -> Partial {
    let block = snapshot.mdraid_block(&mdraid.path);
    let dynamic = mdraid.level != "raid0";

    let header = Header::MdRaid(MdRaidHeader {
        name: mdraid_name(mdraid),
        size: fmt_size_long(mdraid.size),
        level: mdraid_level(mdraid),
        bitmap: (!mdraid.bitmap_location.is_empty()).then(|| mdraid.bitmap_location != "none"),
        degraded: degraded_message(mdraid.degraded),
        state: if mdraid.is_running() {
            "Running"
        } else {
            "Not running"
        }
        .to_string(),
        device: block.map(|b| b.name().to_string()),
        menu: mdraid_menu(mdraid),
    });

    let members = snapshot
        .mdraid_members(&mdraid.path)
        .into_iter()
        .map(|member| {
            let active: Option<&ActiveDevice> =
                mdraid.active_devices.iter().find(|a| a.block == member.path);
            MemberRow {
                path: member.path.clone(),
                device: member.name().to_string(),
                slot: active.map(|a| a.slot).filter(|slot| *slot >= 0),
                states: active
                    .map(|a| a.states.iter().map(|s| member_state(s, a.slot)).collect())
                    .unwrap_or_default(),
                remove: dynamic.then(|| {
                    simple_button(
                        "Remove",
                        Action::MdRaidRemoveDisk {
                            block: member.path.clone(),
                        },
                    )
                }),
            }
        })
        .collect();

    let sidebar = Sidebar::MdRaidMembers {
        members,
        dynamic,
        add: dynamic.then(|| {
            simple_button(
                "Add",
                Action::MdRaidAddDisk {
                    mdraid: mdraid.path.clone(),
                },
            )
        }),
    };

    let content = block.map(|b| Content {
        title: "Content".to_string(),
        entries: block_content_entries(snapshot, b, 0),
    });

    let mut watched = vec![mdraid.path.clone()];
    watched.extend(block.map(|b| b.path.clone()));
    (view(header, Some(sidebar), content), watched)
}

fn pvol_remove_button(
    vgroup: &VolumeGroupRecord,
    pvol: &PhysicalVolumeRecord,
    pvol_count: usize,
) -> ActionMenu {
    let block = pvol.path.clone();
    if pvol_count == 1 {
        return disabled_button(
            "Remove",
            Action::PhysicalVolumeRemove { block },
            "The last physical volume of a volume group cannot be removed.",
        );
    }
    if pvol.free_size < pvol.size {
        if pvol.size <= vgroup.free_size {
            return simple_button("Remove", Action::PhysicalVolumeEmptyAndRemove { block });
        }
        return disabled_button(
            "Remove",
            Action::PhysicalVolumeEmptyAndRemove { block },
            format!(
                "There is not enough free space elsewhere to remove this physical volume.  \
                 At least {} more free space is needed.",
                fmt_size(pvol.size - vgroup.free_size)
            ),
        );
    }
    simple_button("Remove", Action::PhysicalVolumeRemove { block })
}

fn render_vgroup(snapshot: &StorageSnapshot, vgroup: &VolumeGroupRecord) -> Partial {
    let path = || vgroup.path.clone();
    let items = vec![
        MenuItem::enabled("Rename", Action::VolumeGroupRename { vgroup: path() }),
        MenuItem::enabled("Delete", Action::VolumeGroupDelete { vgroup: path() }),
    ];
    let header = Header::VolumeGroup(VolumeGroupHeader {
        name: vgroup.name.clone(),
        size: fmt_size_long(vgroup.size),
        menu: ActionMenu {
            default: items[0].clone(),
            items,
        },
    });

    let pvols = snapshot.pvols_of(&vgroup.path);
    let rows = pvols
        .iter()
        .map(|pvol| PhysicalVolumeRow {
            path: pvol.path.clone(),
            device: snapshot
                .block(&pvol.path)
                .map(|b| b.name().to_string())
                .unwrap_or_default(),
            sizes: format!("{}, {} free", fmt_size(pvol.size), fmt_size(pvol.free_size)),
            remove: pvol_remove_button(vgroup, pvol, pvols.len()),
        })
        .collect();

    let sidebar = Sidebar::PhysicalVolumes {
        pvols: rows,
        add: simple_button("Add", Action::VolumeGroupAddDisk { vgroup: path() }),
    };
    let content = Content {
        title: "Logical Volumes".to_string(),
        entries: volume_group_content_entries(snapshot, vgroup, 0),
    };

    let mut watched = vec![vgroup.path.clone()];
    watched.extend(pvols.iter().map(|p| p.path.clone()));
    (view(header, Some(sidebar), Some(content)), watched)
}

fn job_rows(snapshot: &StorageSnapshot, watched: &[String], now: DateTime<Utc>) -> Vec<JobRow> {
    let paths: Vec<&str> = watched.iter().map(String::as_str).collect();
    snapshot
        .jobs_for(&paths)
        .into_iter()
        .map(|job| JobRow {
            path: job.path.clone(),
            title: job.title(),
            progress: job
                .progress
                .map(|p| (p.clamp(0.0, 1.0) * 100.0).round() as u32),
            remaining: job.remaining(now).map(format_remaining),
            cancel: job.cancelable.then(|| {
                simple_button(
                    "Cancel",
                    Action::CancelJob {
                        job: job.path.clone(),
                    },
                )
            }),
        })
        .collect()
}
