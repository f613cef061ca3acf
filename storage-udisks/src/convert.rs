//! Conversions between records/options and their D-Bus shapes

use std::collections::HashMap;

use storage_types::{ConfigItem, CrypttabEntry, FormatOptions, FstabEntry};
use zbus::zvariant::{OwnedValue, Value};

use crate::DiskError;
use crate::dbus::bytestring as bs;
use crate::dbus::proxies::ConfigurationItem;

pub type CallOptions = HashMap<&'static str, Value<'static>>;

fn bytes_entry(dict: &HashMap<String, OwnedValue>, key: &str) -> String {
    dict.get(key)
        .and_then(bs::owned_value_to_bytestring)
        .unwrap_or_default()
}

fn int_entry(dict: &HashMap<String, OwnedValue>, key: &str) -> i32 {
    dict.get(key)
        .and_then(|v| i32::try_from(v.clone()).ok())
        .unwrap_or(0)
}

fn bool_entry(dict: &HashMap<String, OwnedValue>, key: &str) -> bool {
    dict.get(key)
        .and_then(|v| bool::try_from(v.clone()).ok())
        .unwrap_or(false)
}

/// Decode one `(sa{sv})` configuration item
pub fn config_item_from_dbus(item: &ConfigurationItem) -> ConfigItem {
    let (kind, dict) = item;
    match kind.as_str() {
        "fstab" => ConfigItem::Fstab(FstabEntry {
            fsname: bytes_entry(dict, "fsname"),
            dir: bytes_entry(dict, "dir"),
            fs_type: bytes_entry(dict, "type"),
            opts: bytes_entry(dict, "opts"),
            freq: int_entry(dict, "freq"),
            passno: int_entry(dict, "passno"),
            track_parents: bool_entry(dict, "track-parents"),
        }),
        "crypttab" => ConfigItem::Crypttab(CrypttabEntry {
            name: bytes_entry(dict, "name"),
            device: bytes_entry(dict, "device"),
            options: bytes_entry(dict, "options"),
            passphrase_path: bytes_entry(dict, "passphrase-path"),
            passphrase_contents: bytes_entry(dict, "passphrase-contents"),
            track_parents: bool_entry(dict, "track-parents"),
        }),
        other => ConfigItem::Other {
            kind: other.to_string(),
        },
    }
}

fn put_bytes(
    dict: &mut HashMap<String, OwnedValue>,
    key: &str,
    value: &str,
) -> Result<(), DiskError> {
    let encoded = bs::bytestring_owned_value(value)
        .ok_or_else(|| DiskError::DBusError(format!("cannot encode {key}")))?;
    dict.insert(key.to_string(), encoded);
    Ok(())
}

/// Encode a configuration item; fields the daemon fills in are only sent
/// when known.
pub fn config_item_to_dbus(item: &ConfigItem) -> Result<ConfigurationItem, DiskError> {
    let mut dict = HashMap::new();
    match item {
        ConfigItem::Fstab(entry) => {
            if !entry.fsname.is_empty() {
                put_bytes(&mut dict, "fsname", &entry.fsname)?;
            }
            put_bytes(&mut dict, "dir", &entry.dir)?;
            put_bytes(&mut dict, "type", &entry.fs_type)?;
            put_bytes(&mut dict, "opts", &entry.opts)?;
            dict.insert("freq".to_string(), OwnedValue::from(entry.freq));
            dict.insert("passno".to_string(), OwnedValue::from(entry.passno));
            if entry.track_parents {
                dict.insert("track-parents".to_string(), OwnedValue::from(true));
            }
        }
        ConfigItem::Crypttab(entry) => {
            if !entry.name.is_empty() {
                put_bytes(&mut dict, "name", &entry.name)?;
            }
            if !entry.device.is_empty() {
                put_bytes(&mut dict, "device", &entry.device)?;
            }
            if !entry.passphrase_path.is_empty() {
                put_bytes(&mut dict, "passphrase-path", &entry.passphrase_path)?;
            }
            put_bytes(&mut dict, "options", &entry.options)?;
            put_bytes(&mut dict, "passphrase-contents", &entry.passphrase_contents)?;
            if entry.track_parents {
                dict.insert("track-parents".to_string(), OwnedValue::from(true));
            }
        }
        ConfigItem::Other { .. } => {}
    }
    Ok((item.kind().to_string(), dict))
}

/// `a{sv}` for `Block.Format` and `CreatePartitionAndFormat`
pub fn format_options_to_dbus(options: &FormatOptions) -> Result<CallOptions, DiskError> {
    let mut out = CallOptions::new();
    if options.no_block {
        out.insert("no-block", Value::from(true));
    }
    if options.dry_run_first {
        out.insert("dry-run-first", Value::from(true));
    }
    if options.tear_down {
        out.insert("tear-down", Value::from(true));
    }
    if let Some(erase) = options.erase.as_option() {
        out.insert("erase", Value::from(erase));
    }
    if let Some(label) = options.label.as_deref()
        && !label.is_empty()
    {
        out.insert("label", Value::from(label.to_string()));
    }
    if let Some(passphrase) = options.encrypt_passphrase.as_deref() {
        out.insert("encrypt.passphrase", Value::from(passphrase.to_string()));
    }
    if !options.config_items.is_empty() {
        let items = options
            .config_items
            .iter()
            .map(config_item_to_dbus)
            .collect::<Result<Vec<_>, _>>()?;
        out.insert("config-items", Value::from(items));
    }
    Ok(out)
}

pub fn tear_down_options(tear_down: bool) -> CallOptions {
    let mut out = CallOptions::new();
    if tear_down {
        out.insert("tear-down", Value::from(true));
    }
    out
}
