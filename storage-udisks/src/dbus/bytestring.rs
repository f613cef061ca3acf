//! NUL-terminated byte strings (`ay`) as UDisks2 uses them for paths

use zbus::zvariant::{OwnedValue, Value};

pub fn encode_bytestring(value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// `ay` value for an option or configuration dictionary
pub fn bytestring_value(value: &str) -> Value<'static> {
    Value::from(encode_bytestring(value))
}

pub fn bytestring_owned_value(value: &str) -> Option<OwnedValue> {
    bytestring_value(value).try_into().ok()
}

pub fn owned_value_to_bytestring(value: &OwnedValue) -> Option<String> {
    let bytes: Vec<u8> = value.clone().try_into().ok()?;
    Some(decode_c_string_bytes(&bytes))
}

pub fn decode_c_string_bytes(bytes: &[u8]) -> String {
    let raw = match bytes.split(|b| *b == 0).next() {
        Some(v) => v,
        None => bytes,
    };

    String::from_utf8_lossy(raw).to_string()
}

pub fn decode_mount_points(mount_points: Vec<Vec<u8>>) -> Vec<String> {
    mount_points
        .into_iter()
        .filter_map(|mp| {
            let decoded = decode_c_string_bytes(&mp);
            if decoded.is_empty() {
                None
            } else {
                Some(decoded)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_nul() {
        assert_eq!(encode_bytestring("/mnt"), b"/mnt\0".to_vec());
    }

    #[test]
    fn decode_c_string_bytes_truncates_nul() {
        let bytes = b"/run/media/user/DISK\0garbage";
        assert_eq!(decode_c_string_bytes(bytes), "/run/media/user/DISK");
    }

    #[test]
    fn owned_value_roundtrip_through_bytes() {
        let value = bytestring_owned_value("/etc/luks-keys/data").unwrap();
        assert_eq!(
            owned_value_to_bytestring(&value).as_deref(),
            Some("/etc/luks-keys/data")
        );
    }

    #[test]
    fn decode_mount_points_filters_empty_entries() {
        let decoded = decode_mount_points(vec![
            b"/mnt/a\0".to_vec(),
            b"\0".to_vec(),
            Vec::new(),
            b"/mnt/b".to_vec(),
        ]);

        assert_eq!(decoded, vec!["/mnt/a".to_string(), "/mnt/b".to_string()]);
    }
}
