//! Proxies for the UDisks2 interfaces the `udisks2` crate does not cover the
//! way this client needs them.

use std::collections::HashMap;

use zbus::zvariant::{self, ObjectPath, OwnedObjectPath, OwnedValue, Value};
use zbus_macros::proxy;

pub const UDISKS2_SERVICE: &str = "org.freedesktop.UDisks2";
pub const UDISKS2_ROOT: &str = "/org/freedesktop/UDisks2";

pub type ConfigurationItem = (String, HashMap<String, OwnedValue>);

#[proxy(
    interface = "org.freedesktop.UDisks2.Block",
    default_service = "org.freedesktop.UDisks2",
    assume_defaults = true
)]
pub trait UDisks2BlockConfiguration {
    #[zbus(property)]
    fn configuration(&self) -> zbus::Result<Vec<ConfigurationItem>>;

    /// Method signature (per introspection): (sa{sv}) a{sv}
    fn add_configuration_item(
        &self,
        item: ConfigurationItem,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    /// Method signature (per introspection): (sa{sv}) a{sv}
    fn remove_configuration_item(
        &self,
        item: ConfigurationItem,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    /// Method signature (per introspection): (sa{sv}) (sa{sv}) a{sv}
    fn update_configuration_item(
        &self,
        old_item: ConfigurationItem,
        new_item: ConfigurationItem,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    /// Method signature (per introspection): a{sv} -> a(sa{sv})
    fn get_secret_configuration(
        &self,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<Vec<ConfigurationItem>>;
}

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2/Manager",
    interface = "org.freedesktop.UDisks2.Manager"
)]
pub trait UDisks2Manager {
    #[zbus(property)]
    fn version(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn supported_filesystems(&self) -> zbus::Result<Vec<String>>;
}

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2",
    interface = "org.freedesktop.DBus.ObjectManager"
)]
pub trait UDisks2ObjectManager {
    #[zbus(signal)]
    fn interfaces_added(
        &self,
        object_path: zvariant::OwnedObjectPath,
        interfaces_and_properties: HashMap<String, HashMap<String, zvariant::OwnedValue>>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    fn interfaces_removed(
        &self,
        object_path: zvariant::OwnedObjectPath,
        interfaces: Vec<String>,
    ) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.UDisks2.MDRaid",
    default_service = "org.freedesktop.UDisks2",
    assume_defaults = true
)]
pub trait UDisks2MDRaid {
    fn start(&self, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;

    fn stop(&self, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;

    fn request_sync_action(
        &self,
        sync_action: &str,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    fn set_bitmap_location(
        &self,
        value: &[u8],
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    fn add_device(
        &self,
        device: &ObjectPath<'_>,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    fn remove_device(
        &self,
        device: &ObjectPath<'_>,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    /// Only present on UDisks2 2.1.3 and later
    fn delete(&self, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.UDisks2.VolumeGroup",
    default_service = "org.freedesktop.UDisks2",
    assume_defaults = true
)]
pub trait UDisks2VolumeGroup {
    fn rename(
        &self,
        new_name: &str,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<OwnedObjectPath>;

    fn delete(&self, wipe: bool, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;

    fn create_plain_volume(
        &self,
        name: &str,
        size: u64,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<OwnedObjectPath>;

    fn create_thin_pool_volume(
        &self,
        name: &str,
        size: u64,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<OwnedObjectPath>;

    fn create_thin_volume(
        &self,
        name: &str,
        size: u64,
        pool: &ObjectPath<'_>,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<OwnedObjectPath>;

    fn add_device(
        &self,
        block: &ObjectPath<'_>,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    fn remove_device(
        &self,
        block: &ObjectPath<'_>,
        wipe: bool,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    fn empty_device(
        &self,
        block: &ObjectPath<'_>,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    fn poll(&self) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.UDisks2.LogicalVolume",
    default_service = "org.freedesktop.UDisks2",
    assume_defaults = true
)]
pub trait UDisks2LogicalVolume {
    fn resize(&self, new_size: u64, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;

    fn rename(
        &self,
        new_name: &str,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<OwnedObjectPath>;

    fn create_snapshot(
        &self,
        name: &str,
        size: u64,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<OwnedObjectPath>;

    fn activate(&self, options: HashMap<&str, Value<'_>>) -> zbus::Result<OwnedObjectPath>;

    fn deactivate(&self, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;

    fn delete(&self, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.UDisks2.Job",
    default_service = "org.freedesktop.UDisks2",
    assume_defaults = true
)]
pub trait UDisks2Job {
    fn cancel(&self, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;
}
