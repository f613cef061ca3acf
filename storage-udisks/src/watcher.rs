//! Change notifications from the daemon
//!
//! Any added or removed interface and any property change is reported as a
//! [`StorageEvent`]. Consumers reload the snapshot on each event.

use futures::StreamExt;
use futures::stream::Stream;
use futures::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use zbus::{Connection, MatchRule, MessageStream, message};

use crate::DiskError;
use crate::dbus::proxies::{UDISKS2_SERVICE, UDisks2ObjectManagerProxy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    InterfacesAdded { path: String, interfaces: Vec<String> },
    InterfacesRemoved { path: String, interfaces: Vec<String> },
    PropertiesChanged { path: String },
}

impl StorageEvent {
    pub fn path(&self) -> &str {
        match self {
            Self::InterfacesAdded { path, .. }
            | Self::InterfacesRemoved { path, .. }
            | Self::PropertiesChanged { path } => path,
        }
    }
}

pub struct ChangeWatcher {
    receiver: mpsc::Receiver<StorageEvent>,
}

impl ChangeWatcher {
    /// Subscribe to ObjectManager and PropertiesChanged signals of UDisks2.
    ///
    /// The forwarding task ends when the returned watcher is dropped.
    pub async fn subscribe(connection: &Connection) -> Result<Self, DiskError> {
        let (sender, receiver) = mpsc::channel(64);

        let object_manager = UDisks2ObjectManagerProxy::new(connection).await?;
        let mut added_stream = object_manager.receive_interfaces_added().await?;
        let mut removed_stream = object_manager.receive_interfaces_removed().await?;

        let rule = MatchRule::builder()
            .msg_type(message::Type::Signal)
            .sender(UDISKS2_SERVICE)?
            .interface("org.freedesktop.DBus.Properties")?
            .member("PropertiesChanged")?
            .build();
        let mut changed_stream = MessageStream::for_match_rule(rule, connection, Some(256)).await?;

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    maybe_added = added_stream.next() => {
                        let Some(signal) = maybe_added else {
                            break;
                        };
                        match signal.args() {
                            Ok(args) => StorageEvent::InterfacesAdded {
                                path: args.object_path.to_string(),
                                interfaces: args.interfaces_and_properties.keys().cloned().collect(),
                            },
                            Err(e) => {
                                warn!("Failed to parse InterfacesAdded signal args: {e}");
                                continue;
                            }
                        }
                    }
                    maybe_removed = removed_stream.next() => {
                        let Some(signal) = maybe_removed else {
                            break;
                        };
                        match signal.args() {
                            Ok(args) => StorageEvent::InterfacesRemoved {
                                path: args.object_path.to_string(),
                                interfaces: args.interfaces.clone(),
                            },
                            Err(e) => {
                                warn!("Failed to parse InterfacesRemoved signal args: {e}");
                                continue;
                            }
                        }
                    }
                    maybe_changed = changed_stream.next() => {
                        let Some(message) = maybe_changed else {
                            break;
                        };
                        match message {
                            Ok(message) => {
                                let Some(path) = message.header().path().map(|p| p.to_string()) else {
                                    continue;
                                };
                                StorageEvent::PropertiesChanged { path }
                            }
                            Err(e) => {
                                warn!("Failed to receive PropertiesChanged: {e}");
                                continue;
                            }
                        }
                    }
                };

                debug!(?event, "storage change");
                if let Err(e) = sender.send(event).await {
                    debug!("Storage event receiver dropped: {e}");
                    break;
                }
            }
        });

        Ok(Self { receiver })
    }
}

impl Stream for ChangeWatcher {
    type Item = StorageEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
