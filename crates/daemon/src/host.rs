//! Interface host: the device table and attribute tree the monitor plugs into.
//!
//! The monitor only supplies callbacks ([`DeviceOps`], [`AttributeOps`]);
//! node creation, naming and permission checks belong to the host.
//! [`InterfaceHost`] is the seam, [`Registry`] the in-process
//! implementation served over HTTP by [`crate::routes`].

use std::collections::HashMap;
use std::sync::Arc;

use automon_core::error::CoreError;
use parking_lot::RwLock;

/// Read/write handlers of a stream-style device.
pub trait DeviceOps: Send + Sync {
    /// Called when a handle is opened.
    fn open(&self) {}

    /// Called when a handle is closed.
    fn release(&self) {}

    /// Positional read: at most `max_len` bytes starting at `offset`;
    /// empty once `offset` is past the end.
    fn read(&self, offset: u64, max_len: usize) -> Result<Vec<u8>, CoreError>;

    /// Consume a write payload, returning the number of bytes accepted.
    fn write(&self, payload: &[u8]) -> Result<usize, CoreError>;
}

/// Show/store callbacks of a single attribute entry.
pub trait AttributeOps: Send + Sync {
    fn show(&self) -> String;

    fn store(&self, _payload: &[u8]) -> Result<usize, CoreError> {
        Err(CoreError::ReadOnly("attribute"))
    }
}

/// Read permission bits (owner, group, other).
const MODE_READ: u16 = 0o444;
/// Write permission bits (owner, group, other).
const MODE_WRITE: u16 = 0o222;

/// A named entry in an attribute group.
#[derive(Clone)]
pub struct Attribute {
    pub name: &'static str,
    /// Unix-style permission bits, e.g. `0o664`.
    pub mode: u16,
    pub ops: Arc<dyn AttributeOps>,
}

impl Attribute {
    pub fn new(name: &'static str, mode: u16, ops: Arc<dyn AttributeOps>) -> Self {
        Self { name, mode, ops }
    }

    pub fn is_writable(&self) -> bool {
        self.mode & MODE_WRITE != 0
    }

    pub fn show(&self) -> Result<String, CoreError> {
        if self.mode & MODE_READ == 0 {
            return Err(CoreError::ReadOnly(self.name));
        }
        Ok(self.ops.show())
    }

    /// Store through the entry, refusing entries without write permission.
    pub fn store(&self, payload: &[u8]) -> Result<usize, CoreError> {
        if !self.is_writable() {
            return Err(CoreError::ReadOnly(self.name));
        }
        self.ops.store(payload)
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("mode", &format_args!("{:o}", self.mode))
            .finish()
    }
}

/// Errors from interface registration and lookup.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Device already registered: {0}")]
    DeviceExists(String),

    #[error("No such device: {0}")]
    NoSuchDevice(String),

    #[error("Attribute directory already exists: {0}")]
    DirExists(String),

    #[error("No such attribute directory: {0}")]
    NoSuchDir(String),

    #[error("Attribute group already populated in {0}")]
    GroupExists(String),

    #[error("No such attribute: {dir}/{name}")]
    NoSuchAttribute { dir: String, name: String },
}

/// Proof of a registered device; hand it back to unregister.
#[derive(Debug)]
pub struct DeviceNode {
    name: String,
}

impl DeviceNode {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Proof of a created attribute directory; hand it back to remove.
#[derive(Debug)]
pub struct AttrDir {
    name: String,
}

impl AttrDir {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Registration surface consumed by [`crate::module::Monitor`].
pub trait InterfaceHost: Send + Sync {
    fn register_device(&self, name: &str, ops: Arc<dyn DeviceOps>)
        -> Result<DeviceNode, HostError>;

    fn unregister_device(&self, node: DeviceNode);

    fn create_dir(&self, name: &str) -> Result<AttrDir, HostError>;

    fn remove_dir(&self, dir: AttrDir);

    fn create_group(&self, dir: &AttrDir, attrs: Vec<Attribute>) -> Result<(), HostError>;

    fn remove_group(&self, dir: &AttrDir);
}

/// In-process device table and attribute tree.
#[derive(Default)]
pub struct Registry {
    devices: RwLock<HashMap<String, Arc<dyn DeviceOps>>>,
    dirs: RwLock<HashMap<String, Vec<Attribute>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a handle on a registered device.
    pub fn open(&self, name: &str) -> Result<DeviceFile, HostError> {
        let ops = self
            .devices
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::NoSuchDevice(name.to_string()))?;
        Ok(DeviceFile::open(ops))
    }

    pub fn attribute(&self, dir: &str, name: &str) -> Result<Attribute, HostError> {
        let dirs = self.dirs.read();
        let attrs = dirs
            .get(dir)
            .ok_or_else(|| HostError::NoSuchDir(dir.to_string()))?;
        attrs
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| HostError::NoSuchAttribute {
                dir: dir.to_string(),
                name: name.to_string(),
            })
    }

    /// Entry names and modes of a directory, in registration order.
    pub fn list(&self, dir: &str) -> Result<Vec<(&'static str, u16)>, HostError> {
        let dirs = self.dirs.read();
        let attrs = dirs
            .get(dir)
            .ok_or_else(|| HostError::NoSuchDir(dir.to_string()))?;
        Ok(attrs.iter().map(|a| (a.name, a.mode)).collect())
    }

    pub fn has_device(&self, name: &str) -> bool {
        self.devices.read().contains_key(name)
    }

    pub fn has_dir(&self, name: &str) -> bool {
        self.dirs.read().contains_key(name)
    }
}

impl InterfaceHost for Registry {
    fn register_device(
        &self,
        name: &str,
        ops: Arc<dyn DeviceOps>,
    ) -> Result<DeviceNode, HostError> {
        let mut devices = self.devices.write();
        if devices.contains_key(name) {
            return Err(HostError::DeviceExists(name.to_string()));
        }
        devices.insert(name.to_string(), ops);
        tracing::info!(device = name, "Device node created");
        Ok(DeviceNode {
            name: name.to_string(),
        })
    }

    fn unregister_device(&self, node: DeviceNode) {
        if self.devices.write().remove(&node.name).is_some() {
            tracing::info!(device = %node.name, "Device node removed");
        } else {
            tracing::warn!(device = %node.name, "Unregistering unknown device");
        }
    }

    fn create_dir(&self, name: &str) -> Result<AttrDir, HostError> {
        let mut dirs = self.dirs.write();
        if dirs.contains_key(name) {
            return Err(HostError::DirExists(name.to_string()));
        }
        dirs.insert(name.to_string(), Vec::new());
        Ok(AttrDir {
            name: name.to_string(),
        })
    }

    fn remove_dir(&self, dir: AttrDir) {
        self.dirs.write().remove(&dir.name);
    }

    fn create_group(&self, dir: &AttrDir, attrs: Vec<Attribute>) -> Result<(), HostError> {
        let mut dirs = self.dirs.write();
        let entries = dirs
            .get_mut(&dir.name)
            .ok_or_else(|| HostError::NoSuchDir(dir.name.clone()))?;
        if !entries.is_empty() {
            return Err(HostError::GroupExists(dir.name.clone()));
        }
        *entries = attrs;
        tracing::info!(dir = %dir.name, count = entries.len(), "Attribute group created");
        Ok(())
    }

    fn remove_group(&self, dir: &AttrDir) {
        if let Some(entries) = self.dirs.write().get_mut(&dir.name) {
            entries.clear();
        }
    }
}

/// An open handle on a device. Tracks its own read position and calls
/// the device's `release` hook when dropped.
pub struct DeviceFile {
    ops: Arc<dyn DeviceOps>,
    pos: u64,
}

impl std::fmt::Debug for DeviceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceFile")
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

impl DeviceFile {
    fn open(ops: Arc<dyn DeviceOps>) -> Self {
        ops.open();
        Self { ops, pos: 0 }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn seek(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// Read up to `max_len` bytes at the current position and advance it.
    pub fn read(&mut self, max_len: usize) -> Result<Vec<u8>, CoreError> {
        let chunk = self.ops.read(self.pos, max_len)?;
        self.pos += chunk.len() as u64;
        Ok(chunk)
    }

    /// Read everything from the current position in a single device read.
    ///
    /// Devices render fresh content on every read, so splitting this into
    /// chunks could stitch together pieces of two different renderings.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, CoreError> {
        self.read(usize::MAX)
    }

    pub fn write(&mut self, payload: &[u8]) -> Result<usize, CoreError> {
        self.ops.write(payload)
    }
}

impl Drop for DeviceFile {
    fn drop(&mut self) {
        self.ops.release();
    }
}
