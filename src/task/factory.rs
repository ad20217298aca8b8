//! Task Factory
//!
//! Maps numeric wire tags to constructors producing empty task instances,
//! mirroring the handler-registry idiom used elsewhere in the cluster: the
//! deserializer resolves the tag first, then lets the fresh instance read its
//! own fields.

use bytes::Bytes;
use dashmap::DashMap;

use super::contract::RemoteTask;
use super::wire::{TaskReader, TaskWriter};
use crate::error::{CoordinationError, Result};
use crate::lock::task::DistributedLockTask;

/// Constructor producing an empty, not-yet-populated task instance.
pub type TaskConstructor = fn() -> Box<dyn RemoteTask>;

/// Registry resolving wire type tags back to task variants.
pub struct TaskFactory {
    constructors: DashMap<u8, TaskConstructor>,
}

impl TaskFactory {
    /// Creates a factory with the built-in task variants registered.
    pub fn new() -> Self {
        let factory = Self {
            constructors: DashMap::new(),
        };
        factory.register(DistributedLockTask::FACTORY_ID, || {
            Box::new(DistributedLockTask::empty())
        });
        factory
    }

    /// Registers a constructor for `tag`, replacing any previous one.
    pub fn register(&self, tag: u8, constructor: TaskConstructor) {
        self.constructors.insert(tag, constructor);
        tracing::debug!(tag, "Registered task constructor");
    }

    /// Resolves `tag` to an empty instance of the matching variant.
    pub fn resolve(&self, tag: u8) -> Result<Box<dyn RemoteTask>> {
        self.constructors
            .get(&tag)
            .map(|constructor| constructor.value()())
            .ok_or(CoordinationError::UnknownTaskType(tag))
    }

    pub fn is_registered(&self, tag: u8) -> bool {
        self.constructors.contains_key(&tag)
    }
}

impl Default for TaskFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a task as its wire form: type tag first, then the variant fields.
pub fn encode_task(task: &dyn RemoteTask) -> Result<Bytes> {
    let mut writer = TaskWriter::new();
    writer.write_u8(task.factory_id());
    task.write_to(&mut writer)?;
    Ok(writer.finish())
}

/// Decodes a task: resolves the leading tag through `factory`, then lets the
/// empty instance populate itself from the remaining fields.
pub fn decode_task(buf: Bytes, factory: &TaskFactory) -> Result<Box<dyn RemoteTask>> {
    let mut reader = TaskReader::new(buf);
    let tag = reader.read_u8()?;
    let mut task = factory.resolve(tag)?;
    task.read_from(&mut reader, factory)?;
    Ok(task)
}

