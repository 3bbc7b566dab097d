/// Buffer trait and buffer descriptor

use bitflags::bitflags;
use crate::error::Result;

bitflags! {
    /// Buffer usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const UNIFORM = 1 << 2;
        const TRANSFER_SRC = 1 << 3;
        const TRANSFER_DST = 1 << 4;
    }
}

/// Where the allocation should live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryResidency {
    /// Host visible, written directly by the CPU (uniforms, small meshes)
    CpuToGpu,
    /// Device local, filled through a staging copy
    GpuOnly,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    /// Debug name, also used as allocation name
    pub label: String,
    /// Size in bytes
    pub size: u64,
    pub usage: BufferUsage,
    pub residency: MemoryResidency,
}

impl BufferDesc {
    pub fn uniform(label: impl Into<String>, size: u64) -> Self {
        Self {
            label: label.into(),
            size,
            usage: BufferUsage::UNIFORM,
            residency: MemoryResidency::CpuToGpu,
        }
    }
}

/// GPU buffer resource
///
/// Implemented by backend buffers. The buffer is destroyed when dropped.
pub trait GpuBuffer {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Map, copy `data` at `offset`, unmap
    ///
    /// Writing past the end of the buffer is an `InvalidResource` error.
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;
}

/// Range check shared by backend `write` implementations
pub fn check_write_range(label: &str, size: u64, offset: u64, len: usize) -> Result<()> {
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= size => Ok(()),
        _ => Err(crate::engine_err!(
            InvalidResource,
            "rendan::Buffer",
            "Write of {} bytes at offset {} exceeds buffer '{}' size {}",
            len,
            offset,
            label,
            size
        )),
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
