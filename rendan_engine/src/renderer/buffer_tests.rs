//! Unit tests for buffer.rs

use crate::error::Error;
use crate::renderer::buffer::*;

#[test]
fn test_uniform_desc() {
    let desc = BufferDesc::uniform("camera[0]", 64);
    assert_eq!(desc.label, "camera[0]");
    assert_eq!(desc.size, 64);
    assert_eq!(desc.usage, BufferUsage::UNIFORM);
    assert_eq!(desc.residency, MemoryResidency::CpuToGpu);
}

#[test]
fn test_usage_flags_combine() {
    let usage = BufferUsage::VERTEX | BufferUsage::TRANSFER_DST;
    assert!(usage.contains(BufferUsage::VERTEX));
    assert!(!usage.contains(BufferUsage::INDEX));
}

#[test]
fn test_write_range_inside() {
    assert!(check_write_range("b", 64, 0, 64).is_ok());
    assert!(check_write_range("b", 64, 60, 4).is_ok());
    assert!(check_write_range("b", 64, 64, 0).is_ok());
}

#[test]
fn test_write_range_overflow_rejected() {
    assert!(matches!(check_write_range("b", 64, 1, 64), Err(Error::InvalidResource(_))));
    assert!(check_write_range("b", 64, u64::MAX, 1).is_err());
}
