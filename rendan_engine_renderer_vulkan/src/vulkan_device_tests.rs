//! Unit tests for device selection policies (no GPU required)

use super::*;

fn family(flags: vk::QueueFlags, count: u32) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: flags,
        queue_count: count,
        ..Default::default()
    }
}

// ============================================================================
// QUEUE FAMILIES
// ============================================================================

#[test]
fn test_prefers_family_with_graphics_and_present() {
    let families = [
        family(vk::QueueFlags::GRAPHICS, 1),
        family(vk::QueueFlags::TRANSFER, 1),
        family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, 1),
    ];
    // Family 0 cannot present, family 1 can but has no graphics
    let indices = find_queue_families(&families, |i| i >= 1);
    assert_eq!(indices.graphics, Some(2));
    assert_eq!(indices.present, Some(2));
}

#[test]
fn test_separate_graphics_and_present_families() {
    let families = [family(vk::QueueFlags::GRAPHICS, 1), family(vk::QueueFlags::TRANSFER, 1)];
    let indices = find_queue_families(&families, |i| i == 1);
    assert_eq!(indices.graphics, Some(0));
    assert_eq!(indices.present, Some(1));
    assert!(indices.is_complete());
}

#[test]
fn test_no_present_support_is_incomplete() {
    let families = [family(vk::QueueFlags::GRAPHICS, 1)];
    let indices = find_queue_families(&families, |_| false);
    assert_eq!(indices.graphics, Some(0));
    assert_eq!(indices.present, None);
    assert!(!indices.is_complete());
}

#[test]
fn test_empty_family_is_not_graphics() {
    let families = [family(vk::QueueFlags::GRAPHICS, 0)];
    let indices = find_queue_families(&families, |_| true);
    assert_eq!(indices.graphics, None);
    assert_eq!(indices.present, Some(0));
}

#[test]
fn test_unique_queue_families() {
    assert_eq!(unique_queue_families(0, 0), vec![0]);
    assert_eq!(unique_queue_families(0, 2), vec![0, 2]);
}

// ============================================================================
// DEPTH FORMATS
// ============================================================================

fn depth_props(supported: &[vk::Format]) -> impl Fn(vk::Format) -> vk::FormatProperties + '_ {
    move |format| vk::FormatProperties {
        optimal_tiling_features: if supported.contains(&format) {
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT | vk::FormatFeatureFlags::SAMPLED_IMAGE
        } else {
            vk::FormatFeatureFlags::empty()
        },
        ..Default::default()
    }
}

#[test]
fn test_depth_format_follows_preference_order() {
    let features = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
    let all = DEPTH_FORMAT_CANDIDATES;
    assert_eq!(
        select_supported_format(&DEPTH_FORMAT_CANDIDATES, features, depth_props(&all)),
        Some(vk::Format::D32_SFLOAT)
    );

    let no_d32 = [vk::Format::D24_UNORM_S8_UINT, vk::Format::D32_SFLOAT_S8_UINT];
    assert_eq!(
        select_supported_format(&DEPTH_FORMAT_CANDIDATES, features, depth_props(&no_d32)),
        Some(vk::Format::D32_SFLOAT_S8_UINT)
    );
}

#[test]
fn test_depth_format_none_supported() {
    let features = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
    assert_eq!(
        select_supported_format(&DEPTH_FORMAT_CANDIDATES, features, depth_props(&[])),
        None
    );
}
