/// Swap image chain trait and the backend-independent negotiation rules

use crate::renderer::Extent2D;

/// Presentable image chain
///
/// Implemented by backend swapchains. The chain is recreated in place, so the
/// values below may change after `GraphicsBackend::recreate_swapchain`.
pub trait SwapImageChain {
    /// Number of presentable images (always non-zero)
    fn image_count(&self) -> usize;

    /// Current image extent
    fn extent(&self) -> Extent2D;
}

/// Number of swap images to request
///
/// One more than the surface minimum, clamped to the surface maximum when the
/// surface reports one (`max_image_count == 0` means unbounded).
pub fn swap_image_count(min_image_count: u32, max_image_count: u32) -> u32 {
    let desired = min_image_count.saturating_add(1).max(min_image_count);
    if max_image_count > 0 && desired > max_image_count {
        max_image_count
    } else {
        desired
    }
}

/// Clamp a window framebuffer size component-wise into the surface limits
pub fn clamp_extent(window: Extent2D, min: Extent2D, max: Extent2D) -> Extent2D {
    Extent2D {
        width: window.width.clamp(min.width, max.width.max(min.width)),
        height: window.height.clamp(min.height, max.height.max(min.height)),
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
