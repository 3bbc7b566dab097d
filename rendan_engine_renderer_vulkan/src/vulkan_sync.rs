/// VulkanFrameSync - semaphores and fences for acquire -> render -> present
///
/// Image-available semaphores and fences exist once per frame in flight
/// ("slot"). Render-finished semaphores exist once per swap image and are only
/// signaled again after that image has been re-acquired. `images_in_flight`
/// remembers which slot fence last rendered each swap image, so an image
/// acquired out of order is never written by the CPU while an older frame still
/// reads it.

use ash::vk;
use rendan_engine::rendan::render::{AcquireResult, PresentResult};
use rendan_engine::rendan::Result;
use rendan_engine::{engine_bail, engine_debug, engine_err, engine_trace, engine_warn_err};
use std::sync::Arc;

use crate::vulkan_command_list::VulkanCommandBuffer;
use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_swapchain::VulkanSwapchain;

struct SlotSync {
    image_available: vk::Semaphore,
    in_flight: vk::Fence,
}

pub struct VulkanFrameSync {
    slots: Vec<SlotSync>,
    /// Signaled by the submit rendering swap image `i`, waited on by its present
    render_finished: Vec<vk::Semaphore>,
    /// Fence of the last frame that rendered each swap image (null when none)
    images_in_flight: Vec<vk::Fence>,
    device: Arc<DeviceShared>,
}

/// Map a present result to the engine's outcome
///
/// A lost exclusive full-screen mode is recoverable and reported as a
/// `TransientPresentError`; every other failure is a `RuntimeSubmitError`.
pub fn present_outcome(result: std::result::Result<bool, vk::Result>) -> Result<PresentResult> {
    match result {
        Ok(false) => Ok(PresentResult::Presented),
        Ok(true) => Ok(PresentResult::Suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
        Err(vk::Result::ERROR_FULL_SCREEN_EXCLUSIVE_MODE_LOST_EXT) => Err(engine_warn_err!(
            TransientPresentError,
            "rendan::vulkan",
            "Exclusive full-screen mode lost during present"
        )),
        Err(e) => Err(engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to present: {:?}", e)),
    }
}

/// Map an acquire result to the engine's outcome
pub fn acquire_outcome(result: std::result::Result<(u32, bool), vk::Result>) -> Result<AcquireResult> {
    match result {
        Ok((index, suboptimal)) => Ok(AcquireResult::Image {
            index: index as usize,
            suboptimal,
        }),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::OutOfDate),
        Err(e) => Err(engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to acquire swapchain image: {:?}", e)),
    }
}

impl VulkanFrameSync {
    pub fn new(device: &VulkanDevice, frames_in_flight: usize, image_count: usize) -> Result<Self> {
        let mut sync = Self {
            slots: Vec::with_capacity(frames_in_flight),
            render_finished: Vec::with_capacity(image_count),
            images_in_flight: Vec::new(),
            device: Arc::clone(&device.shared),
        };

        let raw = &device.shared.device;
        let semaphore_info = vk::SemaphoreCreateInfo::default();
        // Signaled so the first wait on each slot returns immediately
        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

        for _ in 0..frames_in_flight {
            unsafe {
                let image_available = raw
                    .create_semaphore(&semaphore_info, None)
                    .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create image-available semaphore: {:?}", e))?;
                let in_flight = match raw.create_fence(&fence_info, None) {
                    Ok(fence) => fence,
                    Err(e) => {
                        raw.destroy_semaphore(image_available, None);
                        engine_bail!(InitError, "rendan::vulkan", "Failed to create in-flight fence: {:?}", e);
                    }
                };
                sync.slots.push(SlotSync {
                    image_available,
                    in_flight,
                });
            }
        }
        sync.resize_images(image_count)?;

        engine_debug!(
            "rendan::vulkan",
            "Frame sync created for {} frame(s) in flight, {} swap image(s)",
            frames_in_flight,
            image_count
        );
        Ok(sync)
    }

    /// Match the render-finished semaphores to a new swap image count
    ///
    /// The device must be idle. Image fence tracking is reset because the
    /// indices refer to the new chain's images.
    pub fn resize_images(&mut self, image_count: usize) -> Result<()> {
        let raw = &self.device.device;
        unsafe {
            while self.render_finished.len() > image_count {
                if let Some(semaphore) = self.render_finished.pop() {
                    raw.destroy_semaphore(semaphore, None);
                }
            }
            while self.render_finished.len() < image_count {
                let semaphore = raw
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                    .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create render-finished semaphore: {:?}", e))?;
                self.render_finished.push(semaphore);
            }
        }
        self.images_in_flight.clear();
        Ok(())
    }

    fn render_finished(&self, image_index: usize) -> Result<vk::Semaphore> {
        self.render_finished.get(image_index).copied().ok_or_else(|| {
            engine_err!(
                InvalidResource,
                "rendan::vulkan",
                "No render-finished semaphore for swap image {} ({} images)",
                image_index,
                self.render_finished.len()
            )
        })
    }

    fn slot(&self, slot: usize) -> Result<&SlotSync> {
        self.slots.get(slot).ok_or_else(|| {
            engine_err!(
                InvalidResource,
                "rendan::vulkan",
                "Sync slot {} out of range ({} slots)",
                slot,
                self.slots.len()
            )
        })
    }

    /// Block until the last submission that used `slot` completed
    pub fn wait_for_frame(&self, slot: usize) -> Result<()> {
        let fence = self.slot(slot)?.in_flight;
        unsafe {
            self.device
                .device
                .wait_for_fences(&[fence], true, u64::MAX)
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to wait for frame fence: {:?}", e))
        }
    }

    pub fn acquire(&mut self, swapchain: &VulkanSwapchain, slot: usize) -> Result<AcquireResult> {
        let (image_available, slot_fence) = {
            let s = self.slot(slot)?;
            (s.image_available, s.in_flight)
        };

        let result = unsafe {
            self.device.swapchain_loader.acquire_next_image(
                swapchain.swapchain,
                u64::MAX,
                image_available,
                vk::Fence::null(),
            )
        };
        let outcome = acquire_outcome(result)?;

        if let AcquireResult::Image { index, .. } = outcome {
            if self.images_in_flight.len() <= index {
                self.images_in_flight.resize(index + 1, vk::Fence::null());
            }
            let previous = self.images_in_flight[index];
            if previous != vk::Fence::null() && previous != slot_fence {
                unsafe {
                    self.device
                        .device
                        .wait_for_fences(&[previous], true, u64::MAX)
                        .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to wait for image fence: {:?}", e))?;
                }
            }
            self.images_in_flight[index] = slot_fence;
            engine_trace!("rendan::vulkan", "Acquired swap image {} on slot {}", index, slot);
        }

        Ok(outcome)
    }

    pub fn submit(&self, slot: usize, image_index: usize, commands: &VulkanCommandBuffer) -> Result<()> {
        let s = self.slot(slot)?;
        let raw = &self.device.device;

        let wait_semaphores = [s.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.render_finished(image_index)?];
        let command_buffers = [commands.command_buffer];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            raw.reset_fences(&[s.in_flight])
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to reset frame fence: {:?}", e))?;
            raw.queue_submit(self.device.graphics_queue, &[submit_info], s.in_flight)
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to submit commands to GPU queue: {:?}", e))
        }
    }

    pub fn present(&self, swapchain: &VulkanSwapchain, image_index: usize) -> Result<PresentResult> {
        let wait_semaphores = [self.render_finished(image_index)?];
        let swapchains = [swapchain.swapchain];
        let image_indices = [image_index as u32];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe {
            self.device
                .swapchain_loader
                .queue_present(self.device.present_queue, &present_info)
        };
        present_outcome(result)
    }
}

impl Drop for VulkanFrameSync {
    fn drop(&mut self) {
        unsafe {
            let raw = &self.device.device;
            raw.device_wait_idle().ok();
            for slot in self.slots.drain(..) {
                raw.destroy_semaphore(slot.image_available, None);
                raw.destroy_fence(slot.in_flight, None);
            }
            for semaphore in self.render_finished.drain(..) {
                raw.destroy_semaphore(semaphore, None);
            }
        }
    }
}
