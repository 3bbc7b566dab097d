/// VulkanContext - loader entry, instance and debug messenger
///
/// Created first and destroyed last. Every requested layer and extension is
/// checked against what the loader reports before the instance is created, so a
/// missing one is reported by name instead of as a bare `ERROR_LAYER_NOT_PRESENT`.

use ash::vk;
use raw_window_handle::HasDisplayHandle;
use rendan_engine::rendan::{RendererConfig, Result};
use rendan_engine::{engine_bail, engine_debug, engine_err, engine_info, engine_warn};
use std::ffi::{CStr, CString};
use winit::window::Window;

/// Names from `required` that are absent from `available`, in request order
pub fn missing_names<'a>(required: &'a [String], available: &[String]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|name| !available.iter().any(|a| a == *name))
        .map(String::as_str)
        .collect()
}

/// Drop repeated names, keeping the first occurrence
pub fn unique_names(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

/// Whether validation layers are compiled in for this build
pub const VALIDATION_COMPILED_IN: bool = cfg!(feature = "vulkan-validation");

/// Vulkan instance and the objects that live exactly as long as it
pub struct VulkanContext {
    /// Loader entry (must outlive the instance)
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) surface_loader: ash::khr::surface::Instance,
    /// Debug utils loader and messenger (validation only)
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanContext {
    /// Create the instance for `window`
    ///
    /// Requested instance extensions are the window-system ones, the config's
    /// extra ones and, with validation, `VK_EXT_debug_utils`.
    pub fn new(window: &Window, config: &RendererConfig) -> Result<Self> {
        let validation = if config.enable_validation && !VALIDATION_COMPILED_IN {
            engine_warn!(
                "rendan::vulkan",
                "Validation requested but the vulkan-validation feature is disabled, continuing without layers"
            );
            false
        } else {
            config.enable_validation
        };

        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to load Vulkan library: {}", e))?;

            // ===== EXTENSIONS =====
            let display_handle = window
                .display_handle()
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to get display handle: {}", e))?;
            let window_extensions = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to get required extensions: {:?}", e))?;

            let mut requested: Vec<String> = window_extensions
                .iter()
                .map(|&ptr| CStr::from_ptr(ptr).to_string_lossy().into_owned())
                .collect();
            requested.extend(config.instance_extensions.iter().cloned());
            if validation {
                requested.push(ash::ext::debug_utils::NAME.to_string_lossy().into_owned());
            }
            let extensions = unique_names(requested);

            let available_extensions: Vec<String> = entry
                .enumerate_instance_extension_properties(None)
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to enumerate instance extensions: {:?}", e))?
                .iter()
                .filter_map(|p| p.extension_name_as_c_str().ok())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
            let missing = missing_names(&extensions, &available_extensions);
            if !missing.is_empty() {
                engine_bail!(
                    InitError,
                    "rendan::vulkan",
                    "Missing instance extension(s): {}",
                    missing.join(", ")
                );
            }

            // ===== LAYERS =====
            let layers: Vec<String> = if validation {
                config.validation_layers.clone()
            } else {
                Vec::new()
            };
            if !layers.is_empty() {
                let available_layers: Vec<String> = entry
                    .enumerate_instance_layer_properties()
                    .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to enumerate instance layers: {:?}", e))?
                    .iter()
                    .filter_map(|p| p.layer_name_as_c_str().ok())
                    .map(|name| name.to_string_lossy().into_owned())
                    .collect();
                let missing = missing_names(&layers, &available_layers);
                if !missing.is_empty() {
                    engine_bail!(
                        InitError,
                        "rendan::vulkan",
                        "Missing validation layer(s): {}",
                        missing.join(", ")
                    );
                }
            }

            let extension_names = to_c_strings(&extensions)?;
            let layer_names = to_c_strings(&layers)?;
            let extension_ptrs: Vec<*const std::os::raw::c_char> =
                extension_names.iter().map(|n| n.as_ptr()).collect();
            let layer_ptrs: Vec<*const std::os::raw::c_char> = layer_names.iter().map(|n| n.as_ptr()).collect();

            // ===== INSTANCE =====
            let app_name = to_c_string(&config.app_name)?;
            let engine_name = to_c_string(&config.engine_name)?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(&engine_name)
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let mut debug_info = debug_messenger_info(config);
            let mut create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_ptrs)
                .enabled_extension_names(&extension_ptrs);
            if validation {
                // Also covers vkCreateInstance / vkDestroyInstance
                create_info = create_info.push_next(&mut debug_info);
            }

            if validation {
                crate::debug::init_debug_config(config.debug.clone());
            }

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                crate::debug::cleanup_debug_config();
                engine_err!(InitError, "rendan::vulkan", "Failed to create Vulkan instance: {:?}", e)
            })?;

            // ===== DEBUG MESSENGER =====
            let debug_messenger = if validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                match debug_utils.create_debug_utils_messenger(&debug_messenger_info(config), None) {
                    Ok(messenger) => Some((debug_utils, messenger)),
                    Err(e) => {
                        crate::debug::cleanup_debug_config();
                        instance.destroy_instance(None);
                        engine_bail!(InitError, "rendan::vulkan", "Failed to create debug messenger: {:?}", e);
                    }
                }
            } else {
                None
            };

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            engine_info!(
                "rendan::vulkan",
                "Vulkan instance created ({} extension(s), {} layer(s))",
                extensions.len(),
                layers.len()
            );
            engine_debug!("rendan::vulkan", "Instance extensions: {}", extensions.join(", "));

            Ok(Self {
                entry,
                instance,
                surface_loader,
                debug_messenger,
            })
        }
    }

    pub fn validation_enabled(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

fn debug_messenger_info(config: &RendererConfig) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(crate::debug::severity_flags(config.debug.severity))
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback))
}

fn to_c_string(value: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| engine_err!(InitError, "rendan::vulkan", "Name '{}' contains a NUL byte", value))
}

pub(crate) fn to_c_strings(values: &[String]) -> Result<Vec<CString>> {
    values.iter().map(|v| to_c_string(v)).collect()
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            // Stop the callback before the messenger goes away
            crate::debug::cleanup_debug_config();

            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_context_tests.rs"]
mod tests;
