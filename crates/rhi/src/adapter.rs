//! Physical device (GPU) selection.
//!
//! Enumerates the available GPUs and picks the first one that can actually
//! drive the engine: a graphics queue family, a present-capable family for
//! the target surface, the swapchain device extension, and at least one
//! supported surface format and present mode. Suitability checks are plain
//! functions over queried data so they can be exercised without a GPU.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;

/// Device extensions every selected adapter must support.
pub const DEVICE_EXTENSIONS: [&CStr; 1] = [ash::khr::swapchain::NAME];

/// Queue family indices resolved for a candidate adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueueFamilies {
    /// Family supporting graphics operations.
    pub graphics: Option<u32>,
    /// Family able to present to the target surface.
    pub present: Option<u32>,
    /// Family used for transfer submissions. Prefers a family without
    /// graphics support, falls back to the graphics family.
    pub transfer: Option<u32>,
}

impl QueueFamilies {
    /// Whether the minimum required families were found.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// Unique family indices, for logical-device queue creation.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(3);

        if let Some(graphics) = self.graphics {
            families.push(graphics);
        }
        if let Some(present) = self.present
            && !families.contains(&present)
        {
            families.push(present);
        }
        if let Some(transfer) = self.transfer
            && !families.contains(&transfer)
        {
            families.push(transfer);
        }

        families
    }

    /// Whether transfer submissions go to a family other than graphics.
    #[inline]
    pub fn has_dedicated_transfer(&self) -> bool {
        self.transfer.is_some() && self.transfer != self.graphics
    }
}

/// Everything the rest of the engine needs to know about the selected GPU.
#[derive(Clone)]
pub struct AdapterInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version).
    pub properties: vk::PhysicalDeviceProperties,
    /// Supported device features.
    pub features: vk::PhysicalDeviceFeatures,
    /// Memory properties used for buffer memory-type selection.
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Resolved queue family indices.
    pub queue_families: QueueFamilies,
}

impl AdapterInfo {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Device")
        }
    }

    /// Returns the Vulkan API version supported by the device.
    pub fn api_version(&self) -> (u32, u32, u32) {
        let version = self.properties.api_version;
        (
            vk::api_version_major(version),
            vk::api_version_minor(version),
            vk::api_version_patch(version),
        )
    }
}

impl std::fmt::Debug for AdapterInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (major, minor, patch) = self.api_version();
        f.debug_struct("AdapterInfo")
            .field("name", &self.device_name())
            .field("api_version", &format!("{}.{}.{}", major, minor, patch))
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

/// Selects the first adapter satisfying all engine requirements.
///
/// Adapters are considered in enumeration order; the first suitable one
/// wins. Requirements: graphics and present queue families, the swapchain
/// device extension, and a non-empty surface format and present mode list.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no adapter qualifies.
pub fn select_adapter(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<AdapterInfo, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    for device in devices {
        if let Some(info) = probe_adapter(instance, device, surface, surface_loader) {
            let (major, minor, patch) = info.api_version();
            info!(
                "Selected GPU: '{}' (Vulkan {}.{}.{})",
                info.device_name(),
                major,
                minor,
                patch
            );
            return Ok(info);
        }
    }

    warn!("No GPU meets the engine's requirements");
    Err(RhiError::NoSuitableGpu)
}

/// Why a candidate adapter was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unsuitability {
    /// No graphics family or no family that can present to the surface.
    MissingQueueFamilies,
    /// A required device extension is not supported.
    MissingExtensions,
    /// The surface lists no formats or no present modes.
    NoSurfaceSupport,
}

/// The suitability predicate, over already-queried adapter data.
///
/// Both [`probe_adapter`] and the selection tests go through this, so
/// the tested policy is the shipped policy.
fn check_adapter(
    queue_families: &QueueFamilies,
    available_extensions: &[&CStr],
    format_count: usize,
    present_mode_count: usize,
) -> Result<(), Unsuitability> {
    if !queue_families.is_complete() {
        return Err(Unsuitability::MissingQueueFamilies);
    }
    if !supports_required_extensions(available_extensions) {
        return Err(Unsuitability::MissingExtensions);
    }
    if format_count == 0 || present_mode_count == 0 {
        return Err(Unsuitability::NoSurfaceSupport);
    }
    Ok(())
}

/// Checks one adapter against all requirements.
///
/// Returns `None` when any requirement is missing, logging the reason.
fn probe_adapter(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Option<AdapterInfo> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let features = unsafe { instance.get_physical_device_features(device) };
    let memory_properties = unsafe { instance.get_physical_device_memory_properties(device) };

    let device_name = unsafe {
        CStr::from_ptr(properties.device_name.as_ptr())
            .to_str()
            .unwrap_or("Unknown")
    };

    let family_props = unsafe { instance.get_physical_device_queue_family_properties(device) };
    let queue_families = pick_queue_families(&family_props, |i| unsafe {
        surface_loader
            .get_physical_device_surface_support(device, i, surface)
            .unwrap_or(false)
    });

    let available_extensions =
        unsafe { instance.enumerate_device_extension_properties(device).ok()? };
    let available_names: Vec<&CStr> = available_extensions
        .iter()
        .map(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) })
        .collect();

    let formats = unsafe {
        surface_loader
            .get_physical_device_surface_formats(device, surface)
            .ok()?
    };
    let present_modes = unsafe {
        surface_loader
            .get_physical_device_surface_present_modes(device, surface)
            .ok()?
    };

    if let Err(reason) = check_adapter(
        &queue_families,
        &available_names,
        formats.len(),
        present_modes.len(),
    ) {
        debug!("GPU '{}' skipped: {:?}", device_name, reason);
        return None;
    }

    Some(AdapterInfo {
        device,
        properties,
        features,
        memory_properties,
        queue_families,
    })
}

/// Resolves queue family indices from the family property list.
///
/// `supports_present` answers whether a family can present to the target
/// surface. Transfer picks a TRANSFER family without GRAPHICS when one
/// exists, otherwise it reuses the graphics family.
pub fn pick_queue_families(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: impl FnMut(u32) -> bool,
) -> QueueFamilies {
    let mut indices = QueueFamilies::default();
    let mut dedicated_transfer: Option<u32> = None;

    for (i, family) in families.iter().enumerate() {
        let i = i as u32;

        if family.queue_count == 0 {
            continue;
        }

        let has_graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
        let has_transfer = family.queue_flags.contains(vk::QueueFlags::TRANSFER);

        if has_graphics && indices.graphics.is_none() {
            indices.graphics = Some(i);
        }

        if has_transfer && !has_graphics && dedicated_transfer.is_none() {
            dedicated_transfer = Some(i);
        }

        if indices.present.is_none() && supports_present(i) {
            indices.present = Some(i);
        }
    }

    indices.transfer = dedicated_transfer.or(indices.graphics);

    indices
}

/// Whether every entry of [`DEVICE_EXTENSIONS`] appears in `available`.
pub fn supports_required_extensions(available: &[&CStr]) -> bool {
    DEVICE_EXTENSIONS
        .iter()
        .all(|required| available.contains(required))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, count: u32) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_queue_families_default_incomplete() {
        let families = QueueFamilies::default();
        assert!(families.graphics.is_none());
        assert!(families.present.is_none());
        assert!(families.transfer.is_none());
        assert!(!families.is_complete());
    }

    #[test]
    fn test_queue_families_complete() {
        let families = QueueFamilies {
            graphics: Some(0),
            present: Some(0),
            transfer: Some(0),
        };
        assert!(families.is_complete());
        assert!(!families.has_dedicated_transfer());
    }

    #[test]
    fn test_unique_families_with_duplicates() {
        let families = QueueFamilies {
            graphics: Some(0),
            present: Some(0),
            transfer: Some(1),
        };
        let unique = families.unique_families();
        assert_eq!(unique, vec![0, 1]);
    }

    #[test]
    fn test_unique_families_all_same() {
        let families = QueueFamilies {
            graphics: Some(0),
            present: Some(0),
            transfer: Some(0),
        };
        assert_eq!(families.unique_families(), vec![0]);
    }

    #[test]
    fn test_pick_prefers_dedicated_transfer() {
        let props = vec![
            family(
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
                4,
            ),
            family(vk::QueueFlags::TRANSFER, 1),
        ];
        let families = pick_queue_families(&props, |_| true);
        assert_eq!(families.graphics, Some(0));
        assert_eq!(families.present, Some(0));
        assert_eq!(families.transfer, Some(1));
        assert!(families.has_dedicated_transfer());
    }

    #[test]
    fn test_pick_transfer_falls_back_to_graphics() {
        let props = vec![family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
            2,
        )];
        let families = pick_queue_families(&props, |_| true);
        assert_eq!(families.graphics, Some(0));
        assert_eq!(families.transfer, Some(0));
        assert!(!families.has_dedicated_transfer());
    }

    #[test]
    fn test_pick_skips_empty_families() {
        let props = vec![
            family(vk::QueueFlags::GRAPHICS, 0),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, 1),
        ];
        let families = pick_queue_families(&props, |_| true);
        assert_eq!(families.graphics, Some(1));
    }

    #[test]
    fn test_pick_present_on_separate_family() {
        let props = vec![
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, 1),
            family(vk::QueueFlags::COMPUTE, 1),
        ];
        // Only the second family can present
        let families = pick_queue_families(&props, |i| i == 1);
        assert_eq!(families.graphics, Some(0));
        assert_eq!(families.present, Some(1));
        assert!(families.is_complete());
    }

    #[test]
    fn test_first_adapter_without_present_is_skipped() {
        // Two fabricated adapters: the first has no present-capable family,
        // the second satisfies everything. Selection must land on the second.
        let extensions: Vec<&CStr> = vec![ash::khr::swapchain::NAME];
        let adapters: Vec<(Vec<vk::QueueFamilyProperties>, fn(u32) -> bool)> = vec![
            (vec![family(vk::QueueFlags::GRAPHICS, 1)], |_| false),
            (vec![family(vk::QueueFlags::GRAPHICS, 1)], |_| true),
        ];

        let results: Vec<_> = adapters
            .iter()
            .map(|(props, present)| {
                let families = pick_queue_families(props, present);
                check_adapter(&families, &extensions, 1, 1)
            })
            .collect();

        assert_eq!(results[0], Err(Unsuitability::MissingQueueFamilies));
        assert_eq!(results[1], Ok(()));

        // First-suitable-wins, as in select_adapter's enumeration loop
        let selected = results.iter().position(|r| r.is_ok());
        assert_eq!(selected, Some(1));
    }

    #[test]
    fn test_check_adapter_rejection_reasons() {
        let complete = QueueFamilies {
            graphics: Some(0),
            present: Some(0),
            transfer: Some(0),
        };
        let extensions: Vec<&CStr> = vec![ash::khr::swapchain::NAME];

        assert_eq!(check_adapter(&complete, &extensions, 1, 1), Ok(()));
        assert_eq!(
            check_adapter(&complete, &[], 1, 1),
            Err(Unsuitability::MissingExtensions)
        );
        assert_eq!(
            check_adapter(&complete, &extensions, 0, 1),
            Err(Unsuitability::NoSurfaceSupport)
        );
        assert_eq!(
            check_adapter(&complete, &extensions, 1, 0),
            Err(Unsuitability::NoSurfaceSupport)
        );
    }

    #[test]
    fn test_required_extensions_check() {
        let with_swapchain: Vec<&CStr> = vec![c"VK_KHR_maintenance1", ash::khr::swapchain::NAME];
        assert!(supports_required_extensions(&with_swapchain));

        let without: Vec<&CStr> = vec![c"VK_KHR_maintenance1"];
        assert!(!supports_required_extensions(&without));
    }
}
