//! Vulkan logical device and queue management.
//!
//! The [`Device`] struct wraps the logical device together with the queues
//! the engine submits to. It is shared as `Arc<Device>` into every resource
//! wrapper so cleanup calls always have the device at hand.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::adapter::{AdapterInfo, QueueFamilies, DEVICE_EXTENSIONS};
use crate::error::RhiError;
use crate::instance::Instance;

/// Buffer sharing configuration derived from the queue family layout.
///
/// EXCLUSIVE when graphics and transfer share a family, CONCURRENT over
/// both family indices otherwise.
#[derive(Clone, Debug)]
pub struct SharingInfo {
    pub mode: vk::SharingMode,
    pub queue_family_indices: Vec<u32>,
}

impl SharingInfo {
    fn from_families(families: &QueueFamilies) -> Self {
        match (families.graphics, families.transfer) {
            (Some(graphics), Some(transfer)) if graphics != transfer => Self {
                mode: vk::SharingMode::CONCURRENT,
                queue_family_indices: vec![graphics, transfer],
            },
            _ => Self {
                mode: vk::SharingMode::EXCLUSIVE,
                queue_family_indices: Vec::new(),
            },
        }
    }
}

/// Vulkan logical device wrapper.
///
/// Owns the device handle and the graphics, present, and transfer queues.
/// Dropping the wrapper waits for the device to go idle before destroying
/// it, so no dependent teardown may happen afterwards.
pub struct Device {
    /// Vulkan logical device handle.
    device: ash::Device,
    /// Physical device handle.
    physical_device: vk::PhysicalDevice,
    /// Memory properties, queried once for buffer memory-type selection.
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Graphics queue handle.
    graphics_queue: vk::Queue,
    /// Presentation queue handle.
    present_queue: vk::Queue,
    /// Transfer queue handle (may alias the graphics queue).
    transfer_queue: vk::Queue,
    /// Queue family indices.
    queue_families: QueueFamilies,
    /// Sharing mode for buffers visible to graphics and transfer.
    sharing: SharingInfo,
}

impl Device {
    /// Creates the logical device over the selected adapter.
    ///
    /// Enables the swapchain extension and creates one queue per unique
    /// queue family the adapter resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter is missing required families or if
    /// device creation fails.
    pub fn new(instance: &Instance, adapter: &AdapterInfo) -> Result<Arc<Self>, RhiError> {
        let queue_families = adapter.queue_families;
        let graphics_family = queue_families
            .graphics
            .ok_or(RhiError::NoSuitableGpu)?;
        let present_family = queue_families.present.ok_or(RhiError::NoSuitableGpu)?;
        let transfer_family = queue_families.transfer.unwrap_or(graphics_family);

        let unique_families = queue_families.unique_families();
        let queue_priorities = [1.0f32];

        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        debug!(
            "Creating {} queue(s) for families: {:?}",
            queue_create_infos.len(),
            unique_families
        );

        let features = vk::PhysicalDeviceFeatures::default();

        let extension_names: Vec<*const i8> =
            DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .handle()
                .create_device(adapter.device, &create_info, None)?
        };

        info!(
            "Logical device created with {} extension(s)",
            DEVICE_EXTENSIONS.len()
        );

        let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(present_family, 0) };
        let transfer_queue = unsafe { device.get_device_queue(transfer_family, 0) };
        debug!(
            "Queues retrieved (graphics={}, present={}, transfer={})",
            graphics_family, present_family, transfer_family
        );

        let sharing = SharingInfo::from_families(&queue_families);
        if sharing.mode == vk::SharingMode::CONCURRENT {
            debug!(
                "Buffers shared CONCURRENT across families {:?}",
                sharing.queue_family_indices
            );
        }

        Ok(Arc::new(Self {
            device,
            physical_device: adapter.device,
            memory_properties: adapter.memory_properties,
            graphics_queue,
            present_queue,
            transfer_queue,
            queue_families,
            sharing,
        }))
    }

    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Returns the adapter's memory properties.
    #[inline]
    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    /// Returns the presentation queue handle.
    #[inline]
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Returns the transfer queue handle.
    ///
    /// Aliases the graphics queue when the adapter has no dedicated
    /// transfer family.
    #[inline]
    pub fn transfer_queue(&self) -> vk::Queue {
        self.transfer_queue
    }

    /// Returns the queue family indices.
    #[inline]
    pub fn queue_families(&self) -> &QueueFamilies {
        &self.queue_families
    }

    /// Returns the buffer sharing configuration.
    #[inline]
    pub fn sharing(&self) -> &SharingInfo {
        &self.sharing
    }

    /// Blocks until all outstanding work on every queue has completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails.
    pub fn wait_idle(&self) -> Result<(), RhiError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Submits command buffers to the graphics queue.
    ///
    /// # Safety
    ///
    /// The caller must ensure the command buffers are recorded and any
    /// provided fence is unsignaled and not in use.
    pub unsafe fn submit_graphics(
        &self,
        submit_infos: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> Result<(), RhiError> {
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, submit_infos, fence)?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                tracing::error!("Failed to wait for device idle during drop: {:?}", e);
            }
            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// Safety: ash::Device is Send+Sync and the remaining fields are plain
// handles or immutable data.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_extensions_defined() {
        assert!(DEVICE_EXTENSIONS.contains(&ash::khr::swapchain::NAME));
    }

    #[test]
    fn test_sharing_exclusive_when_families_match() {
        let families = QueueFamilies {
            graphics: Some(0),
            present: Some(0),
            transfer: Some(0),
        };
        let sharing = SharingInfo::from_families(&families);
        assert_eq!(sharing.mode, vk::SharingMode::EXCLUSIVE);
        assert!(sharing.queue_family_indices.is_empty());
    }

    #[test]
    fn test_sharing_concurrent_when_transfer_differs() {
        let families = QueueFamilies {
            graphics: Some(0),
            present: Some(0),
            transfer: Some(2),
        };
        let sharing = SharingInfo::from_families(&families);
        assert_eq!(sharing.mode, vk::SharingMode::CONCURRENT);
        assert_eq!(sharing.queue_family_indices, vec![0, 2]);
    }

    #[test]
    fn test_device_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Device>();
    }
}
