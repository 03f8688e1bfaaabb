//! GPU buffer management.
//!
//! Wraps a VkBuffer together with its backing device memory. Memory types
//! are selected directly from the adapter's memory properties: the first
//! type whose bit is set in the requirement mask and whose property flags
//! cover the request wins. Device-local uploads go through an ephemeral
//! host-visible staging buffer and a one-shot transfer submission.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::command::CommandPool;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Selects a memory type index for the given requirements.
///
/// Returns the first type `i` with bit `i` set in `type_filter` whose
/// property flags contain all of `properties`, or `None` when nothing
/// matches.
pub fn find_memory_type(
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
) -> Option<u32> {
    memory_properties
        .memory_types
        .iter()
        .take(memory_properties.memory_type_count as usize)
        .enumerate()
        .find(|(i, memory_type)| {
            type_filter & (1 << i) != 0 && memory_type.property_flags.contains(properties)
        })
        .map(|(i, _)| i as u32)
}

/// GPU buffer with its backing memory allocation.
///
/// Buffer and memory handles are created together and destroyed together;
/// a failure after buffer creation destroys the buffer before the error
/// is returned, so the pair is never left half-built.
pub struct Buffer {
    device: Arc<Device>,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    /// Allocated size after alignment; may exceed the requested size.
    size: vk::DeviceSize,
    host_visible: bool,
}

impl Buffer {
    /// Creates a buffer of `size` bytes and binds fresh device memory.
    ///
    /// The sharing mode comes from the device's queue family layout so the
    /// buffer is usable from both the graphics and transfer queues.
    ///
    /// # Errors
    ///
    /// Rejects zero sizes. Returns [`RhiError::NoSuitableMemoryType`] when
    /// no memory type satisfies `properties`, after destroying the buffer
    /// handle created so far.
    pub fn new(
        device: Arc<Device>,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::InvalidHandle(
                "Buffer size must be greater than 0".to_string(),
            ));
        }

        let sharing = device.sharing();
        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(sharing.mode)
            .queue_family_indices(&sharing.queue_family_indices);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let Some(memory_type_index) = find_memory_type(
            requirements.memory_type_bits,
            properties,
            device.memory_properties(),
        ) else {
            // No leak on the failure path
            unsafe { device.handle().destroy_buffer(buffer, None) };
            return Err(RhiError::NoSuitableMemoryType {
                type_filter: requirements.memory_type_bits,
                properties,
            });
        };

        let alloc_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        let memory = match unsafe { device.handle().allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.handle().destroy_buffer(buffer, None) };
                return Err(e.into());
            }
        };

        if let Err(e) = unsafe { device.handle().bind_buffer_memory(buffer, memory, 0) } {
            unsafe {
                device.handle().free_memory(memory, None);
                device.handle().destroy_buffer(buffer, None);
            }
            return Err(e.into());
        }

        let host_visible = properties.contains(vk::MemoryPropertyFlags::HOST_VISIBLE);

        debug!(
            "Created buffer: {} bytes requested, {} allocated (type {})",
            size, requirements.size, memory_type_index
        );

        Ok(Self {
            device,
            buffer,
            memory,
            size: requirements.size,
            host_visible,
        })
    }

    /// Creates a device-local buffer and uploads `data` through a staging
    /// buffer.
    ///
    /// The staging buffer and the one-shot transfer command buffer live
    /// only for the duration of the call; the transfer queue is drained
    /// before either is released.
    ///
    /// # Errors
    ///
    /// Returns an error if any allocation, the write, or the transfer
    /// submission fails.
    pub fn new_device_local_with_data(
        device: Arc<Device>,
        transfer_pool: &CommandPool,
        data: &[u8],
        usage: vk::BufferUsageFlags,
    ) -> RhiResult<Self> {
        let size = data.len() as vk::DeviceSize;

        let staging = Self::new(
            device.clone(),
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        staging.write(0, data)?;

        let buffer = Self::new(
            device.clone(),
            size,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        transfer_pool.one_time_submit(device.transfer_queue(), |cmd| {
            cmd.copy_buffer(staging.handle(), buffer.handle(), size);
            Ok(())
        })?;

        debug!("Uploaded {} bytes via staging buffer", size);

        Ok(buffer)
    }

    /// Writes `data` into the buffer at `offset` via a map/copy/unmap.
    ///
    /// # Errors
    ///
    /// Returns an error when the memory is not host-visible or the write
    /// would run past the end of the allocation.
    pub fn write(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        if !self.host_visible {
            return Err(RhiError::InvalidHandle(
                "Buffer memory is not host-visible".to_string(),
            ));
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::InvalidHandle(format!(
                "Write exceeds buffer size: offset {} + data {} > buffer {}",
                offset,
                data.len(),
                self.size
            )));
        }

        unsafe {
            let mapped = self.device.handle().map_memory(
                self.memory,
                offset,
                data.len() as vk::DeviceSize,
                vk::MemoryMapFlags::empty(),
            )?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped as *mut u8, data.len());
            self.device.handle().unmap_memory(self.memory);
        }

        Ok(())
    }

    /// Returns the Vulkan buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the allocated size in bytes.
    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Whether the backing memory can be mapped by the host.
    #[inline]
    pub fn is_host_visible(&self) -> bool {
        self.host_visible
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
            self.device.handle().free_memory(self.memory, None);
        }
        debug!("Destroyed buffer ({} bytes)", self.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_properties(
        types: &[(u32, vk::MemoryPropertyFlags)],
    ) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: types.len() as u32,
            ..Default::default()
        };
        for (i, (heap_index, flags)) in types.iter().enumerate() {
            props.memory_types[i] = vk::MemoryType {
                property_flags: *flags,
                heap_index: *heap_index,
            };
        }
        props
    }

    #[test]
    fn test_find_memory_type_first_match_wins() {
        let props = memory_properties(&[
            (0, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            (
                1,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            ),
            (
                1,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            ),
        ]);

        let index = find_memory_type(
            0b111,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            &props,
        );
        assert_eq!(index, Some(1));
    }

    #[test]
    fn test_find_memory_type_respects_type_filter() {
        let props = memory_properties(&[
            (0, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            (0, vk::MemoryPropertyFlags::DEVICE_LOCAL),
        ]);

        // Type 0 is excluded by the filter even though its flags match
        let index = find_memory_type(0b10, vk::MemoryPropertyFlags::DEVICE_LOCAL, &props);
        assert_eq!(index, Some(1));
    }

    #[test]
    fn test_find_memory_type_requires_all_properties() {
        let props = memory_properties(&[(0, vk::MemoryPropertyFlags::HOST_VISIBLE)]);

        let index = find_memory_type(
            0b1,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            &props,
        );
        assert_eq!(index, None);
    }

    #[test]
    fn test_find_memory_type_ignores_types_past_count() {
        let mut props = memory_properties(&[(0, vk::MemoryPropertyFlags::DEVICE_LOCAL)]);
        // A stale entry beyond memory_type_count must not be considered
        props.memory_types[1] = vk::MemoryType {
            property_flags: vk::MemoryPropertyFlags::HOST_VISIBLE,
            heap_index: 0,
        };

        let index = find_memory_type(0b11, vk::MemoryPropertyFlags::HOST_VISIBLE, &props);
        assert_eq!(index, None);
    }
}
