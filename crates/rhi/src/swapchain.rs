//! Swapchain management.
//!
//! The [`Swapchain`] owns the presentable image chain and everything built
//! per image: one [`SwapchainImage`] record per entry holding the image,
//! its view, and its framebuffer. Keeping the three in one record makes
//! the co-indexing invariant structural instead of a convention across
//! parallel arrays.
//!
//! Lifecycle: created after device and surface, destroyed and recreated
//! wholesale whenever the surface goes stale (resize, out-of-date). The
//! render pass survives recreation while the surface format is unchanged.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::RhiError;
use crate::instance::Instance;
use crate::render_pass::RenderPass;

/// Swapchain surface support details.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    /// Surface capabilities (image count bounds, extent bounds, transforms)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries support details for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> Result<Self, RhiError> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Swapchain support: {} formats, {} present modes, image count: {}-{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            if capabilities.max_image_count == 0 {
                "unlimited".to_string()
            } else {
                capabilities.max_image_count.to_string()
            }
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Whether at least one format and one present mode are available.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Per-image swapchain resources.
///
/// The image itself is owned by the presentation subsystem; the view and
/// framebuffer are engine-owned and destroyed on teardown.
pub struct SwapchainImage {
    /// Presentable image (not destroyed by the engine).
    pub image: vk::Image,
    /// 2D color view over the image.
    pub view: vk::ImageView,
    /// Framebuffer binding the view to the render pass.
    pub framebuffer: vk::Framebuffer,
}

/// Vulkan swapchain wrapper.
///
/// Not thread-safe; driven by the single render-loop thread.
pub struct Swapchain {
    device: Arc<Device>,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    /// One record per presentable image.
    images: Vec<SwapchainImage>,
    format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
}

impl Swapchain {
    /// Creates a new swapchain.
    ///
    /// Selects:
    /// - Format: B8G8R8A8_SRGB with SRGB_NONLINEAR when offered, else the
    ///   first listed format
    /// - Present mode: MAILBOX when offered, else FIFO
    /// - Extent: the surface's fixed current extent when it reports one,
    ///   otherwise the request clamped into the surface bounds
    /// - Image count: exactly the surface minimum (clamped by the maximum
    ///   when one is set)
    ///
    /// # Errors
    ///
    /// Returns an error if surface queries, swapchain creation, or
    /// per-image resource creation fail, or if the surface resolves to a
    /// zero-area extent (minimized window).
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
        render_pass: &RenderPass,
        width: u32,
        height: u32,
    ) -> Result<Self, RhiError> {
        Self::create_internal(
            instance,
            device,
            surface,
            surface_loader,
            render_pass,
            width,
            height,
            vk::SwapchainKHR::null(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn create_internal(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
        render_pass: &RenderPass,
        width: u32,
        height: u32,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<Self, RhiError> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());

        let support =
            SwapchainSupportDetails::query(device.physical_device(), surface, surface_loader)?;

        if !support.is_adequate() {
            return Err(RhiError::SwapchainError(
                "Inadequate swapchain support (no formats or present modes)".to_string(),
            ));
        }

        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, width, height);
        ensure_valid_extent(extent)?;
        let image_count = determine_image_count(&support.capabilities);

        info!(
            "Creating swapchain: {}x{}, format {:?}, present mode {:?}, {} images",
            extent.width, extent.height, surface_format.format, present_mode, image_count
        );

        // Graphics and present queues may live in different families
        let queue_families = device.queue_families();
        let graphics_family = queue_families.graphics.ok_or(RhiError::NoSuitableGpu)?;
        let present_family = queue_families.present.ok_or(RhiError::NoSuitableGpu)?;
        let queue_family_indices = [graphics_family, present_family];

        let (sharing_mode, queue_family_indices_slice) = if graphics_family != present_family {
            debug!(
                "CONCURRENT sharing between graphics ({}) and present ({}) families",
                graphics_family, present_family
            );
            (vk::SharingMode::CONCURRENT, queue_family_indices.as_slice())
        } else {
            (vk::SharingMode::EXCLUSIVE, &[][..])
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(queue_family_indices_slice)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

        let raw_images = match unsafe { swapchain_loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(e.into());
            }
        };
        info!("Swapchain created with {} images", raw_images.len());

        let images = match build_image_resources(
            &device,
            &raw_images,
            surface_format.format,
            render_pass.handle(),
            extent,
        ) {
            Ok(images) => images,
            Err(e) => {
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(e);
            }
        };

        Ok(Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            format: surface_format.format,
            color_space: surface_format.color_space,
            extent,
            present_mode,
        })
    }

    /// Recreates the swapchain for a new window size.
    ///
    /// Call after a resize request or when acquire/present reported the
    /// surface out of date or suboptimal. The device is waited idle first
    /// so no in-flight command buffer still references the old images.
    ///
    /// # Errors
    ///
    /// Returns an error if recreation fails; the swapchain is left in a
    /// destroyed state in that case and must not be used.
    pub fn recreate(
        &mut self,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
        render_pass: &RenderPass,
        width: u32,
        height: u32,
    ) -> Result<(), RhiError> {
        self.device.wait_idle()?;

        info!("Recreating swapchain for new size: {}x{}", width, height);

        self.destroy_image_resources();

        // Chain the retired handle so the driver can reuse its resources
        let old_swapchain = self.swapchain;
        let mut new_swapchain = Self::create_internal(
            instance,
            self.device.clone(),
            surface,
            surface_loader,
            render_pass,
            width,
            height,
            old_swapchain,
        )?;

        unsafe {
            self.swapchain_loader.destroy_swapchain(old_swapchain, None);
        }

        self.swapchain = new_swapchain.swapchain;
        self.images = std::mem::take(&mut new_swapchain.images);
        self.format = new_swapchain.format;
        self.color_space = new_swapchain.color_space;
        self.extent = new_swapchain.extent;
        self.present_mode = new_swapchain.present_mode;

        // Null the moved-out handle so new_swapchain's Drop is a no-op
        new_swapchain.swapchain = vk::SwapchainKHR::null();

        Ok(())
    }

    /// Acquires the next presentable image.
    ///
    /// `semaphore` is signaled when the image is actually available.
    /// Returns `(image_index, suboptimal)`.
    ///
    /// # Errors
    ///
    /// Propagates `vk::Result::ERROR_OUT_OF_DATE_KHR` when the surface no
    /// longer matches; the caller recreates the swapchain then.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<(u32, bool), vk::Result> {
        unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    /// Presents the image at `image_index` on `queue`.
    ///
    /// Waits on `wait_semaphore` (render finished) before presenting.
    /// Returns true when the swapchain is suboptimal and should be
    /// recreated.
    ///
    /// # Errors
    ///
    /// Propagates `vk::Result::ERROR_OUT_OF_DATE_KHR` when the surface no
    /// longer matches.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> Result<bool, vk::Result> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe { self.swapchain_loader.queue_present(queue, &present_info) }
    }

    /// Returns the swapchain handle.
    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the swapchain color space.
    #[inline]
    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.color_space
    }

    /// Returns the swapchain extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the present mode.
    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Returns the number of presentable images.
    #[inline]
    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    /// Returns the per-image resources at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn image(&self, index: usize) -> &SwapchainImage {
        &self.images[index]
    }

    /// Returns all per-image resource records.
    #[inline]
    pub fn images(&self) -> &[SwapchainImage] {
        &self.images
    }

    /// Destroys framebuffers and views; images belong to the chain.
    fn destroy_image_resources(&mut self) {
        for image in self.images.drain(..) {
            unsafe {
                self.device
                    .handle()
                    .destroy_framebuffer(image.framebuffer, None);
                self.device.handle().destroy_image_view(image.view, None);
            }
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        let image_count = self.images.len();
        self.destroy_image_resources();

        // Null handle means recreate() already moved the resources out
        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe {
                self.swapchain_loader
                    .destroy_swapchain(self.swapchain, None);
            }

            info!(
                "Swapchain destroyed (was {}x{}, {} images)",
                self.extent.width, self.extent.height, image_count
            );
        }
    }
}

/// Chooses the surface format.
///
/// Prefers B8G8R8A8_SRGB with SRGB_NONLINEAR; otherwise takes the first
/// format the surface lists.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = preferred {
        debug!("Selected preferred surface format: B8G8R8A8_SRGB with SRGB_NONLINEAR");
        return format;
    }

    warn!(
        "Using first available surface format: {:?}",
        formats[0].format
    );
    formats[0]
}

/// Chooses the present mode.
///
/// Prefers MAILBOX (low latency, no tearing); falls back to FIFO, which
/// Vulkan guarantees to be available.
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        debug!("Selected MAILBOX present mode");
        return vk::PresentModeKHR::MAILBOX;
    }

    debug!("Selected FIFO present mode (vsync)");
    vk::PresentModeKHR::FIFO
}

/// Chooses the swapchain extent.
///
/// When the surface reports a fixed current extent it is authoritative
/// and the requested size is ignored. The u32::MAX sentinel means the
/// extent is negotiable, in which case the request is clamped into the
/// surface bounds.
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        debug!(
            "Using current surface extent: {}x{}",
            capabilities.current_extent.width, capabilities.current_extent.height
        );
        return capabilities.current_extent;
    }

    let extent = vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    };

    debug!(
        "Calculated extent: {}x{} (requested: {}x{})",
        extent.width, extent.height, width, height
    );

    extent
}

/// Rejects a zero-area extent.
///
/// A minimized window reports a fixed current extent of (0, 0), which
/// [`choose_extent`] passes through unchanged. Creating a swapchain with
/// it is invalid, so creation fails here instead; the engine stalls on
/// the window size before retrying.
fn ensure_valid_extent(extent: vk::Extent2D) -> Result<(), RhiError> {
    if extent.width == 0 || extent.height == 0 {
        return Err(RhiError::SwapchainError(
            "Surface extent is zero; window is likely minimized".to_string(),
        ));
    }
    Ok(())
}

/// Determines the number of swapchain images.
///
/// Requests exactly the surface minimum, clamped by the maximum when one
/// is set (0 means unlimited). No headroom image is added.
fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = if capabilities.max_image_count > 0 {
        capabilities
            .min_image_count
            .min(capabilities.max_image_count)
    } else {
        capabilities.min_image_count
    };

    debug!(
        "Image count: {} (min: {}, max: {})",
        image_count,
        capabilities.min_image_count,
        if capabilities.max_image_count == 0 {
            "unlimited".to_string()
        } else {
            capabilities.max_image_count.to_string()
        }
    );

    image_count
}

/// Builds the per-image view and framebuffer records.
///
/// On failure everything built so far is destroyed before the error is
/// returned, so no partial array leaks.
fn build_image_resources(
    device: &Device,
    raw_images: &[vk::Image],
    format: vk::Format,
    render_pass: vk::RenderPass,
    extent: vk::Extent2D,
) -> Result<Vec<SwapchainImage>, RhiError> {
    let mut images: Vec<SwapchainImage> = Vec::with_capacity(raw_images.len());

    let cleanup = |device: &Device, images: &mut Vec<SwapchainImage>| {
        for image in images.drain(..) {
            unsafe {
                device.handle().destroy_framebuffer(image.framebuffer, None);
                device.handle().destroy_image_view(image.view, None);
            }
        }
    };

    for (i, &image) in raw_images.iter().enumerate() {
        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = match unsafe { device.handle().create_image_view(&view_info, None) } {
            Ok(view) => view,
            Err(e) => {
                cleanup(device, &mut images);
                return Err(RhiError::SwapchainError(format!(
                    "Failed to create image view {}: {:?}",
                    i, e
                )));
            }
        };

        let attachments = [view];
        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = match unsafe {
            device.handle().create_framebuffer(&framebuffer_info, None)
        } {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                unsafe { device.handle().destroy_image_view(view, None) };
                cleanup(device, &mut images);
                return Err(RhiError::SwapchainError(format!(
                    "Failed to create framebuffer {}: {:?}",
                    i, e
                )));
            }
        };

        images.push(SwapchainImage {
            image,
            view,
            framebuffer,
        });
    }

    debug!("Created {} per-image resource sets", images.len());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_surface_format_prefers_srgb() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(selected.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_choose_surface_format_falls_back_to_first() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_choose_present_mode_prefers_mailbox() {
        let modes = vec![
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];

        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_choose_present_mode_fallback_to_fifo() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];

        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_current_extent_is_authoritative() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        };

        // Requested size is ignored when the surface fixes the extent
        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1080);
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 3000, 3000);
        assert_eq!(extent.width, 2000);
        assert_eq!(extent.height, 2000);

        let extent = choose_extent(&capabilities, 50, 50);
        assert_eq!(extent.width, 100);
        assert_eq!(extent.height, 100);

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    #[test]
    fn test_zero_current_extent_is_rejected() {
        // A minimized window fixes the current extent at (0, 0); the
        // requested size is ignored and creation must refuse the result
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 0,
                height: 0,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 640, 360);
        assert_eq!(extent.width, 0);
        assert_eq!(extent.height, 0);
        assert!(ensure_valid_extent(extent).is_err());
    }

    #[test]
    fn test_ensure_valid_extent() {
        let ok = vk::Extent2D {
            width: 640,
            height: 360,
        };
        assert!(ensure_valid_extent(ok).is_ok());

        let zero_width = vk::Extent2D {
            width: 0,
            height: 360,
        };
        assert!(ensure_valid_extent(zero_width).is_err());

        let zero_height = vk::Extent2D {
            width: 640,
            height: 0,
        };
        assert!(ensure_valid_extent(zero_height).is_err());
    }

    #[test]
    fn test_determine_image_count_exactly_minimum() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 2);

        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            max_image_count: 0, // 0 means no limit
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);
    }

    #[test]
    fn test_determine_image_count_clamped_by_maximum() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 4,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);
    }

    #[test]
    fn test_swapchain_support_details_is_adequate() {
        let adequate = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_formats = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!no_formats.is_adequate());

        let no_modes = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![],
        };
        assert!(!no_modes.is_adequate());
    }
}
