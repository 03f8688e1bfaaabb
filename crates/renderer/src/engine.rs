//! Engine façade.
//!
//! [`Engine`] owns every Vulkan object the triangle renderer needs and
//! exposes three operations to the application: construction, one call
//! per frame, and resize notification. Teardown happens in [`Drop`].
//!
//! # Resource Destruction Order
//!
//! Vulkan resources must be destroyed in reverse creation order:
//! 1. Wait for all GPU work to complete
//! 2. Frame scheduler (command buffers, semaphores, fences)
//! 3. Vertex buffer
//! 4. Pipeline and pipeline layout
//! 5. Command pools
//! 6. Swapchain (framebuffers and views first)
//! 7. Render pass
//! 8. Surface
//! 9. Device
//! 10. Instance
//!
//! ManuallyDrop is used to make that order explicit. During
//! construction the same ordering falls out of RAII: a failure partway
//! through unwinds the locals created so far, newest first.

use std::mem::ManuallyDrop;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use glam::{Vec2, Vec3};
use tracing::{debug, error, info};

use lumen_platform::{Surface, Window};
use lumen_rhi::adapter::select_adapter;
use lumen_rhi::buffer::Buffer;
use lumen_rhi::command::CommandPool;
use lumen_rhi::device::Device;
use lumen_rhi::instance::{AppInfo, Instance};
use lumen_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use lumen_rhi::render_pass::RenderPass;
use lumen_rhi::shader::{Shader, ShaderStage};
use lumen_rhi::swapchain::Swapchain;
use lumen_rhi::vertex::Vertex;
use lumen_rhi::{RhiError, RhiResult};

use crate::frame::{AcquireOutcome, FrameScheduler};

/// The three vertices of the demo triangle: red apex, green and blue
/// base corners, wound clockwise in Vulkan's y-down clip space.
pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex {
        position: Vec2::new(0.0, -0.5),
        color: Vec3::new(1.0, 0.0, 0.0),
    },
    Vertex {
        position: Vec2::new(0.5, 0.5),
        color: Vec3::new(0.0, 1.0, 0.0),
    },
    Vertex {
        position: Vec2::new(-0.5, 0.5),
        color: Vec3::new(0.0, 0.0, 1.0),
    },
];

/// Clear color for the single color attachment.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Poll interval while stalled on a zero-area framebuffer.
const MINIMIZED_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Source of the current framebuffer size, polled during swapchain
/// recreation. A minimized window reports (0, 0).
pub trait FramebufferSource {
    fn framebuffer_size(&self) -> (u32, u32);
}

impl FramebufferSource for Window {
    fn framebuffer_size(&self) -> (u32, u32) {
        Window::framebuffer_size(self)
    }
}

/// Polls `source` until it reports a nonzero framebuffer size.
///
/// Recreating the swapchain for a zero-area surface is invalid, and a
/// minimize can land in the same event batch as an out-of-date report
/// from acquire or present. Blocking here keeps the invalid size from
/// ever reaching swapchain creation.
fn wait_for_valid_extent(source: &impl FramebufferSource) -> (u32, u32) {
    let (width, height) = source.framebuffer_size();
    if width > 0 && height > 0 {
        return (width, height);
    }

    debug!("Framebuffer has zero area, waiting for the window to be restored");
    loop {
        std::thread::sleep(MINIMIZED_POLL_INTERVAL);
        let (width, height) = source.framebuffer_size();
        if width > 0 && height > 0 {
            return (width, height);
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application name reported to the Vulkan driver and used as the
    /// window title.
    pub app_name: String,
    /// Application version as (major, minor, patch).
    pub app_version: (u32, u32, u32),
    /// Initial window width in pixels.
    pub width: u32,
    /// Initial window height in pixels.
    pub height: u32,
    /// Path to the compiled vertex shader.
    pub vertex_shader: PathBuf,
    /// Path to the compiled fragment shader.
    pub fragment_shader: PathBuf,
    /// Whether to enable the Khronos validation layer.
    pub enable_validation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Lumen Example".to_string(),
            app_version: (0, 1, 0),
            width: 640,
            height: 360,
            vertex_shader: PathBuf::from("shaders/triangle.vert.spv"),
            fragment_shader: PathBuf::from("shaders/triangle.frag.spv"),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// Owns the full Vulkan object graph and renders one triangle per frame.
pub struct Engine {
    // Fields are dropped manually in Drop; declaration order documents
    // reverse destruction order.
    /// Vulkan instance (destroyed last).
    instance: ManuallyDrop<Instance>,
    /// Logical device (destroyed after everything built on it).
    device: ManuallyDrop<Arc<Device>>,
    /// Window surface (destroyed after swapchain, before device).
    surface: ManuallyDrop<Surface>,
    /// Render pass shared by the pipeline and every framebuffer.
    render_pass: ManuallyDrop<RenderPass>,
    /// Swapchain and its per-image views and framebuffers.
    swapchain: ManuallyDrop<Swapchain>,
    /// Empty pipeline layout (no descriptors, no push constants).
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    /// Triangle graphics pipeline.
    pipeline: ManuallyDrop<Pipeline>,
    /// Pool for the per-slot render command buffers.
    graphics_pool: ManuallyDrop<CommandPool>,
    /// Transient pool for one-shot upload command buffers.
    transfer_pool: ManuallyDrop<CommandPool>,
    /// Device-local vertex buffer holding the triangle.
    vertex_buffer: ManuallyDrop<Buffer>,
    /// Frames-in-flight state machine.
    scheduler: ManuallyDrop<FrameScheduler>,

    /// Latched by resize(); consumed at the top of the next frame.
    framebuffer_resized: bool,
    /// Current window width.
    width: u32,
    /// Current window height.
    height: u32,
}

impl Engine {
    /// Creates the engine for the given window.
    ///
    /// Initializes the full Vulkan stack: instance, surface, adapter
    /// selection, device, render pass, swapchain, pipeline, command
    /// pools, vertex buffer, and frame scheduler, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if any resource creation fails. Everything
    /// created before the failure is released before this returns.
    pub fn new(window: &Window, config: &EngineConfig) -> RhiResult<Self> {
        let width = window.width();
        let height = window.height();

        info!(
            "Initializing engine \"{}\" ({}x{})",
            config.app_name, width, height
        );

        let app_info = AppInfo {
            name: config.app_name.clone(),
            version: config.app_version,
        };
        let instance = Instance::new(&app_info, config.enable_validation)?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let adapter = select_adapter(instance.handle(), surface.handle(), surface.loader())?;
        info!("Selected adapter: {}", adapter.device_name());

        let device = Device::new(&instance, &adapter)?;

        // The render pass only depends on the surface format, so it is
        // created from a pre-swapchain format query and reused across
        // swapchain recreations.
        let format = query_surface_format(&adapter, &surface)?;
        let render_pass = RenderPass::new(device.clone(), format)?;

        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            surface.loader(),
            &render_pass,
            width,
            height,
        )?;

        let (pipeline, pipeline_layout) = create_triangle_pipeline(
            device.clone(),
            &render_pass,
            &config.vertex_shader,
            &config.fragment_shader,
        )?;

        let graphics_family = device.queue_families().graphics.ok_or(RhiError::NoSuitableGpu)?;
        let transfer_family = device
            .queue_families()
            .transfer
            .unwrap_or(graphics_family);

        let graphics_pool = CommandPool::new(device.clone(), graphics_family)?;
        let transfer_pool = CommandPool::new_transient(device.clone(), transfer_family)?;

        let vertex_buffer = Buffer::new_device_local_with_data(
            device.clone(),
            &transfer_pool,
            bytemuck::cast_slice(&TRIANGLE_VERTICES),
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;

        let scheduler = FrameScheduler::new(device.clone(), &graphics_pool)?;

        info!(
            "Engine initialized: {} swapchain images, {} frames in flight",
            swapchain.image_count(),
            scheduler.frames_in_flight()
        );

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            render_pass: ManuallyDrop::new(render_pass),
            swapchain: ManuallyDrop::new(swapchain),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            pipeline: ManuallyDrop::new(pipeline),
            graphics_pool: ManuallyDrop::new(graphics_pool),
            transfer_pool: ManuallyDrop::new(transfer_pool),
            vertex_buffer: ManuallyDrop::new(vertex_buffer),
            scheduler: ManuallyDrop::new(scheduler),
            framebuffer_resized: false,
            width,
            height,
        })
    }

    /// Notifies the engine that the window has been resized.
    ///
    /// Zero or unchanged dimensions are ignored. The swapchain is
    /// recreated lazily at the start of the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!("Ignoring resize to zero dimensions");
            return;
        }

        if width != self.width || height != self.height {
            debug!(
                "Resize latched: {}x{} -> {}x{}",
                self.width, self.height, width, height
            );
            self.width = width;
            self.height = height;
            self.framebuffer_resized = true;
        }
    }

    /// Renders one frame.
    ///
    /// Walks the frame protocol: wait for the slot fence, acquire an
    /// image, record and submit the triangle draw, present, advance the
    /// slot cursor. A stale swapchain at acquire recreates it and skips
    /// the rest of the frame; staleness reported at present recreates it
    /// after the frame completes. Recreation blocks on `framebuffer`
    /// while it reports a zero-area size.
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan operation fails for a reason other
    /// than the swapchain going stale.
    pub fn render_frame(&mut self, framebuffer: &impl FramebufferSource) -> RhiResult<()> {
        if self.framebuffer_resized {
            debug!("Resize pending, recreating swapchain before acquire");
            self.recreate_swapchain(framebuffer)?;
        }

        self.scheduler.wait_for_slot()?;

        let (image_index, suboptimal) = match self.scheduler.acquire_image(&self.swapchain)? {
            AcquireOutcome::Acquired {
                image_index,
                suboptimal,
            } => (image_index, suboptimal),
            AcquireOutcome::OutOfDate => {
                // Nothing was submitted; the slot cursor stays put and
                // the retry happens next frame on the same slot.
                self.recreate_swapchain(framebuffer)?;
                return Ok(());
            }
        };

        self.scheduler.begin_frame()?;
        self.record_commands(image_index);
        self.scheduler.end_frame()?;

        self.scheduler.submit()?;
        let present_stale = self.scheduler.present(&self.swapchain)?;
        self.scheduler.next_frame();

        if present_stale || suboptimal || self.framebuffer_resized {
            debug!("Swapchain stale after present, recreating");
            self.recreate_swapchain(framebuffer)?;
        }

        Ok(())
    }

    /// Records the triangle draw into the current slot's command buffer.
    fn record_commands(&self, image_index: u32) {
        let cmd = self.scheduler.current_slot().command_buffer();
        let image = self.swapchain.image(image_index as usize);
        let extent = self.swapchain.extent();

        cmd.begin_render_pass(
            self.render_pass.handle(),
            image.framebuffer,
            extent,
            CLEAR_COLOR,
        );

        cmd.bind_pipeline(self.pipeline.bind_point(), self.pipeline.handle());

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        cmd.set_viewport(&viewport);

        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        cmd.set_scissor(&scissor);

        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
        cmd.draw(TRIANGLE_VERTICES.len() as u32, 1, 0, 0);

        cmd.end_render_pass();
    }

    /// Recreates the swapchain, stalling while the framebuffer is zero.
    fn recreate_swapchain(&mut self, framebuffer: &impl FramebufferSource) -> RhiResult<()> {
        let (width, height) = wait_for_valid_extent(framebuffer);
        self.width = width;
        self.height = height;

        self.swapchain.recreate(
            &self.instance,
            self.surface.handle(),
            self.surface.loader(),
            &self.render_pass,
            width,
            height,
        )?;

        // Acquires that never presented may have left semaphores signaled
        self.scheduler.reset_semaphores()?;

        self.framebuffer_resized = false;
        Ok(())
    }

    /// Returns the current swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the swapchain image format.
    pub fn format(&self) -> vk::Format {
        self.swapchain.format()
    }

    /// Returns a reference to the device.
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during engine drop: {:?}", e);
        }

        // Reverse creation order; the device Arc is released after every
        // object built on it, and the instance goes last.
        unsafe {
            ManuallyDrop::drop(&mut self.scheduler);
            ManuallyDrop::drop(&mut self.vertex_buffer);
            ManuallyDrop::drop(&mut self.transfer_pool);
            ManuallyDrop::drop(&mut self.graphics_pool);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Engine destroyed");
    }
}

/// Queries the surface format the swapchain will pick, so the render
/// pass can be created before the swapchain exists.
fn query_surface_format(
    adapter: &lumen_rhi::adapter::AdapterInfo,
    surface: &Surface,
) -> RhiResult<vk::Format> {
    let formats = unsafe {
        surface
            .loader()
            .get_physical_device_surface_formats(adapter.device, surface.handle())?
    };

    if formats.is_empty() {
        return Err(RhiError::SurfaceError(
            "Surface reports no formats".to_string(),
        ));
    }

    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    Ok(preferred.unwrap_or(&formats[0]).format)
}

/// Loads the triangle shaders and builds the pipeline.
///
/// The shader modules are dropped when this returns; only the pipeline
/// needs them, and only during creation.
fn create_triangle_pipeline(
    device: Arc<Device>,
    render_pass: &RenderPass,
    vertex_path: &std::path::Path,
    fragment_path: &std::path::Path,
) -> RhiResult<(Pipeline, PipelineLayout)> {
    let vertex_shader =
        Shader::from_spirv_file(device.clone(), vertex_path, ShaderStage::Vertex, "main")?;
    let fragment_shader =
        Shader::from_spirv_file(device.clone(), fragment_path, ShaderStage::Fragment, "main")?;

    let pipeline_layout = PipelineLayout::new(device.clone(), &[], &[])?;

    let pipeline = GraphicsPipelineBuilder::new()
        .vertex_shader(&vertex_shader)
        .fragment_shader(&fragment_shader)
        .vertex_binding(Vertex::binding_description())
        .vertex_attributes(&Vertex::attribute_descriptions())
        .build(device, &pipeline_layout, render_pass)?;

    info!("Triangle pipeline created");

    Ok((pipeline, pipeline_layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Windowing stand-in that reports a zero framebuffer for the first
    /// `zero_polls` queries, then a real size.
    struct RestoredAfter {
        zero_polls: usize,
        polls: Cell<usize>,
    }

    impl FramebufferSource for RestoredAfter {
        fn framebuffer_size(&self) -> (u32, u32) {
            let poll = self.polls.get();
            self.polls.set(poll + 1);
            if poll < self.zero_polls {
                (0, 0)
            } else {
                (640, 360)
            }
        }
    }

    #[test]
    fn test_wait_for_valid_extent_skips_zero_sizes() {
        let source = RestoredAfter {
            zero_polls: 2,
            polls: Cell::new(0),
        };

        let (width, height) = wait_for_valid_extent(&source);
        assert_eq!((width, height), (640, 360));
        // Two zero reports, then the restored size
        assert_eq!(source.polls.get(), 3);
    }

    #[test]
    fn test_wait_for_valid_extent_immediate_when_nonzero() {
        let source = RestoredAfter {
            zero_polls: 0,
            polls: Cell::new(0),
        };

        assert_eq!(wait_for_valid_extent(&source), (640, 360));
        assert_eq!(source.polls.get(), 1);
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.app_name, "Lumen Example");
        assert_eq!(config.app_version, (0, 1, 0));
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 360);
    }

    #[test]
    fn test_triangle_vertices() {
        assert_eq!(TRIANGLE_VERTICES.len(), 3);

        // Apex is centered horizontally and above the base
        assert_eq!(TRIANGLE_VERTICES[0].position.x, 0.0);
        assert!(TRIANGLE_VERTICES[0].position.y < TRIANGLE_VERTICES[1].position.y);

        // One full-intensity channel per vertex
        assert_eq!(TRIANGLE_VERTICES[0].color, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(TRIANGLE_VERTICES[1].color, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(TRIANGLE_VERTICES[2].color, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_triangle_winding_is_clockwise() {
        // Cross product z of (v1 - v0) x (v2 - v0) is positive for
        // clockwise winding in Vulkan's y-down clip space
        let v0 = TRIANGLE_VERTICES[0].position;
        let v1 = TRIANGLE_VERTICES[1].position;
        let v2 = TRIANGLE_VERTICES[2].position;
        let cross = (v1.x - v0.x) * (v2.y - v0.y) - (v1.y - v0.y) * (v2.x - v0.x);
        assert!(cross > 0.0);
    }
}
