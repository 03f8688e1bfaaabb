//! Rendering engine built on the RHI layer.
//!
//! This crate orchestrates the rendering process:
//! - The [`Engine`] façade owning the full Vulkan object graph
//! - Frame scheduling across frames in flight
//! - Swapchain recreation on resize and staleness

pub mod engine;
pub mod frame;

pub use engine::{Engine, EngineConfig, FramebufferSource, TRIANGLE_VERTICES};
pub use frame::{AcquireOutcome, FrameScheduler, FrameSlot};
pub use lumen_rhi::sync::MAX_FRAMES_IN_FLIGHT;
