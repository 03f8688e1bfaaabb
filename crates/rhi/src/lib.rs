//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! This crate provides a safe abstraction over Vulkan using the `ash` crate.
//! It handles:
//! - Instance creation and adapter selection
//! - Logical device and queue setup
//! - Swapchain management
//! - Render pass and framebuffer setup
//! - Command buffer recording
//! - Buffer allocation and upload
//! - Pipeline creation
//! - Synchronization primitives

mod error;

pub mod adapter;
pub mod buffer;
pub mod command;
pub mod device;
pub mod instance;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
