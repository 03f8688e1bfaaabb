//! Platform layer: winit window management and Vulkan surface creation.

mod window;

pub use window::{Surface, Window};

// Re-export the winit types callers need for their event loop.
pub use winit::event::WindowEvent;
pub use winit::event_loop::EventLoop;
