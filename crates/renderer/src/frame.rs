//! Frame scheduling and synchronization.
//!
//! The [`FrameScheduler`] owns the per-slot resources that let the CPU
//! prepare one frame while the GPU renders another, and walks each frame
//! through the fixed protocol:
//!
//! ```text
//! 1. Wait on the slot's in-flight fence
//! 2. Acquire a swapchain image (signals image_available)
//! 3. Reset the fence, record commands
//! 4. Submit: wait image_available at COLOR_ATTACHMENT_OUTPUT,
//!    signal render_finished and the in-flight fence
//! 5. Present (waits on render_finished)
//! 6. Advance the slot cursor
//! ```
//!
//! The fence is reset only after a successful acquire. When acquire
//! reports the swapchain stale the caller recreates it and retries the
//! frame; the fence stays signaled and the cursor stays put, so the retry
//! reuses the same slot without deadlocking on an unsubmitted fence.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use lumen_rhi::command::{CommandBuffer, CommandPool};
use lumen_rhi::device::Device;
use lumen_rhi::swapchain::Swapchain;
use lumen_rhi::sync::{Fence, Semaphore, MAX_FRAMES_IN_FLIGHT};
use lumen_rhi::RhiResult;

/// Per-slot frame resources.
///
/// Each frame in flight has its own command buffer, semaphore pair, and
/// fence so slots never contend with each other.
pub struct FrameSlot {
    /// Command buffer for recording rendering commands.
    command_buffer: CommandBuffer,
    /// Signaled by the presentation engine when the acquired image is usable.
    image_available: Semaphore,
    /// Signaled by the graphics queue when rendering into the image is done.
    render_finished: Semaphore,
    /// Signaled by the graphics queue when the whole submission has retired.
    in_flight: Fence,
}

impl FrameSlot {
    fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        let command_buffer = CommandBuffer::new(device.clone(), command_pool)?;
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        // Signaled so the first wait on this slot returns immediately
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            command_buffer,
            image_available,
            render_finished,
            in_flight,
        })
    }

    /// Returns a reference to the command buffer.
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    /// Returns a reference to the image-available semaphore.
    #[inline]
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    /// Returns a reference to the render-finished semaphore.
    #[inline]
    pub fn render_finished(&self) -> &Semaphore {
        &self.render_finished
    }

    /// Returns a reference to the in-flight fence.
    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

/// Outcome of acquiring a swapchain image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image was acquired; rendering may proceed.
    Acquired {
        /// Index of the acquired swapchain image.
        image_index: u32,
        /// The swapchain still works but no longer matches the surface
        /// exactly; recreate after presenting this frame.
        suboptimal: bool,
    },
    /// The swapchain is out of date. Nothing was acquired and nothing was
    /// submitted; recreate the swapchain and retry the frame on the same
    /// slot.
    OutOfDate,
}

/// Drives the frames-in-flight protocol.
///
/// Maintains [`MAX_FRAMES_IN_FLIGHT`] slots and a cursor over them. Not
/// thread-safe; driven by the single render-loop thread.
pub struct FrameScheduler {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Per-slot resources.
    slots: Vec<FrameSlot>,
    /// Current slot index (0 to MAX_FRAMES_IN_FLIGHT - 1).
    current_frame: usize,
    /// Swapchain image index from the latest successful acquire.
    image_index: u32,
}

impl FrameScheduler {
    /// Creates a scheduler with [`MAX_FRAMES_IN_FLIGHT`] slots.
    ///
    /// # Errors
    ///
    /// Returns an error if command buffer or sync primitive creation fails.
    pub fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        let mut slots = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);

        for i in 0..MAX_FRAMES_IN_FLIGHT {
            slots.push(FrameSlot::new(device.clone(), command_pool)?);
            debug!("Created frame slot {}", i);
        }

        info!(
            "Frame scheduler created with {} frames in flight",
            MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            device,
            slots,
            current_frame: 0,
            image_index: 0,
        })
    }

    /// Returns the current slot.
    #[inline]
    pub fn current_slot(&self) -> &FrameSlot {
        &self.slots[self.current_frame]
    }

    /// Returns the current slot index.
    #[inline]
    pub fn current_frame_index(&self) -> usize {
        self.current_frame
    }

    /// Returns the swapchain image index from the latest acquire.
    #[inline]
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    /// Blocks until the current slot's previous submission has retired.
    ///
    /// Must be called before touching the slot's command buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn wait_for_slot(&self) -> RhiResult<()> {
        self.slots[self.current_frame].in_flight.wait(u64::MAX)?;
        Ok(())
    }

    /// Acquires the next swapchain image for the current slot.
    ///
    /// The slot's fence is deliberately not touched here: on
    /// [`AcquireOutcome::OutOfDate`] no work will be submitted this frame,
    /// and the fence must stay signaled for the retry.
    ///
    /// # Errors
    ///
    /// Returns an error if acquisition fails for a reason other than the
    /// swapchain being out of date.
    pub fn acquire_image(&mut self, swapchain: &Swapchain) -> RhiResult<AcquireOutcome> {
        let slot = &self.slots[self.current_frame];

        match swapchain.acquire_next_image(slot.image_available.handle()) {
            Ok((index, suboptimal)) => {
                self.image_index = index;
                Ok(AcquireOutcome::Acquired {
                    image_index: index,
                    suboptimal,
                })
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during acquire");
                Ok(AcquireOutcome::OutOfDate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resets the slot fence and begins command recording.
    ///
    /// Call only after a successful acquire; resetting the fence earlier
    /// would deadlock the next wait if the frame bails out before submit.
    ///
    /// # Errors
    ///
    /// Returns an error if resetting or beginning the command buffer fails.
    pub fn begin_frame(&self) -> RhiResult<()> {
        let slot = &self.slots[self.current_frame];
        slot.in_flight.reset()?;
        slot.command_buffer.reset()?;
        slot.command_buffer.begin()?;
        Ok(())
    }

    /// Ends command recording for the current slot.
    ///
    /// # Errors
    ///
    /// Returns an error if ending the command buffer fails.
    pub fn end_frame(&self) -> RhiResult<()> {
        self.slots[self.current_frame].command_buffer.end()?;
        Ok(())
    }

    /// Submits the current slot's commands to the graphics queue.
    ///
    /// Waits on image_available at the color-attachment-output stage, so
    /// vertex work may start before the image is ready. Signals
    /// render_finished and the slot fence.
    ///
    /// # Errors
    ///
    /// Returns an error if queue submission fails.
    pub fn submit(&self) -> RhiResult<()> {
        let slot = &self.slots[self.current_frame];

        let wait_semaphores = [slot.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.render_finished.handle()];
        let command_buffers = [slot.command_buffer.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer was just recorded and the fence was
        // reset in begin_frame after its last wait.
        unsafe {
            self.device
                .submit_graphics(&[submit_info], slot.in_flight.handle())?;
        }

        Ok(())
    }

    /// Presents the acquired image.
    ///
    /// Returns `true` when the swapchain is out of date or suboptimal and
    /// should be recreated. The frame was still submitted either way, so
    /// the caller advances the cursor afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if presentation fails for a reason other than the
    /// swapchain being out of date.
    pub fn present(&self, swapchain: &Swapchain) -> RhiResult<bool> {
        let slot = &self.slots[self.current_frame];

        match swapchain.present(
            self.device.present_queue(),
            self.image_index,
            slot.render_finished.handle(),
        ) {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during present");
                Ok(true)
            }
            Err(vk::Result::SUBOPTIMAL_KHR) => {
                debug!("Swapchain suboptimal during present");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Advances the cursor to the next slot.
    ///
    /// Called once per submitted frame, after present. Frames that bailed
    /// out at acquire do not advance, so the retry reuses the same slot.
    pub fn next_frame(&mut self) {
        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;
    }

    /// Blocks until every slot's submission has retired.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn wait_for_all_frames(&self) -> RhiResult<()> {
        let fences: Vec<vk::Fence> = self.slots.iter().map(|s| s.in_flight.handle()).collect();

        unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, u64::MAX)?;
        }

        Ok(())
    }

    /// Replaces every slot's semaphores with fresh ones.
    ///
    /// After swapchain recreation an image_available semaphore may be left
    /// signaled by an acquire whose image was never presented. Fresh
    /// semaphores put every slot back in a known state.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn reset_semaphores(&mut self) -> RhiResult<()> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.image_available = Semaphore::new(self.device.clone())?;
            slot.render_finished = Semaphore::new(self.device.clone())?;
            debug!("Reset semaphores for slot {}", i);
        }

        info!("Reset all frame slot semaphores");
        Ok(())
    }

    /// Returns a reference to the device.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Returns the number of frames in flight.
    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_frames_in_flight_constant() {
        assert!(MAX_FRAMES_IN_FLIGHT >= 1);
        assert!(MAX_FRAMES_IN_FLIGHT <= 4);
    }

    #[test]
    fn test_acquire_outcome_equality() {
        assert_eq!(
            AcquireOutcome::Acquired {
                image_index: 1,
                suboptimal: false
            },
            AcquireOutcome::Acquired {
                image_index: 1,
                suboptimal: false
            }
        );
        assert_ne!(
            AcquireOutcome::Acquired {
                image_index: 0,
                suboptimal: false
            },
            AcquireOutcome::OutOfDate
        );
    }

    #[test]
    fn test_frame_scheduler_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameScheduler>();
    }

    #[test]
    fn test_frame_slot_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameSlot>();
    }
}
