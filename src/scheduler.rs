//! Cooperative frame scheduling.
//!
//! A [`FrameTask`] renders one frame each time its host fires a requested
//! frame, and keeps requesting frames until its [`Animation`] says it is
//! finished or its [`CancelToken`] is set.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::surface::DrawContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Animating,
    Done,
}

/// Identifies one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Whatever fires frames: a window's redraw cycle, a test queue, ...
pub trait FrameHost {
    /// Asks for one more frame before the next refresh.
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Shared flag for stopping an animation from outside its frame loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub trait Animation {
    /// Draws the current state as one full frame.
    fn render(&mut self, ctx: &mut dyn DrawContext);

    /// Steps to the next state; `false` once there is nothing left to show.
    fn advance(&mut self) -> bool;
}

#[derive(Debug)]
pub struct FrameTask<A> {
    animation: A,
    phase: Phase,
    pending: Option<FrameHandle>,
    token: CancelToken,
    frames: u64,
}

impl<A: Animation> FrameTask<A> {
    pub fn new(animation: A) -> Self {
        Self {
            animation,
            phase: Phase::Idle,
            pending: None,
            token: CancelToken::new(),
            frames: 0,
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    pub fn animation(&self) -> &A {
        &self.animation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Runs one frame: render, then either request the next frame or finish.
    ///
    /// A cancelled token is checked after rendering, so the frame in flight
    /// still lands but nothing further is scheduled.
    pub fn run_frame(&mut self, ctx: &mut dyn DrawContext, host: &mut dyn FrameHost) -> Phase {
        if self.phase == Phase::Done {
            return Phase::Done;
        }
        self.animation.render(ctx);
        self.frames += 1;

        if !self.token.is_cancelled() && self.animation.advance() {
            let handle = host.request_frame();
            debug!(frame = self.frames, handle = handle.id(), "scheduled next frame");
            self.pending = Some(handle);
            self.phase = Phase::Animating;
        } else {
            self.finish(host);
        }
        self.phase
    }

    /// Stops right away, releasing any pending frame.
    pub fn cancel(&mut self, host: &mut dyn FrameHost) {
        self.token.cancel();
        if self.phase != Phase::Done {
            self.finish(host);
        }
    }

    fn finish(&mut self, host: &mut dyn FrameHost) {
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
        self.phase = Phase::Done;
        info!(
            frames = self.frames,
            cancelled = self.token.is_cancelled(),
            "animation finished"
        );
    }
}

/// Host that queues requested frames and fires them on demand.
///
/// Used for headless rendering and tests; `fire` stands in for the display
/// refresh.
#[derive(Debug, Default)]
pub struct ImmediateFrames {
    next_id: u64,
    queue: VecDeque<FrameHandle>,
    released: Vec<FrameHandle>,
}

impl ImmediateFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops the oldest requested frame, if any.
    pub fn fire(&mut self) -> Option<FrameHandle> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Total frames ever requested.
    pub fn requested(&self) -> u64 {
        self.next_id
    }

    /// Handles passed to `cancel_frame`, in order.
    pub fn released(&self) -> &[FrameHandle] {
        &self.released
    }
}

impl FrameHost for ImmediateFrames {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle::new(self.next_id);
        self.next_id += 1;
        self.queue.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queue.retain(|queued| *queued != handle);
        self.released.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    /// Counts down from `remaining`, logging what it rendered.
    struct Countdown {
        remaining: u32,
        rendered: Vec<u32>,
    }

    impl Animation for Countdown {
        fn render(&mut self, _ctx: &mut dyn DrawContext) {
            self.rendered.push(self.remaining);
        }

        fn advance(&mut self) -> bool {
            if self.remaining == 0 {
                return false;
            }
            self.remaining -= 1;
            true
        }
    }

    fn countdown(from: u32) -> FrameTask<Countdown> {
        FrameTask::new(Countdown {
            remaining: from,
            rendered: Vec::new(),
        })
    }

    fn drain(task: &mut FrameTask<Countdown>, scene: &mut Scene, frames: &mut ImmediateFrames) {
        task.run_frame(scene, frames);
        while frames.fire().is_some() {
            task.run_frame(scene, frames);
        }
    }

    #[test]
    fn runs_until_animation_stops() {
        let mut scene = Scene::new(1.0, 1.0);
        let mut frames = ImmediateFrames::new();
        let mut task = countdown(3);
        assert_eq!(task.phase(), Phase::Idle);

        assert_eq!(task.run_frame(&mut scene, &mut frames), Phase::Animating);
        assert_eq!(frames.pending(), 1);
        while frames.fire().is_some() {
            task.run_frame(&mut scene, &mut frames);
        }

        assert_eq!(task.phase(), Phase::Done);
        assert_eq!(task.animation().rendered, vec![3, 2, 1, 0]);
        assert_eq!(task.frames_rendered(), 4);
        assert_eq!(frames.requested(), 3);
        assert_eq!(task.pending_frame(), None);
    }

    #[test]
    fn last_handle_is_released_once() {
        let mut scene = Scene::new(1.0, 1.0);
        let mut frames = ImmediateFrames::new();
        let mut task = countdown(2);
        drain(&mut task, &mut scene, &mut frames);

        assert_eq!(frames.released(), &[FrameHandle::new(1)]);
        // Done is terminal: further frames are no-ops.
        assert_eq!(task.run_frame(&mut scene, &mut frames), Phase::Done);
        assert_eq!(task.frames_rendered(), 3);
        assert_eq!(frames.released().len(), 1);
    }

    #[test]
    fn single_frame_goes_straight_to_done() {
        let mut scene = Scene::new(1.0, 1.0);
        let mut frames = ImmediateFrames::new();
        let mut task = countdown(0);

        assert_eq!(task.run_frame(&mut scene, &mut frames), Phase::Done);
        assert_eq!(frames.requested(), 0);
        assert!(frames.released().is_empty());
    }

    #[test]
    fn token_stops_scheduling_after_current_frame() {
        let mut scene = Scene::new(1.0, 1.0);
        let mut frames = ImmediateFrames::new();
        let mut task = countdown(10);
        let token = task.cancel_token();

        task.run_frame(&mut scene, &mut frames);
        frames.fire();
        token.cancel();
        assert_eq!(task.run_frame(&mut scene, &mut frames), Phase::Done);

        assert_eq!(task.animation().rendered, vec![10, 9]);
        assert_eq!(frames.pending(), 0);
        assert_eq!(frames.released(), &[FrameHandle::new(0)]);
    }

    #[test]
    fn cancel_releases_pending_frame() {
        let mut scene = Scene::new(1.0, 1.0);
        let mut frames = ImmediateFrames::new();
        let mut task = countdown(10);

        task.run_frame(&mut scene, &mut frames);
        task.cancel(&mut frames);
        task.cancel(&mut frames);

        assert_eq!(task.phase(), Phase::Done);
        assert_eq!(frames.pending(), 0);
        assert_eq!(frames.fire(), None);
        assert_eq!(frames.released(), &[FrameHandle::new(0)]);
        assert!(task.cancel_token().is_cancelled());
    }

    #[test]
    fn shared_token_can_be_supplied() {
        let token = CancelToken::new();
        let task = countdown(1).with_cancel_token(token.clone());
        token.cancel();
        assert!(task.cancel_token().is_cancelled());
    }
}
