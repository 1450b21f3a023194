//! Joint handles shared between a hardware driver and controllers.
//!
//! Every joint owns one [`JointSlot`]. The driver writes sensed state into it
//! and reads commands back out; controllers see it through a
//! [`JointStateHandle`] (read-only) or a [`JointHandle`] (state + command).
//! All fields are atomics, so neither side ever blocks.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// AtomicF64
// ---------------------------------------------------------------------------

/// `f64` stored as its bit pattern in an [`AtomicU64`].
#[derive(Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl fmt::Debug for AtomicF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.load(), f)
    }
}

// ---------------------------------------------------------------------------
// JointSlot
// ---------------------------------------------------------------------------

/// Lock-free storage for one joint's sensed state and effort command.
#[derive(Debug, Default)]
pub struct JointSlot {
    position: AtomicF64,
    velocity: AtomicF64,
    effort: AtomicF64,
    command: AtomicF64,
}

impl JointSlot {
    pub fn position(&self) -> f64 {
        self.position.load()
    }

    pub fn velocity(&self) -> f64 {
        self.velocity.load()
    }

    /// Sensed effort (Nm or N).
    pub fn effort(&self) -> f64 {
        self.effort.load()
    }

    /// Last effort command written by a controller.
    pub fn command(&self) -> f64 {
        self.command.load()
    }

    /// Driver side: publish sensed position and velocity.
    pub fn set_state(&self, position: f64, velocity: f64) {
        self.position.store(position);
        self.velocity.store(velocity);
    }

    /// Driver side: publish sensed effort.
    pub fn set_effort(&self, effort: f64) {
        self.effort.store(effort);
    }

    fn set_command(&self, command: f64) {
        self.command.store(command);
    }
}

// ---------------------------------------------------------------------------
// JointStateHandle
// ---------------------------------------------------------------------------

/// Read-only view of a joint.
#[derive(Debug, Clone)]
pub struct JointStateHandle {
    name: Arc<str>,
    slot: Arc<JointSlot>,
}

impl JointStateHandle {
    pub fn new(name: impl Into<Arc<str>>, slot: Arc<JointSlot>) -> Self {
        Self {
            name: name.into(),
            slot,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> f64 {
        self.slot.position()
    }

    pub fn velocity(&self) -> f64 {
        self.slot.velocity()
    }

    pub fn effort(&self) -> f64 {
        self.slot.effort()
    }
}

// ---------------------------------------------------------------------------
// JointHandle
// ---------------------------------------------------------------------------

/// Joint state plus a writable effort command.
#[derive(Debug, Clone)]
pub struct JointHandle {
    state: JointStateHandle,
}

impl JointHandle {
    pub const fn new(state: JointStateHandle) -> Self {
        Self { state }
    }

    pub fn name(&self) -> &str {
        self.state.name()
    }

    pub fn position(&self) -> f64 {
        self.state.position()
    }

    pub fn velocity(&self) -> f64 {
        self.state.velocity()
    }

    pub fn effort(&self) -> f64 {
        self.state.effort()
    }

    /// Write the effort command the driver applies on its next cycle.
    pub fn set_command(&self, command: f64) {
        self.state.slot.set_command(command);
    }

    pub fn command(&self) -> f64 {
        self.state.slot.command()
    }

    /// The read-only half of this handle.
    pub const fn state(&self) -> &JointStateHandle {
        &self.state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
