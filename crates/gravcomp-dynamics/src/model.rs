//! The seam between controllers and a rigid-body dynamics engine.
//!
//! A controller only ever talks to a [`DynamicsModel`]: it writes joint
//! state, asks for inverse dynamics, and reads back generalized forces. A
//! [`ModelLoader`] turns description text into such a model.

use std::fmt;

use gravcomp_urdf::ResourceRetriever;

use crate::error::DynamicsError;

// ---------------------------------------------------------------------------
// DofIndex
// ---------------------------------------------------------------------------

/// Position of a degree of freedom inside its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DofIndex(pub usize);

impl DofIndex {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DofIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// DofState
// ---------------------------------------------------------------------------

/// Generalized state of one DOF.
///
/// `force` is an output: it is overwritten by
/// [`DynamicsModel::compute_inverse_dynamics`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DofState {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub force: f64,
}

// ---------------------------------------------------------------------------
// DynamicsModel
// ---------------------------------------------------------------------------

/// A kinematic tree whose DOFs can be written and whose inverse dynamics can
/// be evaluated.
pub trait DynamicsModel: Send {
    /// Model (robot) name.
    fn name(&self) -> &str;

    /// Number of DOFs in the model.
    fn num_dofs(&self) -> usize;

    /// Look up a DOF by name.
    fn dof_index(&self, name: &str) -> Option<DofIndex>;

    /// Name of the DOF at `index`.
    fn dof_name(&self, index: DofIndex) -> Option<&str>;

    fn dof(&self, index: DofIndex) -> Option<&DofState>;

    fn dof_mut(&mut self, index: DofIndex) -> Option<&mut DofState>;

    /// Compute the generalized forces that realize the current positions,
    /// velocities and accelerations, storing them in each [`DofState::force`].
    ///
    /// Must not allocate.
    fn compute_inverse_dynamics(&mut self);

    /// All DOF names in model order.
    fn dof_names(&self) -> Vec<&str> {
        (0..self.num_dofs())
            .filter_map(|i| self.dof_name(DofIndex(i)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ModelLoader
// ---------------------------------------------------------------------------

/// Builds a [`DynamicsModel`] from robot description text.
pub trait ModelLoader: Send {
    type Model: DynamicsModel + 'static;

    /// Parse `description` and build a model. Resource URIs inside the
    /// description are resolved through `retriever`.
    fn load(
        &self,
        description: &str,
        retriever: &dyn ResourceRetriever,
    ) -> Result<Self::Model, DynamicsError>;
}
