//! Mock implementations of the dynamics traits for testing.
//!
//! [`MockModel`] records the DOF state it sees at every solve and answers
//! with preset forces, so controller tests can check exactly what was fed
//! into the dynamics and where its output ended up.

use std::collections::HashSet;

use gravcomp_dynamics::{DofIndex, DofState, DynamicsError, DynamicsModel, ModelLoader};
use gravcomp_urdf::{ResourceRetriever, UrdfError};

// ---------------------------------------------------------------------------
// MockModel
// ---------------------------------------------------------------------------

/// A flat list of named DOFs with scripted inverse dynamics.
#[derive(Debug, Clone)]
pub struct MockModel {
    names: Vec<String>,
    states: Vec<DofState>,
    forces: Vec<f64>,
    hidden: HashSet<usize>,
    solves: Vec<Vec<DofState>>,
}

impl MockModel {
    /// DOFs named `names`, each solving to force `0.0`.
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| (*n).to_owned()).collect(),
            states: vec![DofState::default(); names.len()],
            forces: vec![0.0; names.len()],
            hidden: HashSet::new(),
            solves: Vec::new(),
        }
    }

    /// Builder: force reported for each DOF, in model order.
    #[must_use]
    pub fn with_forces(mut self, forces: &[f64]) -> Self {
        assert_eq!(forces.len(), self.names.len(), "one force per DOF");
        self.forces = forces.to_vec();
        self
    }

    /// Make the DOF called `name` vanish from index lookups, as if the
    /// model had changed underneath its users.
    pub fn hide_dof(&mut self, name: &str) {
        if let Some(i) = self.names.iter().position(|n| n == name) {
            self.hidden.insert(i);
        }
    }

    /// DOF states captured at the start of every solve, oldest first.
    pub fn solves(&self) -> &[Vec<DofState>] {
        &self.solves
    }

    /// State of the DOF called `name`, ignoring hidden DOFs.
    pub fn state_of(&self, name: &str) -> Option<&DofState> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.states[i])
    }
}

impl DynamicsModel for MockModel {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    fn num_dofs(&self) -> usize {
        self.names.len()
    }

    fn dof_index(&self, name: &str) -> Option<DofIndex> {
        self.names.iter().position(|n| n == name).map(DofIndex)
    }

    fn dof_name(&self, index: DofIndex) -> Option<&str> {
        self.names.get(index.0).map(String::as_str)
    }

    fn dof(&self, index: DofIndex) -> Option<&DofState> {
        if self.hidden.contains(&index.0) {
            return None;
        }
        self.states.get(index.0)
    }

    fn dof_mut(&mut self, index: DofIndex) -> Option<&mut DofState> {
        if self.hidden.contains(&index.0) {
            return None;
        }
        self.states.get_mut(index.0)
    }

    fn compute_inverse_dynamics(&mut self) {
        self.solves.push(self.states.clone());
        for (state, force) in self.states.iter_mut().zip(&self.forces) {
            state.force = *force;
        }
    }
}

// ---------------------------------------------------------------------------
// MockLoader
// ---------------------------------------------------------------------------

/// Hands out clones of a prepared [`MockModel`], ignoring the description,
/// or fails every load.
#[derive(Debug, Clone)]
pub struct MockLoader {
    model: Option<MockModel>,
}

impl MockLoader {
    pub const fn new(model: MockModel) -> Self {
        Self { model: Some(model) }
    }

    /// A loader whose every load fails with a parse error.
    pub const fn failing() -> Self {
        Self { model: None }
    }
}

impl ModelLoader for MockLoader {
    type Model = MockModel;

    fn load(
        &self,
        _description: &str,
        _retriever: &dyn ResourceRetriever,
    ) -> Result<MockModel, DynamicsError> {
        self.model
            .clone()
            .ok_or_else(|| UrdfError::Parse("mock loader refuses every description".into()).into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
