//! Ordered subsets of a model's DOFs.

use std::collections::HashMap;

use crate::error::DynamicsError;
use crate::model::{DofIndex, DynamicsModel};

/// An ordered selection of DOFs from one model, plus a name → position map.
///
/// Position `i` of the group is the `i`-th DOF in the order it was added,
/// which for controllers is the order the joints were configured in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DofGroup {
    indices: Vec<DofIndex>,
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl DofGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `names` against `model`, in order.
    ///
    /// Fails on the first name the model does not know, or on a repeat.
    pub fn resolve<M, S>(model: &M, names: &[S]) -> Result<Self, DynamicsError>
    where
        M: DynamicsModel + ?Sized,
        S: AsRef<str>,
    {
        let mut group = Self::new();
        for name in names {
            let name = name.as_ref();
            let index = model
                .dof_index(name)
                .ok_or_else(|| DynamicsError::UnknownDof(name.to_owned()))?;
            group.push(name, index)?;
        }
        Ok(group)
    }

    /// Append a DOF. Returns its position in the group.
    pub fn push(&mut self, name: &str, index: DofIndex) -> Result<usize, DynamicsError> {
        if self.positions.contains_key(name) {
            return Err(DynamicsError::DuplicateDof(name.to_owned()));
        }
        let position = self.indices.len();
        self.indices.push(index);
        self.names.push(name.to_owned());
        self.positions.insert(name.to_owned(), position);
        Ok(position)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Model indices in group order.
    pub fn indices(&self) -> &[DofIndex] {
        &self.indices
    }

    /// DOF names in group order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Group position of the DOF called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Model index at group position `position`.
    pub fn index(&self, position: usize) -> Option<DofIndex> {
        self.indices.get(position).copied()
    }

    /// Whether the group contains the model DOF `index`.
    pub fn contains(&self, index: DofIndex) -> bool {
        self.indices.contains(&index)
    }

    /// `(name, model index)` pairs in group order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DofIndex)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.indices.iter().copied())
    }
}
