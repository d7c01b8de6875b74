//! Ordered in-memory solve collection.

use cubetime_types::{PuzzleType, Solve, SolveId};
use serde::{Deserialize, Serialize};

/// Solves in insertion (chronological) order.
///
/// Serializes as a bare JSON array so the persisted and wire forms are the
/// same list the remote store keeps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveStore {
    solves: Vec<Solve>,
}

impl SolveStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing list, keeping its order.
    pub fn from_solves(solves: Vec<Solve>) -> Self {
        Self { solves }
    }

    /// Append a solve.
    pub fn push(&mut self, solve: Solve) {
        self.solves.push(solve);
    }

    /// Most recent solve.
    pub fn last(&self) -> Option<&Solve> {
        self.solves.last()
    }

    /// Solve by id.
    pub fn get(&self, id: &SolveId) -> Option<&Solve> {
        self.solves.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &SolveId) -> Option<&mut Solve> {
        self.solves.iter_mut().find(|s| &s.id == id)
    }

    /// Flip DNF on a solve. Returns false when the id is unknown.
    pub fn toggle_dnf(&mut self, id: &SolveId) -> bool {
        match self.get_mut(id) {
            Some(solve) => {
                solve.toggle_dnf();
                true
            }
            None => false,
        }
    }

    /// Flip +2 on a solve. Returns false when the id is unknown or the
    /// solve is a DNF.
    pub fn toggle_plus_two(&mut self, id: &SolveId) -> bool {
        self.get_mut(id).is_some_and(Solve::toggle_plus_two)
    }

    /// Remove a solve, returning it.
    pub fn delete(&mut self, id: &SolveId) -> Option<Solve> {
        let index = self.solves.iter().position(|s| &s.id == id)?;
        Some(self.solves.remove(index))
    }

    /// [`toggle_dnf`](Self::toggle_dnf) on the most recent solve.
    pub fn toggle_dnf_last(&mut self) -> bool {
        match self.solves.last_mut() {
            Some(solve) => {
                solve.toggle_dnf();
                true
            }
            None => false,
        }
    }

    /// [`toggle_plus_two`](Self::toggle_plus_two) on the most recent solve.
    pub fn toggle_plus_two_last(&mut self) -> bool {
        self.solves.last_mut().is_some_and(Solve::toggle_plus_two)
    }

    /// Remove the most recent solve.
    pub fn delete_last(&mut self) -> Option<Solve> {
        self.solves.pop()
    }

    /// Remove every solve.
    pub fn clear(&mut self) {
        self.solves.clear();
    }

    /// Replace the whole list. Used when a newer remote copy wins.
    pub fn replace_all(&mut self, solves: Vec<Solve>) {
        self.solves = solves;
    }

    /// Solves of one puzzle type, in order. Legacy solves count as 3x3.
    pub fn filtered(&self, puzzle: PuzzleType) -> Vec<Solve> {
        self.solves
            .iter()
            .filter(|s| s.puzzle() == puzzle)
            .cloned()
            .collect()
    }

    /// Number of solves.
    pub fn len(&self) -> usize {
        self.solves.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.solves.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Solve> {
        self.solves.iter()
    }

    /// The whole list as a slice.
    pub fn as_slice(&self) -> &[Solve] {
        &self.solves
    }

    /// Take the list out.
    pub fn into_vec(self) -> Vec<Solve> {
        self.solves
    }
}

impl<'a> IntoIterator for &'a SolveStore {
    type Item = &'a Solve;
    type IntoIter = std::slice::Iter<'a, Solve>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
