//! Trellis built by the forward pass.
//!
//! One [`Layer`] per time step. A layer is sparse: it holds a [`Cell`] only
//! for states that can explain the observations up to that step, ordered by
//! state registration index. That order is the tie-break order everywhere.

/// Best way of being in `state` at one time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Registration index of the state.
    pub state: usize,
    /// Best chained score reaching `state` at this step.
    pub score: f64,
    /// Registration index of the best predecessor; `None` on the first layer.
    pub predecessor: Option<usize>,
}

/// Reachable states at one time step, sorted by registration index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    cells: Vec<Cell>,
}

impl Layer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Append a cell. Cells must arrive in increasing state order.
    pub(crate) fn push(&mut self, cell: Cell) {
        debug_assert!(
            self.cells.last().map_or(true, |last| last.state < cell.state),
            "layer cells must be pushed in registration order"
        );
        self.cells.push(cell);
    }

    #[inline]
    pub fn get(&self, state: usize) -> Option<&Cell> {
        self.cells
            .binary_search_by_key(&state, |c| c.state)
            .ok()
            .map(|i| &self.cells[i])
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Highest-scoring cell; on ties the lowest registration index wins.
    pub fn best(&self) -> Option<&Cell> {
        let mut best: Option<&Cell> = None;
        for cell in &self.cells {
            if best.map_or(true, |b| cell.score > b.score) {
                best = Some(cell);
            }
        }
        best
    }
}

impl<'a> IntoIterator for &'a Layer {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A predecessor link that backtracking could not follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingLink {
    pub step: usize,
    /// Registration index of the state whose cell or predecessor is missing.
    pub state: usize,
}

/// All layers of one decode, in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trellis {
    layers: Vec<Layer>,
}

impl Trellis {
    pub fn with_capacity(steps: usize) -> Self {
        Self {
            layers: Vec::with_capacity(steps),
        }
    }

    pub(crate) fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Number of time steps filled so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    #[inline]
    pub fn layer(&self, step: usize) -> Option<&Layer> {
        self.layers.get(step)
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn last(&self) -> Option<&Layer> {
        self.layers.last()
    }

    /// Follow predecessor links from `terminal` on the last layer back to the
    /// first one. Returns registration indices in forward time order.
    pub fn backtrack(&self, terminal: usize) -> Result<Vec<usize>, MissingLink> {
        let Some(last_step) = self.layers.len().checked_sub(1) else {
            return Ok(Vec::new());
        };
        let mut path = vec![0usize; self.layers.len()];
        let mut state = terminal;
        let mut cell = self.layers[last_step].get(state).ok_or(MissingLink {
            step: last_step,
            state,
        })?;
        path[last_step] = state;

        for step in (1..=last_step).rev() {
            state = cell
                .predecessor
                .ok_or(MissingLink { step, state })?;
            cell = self.layers[step - 1].get(state).ok_or(MissingLink {
                step: step - 1,
                state,
            })?;
            path[step - 1] = state;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(state: usize, score: f64, predecessor: Option<usize>) -> Cell {
        Cell {
            state,
            score,
            predecessor,
        }
    }

    fn layer(cells: &[Cell]) -> Layer {
        let mut l = Layer::with_capacity(cells.len());
        for &c in cells {
            l.push(c);
        }
        l
    }

    #[test]
    fn sparse_lookup() {
        let l = layer(&[cell(1, 0.5, None), cell(4, 0.25, None)]);
        assert_eq!(l.get(4).map(|c| c.score), Some(0.25));
        assert!(l.get(2).is_none());
        assert_eq!(l.len(), 2);
        assert!(!l.is_empty());
    }

    #[test]
    fn best_prefers_first_on_ties() {
        let l = layer(&[
            cell(0, 0.1, None),
            cell(2, 0.4, None),
            cell(3, 0.4, None),
        ]);
        assert_eq!(l.best().map(|c| c.state), Some(2));
        assert!(Layer::default().best().is_none());
    }

    #[test]
    fn backtrack_follows_links() {
        let mut t = Trellis::with_capacity(3);
        t.push(layer(&[cell(0, 0.3, None), cell(1, 0.04, None)]));
        t.push(layer(&[cell(0, 0.084, Some(0)), cell(1, 0.027, Some(0))]));
        t.push(layer(&[cell(0, 0.00588, Some(0)), cell(1, 0.01512, Some(0))]));
        assert_eq!(t.backtrack(1), Ok(vec![0, 0, 1]));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn backtrack_reports_missing_predecessor() {
        let mut t = Trellis::default();
        t.push(layer(&[cell(0, 1.0, None)]));
        t.push(layer(&[cell(1, 0.5, None)]));
        assert_eq!(t.backtrack(1), Err(MissingLink { step: 1, state: 1 }));
    }

    #[test]
    fn backtrack_reports_dangling_predecessor() {
        let mut t = Trellis::default();
        t.push(layer(&[cell(0, 1.0, None)]));
        t.push(layer(&[cell(1, 0.5, Some(3))]));
        assert_eq!(t.backtrack(1), Err(MissingLink { step: 0, state: 3 }));
    }

    #[test]
    fn backtrack_reports_unknown_terminal() {
        let mut t = Trellis::default();
        t.push(layer(&[cell(0, 1.0, None)]));
        assert_eq!(t.backtrack(5), Err(MissingLink { step: 0, state: 5 }));
    }

    #[test]
    fn empty_trellis_backtracks_to_nothing() {
        assert_eq!(Trellis::default().backtrack(0), Ok(Vec::new()));
    }
}
