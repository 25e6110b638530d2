//! Text dump of a retained trellis, for debugging models.
//!
//! ```
//! use hmm_viterbi::{inspect::TrellisTable, Decoder, Model};
//!
//! let mut model: Model<u64, u64> = Model::new();
//! model.add_state(1);
//! model.add_observation(5);
//! model.put_start_probability(&1, 0.5);
//! model.put_emission_probability(&1, &5, 0.5);
//!
//! let best = Decoder::builder().retain_trellis(true).build().eval_path(&model).unwrap();
//! let table = TrellisTable::new(&model, best.trellis().unwrap()).to_string();
//! assert!(table.contains("0.25"));
//! ```

use std::fmt;

use crate::model::Model;
use crate::traits::Identified;
use crate::trellis::Trellis;

/// Renders one row per state (registration order) and one column per step.
///
/// A present cell shows `score<-predecessor`, where the predecessor is a state
/// identity (`score` alone on the first step). Absent cells show `.`.
pub struct TrellisTable<'a, S, O> {
    model: &'a Model<S, O>,
    trellis: &'a Trellis,
    precision: Option<usize>,
}

impl<'a, S: Identified, O: Identified> TrellisTable<'a, S, O> {
    pub fn new(model: &'a Model<S, O>, trellis: &'a Trellis) -> Self {
        Self {
            model,
            trellis,
            precision: None,
        }
    }

    /// Print scores with a fixed number of decimals instead of the shortest
    /// round-trip form.
    pub fn with_precision(mut self, decimals: usize) -> Self {
        self.precision = Some(decimals);
        self
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let states = self.model.states();
        let steps = self.trellis.len();
        let mut rows = Vec::with_capacity(states.len() + 1);

        let mut header = Vec::with_capacity(steps + 1);
        header.push("state".to_string());
        for (t, obs) in self.model.observations().iter().take(steps).enumerate() {
            header.push(format!("t{t}:{}", obs.id()));
        }
        rows.push(header);

        for (idx, state) in states.iter().enumerate() {
            let mut row = Vec::with_capacity(steps + 1);
            row.push(state.id().to_string());
            for layer in self.trellis.layers() {
                let cell = match layer.get(idx) {
                    None => ".".to_string(),
                    Some(cell) => {
                        let score = match self.precision {
                            Some(p) => format!("{:.*}", p, cell.score),
                            None => format!("{}", cell.score),
                        };
                        match cell.predecessor {
                            Some(pred) => format!("{score}<-{}", states[pred].id()),
                            None => score,
                        }
                    }
                };
                row.push(cell);
            }
            rows.push(row);
        }
        rows
    }
}

impl<S: Identified, O: Identified> fmt::Display for TrellisTable<'_, S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|c| {
                rows.iter()
                    .filter_map(|r| r.get(c))
                    .map(String::len)
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for row in &rows {
            let mut line = String::new();
            for (c, text) in row.iter().enumerate() {
                if c > 0 {
                    line.push_str("  ");
                }
                line.push_str(&format!("{text:>width$}", width = widths[c]));
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
