//! Routing matrix mirror
//!
//! Best-effort copy of the switcher's ties, built from the tie reports the
//! device sends. Stored output-major: one row per output, one flag per
//! input. A row holds at most one set flag because an output can only be
//! fed by one input at a time.

use dxp_protocol::DxpModel;

/// Output-major table of input flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixState {
    inputs: u8,
    outputs: u8,
    rows: Vec<Vec<bool>>,
}

impl MatrixState {
    /// Create an all-clear matrix
    pub fn new(inputs: u8, outputs: u8) -> Self {
        Self {
            inputs,
            outputs,
            rows: vec![vec![false; usize::from(inputs)]; usize::from(outputs)],
        }
    }

    /// Create an all-clear matrix sized for a model
    pub fn for_model(model: DxpModel) -> Self {
        Self::new(model.inputs(), model.outputs())
    }

    /// Re-create the matrix at a model's size, clearing every tie
    pub fn resize(&mut self, model: DxpModel) {
        *self = Self::for_model(model);
    }

    /// Number of inputs (columns)
    pub fn inputs(&self) -> u8 {
        self.inputs
    }

    /// Number of outputs (rows)
    pub fn outputs(&self) -> u8 {
        self.outputs
    }

    /// Record that `output` is fed by `input` (both 1-based)
    ///
    /// Every other flag in the output's row is cleared. Numbers that are
    /// zero or beyond the matrix are ignored. Returns true if the row changed.
    pub fn apply_tie(&mut self, output: u8, input: u8) -> bool {
        let Some(row) = self.row_index(output) else {
            return false;
        };
        let Some(col) = self.col_index(input) else {
            return false;
        };

        let row = &mut self.rows[row];
        let changed = row
            .iter()
            .enumerate()
            .any(|(i, &set)| set != (i == col));

        for (i, flag) in row.iter_mut().enumerate() {
            *flag = i == col;
        }
        changed
    }

    /// Clear every tie
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.iter_mut().for_each(|flag| *flag = false);
        }
    }

    /// Returns true if `input` feeds `output` (both 1-based)
    pub fn is_routed(&self, input: u8, output: u8) -> bool {
        match (self.col_index(input), self.row_index(output)) {
            (Some(col), Some(row)) => self.rows[row][col],
            _ => false,
        }
    }

    /// The 1-based input feeding a 1-based output, if any
    pub fn source_of(&self, output: u8) -> Option<u8> {
        let row = self.row_index(output)?;
        self.rows[row]
            .iter()
            .position(|&set| set)
            .map(|col| col as u8 + 1)
    }

    /// Number of outputs a 1-based input feeds
    pub fn usage_count(&self, input: u8) -> usize {
        let Some(col) = self.col_index(input) else {
            return 0;
        };
        self.rows.iter().filter(|row| row[col]).count()
    }

    /// Number of outputs with a tie
    pub fn active_routes(&self) -> usize {
        self.rows.iter().filter(|row| row.contains(&true)).count()
    }

    /// Number of outputs without a tie
    pub fn disconnected_outputs(&self) -> usize {
        usize::from(self.outputs) - self.active_routes()
    }

    /// Flags for a 1-based output, one per input
    pub fn row(&self, output: u8) -> Option<&[bool]> {
        self.row_index(output).map(|row| self.rows[row].as_slice())
    }

    /// Iterate over rows in output order
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.rows.iter().map(Vec::as_slice)
    }

    fn row_index(&self, output: u8) -> Option<usize> {
        (output >= 1 && output <= self.outputs).then(|| usize::from(output - 1))
    }

    fn col_index(&self, input: u8) -> Option<usize> {
        (input >= 1 && input <= self.inputs).then(|| usize::from(input - 1))
    }
}
