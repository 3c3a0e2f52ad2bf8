use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse on 2D grids.
///
/// The grid is row-major `nrows x ncols`; rows are transformed in place in
/// one pass, columns through a reusable scratch buffer.
pub struct FftHelper {
    row_fft: Arc<dyn Fft<f64>>,
    col_fft: Arc<dyn Fft<f64>>,
    nrows: usize,
    ncols: usize,
    col_scratch: Vec<Complex64>,
    fft_scratch: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        let mut planner = FftPlanner::new();
        let row_fft = planner.plan_fft_forward(ncols);
        let col_fft = planner.plan_fft_forward(nrows);
        let scratch_len = row_fft
            .get_inplace_scratch_len()
            .max(col_fft.get_inplace_scratch_len());
        Self {
            row_fft,
            col_fft,
            nrows,
            ncols,
            col_scratch: vec![Complex64::default(); nrows],
            fft_scratch: vec![Complex64::default(); scratch_len],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Forward 2D transform of a row-major grid, in place.
    pub fn forward(&mut self, grid: &mut [Complex64]) {
        debug_assert_eq!(grid.len(), self.nrows * self.ncols);

        self.row_fft.process_with_scratch(grid, &mut self.fft_scratch);

        for col in 0..self.ncols {
            for row in 0..self.nrows {
                self.col_scratch[row] = grid[row * self.ncols + col];
            }
            self.col_fft
                .process_with_scratch(&mut self.col_scratch, &mut self.fft_scratch);
            for row in 0..self.nrows {
                grid[row * self.ncols + col] = self.col_scratch[row];
            }
        }
    }
}
