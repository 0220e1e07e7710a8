/// Dense score matrix, one row per graph rank plus the virtual start row 0,
/// one column per read position plus column 0.
///
/// The storage is allocated once for the largest graph and read the window
/// admits, and reused for every read.
#[derive(Debug, Clone)]
pub(crate) struct ScoreMatrix {
    scores: Vec<i32>,
    max_rows: usize,
    stride: usize,
}

impl ScoreMatrix {
    pub fn new(max_rows: usize, max_cols: usize) -> Self {
        Self {
            scores: vec![0; max_rows * max_cols],
            max_rows,
            stride: max_cols,
        }
    }

    #[inline(always)]
    pub fn fits(&self, rows: usize, cols: usize) -> bool {
        rows <= self.max_rows && cols <= self.stride
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.scores[row * self.stride + col]
    }

    #[inline(always)]
    pub fn set(&mut self, row: usize, col: usize, score: i32) {
        self.scores[row * self.stride + col] = score;
    }

    /// Mutable view of a single row
    #[inline(always)]
    pub fn row_mut(&mut self, row: usize) -> &mut [i32] {
        let start = row * self.stride;
        &mut self.scores[start..start + self.stride]
    }
}
