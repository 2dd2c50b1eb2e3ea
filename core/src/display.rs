use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// Monochrome 64x32 frame buffer, one byte per cell holding 0 or 1, row-major
#[derive(Clone)]
pub struct DisplayBuffer {
    cells: [u8; SCREEN_WIDTH * SCREEN_HEIGHT],
    /// Set whenever a cell may have changed, cleared by the presenter
    dirty: bool,
}

impl Default for DisplayBuffer {
    fn default() -> DisplayBuffer {
        DisplayBuffer {
            cells: [0u8; SCREEN_WIDTH * SCREEN_HEIGHT],
            dirty: true,
        }
    }
}

impl DisplayBuffer {
    pub fn buffer(&self) -> &[u8] {
        &self.cells[..]
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[y * SCREEN_WIDTH + x] != 0
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
        self.dirty = true;
    }

    /// XOR one cell with 1, returns true if the cell went from set to unset
    pub fn flip(&mut self, x: usize, y: usize) -> bool {
        let idx = y * SCREEN_WIDTH + x;
        let erased = self.cells[idx] == 1;
        self.cells[idx] ^= 1;
        self.dirty = true;
        erased
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledge the current contents, returns the previous dirty state
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks_exact(SCREEN_WIDTH)
    }
}

/// ASCII frame, `X` for set cells
impl fmt::Display for DisplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "_".repeat(SCREEN_WIDTH);
        writeln!(f, "{}", rule)?;
        for row in self.rows() {
            write!(f, "|")?;
            for cell in row {
                write!(f, "{}", if *cell != 0 { 'X' } else { ' ' })?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{}", rule)
    }
}
