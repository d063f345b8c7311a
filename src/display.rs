pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub const CELL_COUNT: usize = WIDTH * HEIGHT;

/// Monochrome 64x32 grid, one byte per cell (0 or 1), linear index `y * 64 + x`.
pub struct FrameBuffer {
    bit_buffer: Box<[u8; CELL_COUNT]>,
    dirty: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bit_buffer: Box::new([0; CELL_COUNT]),
            dirty: false,
        }
    }

    /// 00E0, also used by engine reset. Both leave the flag for the host.
    pub fn clear_buffer(&mut self) {
        self.bit_buffer.fill(0);
        self.dirty = true;
    }

    /// XORs an 8-pixel wide sprite onto the grid at (x, y). Every pixel wraps
    /// around the edges on its own. Returns true if any set pixel was erased.
    pub fn paint(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        log::debug!("painting sprite at ({x}, {y}): {sprite:02X?}");
        let mut vf = false;
        for (i, row) in sprite.iter().enumerate() {
            let ny = (y as usize + i) % HEIGHT;
            for j in 0..8 {
                let bit = (row >> (7 - j)) & 1;
                if bit == 0 {
                    continue;
                }
                let nx = (x as usize + j) % WIDTH;
                let index = ny * WIDTH + nx;
                if self.bit_buffer[index] == 1 {
                    vf = true;
                }
                self.bit_buffer[index] ^= 1;
            }
        }
        self.dirty = true;
        vf
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.bit_buffer[(y % HEIGHT) * WIDTH + (x % WIDTH)] == 1
    }

    pub fn cells(&self) -> &[u8; CELL_COUNT] {
        &self.bit_buffer
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
