pub const KEY_COUNT: usize = 16;

/// Hex keypad state. Written by the host, read by the engine.
pub struct Keypad {
    keys: Box<[bool; KEY_COUNT]>,
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            keys: Box::new([false; KEY_COUNT]),
        }
    }

    pub fn set(&mut self, key: u8, pressed: bool) {
        self.keys[(key & 0xF) as usize] = pressed;
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// Bit `k` set when key `k` is down.
    pub fn pressed_mask(&self) -> u16 {
        self.keys
            .iter()
            .enumerate()
            .filter(|&(_, &down)| down)
            .fold(0, |mask, (k, _)| mask | (1u16 << k))
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut [bool; KEY_COUNT] {
        &mut self.keys
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}
