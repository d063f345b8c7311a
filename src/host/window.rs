use anyhow::bail;
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

use emuchip::{HEIGHT, WIDTH};

const ON: u32 = 0x00_7F_FF;
const OFF: u32 = 0x00_00_00;

pub struct Screen {
    pixel_buffer: Vec<u32>,
    window: Window,
}

impl Screen {
    pub fn new(scale: u8) -> anyhow::Result<Self> {
        let scale = match scale {
            1 => Scale::X1,
            2 => Scale::X2,
            4 => Scale::X4,
            8 => Scale::X8,
            16 => Scale::X16,
            32 => Scale::X32,
            other => bail!("unsupported scale {other}"),
        };
        let mut window = Window::new(
            "emuchip - ESC to exit",
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale,
                ..WindowOptions::default()
            },
        )?;
        // Limit to max ~60 fps update rate
        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));
        Ok(Self {
            pixel_buffer: vec![OFF; WIDTH * HEIGHT],
            window,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_pressed(Key::Escape, KeyRepeat::Yes)
    }

    pub fn pressed_keys(&self) -> Vec<Key> {
        self.window.get_keys()
    }

    pub fn render(&mut self, cells: &[u8]) -> anyhow::Result<()> {
        for (pixel, &cell) in self.pixel_buffer.iter_mut().zip(cells) {
            *pixel = if cell == 1 { ON } else { OFF };
        }
        self.window
            .update_with_buffer(&self.pixel_buffer, WIDTH, HEIGHT)?;
        Ok(())
    }

    /// Pumps window events without touching the picture.
    pub fn update(&mut self) {
        self.window.update();
    }
}
