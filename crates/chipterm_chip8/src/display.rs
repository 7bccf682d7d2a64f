use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Monochrome 64x32 bitmap with XOR sprite blitting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [bool; SCREEN_WIDTH * SCREEN_HEIGHT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        FrameBuffer {
            pixels: [false; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }
}

impl FrameBuffer {
    pub fn clear(&mut self) {
        self.pixels = [false; SCREEN_WIDTH * SCREEN_HEIGHT];
    }

    /// XOR `sprite` (one byte per row, MSB leftmost) onto the bitmap with its
    /// top-left corner at `(x, y)`. Rows and columns wrap around the edges.
    /// Returns whether any lit pixel was switched off.
    pub fn draw_sprite(&mut self, sprite: &[u8], x: u8, y: u8) -> bool {
        let x_coord = x as usize;
        let y_coord = y as usize;
        let mut collision = false;
        for (row, pixels) in sprite.iter().enumerate() {
            for col in 0..8 {
                if (pixels >> (7 - col)) & 0x1 == 0 {
                    continue;
                }
                let x = (x_coord + col) % SCREEN_WIDTH;
                let y = (y_coord + row) % SCREEN_HEIGHT;
                let screen_pixel = &mut self.pixels[x + y * SCREEN_WIDTH];
                collision |= *screen_pixel;
                *screen_pixel ^= true;
            }
        }
        collision
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(x % SCREEN_WIDTH) + (y % SCREEN_HEIGHT) * SCREEN_WIDTH]
    }

    /// Coordinates of every lit pixel, row by row.
    pub fn lit(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| (i % SCREEN_WIDTH, i / SCREEN_WIDTH))
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| !p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FONTSET;

    #[test]
    fn draws_msb_first() {
        let mut fb = FrameBuffer::default();
        assert!(!fb.draw_sprite(&[0b1000_0001], 0, 0));
        assert!(fb.pixel(0, 0));
        assert!(!fb.pixel(1, 0));
        assert!(fb.pixel(7, 0));
        assert_eq!(fb.lit().count(), 2);
    }

    #[test]
    fn double_draw_erases_and_reports_collision() {
        let mut fb = FrameBuffer::default();
        let glyph = &FONTSET[0..5];
        assert!(!fb.draw_sprite(glyph, 10, 12));
        assert!(!fb.is_blank());
        assert!(fb.draw_sprite(glyph, 10, 12));
        assert!(fb.is_blank());
    }

    #[test]
    fn wraps_both_axes() {
        let mut fb = FrameBuffer::default();
        fb.draw_sprite(&[0xFF, 0xFF], 60, 31);
        assert!(fb.pixel(63, 31));
        assert!(fb.pixel(0, 31));
        assert!(fb.pixel(3, 31));
        assert!(fb.pixel(60, 0));
        assert!(fb.pixel(3, 0));
        assert!(!fb.pixel(4, 0));
    }

    #[test]
    fn partial_overlap_still_collides() {
        let mut fb = FrameBuffer::default();
        fb.draw_sprite(&[0x01], 0, 0);
        assert!(fb.draw_sprite(&[0x03], 0, 0));
        assert!(!fb.pixel(7, 0));
        assert!(fb.pixel(6, 0));
    }

    #[test]
    fn clear_blanks_everything() {
        let mut fb = FrameBuffer::default();
        fb.draw_sprite(&[0xFF; 15], 5, 5);
        fb.clear();
        assert!(fb.is_blank());
    }
}
