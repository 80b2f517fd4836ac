// src/font/atlas.rs

//! Shelf packer for glyph atlases.
//!
//! Rectangles are placed left to right on horizontal shelves; a new shelf
//! opens above the last one when no existing shelf fits. Every allocation
//! keeps `padding` empty texels to its right and above it so bilinear
//! sampling never bleeds between glyphs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shelf {
    y: usize,
    height: usize,
    cursor_x: usize,
}

#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: usize,
    height: usize,
    padding: usize,
    shelves: Vec<Shelf>,
}

impl ShelfPacker {
    pub fn new(width: usize, height: usize, padding: usize) -> Self {
        Self {
            width,
            height,
            padding,
            shelves: Vec::new(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Forgets every allocation and adopts a new size.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.shelves.clear();
    }

    /// Finds room for a `w` x `h` rectangle.
    ///
    /// # Returns
    /// The lower-left texel of the allocation, or None when the atlas is full
    pub fn allocate(&mut self, w: usize, h: usize) -> Option<(usize, usize)> {
        let (pw, ph) = (w + self.padding, h + self.padding);
        let width = self.width;
        if pw > width {
            return None;
        }

        // Tightest shelf that fits.
        let best = self
            .shelves
            .iter_mut()
            .filter(|s| s.height >= ph && s.cursor_x + pw <= width)
            .min_by_key(|s| s.height);
        if let Some(shelf) = best {
            let at = (shelf.cursor_x, shelf.y);
            shelf.cursor_x += pw;
            return Some(at);
        }

        let top = self.shelves.last().map_or(0, |s| s.y + s.height);
        if top + ph > self.height {
            return None;
        }
        self.shelves.push(Shelf {
            y: top,
            height: ph,
            cursor_x: pw,
        });
        Some((0, top))
    }
}
