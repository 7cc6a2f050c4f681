//! # Atlas — Packing Many Images Onto One Texture
//!
//! Sprites only share a draw call when they share a render state, which in
//! practice means a texture. [`AtlasPacker`] lays out many small images on
//! one large texture so they can all be drawn together.
//!
//! ## Algorithm
//!
//! The packer keeps an unbalanced binary tree over the target rectangle
//! (the "lightmap packing" scheme). Every leaf is either used or free. To
//! place a `w x h` image, the tree is searched depth-first for a free leaf
//! large enough; that leaf is split into a piece that fits the image along
//! one axis and the remainder, and the search continues in the first piece
//! until a leaf matches exactly:
//!
//! ```text
//!  ┌──────────────────────┐      ┌──────┬───────────────┐
//!  │                      │      │ a    │               │
//!  │        free          │  →   │ used │   b (free)    │
//!  │                      │      │      │               │
//!  │                      │      ├──────┤               │
//!  └──────────────────────┘      └──────┴───────────────┘
//!     split on the axis with more slack (width here)
//! ```
//!
//! Padding is added around every image so bilinear filtering never samples
//! a neighbor. The returned rectangle excludes the padding.
//!
//! Nodes live in a `Vec` and refer to their children by index.

/// One image placed in the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackedRect {
    /// Left edge of the image, inside its padding.
    pub x: u32,
    /// Top edge of the image, inside its padding.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Caller's identifier for the image.
    pub image_id: u32,
}

impl PackedRect {
    pub fn texel_rect(&self) -> crate::math::TexelRect {
        crate::math::TexelRect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    /// `[left, top, right, bottom]`.
    bound: [u32; 4],
    children: Option<[usize; 2]>,
    used: bool,
}

impl Node {
    fn leaf(bound: [u32; 4]) -> Self {
        Self {
            bound,
            children: None,
            used: false,
        }
    }

    fn width(&self) -> u32 {
        self.bound[2] - self.bound[0]
    }

    fn height(&self) -> u32 {
        self.bound[3] - self.bound[1]
    }
}

/// Binary-tree rectangle packer for a fixed-size target.
#[derive(Debug, Clone)]
pub struct AtlasPacker {
    width: u32,
    height: u32,
    free: u64,
    used: u64,
    nodes: Vec<Node>,
    rects: Vec<PackedRect>,
}

impl AtlasPacker {
    /// An empty packer for a `width` x `height` target, with storage
    /// reserved for `capacity` images.
    pub fn new(width: u32, height: u32, capacity: usize) -> Self {
        let mut packer = Self {
            width,
            height,
            free: 0,
            used: 0,
            nodes: Vec::with_capacity(capacity * 3),
            rects: Vec::with_capacity(capacity),
        };
        packer.clear();
        packer
    }

    /// Forget every placed image.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.rects.clear();
        self.nodes.push(Node::leaf([0, 0, self.width, self.height]));
        self.free = u64::from(self.width) * u64::from(self.height);
        self.used = 0;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Area not yet claimed by an image or its padding.
    pub fn free_area(&self) -> u64 {
        self.free
    }

    /// Area claimed by images, padding included.
    pub fn used_area(&self) -> u64 {
        self.used
    }

    /// Every image placed so far, in insertion order.
    pub fn rects(&self) -> &[PackedRect] {
        &self.rects
    }

    /// Place a `width` x `height` image with `h_pad` texels of padding left
    /// and right and `v_pad` above and below. Returns `None` if it does not
    /// fit anywhere.
    pub fn insert(
        &mut self,
        width: u32,
        height: u32,
        h_pad: u32,
        v_pad: u32,
        image_id: u32,
    ) -> Option<PackedRect> {
        if width == 0 || height == 0 {
            return None;
        }
        let w = width.checked_add(h_pad.checked_mul(2)?)?;
        let h = height.checked_add(v_pad.checked_mul(2)?)?;
        let area = u64::from(w) * u64::from(h);
        if area > self.free {
            return None;
        }

        let node = self.find(0, w, h)?;
        self.nodes[node].used = true;

        let rect = PackedRect {
            x: self.nodes[node].bound[0] + h_pad,
            y: self.nodes[node].bound[1] + v_pad,
            width,
            height,
            image_id,
        };
        self.rects.push(rect);
        self.free -= area;
        self.used += area;
        Some(rect)
    }

    /// Find (splitting as needed) a free leaf of exactly `w` x `h` under `n`.
    fn find(&mut self, n: usize, w: u32, h: u32) -> Option<usize> {
        let node = self.nodes[n];
        if let Some([first, second]) = node.children {
            return self.find(first, w, h).or_else(|| self.find(second, w, h));
        }
        if node.used || w > node.width() || h > node.height() {
            return None;
        }
        if w == node.width() && h == node.height() {
            return Some(n);
        }

        let [left, top, right, bottom] = node.bound;
        let (a, b) = if node.width() - w > node.height() - h {
            ([left, top, left + w, bottom], [left + w, top, right, bottom])
        } else {
            ([left, top, right, top + h], [left, top + h, right, bottom])
        };
        let first = self.nodes.len();
        self.nodes.push(Node::leaf(a));
        self.nodes.push(Node::leaf(b));
        self.nodes[n].children = Some([first, first + 1]);
        self.find(first, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: &PackedRect, b: &PackedRect) -> bool {
        a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
    }

    #[test]
    fn first_image_goes_top_left() {
        let mut packer = AtlasPacker::new(64, 64, 4);
        let r = packer.insert(16, 8, 0, 0, 1).unwrap();
        assert_eq!((r.x, r.y, r.width, r.height, r.image_id), (0, 0, 16, 8, 1));
        assert_eq!(packer.used_area(), 128);
        assert_eq!(packer.free_area(), 64 * 64 - 128);
    }

    #[test]
    fn padding_offsets_rect_and_counts_in_area() {
        let mut packer = AtlasPacker::new(32, 32, 2);
        let r = packer.insert(8, 8, 1, 2, 0).unwrap();
        assert_eq!((r.x, r.y), (1, 2));
        assert_eq!(packer.used_area(), 10 * 12);
    }

    #[test]
    fn exact_fit_fills_target() {
        let mut packer = AtlasPacker::new(32, 32, 4);
        for id in 0..4 {
            assert!(packer.insert(16, 16, 0, 0, id).is_some());
        }
        assert_eq!(packer.free_area(), 0);
        assert!(packer.insert(1, 1, 0, 0, 9).is_none());
    }

    #[test]
    fn rejects_when_too_large_or_empty() {
        let mut packer = AtlasPacker::new(32, 32, 1);
        assert!(packer.insert(33, 1, 0, 0, 0).is_none());
        assert!(packer.insert(31, 1, 1, 0, 0).is_none());
        assert!(packer.insert(0, 4, 0, 0, 0).is_none());
        assert!(packer.rects().is_empty());
    }

    #[test]
    fn many_images_never_overlap() {
        let mut packer = AtlasPacker::new(256, 256, 64);
        let mut placed = 0;
        for i in 0..64u32 {
            let w = 4 + (i * 7) % 29;
            let h = 4 + (i * 13) % 23;
            if packer.insert(w, h, 1, 1, i).is_some() {
                placed += 1;
            }
        }
        assert!(placed > 32);
        let rects = packer.rects();
        for (i, a) in rects.iter().enumerate() {
            assert!(a.x + a.width <= 256 && a.y + a.height <= 256);
            for b in &rects[i + 1..] {
                assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn clear_resets_everything() {
        let mut packer = AtlasPacker::new(16, 16, 1);
        packer.insert(16, 16, 0, 0, 0).unwrap();
        packer.clear();
        assert_eq!(packer.free_area(), 256);
        assert!(packer.rects().is_empty());
        assert!(packer.insert(16, 16, 0, 0, 1).is_some());
    }
}
