//! Supersampling resolve

use super::target::RenderTarget;
use super::types::Color;

/// Block sum kept in f64 so that averaging identical samples is exact
#[derive(Default, Clone, Copy)]
struct Accum {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
    count: usize,
}

impl Accum {
    #[inline]
    fn add(mut self, c: Color) -> Self {
        self.r += c.r as f64;
        self.g += c.g as f64;
        self.b += c.b as f64;
        self.a += c.a as f64;
        self.count += 1;
        self
    }

    /// Mean of the accumulated samples, `None` for an empty block
    #[inline]
    fn mean(self) -> Option<Color> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(Color::with_alpha(
            (self.r / n) as f32,
            (self.g / n) as f32,
            (self.b / n) as f32,
            (self.a / n) as f32,
        ))
    }
}

/// Downsample `src` into `dst` with a separable box filter of width `factor`.
///
/// The first pass averages blocks of `factor` columns into a buffer of
/// `dst.width() x src.height()`; the second averages blocks of `factor`
/// rows of that buffer into `dst`. Blocks at the right and bottom edges
/// average only the samples that exist; blocks with no samples leave `dst`
/// untouched. With `factor <= 1` the overlapping region is copied as is.
pub fn resolve_box(src: &RenderTarget, dst: &mut RenderTarget, factor: usize) {
    let (src_w, src_h) = (src.width(), src.height());
    let (dst_w, dst_h) = (dst.width(), dst.height());

    if factor <= 1 {
        let w = src_w.min(dst_w);
        let h = src_h.min(dst_h);
        let from = src.pixels();
        let to = dst.pixels_mut();
        for y in 0..h {
            to[y * dst_w..y * dst_w + w].copy_from_slice(&from[y * src_w..y * src_w + w]);
        }
        return;
    }

    let from = src.pixels();

    // Horizontal pass; `None` marks a block with no source columns
    let mut rows: Vec<Option<Color>> = vec![None; dst_w * src_h];
    for y in 0..src_h {
        let line = &from[y * src_w..(y + 1) * src_w];
        for ox in 0..dst_w {
            let x0 = (ox * factor).min(src_w);
            let x1 = (x0 + factor).min(src_w);
            rows[y * dst_w + ox] = line[x0..x1].iter().fold(Accum::default(), |acc, &c| acc.add(c)).mean();
        }
    }

    // Vertical pass
    let to = dst.pixels_mut();
    for oy in 0..dst_h {
        let y0 = (oy * factor).min(src_h);
        let y1 = (y0 + factor).min(src_h);
        for ox in 0..dst_w {
            let block = (y0..y1)
                .filter_map(|y| rows[y * dst_w + ox])
                .fold(Accum::default(), Accum::add);
            if let Some(c) = block.mean() {
                to[oy * dst_w + ox] = c;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterned(w: usize, h: usize) -> RenderTarget {
        let mut t = RenderTarget::new(w, h);
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                t.set_pixel(x, y, Color::with_alpha(x as f32 / 8.0, y as f32 / 8.0, 0.25, 1.0));
            }
        }
        t
    }

    #[test]
    fn test_factor_one_is_identity() {
        let src = patterned(6, 4);
        let mut dst = RenderTarget::new(6, 4);
        resolve_box(&src, &mut dst, 1);
        assert_eq!(src.pixels(), dst.pixels());
    }

    #[test]
    fn test_uniform_blocks_resolve_exactly() {
        let colors = [Color::new(0.25, 0.5, 0.75), Color::with_alpha(0.125, 0.375, 0.625, 0.5)];
        for factor in [2usize, 4] {
            let mut src = RenderTarget::new(2 * factor, factor);
            for y in 0..factor as i32 {
                for x in 0..(2 * factor) as i32 {
                    src.set_pixel(x, y, colors[x as usize / factor]);
                }
            }
            let mut dst = RenderTarget::new(2, 1);
            resolve_box(&src, &mut dst, factor);
            assert_eq!(dst.get_pixel(0, 0), colors[0]);
            assert_eq!(dst.get_pixel(1, 0), colors[1]);
        }
    }

    #[test]
    fn test_odd_factors_resolve_exactly() {
        let color = Color::with_alpha(0.1, 0.7, 0.3, 0.9);
        for factor in [3usize, 5, 6, 7] {
            let mut src = RenderTarget::new(factor, factor);
            src.clear_color(color);
            let mut dst = RenderTarget::new(1, 1);
            resolve_box(&src, &mut dst, factor);
            assert_eq!(dst.get_pixel(0, 0), color, "factor {}", factor);
        }
    }

    #[test]
    fn test_blocks_without_samples_keep_destination() {
        let mut src = RenderTarget::new(4, 4);
        src.clear_color(Color::WHITE);
        // Destination larger than src / factor: column 2 and row 2 have no samples
        let mut dst = RenderTarget::new(3, 3);
        dst.clear_color(Color::RED);
        resolve_box(&src, &mut dst, 2);
        assert_eq!(dst.get_pixel(1, 1), Color::WHITE);
        assert_eq!(dst.get_pixel(2, 0), Color::RED);
        assert_eq!(dst.get_pixel(0, 2), Color::RED);
    }

    #[test]
    fn test_box_average() {
        let mut src = RenderTarget::new(2, 2);
        src.clear_color(Color::BLACK);
        src.set_pixel(0, 0, Color::WHITE);
        let mut dst = RenderTarget::new(1, 1);
        resolve_box(&src, &mut dst, 2);
        let c = dst.get_pixel(0, 0);
        assert_eq!((c.r, c.g, c.b, c.a), (0.25, 0.25, 0.25, 1.0));
    }
}
