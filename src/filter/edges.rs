use rayon::prelude::*;

use crate::foundation::core::Field;

/// Sobel gradient magnitude. The one-pixel border is left at zero.
pub fn sobel_magnitude(gray: &Field) -> Field {
    let (w, h) = (gray.width(), gray.height());
    let mut data = vec![0f32; w * h];
    if w < 3 || h < 3 {
        return Field::from_raw(w, h, data);
    }

    data.par_chunks_mut(w)
        .enumerate()
        .skip(1)
        .take(h - 2)
        .for_each(|(y, row)| {
            for x in 1..w - 1 {
                let p = |dx: usize, dy: usize| gray.at(x + dx - 1, y + dy - 1);
                let gx = -p(0, 0) + p(2, 0) - 2.0 * p(0, 1) + 2.0 * p(2, 1) - p(0, 2) + p(2, 2);
                let gy = -p(0, 0) - 2.0 * p(1, 0) - p(2, 0) + p(0, 2) + 2.0 * p(1, 2) + p(2, 2);
                row[x] = (gx * gx + gy * gy).sqrt();
            }
        });
    Field::from_raw(w, h, data)
}

/// Sobel magnitude normalized by its own maximum, in `[0, 1]`.
///
/// A flat image (maximum zero) yields an all-zero field.
pub fn edge_strength(gray: &Field) -> Field {
    let mut g = sobel_magnitude(gray);
    let max = g.data().iter().copied().fold(0f32, f32::max);
    if max > 0.0 {
        for v in g.data_mut() {
            *v = (*v / max).min(1.0);
        }
    }
    g
}

#[cfg(test)]
#[path = "../../tests/unit/filter/edges.rs"]
mod tests;
