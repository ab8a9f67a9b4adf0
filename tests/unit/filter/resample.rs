use super::*;

fn ramp(w: usize, h: usize) -> Field {
    let data = (0..w * h).map(|i| i as f32 * 0.25).collect();
    Field::from_vec(w, h, data).unwrap()
}

#[test]
fn box_sum_of_constant_interior_is_full_window() {
    let f = Field::new_fill(11, 9, 0.5);
    let r = 2;
    let s = box_sum(&f, r);
    let full = ((2 * r + 1) * (2 * r + 1)) as f32;
    for y in r..9 - r {
        for x in r..11 - r {
            assert!((s.at(x, y) - full * 0.5).abs() < 1e-5);
        }
    }
}

#[test]
fn box_sum_clamps_border_windows() {
    let f = Field::new_fill(5, 5, 1.0);
    let s = box_sum(&f, 1);
    assert_eq!(s.at(0, 0), 4.0);
    assert_eq!(s.at(2, 0), 6.0);
    assert_eq!(s.at(2, 2), 9.0);
    assert_eq!(box_count(5, 5, 1).data(), s.data());
}

#[test]
fn box_sum_matches_brute_force() {
    let f = ramp(7, 6);
    let r = 2;
    let s = box_sum(&f, r);
    for y in 0..6usize {
        for x in 0..7usize {
            let mut acc = 0.0f32;
            for yy in y.saturating_sub(r)..=(y + r).min(5) {
                for xx in x.saturating_sub(r)..=(x + r).min(6) {
                    acc += f.at(xx, yy);
                }
            }
            assert!((s.at(x, y) - acc).abs() < 1e-3, "mismatch at {x},{y}");
        }
    }
}

#[test]
fn box_sum_radius_larger_than_image_is_global_sum() {
    let f = ramp(3, 2);
    let total: f32 = f.data().iter().sum();
    let s = box_sum(&f, 50);
    assert!(s.data().iter().all(|&v| (v - total).abs() < 1e-4));
}

#[test]
fn box_mean_of_constant_is_constant() {
    let f = Field::new_fill(6, 4, 0.3);
    let m = box_mean(&f, 3);
    assert!(m.data().iter().all(|&v| (v - 0.3).abs() < 1e-6));
}

#[test]
fn downsample_point_samples_without_averaging() {
    let f = ramp(8, 8);
    let d = downsample(&f, 2.0);
    assert_eq!((d.width(), d.height()), (4, 4));
    assert_eq!(d.at(1, 1), f.at(2, 2));
    assert_eq!(d.at(3, 2), f.at(6, 4));
}

#[test]
fn downsample_never_collapses_below_one_pixel() {
    let f = ramp(3, 2);
    let d = downsample(&f, 8.0);
    assert_eq!((d.width(), d.height()), (1, 1));
    assert_eq!(d.at(0, 0), f.at(0, 0));
}

#[test]
fn upsample_same_size_is_identity() {
    let f = ramp(5, 3);
    assert_eq!(upsample_bilinear(&f, 5, 3), f);
}

#[test]
fn upsample_interpolates_between_corners() {
    let f = Field::from_vec(2, 1, vec![0.0, 1.0]).unwrap();
    let u = upsample_bilinear(&f, 5, 1);
    let expected = [0.0, 0.25, 0.5, 0.75, 1.0];
    for (v, e) in u.data().iter().zip(expected) {
        assert!((v - e).abs() < 1e-6);
    }
}

#[test]
fn upsample_from_single_pixel_is_flat() {
    let f = Field::from_vec(1, 1, vec![0.7]).unwrap();
    let u = upsample_bilinear(&f, 4, 3);
    assert!(u.data().iter().all(|&v| (v - 0.7).abs() < 1e-6));
}
