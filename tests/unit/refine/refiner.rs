use super::*;

fn step(w: usize, h: usize, split: usize) -> Field {
    let data = (0..w * h)
        .map(|i| if i % w >= split { 1.0 } else { 0.0 })
        .collect();
    Field::from_vec(w, h, data).unwrap()
}

fn depth_step(w: usize, h: usize, split: usize) -> DepthField {
    DepthField::from_normalized(step(w, h, split))
}

#[test]
fn outputs_match_guide_resolution() {
    let guide = step(48, 32, 24);
    let refined = refine_depth(&guide, &depth_step(12, 8, 6), &RefineOpts::default()).unwrap();
    assert_eq!((refined.width(), refined.height()), (48, 32));
    assert_eq!((refined.edges.width(), refined.edges.height()), (48, 32));
    let unit = |v: &f32| (0.0..=1.0).contains(v);
    assert!(refined.depth.data().iter().all(unit));
    assert!(refined.edges.data().iter().all(unit));
}

#[test]
fn refinement_is_deterministic() {
    let guide = Field::from_vec(
        16,
        16,
        (0..256).map(|i| ((i * 37) % 101) as f32 / 100.0).collect(),
    )
    .unwrap();
    let depth = depth_step(8, 8, 3);
    let a = refine_depth(&guide, &depth, &RefineOpts::default()).unwrap();
    let b = refine_depth(&guide, &depth, &RefineOpts::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn flat_guide_uses_coarse_pass_only() {
    let guide = Field::new_fill(24, 24, 0.5);
    let depth = depth_step(6, 6, 3);
    let refined = refine_depth(&guide, &depth, &RefineOpts::default()).unwrap();
    assert!(refined.edges.data().iter().all(|&v| v == 0.0));

    let coarse = fast_guided_filter(&guide, depth.as_field(), GuidedFilterParams::COARSE);
    assert_eq!(refined.depth, coarse);
}

#[test]
fn subject_side_of_edge_stays_in_front() {
    let guide = step(64, 16, 32);
    let refined = refine_depth(&guide, &depth_step(16, 4, 8), &RefineOpts::default()).unwrap();
    assert!(refined.depth.at(40, 8) > refined.depth.at(24, 8));
}

#[test]
fn single_pixel_target_is_handled() {
    let guide = Field::new_fill(1, 1, 0.3);
    let refined = refine_depth(&guide, &depth_step(4, 4, 2), &RefineOpts::default()).unwrap();
    assert_eq!(refined.depth.len(), 1);
    assert!(refined.depth.data()[0].is_finite());
}
