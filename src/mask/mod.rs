pub(crate) mod cutout;
pub(crate) mod depth_mask;
pub(crate) mod feather;
