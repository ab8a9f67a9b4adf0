pub(crate) mod acquire;
pub(crate) mod normalize;
