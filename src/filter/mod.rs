pub(crate) mod edges;
pub(crate) mod guided;
pub(crate) mod resample;
