pub(crate) mod color;
pub(crate) mod params;
pub(crate) mod raster;
pub(crate) mod svg;
