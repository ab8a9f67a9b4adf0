pub(crate) mod editor;
pub(crate) mod request;
pub(crate) mod scheduler;
