pub(crate) mod compositor;
pub(crate) mod surface;
pub(crate) mod text;
