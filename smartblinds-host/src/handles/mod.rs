mod cover_handle;

pub use cover_handle::*;
