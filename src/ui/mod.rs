/// UI module exports

pub mod components;
pub mod dom;
pub mod focus;
pub mod overlay;
