pub mod controller;
pub mod model;
pub mod router;
pub mod service;
pub mod upload;

pub use model::*;
pub use router::init_contents_router;
