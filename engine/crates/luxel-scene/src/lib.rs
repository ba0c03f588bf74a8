pub mod mesh;
pub mod physics;
pub mod vertex;
