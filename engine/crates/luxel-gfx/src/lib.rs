pub mod commands;
pub mod foundation;
pub mod gfx;
pub mod pipelines;
pub mod resources;
pub mod sampler;
pub mod swapchain;
