pub mod cadence;
pub mod frame_timer;
pub mod input;
pub mod passes;
pub mod renderer;
pub mod settings;
pub mod sync_chain;
pub mod targets;
pub mod transform_feed;
pub mod uniforms;
