pub mod layout;
pub mod render_target;
