use luxel_crate_tools::init_log::init_log;
use luxel_renderer::settings::RendererSettings;

mod app;

fn main() {
    init_log();
    tracy_client::Client::start();

    app::LuxelApp::run(RendererSettings::default());
}
