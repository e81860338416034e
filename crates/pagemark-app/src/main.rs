//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    use pagemark_app::{App, AppConfig};
    use pagemark_core::config::SurfaceConfig;
    use std::path::PathBuf;

    env_logger::init();
    log::info!("Starting Pagemark");

    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig {
        surface: SurfaceConfig::load_or_default(),
        ..AppConfig::default()
    };

    if let Err(e) = pollster::block_on(App::run(config, initial_file)) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
