use std::env;

use anyhow::bail;
use app::App;
use config::Config;
use guard::InjectionGuard;

mod app;
mod canvas;
mod capture;
mod cmd;
mod color;
mod config;
mod glow;
mod gpu;
mod guard;
mod input;
mod math;
mod overlay;
mod panel;
mod pen;
mod render;
mod stroke;

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    let config = match &*env::args_os().skip(1).collect::<Vec<_>>() {
        [] => Config::default(),
        [path] => Config::load(path)?,
        _ => {
            bail!("usage: {} [config.toml]", env!("CARGO_PKG_NAME"));
        }
    };

    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = App::new(config, InjectionGuard::default());
    event_loop.run_app(&mut app)?;
    app.into_result()
}
