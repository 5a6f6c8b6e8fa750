//! Bastion-Builder Client
//!
//! Yew WASM frontend: map editor page, grid canvas and live sync.
//!
//! Build with `trunk build` from this crate's directory.

mod app;
mod canvas_surface;
mod components;
mod config;
mod hooks;
mod network;
mod pages;
mod routes;

use app::App;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_web::MakeWebConsoleWriter;

fn main() {
    console_error_panic_hook::set_once();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new())
        .with_filter(EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt_layer).init();

    yew::Renderer::<App>::new().render();
}
