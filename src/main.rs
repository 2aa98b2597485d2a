mod app;
mod config;
mod engine;
mod error;
mod library;
mod mpris;
mod persist;
mod player;
mod playlist;
mod progress;
mod runtime;
mod selection;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
