mod accumulator;
mod cli;
mod config;
mod editor;
mod events;
mod layout;
mod link;
mod logging;
mod mapper;
mod pipeline;
mod session;
mod surface;
mod tracker;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
