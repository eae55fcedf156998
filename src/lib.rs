pub mod adapters;
pub mod core;
pub mod runtime;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    runtime::run()
}
