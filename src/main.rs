use beneath_the_surface::game::GameContext;
use beneath_the_surface::Result;

fn main() {
    env_logger::init();

    if let Err(error) = run() {
        log::error!("fatal: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    GameContext::new()?.run()
}
