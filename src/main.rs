use helion::{ViewerConfig, run};

fn main() {
    env_logger::init();
    run(ViewerConfig::new());
}
