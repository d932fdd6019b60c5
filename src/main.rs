use drape::ClothConfig;

fn main() {
    env_logger::init();

    if let Err(e) = drape::run(ClothConfig::default()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
