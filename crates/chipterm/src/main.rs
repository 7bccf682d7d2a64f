use chipterm::Options;
use clap::Parser;

fn main() {
    let options = Options::parse();
    if let Err(e) = chipterm::init_logging(options.log_file.as_deref()) {
        eprintln!("chipterm: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = chipterm::run(&options) {
        log::error!("{:#}", e);
        eprintln!("chipterm: {:#}", e);
        std::process::exit(1);
    }
}
