use coolc_drv::{Config, Session};

fn main() {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = Session::new(config).compile() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
