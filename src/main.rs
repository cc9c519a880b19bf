mod backend;
mod config;
mod errors;
mod fsystem;
mod handlers;
mod locations;
mod log;
mod routes;
mod server;
mod session;

use clap::Parser;
// Allow the server to return its version with a --version flag
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
struct Opts {
    #[clap(short, long)]
    version: bool,
    #[clap(short, long)]
    debug: bool,
    #[clap(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let opts: Opts = Opts::parse();
    if opts.version {
        println!("{}", VERSION);
        return;
    }
    let _guard = match log::init_logging(opts.debug) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging is disabled: {}", e);
            None
        }
    };
    let config = config::Config::from_env(opts.port);
    let srv = server::get_server(&config);
    if let Err(e) = srv.start().await {
        tracing::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
