//! qchat release builder - compiles, signs and packages qchat.

use qchat_release::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
