use lora_medium_sim::constants::DEFAULT_BIND_ADDR;
use lora_medium_sim::{init_logger, log_info, run_server, SimError};

#[tokio::main]
async fn main() -> Result<(), SimError> {
    init_logger();

    let addr = DEFAULT_BIND_ADDR
        .parse()
        .expect("DEFAULT_BIND_ADDR must be a valid socket address");

    log_info(&format!("starting lora-medium-sim on {addr}"));
    run_server(addr).await
}
