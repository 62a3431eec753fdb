use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    cordwood_cli::run().await
}
