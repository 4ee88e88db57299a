use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    napcat_installer_lib::run().await
}
