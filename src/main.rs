use std::process::ExitCode;

use monolunch_lib::StartupError;

#[tokio::main]
async fn main() -> ExitCode {
    match monolunch_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(StartupError::Gateway(e)) => {
            tracing::error!(error = %e, "could not start the local gateway, is the port already in use?");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start MonoLunch");
            ExitCode::FAILURE
        }
    }
}
