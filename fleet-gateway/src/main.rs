use anyhow::anyhow;
use fleet_gateway::handlers::{
    ErrorMessage, HandlerError, apply_service, cluster_status, delete_spec, list_specs, save_spec,
    service_logs,
};
use fleet_telemetry::init_tracing;
use std::env;
use std::io::Read;
use tracing::error;

fn main() -> anyhow::Result<()> {
    // Initialize tracing from the binary name
    init_tracing(env!("CARGO_BIN_NAME"))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let operation = env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: fleet-gateway <operation>"))?;

    let mut payload = Vec::new();
    std::io::stdin().read_to_end(&mut payload)?;

    let result = dispatch(&operation, &payload).await?;
    match result {
        Ok(response) => {
            println!("{response}");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, retryable = err.retryable(), operation, "handler failed");
            let message = ErrorMessage::from(&err);
            println!("{}", serde_json::to_string(&message)?);
            std::process::exit(1)
        }
    }
}

/// Runs exactly one handler. An unknown operation is a usage error of the
/// dispatch runtime, not a handler failure.
async fn dispatch(
    operation: &str,
    payload: &[u8],
) -> anyhow::Result<Result<String, HandlerError>> {
    let result = match operation {
        "save-spec" => save_spec::handle(payload).await,
        "delete-spec" => delete_spec::handle(payload).await,
        "list-specs" => list_specs::handle(payload).await,
        "apply-service" => apply_service::handle(payload).await,
        "cluster-status" => cluster_status::handle(payload).await,
        "service-logs" => service_logs::handle(payload).await,
        other => return Err(anyhow!("unknown operation: {other}")),
    };

    Ok(result)
}
