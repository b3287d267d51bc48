use studyscope::api::ApiError;
use studyscope::error::{SessionError, ValidationError};

/// 2 validation, 3 login required, 1 anything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<SessionError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<ValidationError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<ApiError>() {
        Some(e) if e.requires_login() => 3,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    if let Err(err) = studyscope::run().await {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}
