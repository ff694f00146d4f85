//! DashScope application command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::dashscope::DashScopeApp;
use crate::error::SporError;
use anyhow::Result;

/// Run the app command.
pub async fn run_app(prompt: &str, app_id: Option<String>, settings: Settings) -> Result<()> {
    preflight::check(
        &settings,
        Operation::App {
            app_id: app_id.as_deref(),
        },
    )?;

    let app_id = app_id
        .or_else(|| settings.dashscope.app_id.clone())
        .unwrap_or_default();
    let app = DashScopeApp::new(&settings.dashscope, &settings.dashscope_credentials()?, &app_id)?;

    let spinner = Output::spinner(&format!("Calling application {}...", app.app_id()));
    let result = app.call(prompt).await;
    spinner.finish_and_clear();

    match result {
        Ok(text) => {
            println!("\n{}\n", text);
            Ok(())
        }
        Err(SporError::DashScope {
            request_id,
            code,
            message,
        }) => {
            Output::error("Application call failed");
            Output::kv("request_id", &request_id);
            Output::kv("code", &code);
            Output::kv("message", &message);
            Output::info("See https://help.aliyun.com/zh/model-studio/developer-reference/error-code");
            Err(anyhow::anyhow!("DashScope request {} failed with {}", request_id, code))
        }
        Err(e) => Err(e.into()),
    }
}
