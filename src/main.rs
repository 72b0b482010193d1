//! makedmg - stage, sign and image an application bundle into a DMG.

use makedmg::cli;
use makedmg::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Never quiet for fatal errors
            let output = OutputManager::new(false);
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.error_detail("");
                output.error_detail("💡 Recovery suggestions:");
                for suggestion in suggestions {
                    output.error_detail(&format!("  {suggestion}"));
                }
            }

            process::exit(e.exit_code());
        }
    }
}
