//! Auth command - test and explain management API authentication

use crate::cli::style::{Stylize, check, spinner_style};
use anstream::println;
use cms_migrate::auth::{get_management_auth, test_management_auth};
use cms_migrate::config::{Config, ENV_SPACE_ID};
use cms_migrate::error::Result;
use indicatif::ProgressBar;
use std::time::Duration;

/// Auth subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Validate the token against the configured space
    Test,
    /// Show setup instructions
    Setup,
}

/// Run the auth test command
pub async fn run_auth_test(config: &Config) -> Result<()> {
    config.validate(false)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message("Testing management API authentication...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let auth = get_management_auth(&config.api)?;
    let tested = test_management_auth(&auth, &config.api).await;
    spinner.finish_and_clear();

    let space_name = tested?;
    println!("{} Authenticated for space: {}", check(), space_name.accent());
    println!("  {} {:?}", "Token source:".muted(), auth.source);
    println!("  {} {}", "Space:".muted(), config.api.space_id);
    println!("  {} {}", "Environment:".muted(), config.api.environment_id);
    Ok(())
}

/// Run the auth setup command (show instructions)
pub fn run_auth_setup() {
    let path = Config::default_path()
        .map_or_else(|| "<config dir>/cms-migrate/config.toml".to_string(), |p| {
            p.display().to_string()
        });

    println!("{}", "Management API Authentication Setup".emphasis());
    println!();
    println!("{}", "Step 1: Create a personal access token".emphasis());
    println!("  In the web app: Settings > CMA tokens > Generate personal token");
    println!();
    println!("{}", "Option 1: Environment variable".emphasis());
    println!(
        "  Set {} or {}",
        "CMS_MANAGEMENT_TOKEN".accent(),
        "CONTENTFUL_MANAGEMENT_TOKEN".accent()
    );
    println!();
    println!("{}", "Option 2: Config file".emphasis());
    println!("  {}", path.accent());
    println!();
    println!("  [api]");
    println!("  space_id = \"<your-space-id>\"");
    println!("  management_token = \"<your-token>\"");
    println!();
    println!(
        "{}",
        format!("The space can also be set with --space or {ENV_SPACE_ID}").muted()
    );
}

/// Wrapper for auth commands
pub async fn run_auth(config: &Config, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Test => run_auth_test(config).await,
        AuthAction::Setup => {
            run_auth_setup();
            Ok(())
        }
    }
}
