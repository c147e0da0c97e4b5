//! DynamoDB infrastructure management commands.

mod client;
mod deploy;
mod error;
mod schema;
mod seed;

pub use error::{DynamodbError, Result};

use dialoguer::Confirm;

use crate::prelude::*;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy DynamoDB table infrastructure.
    Deploy(DeployCommand),

    /// Seed the table with mock subscriptions.
    Seed(SeedCommand),
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy DynamoDB table infrastructure.

By default, this command creates or updates the newsletter DynamoDB table
with the required schema and the item type Global Secondary Index (GSI).

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the table instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Table name to use.
    #[arg(long, default_value = "newsletter")]
    pub table_name: String,
}

/// Seed the table with mock subscriptions.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Generate and insert mock subscriptions into DynamoDB.

Creates a mix of confirmed and pending subscriptions with generated
email addresses, then settles the subscription counter row so counts
read correctly afterwards.")]
pub struct SeedCommand {
    /// Number of subscriptions to generate.
    #[arg(long, default_value = "25")]
    pub count: u32,

    /// Table name to use.
    #[arg(long, default_value = "newsletter")]
    pub table_name: String,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
        DynamodbAction::Seed(seed_cmd) => run_seed(seed_cmd, &global).await,
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await?;
    let current_state = client::get_table_state(&dynamo_client, &cmd.table_name).await?;

    if cmd.destroy {
        // Destroy flow
        let plan = schema::calculate_destroy_plan(current_state.as_ref(), &cmd.table_name);

        if !global.is_silent() {
            aprintln!("{}", p_y("Destroy Plan:"));
            for line in schema::format_destroy_plan(&plan) {
                aprintln!("  {}", p_r(&line));
            }
            aprintln!();
        }

        if matches!(plan, schema::DestroyPlan::AlreadyGone { .. }) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Nothing to destroy."));
            }
            return Ok(());
        }

        if !cmd.force {
            let confirmed = Confirm::new()
                .with_prompt("Are you sure you want to delete this table? ALL DATA WILL BE LOST")
                .default(false)
                .interact()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

            if !confirmed {
                return Err(DynamodbError::UserCancelled);
            }
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Deleting table..."));
        }

        deploy::execute_destroy_plan(&dynamo_client, &plan).await?;

        if !global.is_silent() {
            aprintln!("{}", p_g("Table destroyed successfully."));
        }
    } else {
        // Deploy flow
        let table_config = schema::newsletter_table_config().with_table_name(&cmd.table_name);

        let plan = schema::calculate_deploy_plan(current_state.as_ref(), &table_config);

        if !global.is_silent() {
            aprintln!("{}", p_c("Deploy Plan:"));
            for line in schema::format_deploy_plan(&plan) {
                if line.starts_with('+') {
                    aprintln!("  {}", p_g(&line));
                } else if line.starts_with('-') {
                    aprintln!("  {}", p_r(&line));
                } else if line.starts_with('~') {
                    aprintln!("  {}", p_y(&line));
                } else {
                    aprintln!("  {}", line);
                }
            }
            aprintln!();
        }

        if matches!(plan, schema::DeployPlan::NoChanges { .. }) {
            if !global.is_silent() {
                aprintln!("{}", p_g("Infrastructure is up to date."));
            }
            return Ok(());
        }

        if !cmd.force {
            let confirmed = Confirm::new()
                .with_prompt("Apply these changes?")
                .default(true)
                .interact()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

            if !confirmed {
                return Err(DynamodbError::UserCancelled);
            }
        }

        if !global.is_silent() {
            aprintln!("{}", p_b("Applying changes..."));
        }

        deploy::execute_deploy_plan(&dynamo_client, &plan).await?;

        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure deployed successfully."));
        }
    }

    Ok(())
}

async fn run_seed(cmd: SeedCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), aws_config.target_display());
        aprintln!("{} {}", p_b("Table:"), cmd.table_name);
        aprintln!("{} {}", p_b("Subscription count:"), cmd.count);
        aprintln!();
    }

    let dynamo_client = client::create_client(&aws_config).await?;

    // Verify table exists
    let table_state = client::get_table_state(&dynamo_client, &cmd.table_name).await?;
    if table_state.is_none() {
        return Err(DynamodbError::TableNotFound {
            table_name: cmd.table_name,
        });
    }

    // Generate subscriptions
    let subscriptions = seed::generate_seed_subscriptions(cmd.count);

    if !global.is_silent() {
        let shown = if global.is_verbose() {
            subscriptions.len()
        } else {
            5
        };

        aprintln!("{}", p_c("Subscriptions to create:"));
        for subscription in subscriptions.iter().take(shown) {
            let status = if subscription.is_confirmed {
                "confirmed"
            } else {
                "pending"
            };
            aprintln!("  {} ({})", subscription.email_address, status);
        }
        if subscriptions.len() > shown {
            aprintln!("  ... and {} more", subscriptions.len() - shown);
        }
        aprintln!();
    }

    if !cmd.force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Insert {} subscriptions?", subscriptions.len()))
            .default(true)
            .interact()
            .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

        if !confirmed {
            return Err(DynamodbError::UserCancelled);
        }
    }

    let inserted = seed::seed_subscriptions(&dynamo_client, &cmd.table_name, &subscriptions).await?;

    if !global.is_silent() {
        aprintln!("{} {} subscriptions inserted.", p_g("Success:"), inserted);
    }

    Ok(())
}
