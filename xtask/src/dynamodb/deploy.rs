//! Table deployment operations (Imperative Shell).

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, CreateGlobalSecondaryIndexAction, GlobalSecondaryIndex,
    GlobalSecondaryIndexUpdate, KeySchemaElement, KeyType, Projection, ProjectionType,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;

use super::client;
use super::error::{DynamodbError, Result};
use super::schema::{self, DeployPlan, DestroyPlan, GsiStatus, TableConfig, TableStatus};

/// Execute a deploy plan.
pub async fn execute_deploy_plan(client: &Client, plan: &DeployPlan) -> Result<()> {
    match plan {
        DeployPlan::CreateTable { config } => {
            create_table(client, config).await?;
            wait_for_table_active(client, &config.table_name).await?;
        }
        DeployPlan::AddGsis {
            table_name,
            gsis_to_add,
        } => {
            for gsi in gsis_to_add {
                add_gsi(client, table_name, gsi).await?;
                wait_for_table_active(client, table_name).await?;
            }
        }
        DeployPlan::NoChanges { .. } => {
            // Nothing to do
        }
    }
    Ok(())
}

/// Execute a destroy plan.
pub async fn execute_destroy_plan(client: &Client, plan: &DestroyPlan) -> Result<()> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            delete_table(client, table_name).await?;
        }
        DestroyPlan::AlreadyGone { .. } => {
            // Nothing to do
        }
    }
    Ok(())
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
}

fn attribute_definition(key: &schema::KeyAttribute) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(&key.name)
        .attribute_type(to_scalar_type(&key.attribute_type))
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
}

async fn create_table(client: &Client, config: &TableConfig) -> Result<()> {
    let key_schema = vec![
        key_element(&config.partition_key.name, KeyType::Hash)?,
        key_element(&config.sort_key.name, KeyType::Range)?,
    ];

    let mut attribute_definitions = vec![
        attribute_definition(&config.partition_key)?,
        attribute_definition(&config.sort_key)?,
    ];

    // Every GSI hash key also needs an attribute definition
    for gsi in &config.gsis {
        let hash_name = gsi.partition_key.name.as_str();
        if !attribute_definitions
            .iter()
            .any(|a| a.attribute_name() == hash_name)
        {
            attribute_definitions.push(attribute_definition(&gsi.partition_key)?);
        }
    }

    let mut request = client
        .create_table()
        .table_name(&config.table_name)
        .set_key_schema(Some(key_schema))
        .set_attribute_definitions(Some(attribute_definitions))
        .billing_mode(BillingMode::PayPerRequest);

    for gsi in &config.gsis {
        request = request.global_secondary_indexes(
            GlobalSecondaryIndex::builder()
                .index_name(&gsi.name)
                .key_schema(key_element(&gsi.partition_key.name, KeyType::Hash)?)
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .build()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?,
        );
    }

    request
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    Ok(())
}

async fn add_gsi(client: &Client, table_name: &str, gsi: &schema::GsiConfig) -> Result<()> {
    client
        .update_table()
        .table_name(table_name)
        .attribute_definitions(attribute_definition(&gsi.partition_key)?)
        .global_secondary_index_updates(
            GlobalSecondaryIndexUpdate::builder()
                .create(
                    CreateGlobalSecondaryIndexAction::builder()
                        .index_name(&gsi.name)
                        .key_schema(key_element(&gsi.partition_key.name, KeyType::Hash)?)
                        .projection(
                            Projection::builder()
                                .projection_type(ProjectionType::All)
                                .build(),
                        )
                        .build()
                        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?,
                )
                .build(),
        )
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

    Ok(())
}

async fn delete_table(client: &Client, table_name: &str) -> Result<()> {
    client
        .delete_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    Ok(())
}

async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    let max_attempts = 60;
    let delay = Duration::from_secs(2);

    for _ in 0..max_attempts {
        if let Some(state) = client::get_table_state(client, table_name).await? {
            if state.status == TableStatus::Active
                && state.gsis.iter().all(|g| g.status == GsiStatus::Active)
            {
                return Ok(());
            }
        }
        tokio::time::sleep(delay).await;
    }

    Err(DynamodbError::TableActivationTimeout)
}

fn to_scalar_type(attr_type: &schema::AttributeType) -> ScalarAttributeType {
    match attr_type {
        schema::AttributeType::String => ScalarAttributeType::S,
    }
}
