//! Table schema and deployment planning (Functional Core - pure data).

use newsletter_core::item::{ATTR_ITEM_TYPE, ATTR_PARTITION_KEY, ATTR_SORT_KEY, INDEX_ITEM_TYPE};

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub gsis: Vec<GsiConfig>,
    pub billing_mode: BillingMode,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

/// DynamoDB attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
}

/// Global Secondary Index configuration. All indexes here are hash-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiConfig {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub projection: ProjectionType,
}

/// GSI projection type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionType {
    All,
}

/// Billing mode for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

impl TableConfig {
    /// Sets the table name.
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }
}

/// Returns the canonical table configuration for the newsletter service.
///
/// One table holds every item type. Rows are addressed by `pk`/`sk`, and the
/// type index lets a query walk all rows of one item type. Counter rows carry
/// no type attribute, so the index never sees them.
pub fn newsletter_table_config() -> TableConfig {
    TableConfig {
        table_name: "newsletter".to_string(),
        partition_key: KeyAttribute {
            name: ATTR_PARTITION_KEY.to_string(),
            attribute_type: AttributeType::String,
        },
        sort_key: KeyAttribute {
            name: ATTR_SORT_KEY.to_string(),
            attribute_type: AttributeType::String,
        },
        gsis: vec![GsiConfig {
            name: INDEX_ITEM_TYPE.to_string(),
            partition_key: KeyAttribute {
                name: ATTR_ITEM_TYPE.to_string(),
                attribute_type: AttributeType::String,
            },
            projection: ProjectionType::All,
        }],
        billing_mode: BillingMode::PayPerRequest,
    }
}

/// Represents the current state of a table.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: TableStatus,
    pub gsis: Vec<GsiState>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// GSI state.
#[derive(Debug, Clone)]
pub struct GsiState {
    pub name: String,
    pub status: GsiStatus,
}

/// GSI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsiStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { config: TableConfig },
    /// Table exists, GSIs need to be added.
    AddGsis {
        table_name: String,
        gsis_to_add: Vec<GsiConfig>,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    match current {
        None => DeployPlan::CreateTable {
            config: desired.clone(),
        },
        Some(state) => {
            let existing_gsi_names: Vec<&str> =
                state.gsis.iter().map(|g| g.name.as_str()).collect();

            let gsis_to_add: Vec<GsiConfig> = desired
                .gsis
                .iter()
                .filter(|gsi| !existing_gsi_names.contains(&gsi.name.as_str()))
                .cloned()
                .collect();

            if gsis_to_add.is_empty() {
                DeployPlan::NoChanges {
                    table_name: desired.table_name.clone(),
                }
            } else {
                DeployPlan::AddGsis {
                    table_name: desired.table_name.clone(),
                    gsis_to_add,
                }
            }
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!("  Partition key: {} (S)", config.partition_key.name),
                format!("  Sort key: {} (S)", config.sort_key.name),
            ];
            for gsi in &config.gsis {
                lines.push(format!("  + GSI: {}", gsi.name));
                lines.push(format!("    Hash key: {} (S)", gsi.partition_key.name));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::AddGsis {
            table_name,
            gsis_to_add,
        } => {
            let mut lines = vec![format!("~ Update table: {}", table_name)];
            for gsi in gsis_to_add {
                lines.push(format!("  + Add GSI: {}", gsi.name));
            }
            lines
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {} (ALL DATA WILL BE LOST)",
                table_name
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{}' does not exist", table_name)]
        }
    }
}
