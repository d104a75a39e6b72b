//! Configuration for the sync engine.

/// Trigger point used for schema sync when none is configured.
pub const DEFAULT_TRIGGER_POINT: &str = "System";

/// Store category that receives dynamic field records.
pub const DYNAMIC_FIELD_STORE: &str = "DynamicField";

/// What one logical group does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    /// Fixed categories, synced sequentially in this order.
    Fixed(Vec<String>),
    /// Every dynamic dataset of the batch.
    Dynamic,
    /// Identity schema and process specs, fetched separately.
    Schema,
}

/// A unit of work run by one concurrent task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalGroup {
    /// Group name used in logs and failure causes.
    pub name: String,
    /// What the group syncs.
    pub kind: GroupKind,
}

impl LogicalGroup {
    /// A group of fixed categories.
    pub fn fixed(name: impl Into<String>, categories: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::Fixed(categories.iter().map(|c| (*c).to_string()).collect()),
        }
    }

    /// The dynamic field group.
    pub fn dynamic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::Dynamic,
        }
    }

    /// The schema group.
    pub fn schema(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::Schema,
        }
    }

    /// Store categories this group writes to.
    pub fn store_categories(&self) -> Vec<&str> {
        match &self.kind {
            GroupKind::Fixed(categories) => categories.iter().map(String::as_str).collect(),
            GroupKind::Dynamic => vec![DYNAMIC_FIELD_STORE],
            GroupKind::Schema => Vec::new(),
        }
    }
}

/// The set of logical groups run by one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    groups: Vec<LogicalGroup>,
}

impl SyncPlan {
    /// Creates a plan from groups, run concurrently and reported in this order.
    #[must_use]
    pub fn new(groups: Vec<LogicalGroup>) -> Self {
        Self { groups }
    }

    /// The standard plan: ten data groups plus schema sync.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            LogicalGroup::fixed(
                "machine",
                &["MachineType", "MachineSpecification", "Machine"],
            ),
            LogicalGroup::fixed(
                "registration-center",
                &[
                    "RegistrationCenterType",
                    "RegistrationCenter",
                    "RegistrationCenterMachine",
                    "RegistrationCenterUser",
                ],
            ),
            LogicalGroup::fixed(
                "app-detail",
                &["AppRolePriority", "AppAuthenticationMethod"],
            ),
            LogicalGroup::fixed(
                "template",
                &["TemplateFileFormat", "TemplateType", "Template"],
            ),
            LogicalGroup::fixed(
                "document",
                &[
                    "DocumentType",
                    "DocumentCategory",
                    "ApplicantValidDocument",
                    "ValidDocument",
                ],
            ),
            LogicalGroup::fixed(
                "biometric-location",
                &[
                    "BiometricType",
                    "BiometricAttribute",
                    "IdType",
                    "Location",
                    "LocationHierarchy",
                ],
            ),
            LogicalGroup::fixed(
                "miscellaneous-1",
                &[
                    "BlacklistedWords",
                    "ProcessList",
                    "ScreenDetail",
                    "ScreenAuthorization",
                ],
            ),
            LogicalGroup::fixed(
                "miscellaneous-2",
                &["Language", "ReasonCategory", "ReasonList", "SyncJobDef"],
            ),
            LogicalGroup::dynamic("dynamic-field"),
            LogicalGroup::fixed("permitted-config", &["PermittedLocalConfig"]),
            LogicalGroup::schema("schema"),
        ])
    }

    /// Adds a group at the end.
    #[must_use]
    pub fn with_group(mut self, group: LogicalGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Groups in plan order.
    #[must_use]
    pub fn groups(&self) -> &[LogicalGroup] {
        &self.groups
    }

    /// Every fixed category in plan order.
    #[must_use]
    pub fn fixed_categories(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| matches!(g.kind, GroupKind::Fixed(_)))
            .flat_map(LogicalGroup::store_categories)
            .collect()
    }

    /// Every store category the plan writes to, including the dynamic field store.
    #[must_use]
    pub fn store_categories(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(LogicalGroup::store_categories)
            .collect()
    }
}

impl Default for SyncPlan {
    fn default() -> Self {
        Self::standard()
    }
}

/// Configuration for sync rounds.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Groups to run.
    pub plan: SyncPlan,
    /// Trigger point passed to the schema endpoint.
    pub schema_trigger_point: String,
    /// Delete stored dynamic fields sharing a name with incoming ones
    /// before upserting.
    pub resolve_dynamic_duplicates: bool,
}

impl SyncConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            plan: SyncPlan::standard(),
            schema_trigger_point: DEFAULT_TRIGGER_POINT.to_string(),
            resolve_dynamic_duplicates: true,
        }
    }

    /// Sets the plan.
    pub fn with_plan(mut self, plan: SyncPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Sets the schema trigger point.
    pub fn with_schema_trigger_point(mut self, trigger_point: impl Into<String>) -> Self {
        self.schema_trigger_point = trigger_point.into();
        self
    }

    /// Enables or disables dynamic field duplicate resolution.
    pub fn with_dynamic_duplicate_resolution(mut self, enabled: bool) -> Self {
        self.resolve_dynamic_duplicates = enabled;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
