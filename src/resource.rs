//! Control-plane resource records shared by every sweeper.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

/// API level a resource lives at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Reached through the account console host.
    Account,
    /// Reached through a single workspace host.
    Workspace,
}

/// Every resource kind the sweeper knows how to list and delete.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResourceKind {
    /// Account-level SCIM users.
    User,
    /// Unity Catalog metastores registered with the account.
    Metastore,
    /// Workspaces provisioned in the account.
    Workspace,
    /// Customer-managed VPC network configurations.
    NetworkConfig,
    /// Root bucket storage configurations.
    StorageConfig,
    /// Cross-account IAM credential configurations.
    CredentialConfig,
    /// Unity Catalog external locations.
    ExternalLocation,
    /// Unity Catalog storage credentials.
    StorageCredential,
    /// Unity Catalog catalogs.
    Catalog,
}

impl ResourceKind {
    /// Account-scoped kinds in sweep order.
    pub const ACCOUNT: [Self; 6] = [
        Self::User,
        Self::Metastore,
        Self::Workspace,
        Self::NetworkConfig,
        Self::StorageConfig,
        Self::CredentialConfig,
    ];

    /// Workspace-scoped kinds in sweep order.
    pub const WORKSPACE: [Self; 3] = [
        Self::ExternalLocation,
        Self::StorageCredential,
        Self::Catalog,
    ];

    /// Label used in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Metastore => "metastore",
            Self::Workspace => "workspace",
            Self::NetworkConfig => "network configuration",
            Self::StorageConfig => "storage configuration",
            Self::CredentialConfig => "credential",
            Self::ExternalLocation => "External Location",
            Self::StorageCredential => "Storage Credentials",
            Self::Catalog => "Catalog",
        }
    }

    /// Which client reaches this kind.
    #[must_use]
    pub const fn scope(self) -> Scope {
        match self {
            Self::ExternalLocation | Self::StorageCredential | Self::Catalog => Scope::Workspace,
            _ => Scope::Account,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A resource as returned by a list call, normalised across kinds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resource {
    /// Kind the record was listed as.
    pub kind: ResourceKind,
    /// Identifier used for delete calls. Unity Catalog objects are addressed
    /// by name, so for those this equals `name`.
    pub id: String,
    /// Display name the prefix filter matches against.
    pub name: String,
    /// Creation time, when the API reports one.
    pub created_at: Option<DateTime<Utc>>,
    /// Current owner, when the API reports one.
    pub owner: Option<String>,
}

impl Resource {
    /// Creates a record with no creation time or owner.
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
            created_at: None,
            owner: None,
        }
    }

    /// Sets the creation time from epoch milliseconds. Out-of-range values
    /// leave the creation time unset.
    #[must_use]
    pub fn created_at_millis(mut self, millis: Option<i64>) -> Self {
        self.created_at = millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single());
        self
    }

    /// Sets the creation time.
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Sets the owner.
    #[must_use]
    pub fn owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }
}
