//! Entity contract shared by every persisted kind, plus the query vocabulary
//! repositories understand.

use std::collections::BTreeMap;
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Index key for the owning application's primary key.
pub const INDEX_APP_PRIMARY_KEY: &str = "appPrimaryKey";
/// Index key for an entity's own name.
pub const INDEX_NAME: &str = "name";
/// Index key for the workflow a record or revision belongs to.
pub const INDEX_WORKFLOW_NAME: &str = "workflowName";
/// Index key for the deployment environment.
pub const INDEX_ENV_NAME: &str = "envName";
/// Index key for the default-workflow marker.
pub const INDEX_DEFAULT: &str = "default";
/// Index key for a record's revision pointer.
pub const INDEX_REVISION_PRIMARY_KEY: &str = "revisionPrimaryKey";
/// Index key for a record's string-encoded finished flag.
pub const INDEX_FINISHED: &str = "finished";
/// Index key for summary status.
pub const INDEX_STATUS: &str = "status";
/// Index key for a revision's version identifier.
pub const INDEX_VERSION: &str = "version";
/// Index key for the namespace.
pub const INDEX_NAMESPACE: &str = "namespace";
/// Index key for a revision's trigger kind.
pub const INDEX_TRIGGER_TYPE: &str = "triggerType";

/// Sort key resolving to [`BaseModel::create_time`].
pub const SORT_CREATE_TIME: &str = "createTime";
/// Sort key resolving to [`BaseModel::update_time`].
pub const SORT_UPDATE_TIME: &str = "updateTime";

/// Queryable attributes of an entity. Keys absent from the map are unset.
pub type Index = BTreeMap<&'static str, String>;

/// Timestamps every persisted entity carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseModel {
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// A persisted entity kind.
///
/// Repositories are typed per kind, so callers never narrow a heterogeneous
/// result at runtime.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Storage discriminator, unique per kind.
    const KIND: &'static str;

    /// Composite primary key rendered as a single string.
    fn primary_key(&self) -> String;

    /// Queryable attributes. Only set fields appear.
    fn index(&self) -> Index;

    fn base(&self) -> &BaseModel;

    fn base_mut(&mut self) -> &mut BaseModel;
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// One sort criterion. Keys are [`SORT_CREATE_TIME`], [`SORT_UPDATE_TIME`]
/// or any index key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOption {
    pub key: String,
    pub order: SortOrder,
}

impl SortOption {
    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            order: SortOrder::Descending,
        }
    }

    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            order: SortOrder::Ascending,
        }
    }
}

/// Substring match on an index value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyQuery {
    pub key: String,
    pub query: String,
}

/// Index value must be one of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InQuery {
    pub key: String,
    pub values: Vec<String>,
}

/// Predicates applied on top of the exact-match filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub queries: Vec<FuzzyQuery>,
    pub in_filters: Vec<InQuery>,
    /// Index keys that must be unset.
    pub is_not_exist: Vec<String>,
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty() && self.in_filters.is_empty() && self.is_not_exist.is_empty()
    }
}

/// Options for [`crate::interfaces::Repository::list`].
///
/// `page` is 1-based. A zero `page` or `page_size` lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page: usize,
    pub page_size: usize,
    pub sort_by: Vec<SortOption>,
    pub filter: FilterOptions,
}

impl ListOptions {
    pub fn paged(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, sort: SortOption) -> Self {
        self.sort_by.push(sort);
        self
    }
}
