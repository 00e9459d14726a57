//! Groups and server templates.
//!
//! The dashboard only needs list/get/create/delete over the two record
//! kinds, so the store behind it is a trait. `MemoryCatalog` backs the
//! standalone daemon and tests.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A scalable pool of servers built from one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Defaults to `name` when left empty.
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Prefix for the names of servers in the group.
    #[serde(default)]
    pub base_name: String,
    pub template_name: String,
    #[serde(default)]
    pub metric_type: String,
    #[serde(default)]
    pub policy_type: String,
}

/// Recipe for booting one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    #[serde(default)]
    pub ssh_keys: Vec<String>,
    #[serde(default)]
    pub user_data: String,
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },

    #[error("template {template} is used by group {group}")]
    TemplateInUse { template: String, group: String },
}

pub trait Catalog: Send + Sync {
    fn list_groups(&self) -> CatalogResult<Vec<Group>>;
    fn get_group(&self, id: &str) -> CatalogResult<Option<Group>>;
    fn create_group(&self, group: Group) -> CatalogResult<Group>;
    fn delete_group(&self, id: &str) -> CatalogResult<bool>;

    fn list_templates(&self) -> CatalogResult<Vec<Template>>;
    fn get_template(&self, name: &str) -> CatalogResult<Option<Template>>;
    fn create_template(&self, template: Template) -> CatalogResult<Template>;
    fn delete_template(&self, name: &str) -> CatalogResult<bool>;
}

/// Groups and templates share one lock; rules spanning both kinds are
/// checked and applied under a single write guard.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: RwLock<Records>,
}

#[derive(Debug, Default)]
struct Records {
    groups: BTreeMap<String, Group>,
    templates: BTreeMap<String, Template>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog pre-populated with templates, then groups.
    pub fn seeded(templates: Vec<Template>, groups: Vec<Group>) -> CatalogResult<Self> {
        let catalog = Self::new();
        for template in templates {
            catalog.create_template(template)?;
        }
        for group in groups {
            catalog.create_group(group)?;
        }
        Ok(catalog)
    }

    fn read(&self) -> RwLockReadGuard<'_, Records> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Records> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Catalog for MemoryCatalog {
    fn list_groups(&self) -> CatalogResult<Vec<Group>> {
        Ok(self.read().groups.values().cloned().collect())
    }

    fn get_group(&self, id: &str) -> CatalogResult<Option<Group>> {
        Ok(self.read().groups.get(id).cloned())
    }

    fn create_group(&self, mut group: Group) -> CatalogResult<Group> {
        if group.name.trim().is_empty() {
            return Err(CatalogError::Invalid {
                kind: "group",
                reason: "name is required".to_string(),
            });
        }
        if group.id.is_empty() {
            group.id = group.name.clone();
        }
        if group.base_name.is_empty() {
            group.base_name = group.name.clone();
        }

        let mut records = self.write();
        if !records.templates.contains_key(&group.template_name) {
            return Err(CatalogError::Invalid {
                kind: "group",
                reason: format!("unknown template {:?}", group.template_name),
            });
        }
        if records.groups.contains_key(&group.id) {
            return Err(CatalogError::AlreadyExists {
                kind: "group",
                id: group.id,
            });
        }
        debug!(group = %group.id, template = %group.template_name, "group created");
        records.groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    fn delete_group(&self, id: &str) -> CatalogResult<bool> {
        Ok(self.write().groups.remove(id).is_some())
    }

    fn list_templates(&self) -> CatalogResult<Vec<Template>> {
        Ok(self.read().templates.values().cloned().collect())
    }

    fn get_template(&self, name: &str) -> CatalogResult<Option<Template>> {
        Ok(self.read().templates.get(name).cloned())
    }

    fn create_template(&self, template: Template) -> CatalogResult<Template> {
        if template.name.trim().is_empty() {
            return Err(CatalogError::Invalid {
                kind: "template",
                reason: "name is required".to_string(),
            });
        }

        let mut records = self.write();
        if records.templates.contains_key(&template.name) {
            return Err(CatalogError::AlreadyExists {
                kind: "template",
                id: template.name,
            });
        }
        debug!(template = %template.name, region = %template.region, "template created");
        records.templates.insert(template.name.clone(), template.clone());
        Ok(template)
    }

    fn delete_template(&self, name: &str) -> CatalogResult<bool> {
        let mut records = self.write();
        if let Some(group) = records.groups.values().find(|g| g.template_name == name) {
            return Err(CatalogError::TemplateInUse {
                template: name.to_string(),
                group: group.id.clone(),
            });
        }
        Ok(records.templates.remove(name).is_some())
    }
}
