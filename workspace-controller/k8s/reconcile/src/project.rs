//! Computes the desired shape of every resource a workspace manages.
//!
//! Nothing here touches the cluster. A [`Projection`] is only built from a
//! workspace whose name and users are valid, so the names it derives are
//! always usable.

use crate::{Error, Object, ResourceId, Result};
use std::collections::BTreeMap;
use workspace_controller_core::{quota_name, validate_name, Tier};
use workspace_controller_k8s_api::{
    labels::{self, Map},
    Namespace, NamespaceSpec, ObjectMeta, ParsedQuantity, PolicyRule, Quantity, ResourceExt,
    ResourceQuota, ResourceQuotaSpec, Role, RoleBinding, RoleRef, Subject, Users, Workspace,
    WorkspaceSpec, OWNER_ANNOTATION, QUOTA_CPU, QUOTA_MEMORY, QUOTA_STORAGE, RBAC_API_GROUP,
};

const NAMESPACE_FINALIZER: &str = "kubernetes";

#[derive(Clone, Debug)]
pub struct Projection<'w> {
    owner: String,
    spec: &'w WorkspaceSpec,
}

impl<'w> Projection<'w> {
    pub fn new(workspace: &'w Workspace) -> Result<Self> {
        let spec = &workspace.spec;
        validate_name(&spec.name).map_err(|source| Error::InvalidName {
            name: spec.name.clone(),
            source,
        })?;

        for tier in Tier::ALL {
            if let Some(user) = user(&spec.users, tier) {
                validate_subject(tier, user)?;
            }
        }

        Ok(Self {
            owner: workspace.name_any(),
            spec,
        })
    }

    /// The namespace name every other resource lives in.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The name of the workspace object this projection was built from.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn namespace_id(&self) -> ResourceId {
        ResourceId::cluster(self.name())
    }

    pub fn quota_id(&self) -> ResourceId {
        ResourceId::namespaced(self.name(), quota_name(self.name()))
    }

    pub fn role_id(&self, tier: Tier) -> ResourceId {
        ResourceId::namespaced(self.name(), tier.role_name(self.name()))
    }

    pub fn binding_id(&self, tier: Tier) -> ResourceId {
        ResourceId::namespaced(self.name(), tier.binding_name(self.name()))
    }

    pub fn labels(&self) -> &Map {
        &self.spec.labels
    }

    /// The workspace's annotations plus the ownership annotation, which
    /// takes precedence.
    pub fn annotations(&self) -> Map {
        labels::with_entry(&self.spec.annotations, OWNER_ANNOTATION, &self.owner)
    }

    /// Fails if `obj` is annotated as owned by another workspace. Objects
    /// without the annotation are adopted.
    pub fn check_owner<K: Object>(&self, obj: &K) -> Result<()> {
        match obj.annotations().get(OWNER_ANNOTATION) {
            Some(owner) if *owner != self.owner => Err(Error::Claimed {
                kind: K::kind(&()).into_owned(),
                id: ResourceId::of(obj),
                owner: owner.clone(),
            }),
            _ => Ok(()),
        }
    }

    pub fn namespace(&self) -> Namespace {
        Namespace {
            metadata: self.metadata(self.namespace_id()),
            spec: Some(NamespaceSpec {
                finalizers: Some(vec![NAMESPACE_FINALIZER.to_string()]),
            }),
            ..Default::default()
        }
    }

    /// Hard limits keyed by quota resource name, in the order they are
    /// corrected.
    pub fn hard_limits(&self) -> [(&'static str, &str); 3] {
        let resources = &self.spec.resources;
        [
            (QUOTA_CPU, resources.cpu.as_str()),
            (QUOTA_MEMORY, resources.memory.as_str()),
            (QUOTA_STORAGE, resources.disk.as_str()),
        ]
    }

    /// Fails if any limit does not parse. Limits are written as given.
    pub fn quota(&self) -> Result<ResourceQuota> {
        let mut hard = BTreeMap::new();
        for (resource, value) in self.hard_limits() {
            parse_limit(resource, value)?;
            hard.insert(resource.to_string(), Quantity(value.to_string()));
        }

        Ok(ResourceQuota {
            metadata: self.metadata(self.quota_id()),
            spec: Some(ResourceQuotaSpec {
                hard: Some(hard),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    pub fn role(&self, tier: Tier) -> Role {
        Role {
            metadata: self.metadata(self.role_id(tier)),
            rules: Some(vec![PolicyRule {
                api_groups: Some(vec![String::new()]),
                resources: Some(vec!["*".to_string()]),
                verbs: tier.verbs().iter().map(|v| v.to_string()).collect(),
                ..Default::default()
            }]),
        }
    }

    pub fn binding(&self, tier: Tier) -> RoleBinding {
        RoleBinding {
            metadata: self.metadata(self.binding_id(tier)),
            role_ref: RoleRef {
                api_group: RBAC_API_GROUP.to_string(),
                kind: "Role".to_string(),
                name: tier.role_name(self.name()),
            },
            subjects: self.subject(tier).map(|user| vec![user_subject(user)]),
        }
    }

    /// The user bound to `tier`, if any.
    pub fn subject(&self, tier: Tier) -> Option<&str> {
        user(&self.spec.users, tier)
    }

    fn metadata(&self, ResourceId { namespace, name }: ResourceId) -> ObjectMeta {
        let labels = self.labels();
        ObjectMeta {
            name: Some(name),
            namespace,
            labels: (!labels.is_empty()).then(|| labels.clone()),
            annotations: Some(self.annotations()),
            ..Default::default()
        }
    }
}

pub(crate) fn user_subject(name: &str) -> Subject {
    Subject {
        api_group: Some(RBAC_API_GROUP.to_string()),
        kind: "User".to_string(),
        name: name.to_string(),
        namespace: None,
    }
}

pub(crate) fn parse_limit(resource: &'static str, value: &str) -> Result<ParsedQuantity> {
    value.parse().map_err(|source| Error::Quantity {
        resource,
        value: value.to_string(),
        source,
    })
}

fn user(users: &Users, tier: Tier) -> Option<&str> {
    let user = match tier {
        Tier::Admin => &users.admin,
        Tier::Editor => &users.editor,
        Tier::Viewer => &users.viewer,
    };
    user.as_deref()
}

fn validate_subject(tier: Tier, user: &str) -> Result<()> {
    if user.is_empty() || user.trim() != user || user.contains(',') {
        return Err(Error::InvalidSubject {
            tier,
            name: user.to_string(),
        });
    }
    Ok(())
}
