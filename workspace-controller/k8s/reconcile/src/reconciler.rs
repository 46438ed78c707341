use crate::{
    error::Op,
    project::{self, Projection},
    Error, Object, ReconcileMetrics, ResourceId, Result, Store, StoreError,
};
use std::collections::BTreeMap;
use tracing::Instrument;
use workspace_controller_core::{Observation, Outcome, Step, Tier, Transition};
use workspace_controller_k8s_api::{
    labels::{self, Map},
    Namespace, ParsedQuantity, Quantity, ResourceQuota, Role, RoleBinding, Workspace,
};

/// Drives the resources of one workspace toward their projected shape, one
/// pass at a time.
///
/// A pass stops as soon as it has created a missing resource. Drift is only
/// corrected once every resource exists. Callers are expected to invoke
/// passes repeatedly; see [`workspace_controller_core::Leveling`].
pub struct Reconciler<S> {
    store: S,
    metrics: ReconcileMetrics,
}

/// Objects read during a pass, in the form last returned by the store.
#[derive(Default)]
struct Live {
    namespace: Option<Namespace>,
    quota: Option<ResourceQuota>,
    roles: BTreeMap<Tier, Role>,
    bindings: BTreeMap<Tier, RoleBinding>,
}

enum Ensured<K> {
    Present(K),
    Created,
}

// === impl Reconciler ===

impl<S: Store> Reconciler<S> {
    pub fn new(store: S, metrics: ReconcileMetrics) -> Self {
        Self { store, metrics }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs a single pass for the named workspace object.
    pub async fn reconcile(&self, workspace: &str) -> Result<Outcome> {
        let result = self
            .pass(workspace)
            .instrument(tracing::debug_span!("pass", %workspace))
            .await;
        self.metrics.pass(&result);
        result
    }

    async fn pass(&self, workspace: &str) -> Result<Outcome> {
        let id = ResourceId::cluster(workspace);
        let ws = match self.store.get::<Workspace>(&id).await {
            Ok(ws) => ws,
            Err(StoreError::NotFound) => {
                tracing::debug!("Workspace not found");
                return Ok(Outcome::Absent);
            }
            Err(source) => return Err(store_error::<Workspace>(Op::Get, id, source)),
        };

        let proj = Projection::new(&ws)?;
        let mut live = Live::default();
        let mut step = Step::FIRST;
        loop {
            let observation = self.observe(step, &proj, &mut live).await?;
            match step.transition(observation) {
                Transition::Continue(next) => step = next,
                Transition::Finish(outcome) => {
                    tracing::debug!(outcome = outcome.as_str(), %step, "Pass complete");
                    return Ok(outcome);
                }
            }
        }
    }

    async fn observe(
        &self,
        step: Step,
        proj: &Projection<'_>,
        live: &mut Live,
    ) -> Result<Observation> {
        let observation = match step {
            Step::EnsureNamespace => self
                .ensure(proj, proj.namespace_id(), || Ok(proj.namespace()))
                .await?
                .keep(|ns| live.namespace = Some(ns)),

            Step::EnsureQuota => self
                .ensure(proj, proj.quota_id(), || proj.quota())
                .await?
                .keep(|quota| live.quota = Some(quota)),

            Step::EnsureRole(tier) => self
                .ensure(proj, proj.role_id(tier), || Ok(proj.role(tier)))
                .await?
                .keep(|role| {
                    live.roles.insert(tier, role);
                }),

            Step::EnsureBinding(tier) => self
                .ensure(proj, proj.binding_id(tier), || Ok(proj.binding(tier)))
                .await?
                .keep(|binding| {
                    live.bindings.insert(tier, binding);
                }),

            Step::CorrectDrift => Observation::Corrected {
                updates: self.correct_drift(proj, live).await?,
            },
        };
        Ok(observation)
    }

    /// Reads the object, creating it from `desired` if it does not exist.
    async fn ensure<K: Object>(
        &self,
        proj: &Projection<'_>,
        id: ResourceId,
        desired: impl FnOnce() -> Result<K> + Send,
    ) -> Result<Ensured<K>> {
        match self.store.get::<K>(&id).await {
            Ok(obj) => {
                proj.check_owner(&obj)?;
                Ok(Ensured::Present(obj))
            }
            Err(StoreError::NotFound) => {
                let obj = desired()?;
                self.create(&obj).await?;
                Ok(Ensured::Created)
            }
            Err(source) => Err(store_error::<K>(Op::Get, id, source)),
        }
    }

    async fn correct_drift(&self, proj: &Projection<'_>, live: &mut Live) -> Result<usize> {
        let mut updates = 0;

        // Bindings' labels are not corrected.
        let labels = proj.labels();
        if let Some(ns) = live.namespace.as_mut() {
            updates += usize::from(self.correct_labels(ns, labels).await?);
        }
        if let Some(quota) = live.quota.as_mut() {
            updates += usize::from(self.correct_labels(quota, labels).await?);
        }
        for role in live.roles.values_mut() {
            updates += usize::from(self.correct_labels(role, labels).await?);
        }

        let annotations = proj.annotations();
        if let Some(ns) = live.namespace.as_mut() {
            updates += usize::from(self.correct_annotations(ns, &annotations).await?);
        }
        if let Some(quota) = live.quota.as_mut() {
            updates += usize::from(self.correct_annotations(quota, &annotations).await?);
        }

        for (tier, binding) in live.bindings.iter_mut() {
            updates += usize::from(self.correct_subject(binding, proj.subject(*tier)).await?);
        }

        if let Some(quota) = live.quota.as_mut() {
            updates += self.correct_limits(proj, quota).await?;
        }

        if updates > 0 {
            tracing::info!(updates, "Corrected drift");
        }
        Ok(updates)
    }

    /// Replaces the whole label map when any desired label is missing or
    /// differs. Extra live labels are left alone otherwise.
    async fn correct_labels<K: Object>(&self, obj: &mut K, desired: &Map) -> Result<bool> {
        if labels::contains_all(obj.meta().labels.as_ref(), desired) {
            return Ok(false);
        }
        obj.meta_mut().labels = Some(desired.clone());
        self.update(obj, "labels").await?;
        Ok(true)
    }

    async fn correct_annotations<K: Object>(&self, obj: &mut K, desired: &Map) -> Result<bool> {
        if labels::contains_all(obj.meta().annotations.as_ref(), desired) {
            return Ok(false);
        }
        obj.meta_mut().annotations = Some(desired.clone());
        self.update(obj, "annotations").await?;
        Ok(true)
    }

    /// Only the first subject is compared.
    async fn correct_subject(
        &self,
        binding: &mut RoleBinding,
        desired: Option<&str>,
    ) -> Result<bool> {
        let first = binding.subjects.as_deref().and_then(|s| s.first());
        let drifted = match (desired, first) {
            (Some(user), Some(subject)) => subject.name != user,
            (Some(_), None) => true,
            (None, _) => binding.subjects.as_ref().is_some_and(|s| !s.is_empty()),
        };
        if !drifted {
            return Ok(false);
        }

        match desired {
            Some(user) => {
                let subjects = binding.subjects.get_or_insert_with(Vec::new);
                if let Some(subject) = subjects.first_mut() {
                    subject.name = user.to_string();
                } else {
                    subjects.push(project::user_subject(user));
                }
            }
            None => binding.subjects = None,
        }
        self.update(binding, "subject").await?;
        Ok(true)
    }

    /// Limits are compared numerically. A missing or unparseable live limit
    /// is rewritten.
    async fn correct_limits(
        &self,
        proj: &Projection<'_>,
        quota: &mut ResourceQuota,
    ) -> Result<usize> {
        let mut updates = 0;
        for (resource, value) in proj.hard_limits() {
            let desired = project::parse_limit(resource, value)?;
            let current = quota
                .spec
                .as_ref()
                .and_then(|spec| spec.hard.as_ref())
                .and_then(|hard| hard.get(resource))
                .and_then(|q| ParsedQuantity::try_from(q).ok());
            if current == Some(desired) {
                continue;
            }

            quota
                .spec
                .get_or_insert_with(Default::default)
                .hard
                .get_or_insert_with(Default::default)
                .insert(resource.to_string(), Quantity(value.to_string()));
            self.update(quota, resource).await?;
            updates += 1;
        }
        Ok(updates)
    }

    async fn create<K: Object>(&self, obj: &K) -> Result<()> {
        let kind = K::kind(&());
        let id = ResourceId::of(obj);
        match self.store.create(obj).await {
            Ok(_) => {
                tracing::info!(%kind, %id, "Created");
                self.metrics.write(&kind, Op::Create);
                Ok(())
            }
            Err(source) => {
                tracing::error!(%kind, %id, error = %source, "Failed to create");
                Err(store_error::<K>(Op::Create, id, source))
            }
        }
    }

    /// Writes `obj` and replaces it with the stored result so that later
    /// writes in the pass carry the current resource version.
    async fn update<K: Object>(&self, obj: &mut K, drift: &str) -> Result<()> {
        let kind = K::kind(&());
        let id = ResourceId::of(&*obj);
        match self.store.update(&*obj).await {
            Ok(updated) => {
                tracing::info!(%kind, %id, drift, "Updated");
                self.metrics.write(&kind, Op::Update);
                *obj = updated;
                Ok(())
            }
            Err(source) => {
                tracing::error!(%kind, %id, drift, error = %source, "Failed to update");
                Err(store_error::<K>(Op::Update, id, source))
            }
        }
    }
}

// === impl Ensured ===

impl<K> Ensured<K> {
    /// Hands a present object to `keep`.
    fn keep(self, keep: impl FnOnce(K)) -> Observation {
        match self {
            Self::Present(obj) => {
                keep(obj);
                Observation::Present
            }
            Self::Created => Observation::Created,
        }
    }
}

fn store_error<K: Object>(op: Op, id: ResourceId, source: StoreError) -> Error {
    Error::Store {
        op,
        kind: K::kind(&()).into_owned(),
        id,
        source,
    }
}
