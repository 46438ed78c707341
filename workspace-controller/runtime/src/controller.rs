use crate::{
    core::{Leveling, Outcome},
    k8s::{Api, Client, ResourceExt, Workspace},
    reconcile::{self, KubeStore, Reconciler},
};
use futures::prelude::*;
use kube::runtime::{controller::Action, watcher, Controller};
use std::sync::Arc;

pub(crate) struct Context {
    pub(crate) reconciler: Reconciler<KubeStore>,
    pub(crate) leveling: Leveling,
}

/// Runs passes for every workspace until shutdown is signaled.
///
/// The controller never runs two passes for the same workspace at once.
pub(crate) async fn run(client: Client, ctx: Arc<Context>, drain: drain::Watch) {
    let (close_tx, close_rx) = tokio::sync::oneshot::channel::<()>();
    let workspaces = Api::<Workspace>::all(client);

    tokio::pin! {
        let controller = Controller::new(workspaces, watcher::Config::default())
            .graceful_shutdown_on(close_rx.map(|_| ()))
            .run(reconcile, error_policy, ctx)
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => tracing::trace!(workspace = %obj.name, "Reconciled"),
                    Err(error) => tracing::debug!(%error, "Reconciliation failed"),
                }
            });
    }

    tracing::info!("Workspace controller started");
    tokio::select! {
        _ = (&mut controller) => {}
        handle = drain.signaled() => {
            let _ = close_tx.send(());
            handle.release_after(controller).await;
            tracing::info!("Workspace controller stopped");
        }
    }
}

async fn reconcile(
    workspace: Arc<Workspace>,
    ctx: Arc<Context>,
) -> Result<Action, reconcile::Error> {
    let outcome = ctx.reconciler.reconcile(&workspace.name_any()).await?;
    Ok(action(&ctx.leveling, &outcome))
}

fn error_policy(workspace: Arc<Workspace>, error: &reconcile::Error, ctx: Arc<Context>) -> Action {
    tracing::warn!(workspace = %workspace.name_any(), %error, "Pass failed");
    Action::requeue(ctx.leveling.after_error())
}

fn action(leveling: &Leveling, outcome: &Outcome) -> Action {
    match leveling.after(outcome) {
        Some(delay) => Action::requeue(delay),
        None => Action::await_change(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Step;
    use std::time::Duration;

    #[test]
    fn outcomes_map_to_actions() {
        let leveling = Leveling::new(Duration::from_secs(5));
        for (outcome, expected) in [
            (
                Outcome::Created(Step::EnsureQuota),
                Action::requeue(Duration::from_secs(5)),
            ),
            (
                Outcome::Converged { updates: 2 },
                Action::requeue(Duration::from_secs(5)),
            ),
            (Outcome::Absent, Action::await_change()),
        ] {
            assert_eq!(action(&leveling, &outcome), expected, "{outcome:?}");
        }
    }
}
