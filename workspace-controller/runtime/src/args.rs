use crate::{
    controller::{self, Context},
    core::Leveling,
    reconcile::{KubeStore, ReconcileMetrics, Reconciler},
};
use anyhow::{bail, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use std::{sync::Arc, time::Duration};
use tracing::{info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "workspace-controller",
    about = "Keeps namespaces, quotas and roles in line with Workspace resources"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "workspace=info,warn",
        env = "WORKSPACE_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Delay before a workspace is reconciled again, after both successful
    /// and failed passes.
    #[clap(long, default_value = "3000")]
    requeue_interval_ms: u64,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            requeue_interval_ms,
        } = self;

        let leveling = leveling(requeue_interval_ms)?;

        let mut prom = <Registry>::default();
        let reconcile_metrics =
            ReconcileMetrics::register(prom.sub_registry_with_prefix("workspace_reconcile"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let ctx = Arc::new(Context {
            reconciler: Reconciler::new(KubeStore::new(runtime.client()), reconcile_metrics),
            leveling,
        });
        tokio::spawn(
            controller::run(runtime.client(), ctx, runtime.shutdown_handle())
                .instrument(info_span!("workspaces")),
        );

        // Block the main thread on the shutdown signal. Once it fires, wait for
        // the controller to complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

fn leveling(requeue_interval_ms: u64) -> Result<Leveling> {
    if requeue_interval_ms == 0 {
        bail!("--requeue-interval-ms must be greater than zero");
    }
    Ok(Leveling::new(Duration::from_millis(requeue_interval_ms)))
}
