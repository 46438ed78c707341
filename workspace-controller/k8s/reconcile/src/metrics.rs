use crate::{error::Op, Result};
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};
use workspace_controller_core::Outcome;

#[derive(Clone, Debug, Default)]
pub struct ReconcileMetrics {
    passes: Family<PassLabels, Counter>,
    writes: Family<WriteLabels, Counter>,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct PassLabels {
    outcome: &'static str,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct WriteLabels {
    kind: String,
    op: &'static str,
}

// === impl ReconcileMetrics ===

impl ReconcileMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let passes = Family::<PassLabels, Counter>::default();
        reg.register(
            "passes",
            "Total number of reconciliation passes by outcome",
            passes.clone(),
        );

        let writes = Family::<WriteLabels, Counter>::default();
        reg.register(
            "writes",
            "Total number of successful writes to managed resources",
            writes.clone(),
        );

        Self { passes, writes }
    }

    pub(crate) fn pass(&self, result: &Result<Outcome>) {
        let outcome = match result {
            Ok(outcome) => outcome.as_str(),
            Err(_) => "error",
        };
        self.passes.get_or_create(&PassLabels { outcome }).inc();
    }

    pub(crate) fn write(&self, kind: &str, op: Op) {
        let labels = WriteLabels {
            kind: kind.to_string(),
            op: op.as_str(),
        };
        self.writes.get_or_create(&labels).inc();
    }
}
