//! Batch initialization of module tools.
//!
//! Modules are processed one at a time, in input order. Each module runs
//! inside its own failure boundary: an error, a discovery timeout or a panic
//! becomes a [`ModuleFailure`] and the loop moves on.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{error, info, warn};

use tfgen_core::{derive_name, ModuleReference, RunConfig, ToolDescriptor, ToolSink};

use crate::assembler::{AssemblerSettings, ToolAssembler};
use crate::discovery::{DiscoveryOutcome, DiscoveryRequest, VariableDiscovery};
use crate::error::{IacError, IacResult, ModuleFailure};

/// Result of a batch run that produced at least one descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub descriptors: Vec<ToolDescriptor>,
    pub failures: Vec<ModuleFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Turns module references into registered tool descriptors.
pub struct BatchInitializer {
    discovery: Arc<dyn VariableDiscovery>,
    sink: Arc<dyn ToolSink>,
    assembler: ToolAssembler,
    category: String,
    max_workers: usize,
    timeout: Option<Duration>,
}

impl BatchInitializer {
    pub fn new(discovery: Arc<dyn VariableDiscovery>, sink: Arc<dyn ToolSink>, config: &RunConfig) -> Self {
        Self {
            discovery,
            sink,
            assembler: ToolAssembler::new(AssemblerSettings::from_config(config)),
            category: config.tools.category.clone(),
            max_workers: config.discovery.max_workers,
            timeout: config.discovery.timeout(),
        }
    }

    pub fn with_assembler(mut self, assembler: ToolAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Per-module discovery timeout; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Process every module and register the produced descriptors.
    ///
    /// Returns the report when at least one descriptor was produced,
    /// [`IacError::Batch`] when every module failed, and
    /// [`IacError::NoToolsConfigured`] when there was nothing to do.
    pub async fn run(&self, modules: &[ModuleReference]) -> IacResult<BatchReport> {
        let started_at = Utc::now();
        let mut descriptors = Vec::new();
        let mut failures = Vec::new();

        info!("Initializing tools for {} module(s)", modules.len());
        for reference in modules {
            match self.process(reference).await {
                Ok(tools) => {
                    for tool in &tools {
                        self.sink.register(&self.category, tool.clone());
                    }
                    descriptors.extend(tools);
                }
                Err(failure) => {
                    error!("Failed to initialize module {}", failure);
                    failures.push(failure);
                }
            }
        }

        if descriptors.is_empty() {
            if failures.is_empty() {
                return Err(IacError::NoToolsConfigured);
            }
            return Err(IacError::Batch { failures });
        }

        if !failures.is_empty() {
            warn!("{} module(s) failed to initialize", failures.len());
        }
        info!(
            "Initialized {} tool(s) from {} module(s)",
            descriptors.len(),
            modules.len() - failures.len()
        );

        Ok(BatchReport {
            descriptors,
            failures,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn process(&self, reference: &ModuleReference) -> Result<Vec<ToolDescriptor>, ModuleFailure> {
        let name = derive_name(reference);
        info!("Processing module {} from {}", name, reference.url);

        match AssertUnwindSafe(self.build_module(&name, reference))
            .catch_unwind()
            .await
        {
            Ok(Ok(tools)) => Ok(tools),
            Ok(Err(e)) => Err(ModuleFailure::new(name, e.to_string())),
            Err(panic) => Err(ModuleFailure::new(name, format!("panicked: {}", panic_message(panic.as_ref())))),
        }
    }

    async fn build_module(&self, name: &str, reference: &ModuleReference) -> IacResult<Vec<ToolDescriptor>> {
        let outcome = self.discover(reference).await?;
        self.assembler.assemble(name, reference, &outcome)
    }

    async fn discover(&self, reference: &ModuleReference) -> IacResult<DiscoveryOutcome> {
        let request = DiscoveryRequest::for_module(reference).with_max_workers(self.max_workers);
        let discovery = self.discovery.discover(&request);

        match self.timeout {
            Some(limit) => match timeout(limit, discovery).await {
                Ok(result) => result,
                Err(_) => Err(IacError::DiscoveryTimeout {
                    source_url: reference.url.clone(),
                    limit,
                }),
            },
            None => discovery.await,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDiscovery, MockResponse};
    use tfgen_core::{BaseType, ToolRegistry, TypeDescriptor, Variable};

    const VPC: &str = "https://github.com/terraform-aws-modules/terraform-aws-vpc";
    const EKS: &str = "https://github.com/terraform-aws-modules/terraform-aws-eks";

    fn outcome() -> DiscoveryOutcome {
        DiscoveryOutcome::from_variables(vec![
            Variable::new("region", TypeDescriptor::new(BaseType::String)).required()
        ])
    }

    fn module(url: &str) -> ModuleReference {
        ModuleReference::new(url).unwrap()
    }

    fn batch(discovery: MockDiscovery, registry: Arc<ToolRegistry>) -> BatchInitializer {
        BatchInitializer::new(Arc::new(discovery), registry, &RunConfig::default())
    }

    #[tokio::test]
    async fn test_run_registers_descriptors() {
        let registry = Arc::new(ToolRegistry::new());
        let discovery = MockDiscovery::new().with_outcome(VPC, outcome());
        let report = batch(discovery.clone(), registry.clone())
            .run(&[module(VPC)])
            .await
            .unwrap();

        assert_eq!(report.descriptors.len(), 3);
        assert!(report.failures.is_empty());
        assert!(report.finished_at >= report.started_at);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("terraform", "tf_aws_vpc_apply"));
        assert_eq!(discovery.requests()[0].max_workers, Some(8));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let registry = Arc::new(ToolRegistry::new());
        let discovery = MockDiscovery::new()
            .with_response(EKS, MockResponse::Panic("parser exploded".into()))
            .with_outcome(VPC, outcome());

        let report = batch(discovery, registry)
            .run(&[module(EKS), module(VPC)])
            .await
            .unwrap();

        assert_eq!(report.descriptors.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].module_name, "aws_eks");
        assert!(report.failures[0].error_message.contains("parser exploded"));
    }

    #[tokio::test]
    async fn test_discovery_timeout() {
        let registry = Arc::new(ToolRegistry::new());
        let discovery = MockDiscovery::new()
            .with_response(VPC, MockResponse::Delayed(Duration::from_millis(500), outcome()));

        let err = batch(discovery, registry.clone())
            .with_timeout(Some(Duration::from_millis(20)))
            .run(&[module(VPC)])
            .await
            .unwrap_err();

        match err {
            IacError::Batch { failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].error_message.contains("timed out after 20ms"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let registry = Arc::new(ToolRegistry::new());
        let err = batch(MockDiscovery::new(), registry).run(&[]).await.unwrap_err();
        assert!(matches!(err, IacError::NoToolsConfigured));
    }
}
