//! Required-entity resolution over a compiled workflow.
//!
//! A pass walks pre- and post-deployment first, because what they need
//! applies to every phase service, then each forward phase, then each
//! rollback phase. A phase contributes its resolved service id to the
//! artifact set when any of its nodes consumes the build artifact, and to
//! the manifest set when the service takes its artifact from a helm chart
//! and a node renders that chart.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use phasegrid_model::{
    Catalog, DeploymentType, EntityType, FeatureFlag, FeatureFlags, Node, OrchestrationWorkflow,
    PhaseStep, Service, StepType, StepTypeRegistry, WorkflowPhase,
};

use crate::bindings::{self, Bindings};
use crate::error::ResolveResult;
use crate::scan::{self, ExpressionScanner};

const COMMAND_NAME: &str = "commandName";

/// Services that need an artifact or manifest selected before deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredEntities {
    pub artifact_service_ids: Vec<String>,
    pub manifest_service_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RequiredEntities {
    pub fn needs_artifact(&self, service_id: &str) -> bool {
        self.artifact_service_ids.iter().any(|id| id == service_id)
    }

    pub fn needs_manifest(&self, service_id: &str) -> bool {
        self.manifest_service_ids.iter().any(|id| id == service_id)
    }

    /// Entity kinds the deployment must be given.
    pub fn entity_types(&self) -> Vec<EntityType> {
        let mut types = Vec::new();
        if !self.artifact_service_ids.is_empty() {
            types.push(EntityType::Artifact);
        }
        if !self.manifest_service_ids.is_empty() {
            types.push(EntityType::HelmChart);
        }
        types
    }

    fn add_artifact(&mut self, service_id: &str) {
        if !self.needs_artifact(service_id) {
            self.artifact_service_ids.push(service_id.to_string());
        }
    }

    fn add_manifest(&mut self, service_id: &str) {
        if !self.needs_manifest(service_id) {
            self.manifest_service_ids.push(service_id.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Needs {
    artifact: bool,
    manifest: bool,
}

impl Needs {
    fn merge(&mut self, other: Needs) {
        self.artifact |= other.artifact;
        self.manifest |= other.manifest;
    }

    fn both(&self) -> bool {
        self.artifact && self.manifest
    }
}

/// What node checks know about the phase that owns the node.
struct PhaseContext<'p> {
    service_id: Option<&'p str>,
    deployment_type: Option<DeploymentType>,
    infra_ids: &'p [String],
    in_phase: bool,
}

impl PhaseContext<'_> {
    fn outside() -> Self {
        Self {
            service_id: None,
            deployment_type: None,
            infra_ids: &[],
            in_phase: false,
        }
    }
}

/// Computes [`RequiredEntities`] for workflows of one application.
pub struct RequiredEntityResolver<'a> {
    catalog: &'a dyn Catalog,
    flags: &'a dyn FeatureFlags,
    registry: &'a StepTypeRegistry,
    scanner: ExpressionScanner,
    app_id: String,
    account_id: String,
}

impl<'a> RequiredEntityResolver<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        flags: &'a dyn FeatureFlags,
        registry: &'a StepTypeRegistry,
    ) -> ResolveResult<Self> {
        Ok(Self {
            catalog,
            flags,
            registry,
            scanner: ExpressionScanner::new()?,
            app_id: String::new(),
            account_id: String::new(),
        })
    }

    pub fn for_app(mut self, app_id: &str, account_id: &str) -> Self {
        self.app_id = app_id.to_string();
        self.account_id = account_id.to_string();
        self
    }

    /// Resolves without touching `workflow`.
    pub fn resolve(
        &self,
        workflow: &OrchestrationWorkflow,
        bindings: &Bindings,
    ) -> ResolveResult<RequiredEntities> {
        let mut scratch = workflow.clone();
        self.annotate(&mut scratch, bindings)
    }

    /// Resolves and sets `artifact_needed` on every step group whose nodes
    /// consume the artifact.
    pub fn annotate(
        &self,
        workflow: &mut OrchestrationWorkflow,
        bindings: &Bindings,
    ) -> ResolveResult<RequiredEntities> {
        let mut pass = Pass {
            resolver: self,
            cache: PassCache::default(),
            out: RequiredEntities::default(),
        };

        let outside = PhaseContext::outside();
        let mut shared = pass.group(&outside, &mut workflow.pre_deployment_steps)?;
        shared.merge(pass.group(&outside, &mut workflow.post_deployment_steps)?);

        let mut forward = shared;
        for phase in &mut workflow.phases {
            forward.merge(pass.phase(&mut phase.forward, bindings, shared)?);
        }
        let mut rollback = Needs::default();
        for phase in &mut workflow.phases {
            if let Some(rollback_phase) = phase.rollback.as_mut() {
                rollback.merge(pass.phase(rollback_phase, bindings, shared)?);
            }
        }

        if rollback.artifact && !forward.artifact {
            warn!(app = %self.app_id, "only rollback steps need an artifact");
            pass.out
                .warnings
                .push("Phase steps do not need an artifact, but rollback steps do".to_string());
        }
        debug!(
            artifacts = pass.out.artifact_service_ids.len(),
            manifests = pass.out.manifest_service_ids.len(),
            "required entities resolved"
        );
        Ok(pass.out)
    }
}

/// Collaborator answers memoized for one pass.
#[derive(Debug, Default)]
struct PassCache {
    services: HashMap<String, Option<Service>>,
    artifact_streams: HashMap<String, bool>,
    manifests: HashMap<(String, String), bool>,
    manifest_sources: HashMap<String, bool>,
    helm_chart_as_artifact: Option<bool>,
}

struct Pass<'r> {
    resolver: &'r RequiredEntityResolver<'r>,
    cache: PassCache,
    out: RequiredEntities,
}

impl Pass<'_> {
    fn phase(
        &mut self,
        phase: &mut WorkflowPhase,
        bindings: &Bindings,
        shared: Needs,
    ) -> ResolveResult<Needs> {
        let service_id = bindings::resolved_service_id(phase, bindings);
        let infra_ids = bindings::resolved_infra_definition_ids(phase, bindings);
        let mut needs = Needs::default();

        if let Some(id) = service_id.as_deref() {
            needs.artifact = self.out.needs_artifact(id);
            needs.manifest = self.out.needs_manifest(id);
            if needs.both() {
                return Ok(needs);
            }
            if self.resolver.scanner.is_live_expression(id) {
                if bindings.is_declared(id) {
                    self.out.add_artifact(id);
                    needs.artifact = true;
                } else {
                    debug!(phase = %phase.name, service = id, "unresolved service, phase skipped");
                }
                return Ok(needs);
            }
            if shared.artifact {
                self.out.add_artifact(id);
            }
            if shared.manifest && self.requires_manifest(id) {
                self.out.add_manifest(id);
            }
            if shared.both() {
                return Ok(needs);
            }
        }

        let ctx = PhaseContext {
            service_id: service_id.as_deref(),
            deployment_type: phase.deployment_type,
            infra_ids: &infra_ids,
            in_phase: true,
        };
        for group in &mut phase.phase_steps {
            if group.steps.is_empty() {
                continue;
            }
            let done = ctx
                .service_id
                .is_some_and(|id| self.out.needs_artifact(id) && self.out.needs_manifest(id));
            if needs.both() && done {
                return Ok(needs);
            }
            needs.merge(self.group(&ctx, group)?);
        }

        if let Some(id) = ctx.service_id {
            if needs.artifact {
                self.out.add_artifact(id);
            }
            if needs.manifest {
                self.out.add_manifest(id);
            }
        }
        Ok(needs)
    }

    fn group(&mut self, ctx: &PhaseContext<'_>, group: &mut PhaseStep) -> ResolveResult<Needs> {
        let mut needs = Needs::default();
        for node in &group.steps {
            if self.node_needs_artifact(ctx, node)? {
                needs.artifact = true;
                break;
            }
        }

        needs.manifest = self.helm_chart_as_artifact()?
            && group.steps.iter().any(|n| self.node_needs_manifest(n))
            && match ctx.service_id {
                Some(id) => self.requires_manifest(id),
                None => !ctx.in_phase,
            };

        if needs.artifact {
            group.artifact_needed = true;
        }
        Ok(needs)
    }

    fn node_needs_artifact(&mut self, ctx: &PhaseContext<'_>, node: &Node) -> ResolveResult<bool> {
        let resolver = self.resolver;
        if resolver.scanner.mentions_artifact(scan::template_variable_values(node)) {
            return Ok(true);
        }
        let needed = match &node.step_type {
            StepType::Command => self.command_needs_artifact(ctx, node)?,
            StepType::Http | StepType::ShellScript | StepType::CloudFormationCreateStack => {
                resolver.scanner.mentions_artifact(scan::templatizable_values(node))
            }
            kind if resolver.registry.consumes_artifact(kind) => true,
            StepType::HelmDeploy => {
                ctx.deployment_type == Some(DeploymentType::Helm) && self.manifest_uses_artifact(ctx)?
            }
            kind if resolver.registry.is_k8s_manifest(kind) => {
                ctx.in_phase && (self.artifact_streams_exist(ctx)? || self.manifest_uses_artifact(ctx)?)
            }
            _ => false,
        };
        if needed {
            debug!(node = %node.name, kind = %node.step_type, "node needs artifact");
        }
        Ok(needed)
    }

    fn node_needs_manifest(&self, node: &Node) -> bool {
        let resolver = self.resolver;
        if resolver.scanner.mentions_manifest(scan::template_variable_values(node)) {
            return true;
        }
        resolver.registry.consumes_manifest(&node.step_type)
            || resolver.scanner.mentions_manifest(scan::templatizable_values(node))
    }

    /// A linked command template decides first, then the phase service's
    /// command of the same name.
    fn command_needs_artifact(&mut self, ctx: &PhaseContext<'_>, node: &Node) -> ResolveResult<bool> {
        let resolver = self.resolver;
        if let Some(template_id) = node.template_uuid.as_deref() {
            let template = resolver
                .catalog
                .command_template(template_id, node.template_version.as_deref())?;
            if template.is_some_and(|t| t.artifact_needed) {
                return Ok(true);
            }
        }
        let Some(service_id) = self.concrete_service(ctx) else {
            return Ok(false);
        };
        let Some(command_name) = node.str_property(COMMAND_NAME) else {
            return Ok(false);
        };
        Ok(self
            .service(service_id)?
            .and_then(|service| service.command(command_name))
            .is_some_and(|command| command.artifact_needed))
    }

    fn concrete_service<'c>(&self, ctx: &PhaseContext<'c>) -> Option<&'c str> {
        ctx.service_id
            .filter(|id| !self.resolver.scanner.is_live_expression(id))
    }

    fn service(&mut self, service_id: &str) -> ResolveResult<Option<&Service>> {
        if !self.cache.services.contains_key(service_id) {
            let service = self.resolver.catalog.service(&self.resolver.app_id, service_id)?;
            self.cache.services.insert(service_id.to_string(), service);
        }
        Ok(self.cache.services.get(service_id).and_then(Option::as_ref))
    }

    /// True when the service takes its artifact from a helm chart. A
    /// missing or unreadable service needs no manifest.
    fn requires_manifest(&mut self, service_id: &str) -> bool {
        if let Some(required) = self.cache.manifest_sources.get(service_id) {
            return *required;
        }
        let required = match self.service(service_id) {
            Ok(Some(service)) => service.artifact_from_manifest,
            Ok(None) => {
                warn!(service = service_id, "service not found, assuming no manifest is needed");
                false
            }
            Err(err) => {
                warn!(
                    service = service_id,
                    error = %err,
                    "service lookup failed, assuming no manifest is needed"
                );
                false
            }
        };
        self.cache.manifest_sources.insert(service_id.to_string(), required);
        required
    }

    fn helm_chart_as_artifact(&mut self) -> ResolveResult<bool> {
        if let Some(enabled) = self.cache.helm_chart_as_artifact {
            return Ok(enabled);
        }
        let enabled = self
            .resolver
            .flags
            .is_enabled(FeatureFlag::HelmChartAsArtifact, &self.resolver.account_id)?;
        self.cache.helm_chart_as_artifact = Some(enabled);
        Ok(enabled)
    }

    fn artifact_streams_exist(&mut self, ctx: &PhaseContext<'_>) -> ResolveResult<bool> {
        let Some(service_id) = self.concrete_service(ctx) else {
            return Ok(false);
        };
        if let Some(exists) = self.cache.artifact_streams.get(service_id) {
            return Ok(*exists);
        }
        let exists = self
            .resolver
            .catalog
            .artifact_streams_exist(&self.resolver.app_id, service_id)?;
        self.cache.artifact_streams.insert(service_id.to_string(), exists);
        Ok(exists)
    }

    /// True when the manifests on any resolved infrastructure reference the
    /// artifact.
    fn manifest_uses_artifact(&mut self, ctx: &PhaseContext<'_>) -> ResolveResult<bool> {
        let Some(service_id) = self.concrete_service(ctx) else {
            return Ok(false);
        };
        for infra_id in ctx.infra_ids {
            if infra_id.is_empty() || self.resolver.scanner.is_live_expression(infra_id) {
                continue;
            }
            let key = (service_id.to_string(), infra_id.clone());
            let uses = match self.cache.manifests.get(&key) {
                Some(uses) => *uses,
                None => {
                    let uses = self.resolver.catalog.manifest_references_artifact(
                        &self.resolver.app_id,
                        service_id,
                        infra_id,
                    )?;
                    self.cache.manifests.insert(key, uses);
                    uses
                }
            };
            if uses {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use phasegrid_model::{
        CommandTemplate, CommandType, FeatureSet, InMemoryCatalog, ManifestRecord, OrchestrationStrategy,
        Phase, PhaseStepType, ServiceCommand, TemplateExpression, fields,
    };
    use crate::error::ResolveError;
    use phasegrid_model::CatalogError;

    /// Counts service lookups to check the per-pass cache.
    struct CountingCatalog {
        inner: InMemoryCatalog,
        service_calls: Cell<usize>,
        fail: bool,
    }

    impl CountingCatalog {
        fn new(inner: InMemoryCatalog) -> Self {
            Self {
                inner,
                service_calls: Cell::new(0),
                fail: false,
            }
        }
    }

    impl Catalog for CountingCatalog {
        fn service(&self, app_id: &str, service_id: &str) -> Result<Option<Service>, CatalogError> {
            if self.fail {
                return Err(CatalogError("service store unavailable".into()));
            }
            self.service_calls.set(self.service_calls.get() + 1);
            self.inner.service(app_id, service_id)
        }

        fn infrastructure_definition(
            &self,
            app_id: &str,
            infra_definition_id: &str,
        ) -> Result<Option<phasegrid_model::InfrastructureDefinition>, CatalogError> {
            self.inner.infrastructure_definition(app_id, infra_definition_id)
        }

        fn artifact_streams_exist(&self, app_id: &str, service_id: &str) -> Result<bool, CatalogError> {
            self.inner.artifact_streams_exist(app_id, service_id)
        }

        fn manifest_references_artifact(
            &self,
            app_id: &str,
            service_id: &str,
            infra_definition_id: &str,
        ) -> Result<bool, CatalogError> {
            self.inner
                .manifest_references_artifact(app_id, service_id, infra_definition_id)
        }

        fn command_template(
            &self,
            template_id: &str,
            version: Option<&str>,
        ) -> Result<Option<CommandTemplate>, CatalogError> {
            self.inner.command_template(template_id, version)
        }
    }

    fn phase_with(name: &str, service_id: &str, nodes: Vec<Node>) -> WorkflowPhase {
        let mut phase = WorkflowPhase::new(name, Some(DeploymentType::Ssh));
        phase.service_id = Some(service_id.to_string());
        phase.infra_definition_id = Some("infra-1".to_string());
        phase.phase_steps = vec![PhaseStep::new(PhaseStepType::DeployService, "Deploy").with_steps(nodes)];
        phase
    }

    fn workflow(phases: Vec<WorkflowPhase>) -> OrchestrationWorkflow {
        let mut workflow = OrchestrationWorkflow::new(OrchestrationStrategy::Canary);
        workflow.phases = phases.into_iter().map(|p| Phase::new(p, None)).collect();
        workflow
    }

    fn http(body: &str) -> Node {
        Node::new(StepType::Http, "Check").with_property("body", body)
    }

    fn resolve(catalog: &dyn Catalog, flags: &FeatureSet, workflow: &OrchestrationWorkflow, bindings: &Bindings) -> RequiredEntities {
        let registry = StepTypeRegistry::builtin();
        RequiredEntityResolver::new(catalog, flags, &registry)
            .unwrap()
            .resolve(workflow, bindings)
            .unwrap()
    }

    #[test]
    fn http_body_mentioning_artifact() {
        let catalog = InMemoryCatalog::new();
        let flags = FeatureSet::new();
        let needed = workflow(vec![phase_with("Phase 1", "svc-1", vec![http("${artifact.buildNo}")])]);
        let result = resolve(&catalog, &flags, &needed, &Bindings::new());
        assert_eq!(result.artifact_service_ids, vec!["svc-1"]);
        assert_eq!(result.entity_types(), vec![EntityType::Artifact]);

        let static_body = workflow(vec![phase_with("Phase 1", "svc-1", vec![http("static")])]);
        let result = resolve(&catalog, &flags, &static_body, &Bindings::new());
        assert!(result.artifact_service_ids.is_empty());
        assert!(result.entity_types().is_empty());
    }

    #[test]
    fn annotate_marks_step_groups() {
        let catalog = InMemoryCatalog::new();
        let flags = FeatureSet::new();
        let registry = StepTypeRegistry::builtin();
        let resolver = RequiredEntityResolver::new(&catalog, &flags, &registry).unwrap();
        let mut doc = workflow(vec![phase_with(
            "Phase 1",
            "svc-1",
            vec![Node::new(StepType::KubernetesDeploy, "Upgrade Containers")],
        )]);
        resolver.annotate(&mut doc, &Bindings::new()).unwrap();
        assert!(doc.phases[0].forward.phase_steps[0].artifact_needed);
    }

    #[test]
    fn commands_resolve_through_service_with_one_lookup() {
        let mut service = Service::new("svc-1", "api", Some(DeploymentType::Ssh));
        service.commands.push(ServiceCommand {
            name: "Install".into(),
            command_type: CommandType::Install,
            artifact_needed: true,
            template_uuid: None,
            template_version: None,
        });
        let catalog = CountingCatalog::new(InMemoryCatalog::new().with_service(service));
        let flags = FeatureSet::new();
        let command = Node::new(StepType::Command, "Install").with_property("commandName", "install");
        let doc = workflow(vec![
            phase_with("Phase 1", "svc-1", vec![command.clone()]),
            phase_with("Phase 2", "svc-1", vec![Node::new(StepType::Command, "Stop").with_property("commandName", "Stop")]),
        ]);
        let result = resolve(&catalog, &flags, &doc, &Bindings::new());
        assert_eq!(result.artifact_service_ids, vec!["svc-1"]);
        assert_eq!(catalog.service_calls.get(), 1);
    }

    #[test]
    fn linked_command_template_decides() {
        let catalog = InMemoryCatalog::new().with_command_template(CommandTemplate {
            id: "tpl-1".into(),
            version: Some("2".into()),
            artifact_needed: true,
        });
        let flags = FeatureSet::new();
        let mut command = Node::new(StepType::Command, "Install");
        command.template_uuid = Some("tpl-1".into());
        command.template_version = Some("2".into());
        let doc = workflow(vec![phase_with("Phase 1", "svc-9", vec![command])]);
        let result = resolve(&catalog, &flags, &doc, &Bindings::new());
        assert_eq!(result.artifact_service_ids, vec!["svc-9"]);
    }

    #[test]
    fn kubernetes_v2_asks_the_catalog() {
        let mut streams = Service::new("svc-1", "api", Some(DeploymentType::Kubernetes));
        streams.has_artifact_streams = true;
        let catalog = InMemoryCatalog::new()
            .with_service(streams)
            .with_manifest(ManifestRecord {
                service_id: "svc-2".into(),
                infra_definition_id: "infra-1".into(),
                references_artifact: true,
            });
        let flags = FeatureSet::new();
        let rolling = Node::new(StepType::K8sDeploymentRolling, "Rollout Deployment");
        let doc = workflow(vec![
            phase_with("Phase 1", "svc-1", vec![rolling.clone()]),
            phase_with("Phase 2", "svc-2", vec![rolling.clone()]),
            phase_with("Phase 3", "svc-3", vec![rolling]),
        ]);
        let result = resolve(&catalog, &flags, &doc, &Bindings::new());
        assert_eq!(result.artifact_service_ids, vec!["svc-1", "svc-2"]);
    }

    #[test]
    fn helm_deploy_only_counts_in_helm_phases() {
        let catalog = InMemoryCatalog::new().with_manifest(ManifestRecord {
            service_id: "svc-1".into(),
            infra_definition_id: "infra-1".into(),
            references_artifact: true,
        });
        let flags = FeatureSet::new();
        let mut helm = phase_with("Phase 1", "svc-1", vec![Node::new(StepType::HelmDeploy, "Helm Deploy")]);
        let doc = workflow(vec![helm.clone()]);
        assert!(resolve(&catalog, &flags, &doc, &Bindings::new()).artifact_service_ids.is_empty());

        helm.deployment_type = Some(DeploymentType::Helm);
        let doc = workflow(vec![helm]);
        assert_eq!(resolve(&catalog, &flags, &doc, &Bindings::new()).artifact_service_ids, vec!["svc-1"]);
    }

    #[test]
    fn manifest_needs_toggle_and_manifest_service() {
        let mut chart = Service::new("svc-1", "chart", Some(DeploymentType::Helm));
        chart.artifact_from_manifest = true;
        let catalog = InMemoryCatalog::new().with_service(chart);
        let doc = workflow(vec![
            phase_with("Phase 1", "svc-1", vec![Node::new(StepType::HelmDeploy, "Helm Deploy")]),
            phase_with("Phase 2", "svc-missing", vec![Node::new(StepType::HelmDeploy, "Helm Deploy")]),
        ]);

        let off = FeatureSet::new();
        assert!(resolve(&catalog, &off, &doc, &Bindings::new()).manifest_service_ids.is_empty());

        let on = FeatureSet::new().with(FeatureFlag::HelmChartAsArtifact);
        let result = resolve(&catalog, &on, &doc, &Bindings::new());
        assert_eq!(result.manifest_service_ids, vec!["svc-1"]);
        assert_eq!(result.entity_types(), vec![EntityType::HelmChart]);
    }

    #[test]
    fn pre_deployment_need_applies_to_every_phase_service() {
        let catalog = InMemoryCatalog::new();
        let flags = FeatureSet::new();
        let mut doc = workflow(vec![
            phase_with("Phase 1", "svc-1", vec![http("static")]),
            phase_with("Phase 2", "svc-2", Vec::new()),
        ]);
        doc.pre_deployment_steps = PhaseStep::pre_deployment().with_step(
            Node::new(StepType::ShellScript, "Fetch").with_property("scriptString", "wget ${artifact.url}"),
        );
        let result = resolve(&catalog, &flags, &doc, &Bindings::new());
        assert_eq!(result.artifact_service_ids, vec!["svc-1", "svc-2"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn rollback_only_need_is_a_warning() {
        let catalog = InMemoryCatalog::new();
        let flags = FeatureSet::new();
        let mut doc = workflow(Vec::new());
        let forward = phase_with("Phase 1", "svc-1", vec![http("static")]);
        let mut rollback = phase_with("Rollback Phase 1", "svc-1", vec![http("${artifact.url}")]);
        rollback.rollback = true;
        doc.phases.push(Phase::new(forward, Some(rollback)));

        let result = resolve(&catalog, &flags, &doc, &Bindings::new());
        assert_eq!(result.artifact_service_ids, vec!["svc-1"]);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn unresolved_service_expression() {
        let catalog = InMemoryCatalog::new();
        let flags = FeatureSet::new();
        let mut phase = phase_with("Phase 1", "ignored", vec![http("${artifact.url}")]);
        phase.template_expressions =
            vec![TemplateExpression::new(fields::SERVICE_ID, "${Service}", EntityType::Service)];
        let doc = workflow(vec![phase]);

        // Unbound parameter: nothing to attribute the need to.
        assert!(resolve(&catalog, &flags, &doc, &Bindings::new()).artifact_service_ids.is_empty());

        let live = Bindings::new().with("Service", "${workflow.variables.svc}");
        assert!(resolve(&catalog, &flags, &doc, &live).artifact_service_ids.is_empty());

        let declared = live.declare_artifact("${workflow.variables.svc}");
        assert_eq!(
            resolve(&catalog, &flags, &doc, &declared).artifact_service_ids,
            vec!["${workflow.variables.svc}"]
        );

        let bound = Bindings::new().with("Service", "svc-7");
        assert_eq!(resolve(&catalog, &flags, &doc, &bound).artifact_service_ids, vec!["svc-7"]);
    }

    #[test]
    fn manifest_lookup_failure_is_not_fatal() {
        let mut catalog = CountingCatalog::new(InMemoryCatalog::new());
        catalog.fail = true;
        let doc = workflow(vec![phase_with("Phase 1", "svc-1", vec![http("${artifact.buildNo}")])]);

        let off = FeatureSet::new();
        let result = resolve(&catalog, &off, &doc, &Bindings::new());
        assert_eq!(result.artifact_service_ids, vec!["svc-1"]);

        let on = FeatureSet::new().with(FeatureFlag::HelmChartAsArtifact);
        let charted = workflow(vec![phase_with(
            "Phase 1",
            "svc-1",
            vec![Node::new(StepType::HelmDeploy, "Helm Deploy")],
        )]);
        assert!(resolve(&catalog, &on, &charted, &Bindings::new()).manifest_service_ids.is_empty());
    }

    #[test]
    fn catalog_failures_abort_the_pass() {
        let mut catalog = CountingCatalog::new(InMemoryCatalog::new());
        catalog.fail = true;
        let flags = FeatureSet::new();
        let registry = StepTypeRegistry::builtin();
        let doc = workflow(vec![phase_with(
            "Phase 1",
            "svc-1",
            vec![Node::new(StepType::Command, "Install").with_property("commandName", "Install")],
        )]);
        let err = RequiredEntityResolver::new(&catalog, &flags, &registry)
            .unwrap()
            .resolve(&doc, &Bindings::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Catalog(_)));
    }
}
