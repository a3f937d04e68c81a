//! Validation run orchestration.
//!
//! A run expands the snapshot into one [`Task`] per validated object and
//! executes the tasks on a bounded `rayon` pool. Each task produces a
//! `ValidationSet` holding exactly its own key and sends it over a bounded
//! channel; the calling thread is the only consumer and merges everything
//! into the [`Aggregator`]. Group checkers run afterwards on the calling
//! thread, then the aggregator is finalized into a [`ValidationReport`].

use crate::checkers::selector::WorkloadSelectorChecker;
use crate::checkers::virtual_services::gateway_ref;
use crate::checkers::{
    authorization, destination_rules, gateways, pods, route_rules, sidecars, virtual_services,
    Checker, GroupChecker,
};
use crate::error::Result;
use crate::host::DEFAULT_CLUSTER_DOMAIN;
use crate::models::resources::{
    AuthorizationPolicy, DestinationRule, Gateway, Pod, RouteRule, Sidecar, VirtualService,
};
use crate::models::{ConfigObjectRef, ObjectType};
use crate::registry::ServiceRegistry;
use crate::snapshot::Snapshot;
use crate::validations::{Aggregator, ReportPolicy, ValidationReport, ValidationSet};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashSet;
use std::sync::mpsc;
use std::time::Instant;
use tracing::{debug, info};

/// Knobs for a validation run.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub cluster_domain: String,
    /// Worker threads for individual checks.
    pub concurrency: usize,
    pub app_label: String,
    pub version_label: String,
    pub proxy_container: String,
    /// Namespace whose PeerAuthentications apply mesh-wide.
    pub root_namespace: String,
    pub policy: ReportPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            concurrency: default_concurrency(),
            app_label: "app".to_string(),
            version_label: "version".to_string(),
            proxy_container: "istio-proxy".to_string(),
            root_namespace: "istio-system".to_string(),
            policy: ReportPolicy::default(),
        }
    }
}

pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Read-only state shared by every task of one run.
struct Context<'a> {
    snapshot: &'a Snapshot,
    settings: &'a EngineSettings,
    registry: ServiceRegistry,
    gateway_names: HashSet<String>,
}

impl<'a> Context<'a> {
    fn new(snapshot: &'a Snapshot, settings: &'a EngineSettings) -> Self {
        let domain = settings.cluster_domain.as_str();
        Context {
            snapshot,
            settings,
            registry: ServiceRegistry::from_snapshot(snapshot, domain),
            gateway_names: snapshot
                .gateways
                .iter()
                .map(|gw| gateway_ref(gw.name(), gw.namespace(), domain))
                .collect(),
        }
    }

    fn domain(&self) -> &str {
        &self.settings.cluster_domain
    }
}

/// One validated object together with the checkers that apply to it.
#[derive(Clone, Copy)]
enum Task<'a> {
    VirtualService(&'a VirtualService),
    DestinationRule(&'a DestinationRule),
    Gateway(&'a Gateway),
    RouteRule(&'a RouteRule),
    Sidecar(&'a Sidecar),
    AuthorizationPolicy(&'a AuthorizationPolicy),
    Pod(&'a Pod),
}

impl<'a> Task<'a> {
    fn all(snapshot: &'a Snapshot) -> Vec<Task<'a>> {
        let mut tasks = Vec::with_capacity(snapshot.validated_object_count());
        tasks.extend(snapshot.virtual_services.iter().map(Task::VirtualService));
        tasks.extend(snapshot.destination_rules.iter().map(Task::DestinationRule));
        tasks.extend(snapshot.gateways.iter().map(Task::Gateway));
        tasks.extend(snapshot.route_rules.iter().map(Task::RouteRule));
        tasks.extend(snapshot.sidecars.iter().map(Task::Sidecar));
        tasks.extend(snapshot.authorization_policies.iter().map(Task::AuthorizationPolicy));
        tasks.extend(snapshot.pods.iter().map(Task::Pod));
        tasks
    }

    fn key(&self) -> ConfigObjectRef {
        let (object_type, meta) = match self {
            Task::VirtualService(o) => (ObjectType::VirtualService, &o.metadata),
            Task::DestinationRule(o) => (ObjectType::DestinationRule, &o.metadata),
            Task::Gateway(o) => (ObjectType::Gateway, &o.metadata),
            Task::RouteRule(o) => (ObjectType::RouteRule, &o.metadata),
            Task::Sidecar(o) => (ObjectType::Sidecar, &o.metadata),
            Task::AuthorizationPolicy(o) => (ObjectType::AuthorizationPolicy, &o.metadata),
            Task::Pod(o) => (ObjectType::Pod, &o.metadata),
        };
        ConfigObjectRef::new(object_type, &meta.name, &meta.namespace)
    }

    fn checkers<'c>(&self, ctx: &'c Context<'a>) -> Vec<Box<dyn Checker + 'c>>
    where
        'a: 'c,
    {
        let snapshot = ctx.snapshot;
        let domain = ctx.domain();
        let registry = &ctx.registry;
        let mut out: Vec<Box<dyn Checker + 'c>> = Vec::new();
        match *self {
            Task::VirtualService(vs) => {
                let namespace = vs.namespace();
                out.push(Box::new(virtual_services::RouteChecker { virtual_service: vs }));
                out.push(Box::new(virtual_services::NoHostChecker {
                    namespace,
                    registry,
                    virtual_service: vs,
                }));
                out.push(Box::new(virtual_services::SubsetPresenceChecker {
                    namespace,
                    cluster_domain: domain,
                    destination_rules: &snapshot.destination_rules,
                    virtual_service: vs,
                }));
                out.push(Box::new(virtual_services::VersionPresenceChecker {
                    namespace,
                    cluster_domain: domain,
                    pods: &snapshot.pods,
                    destination_rules: &snapshot.destination_rules,
                    virtual_service: vs,
                }));
                out.push(Box::new(virtual_services::NoGatewayChecker {
                    namespace,
                    cluster_domain: domain,
                    gateway_names: &ctx.gateway_names,
                    virtual_service: vs,
                }));
            }
            Task::DestinationRule(dr) => {
                out.push(Box::new(destination_rules::NoDestinationChecker {
                    namespace: dr.namespace(),
                    registry,
                    pods: &snapshot.pods,
                    destination_rule: dr,
                }));
                out.push(Box::new(destination_rules::DisabledNamespaceWideMtlsChecker {
                    cluster_domain: domain,
                    root_namespace: &ctx.settings.root_namespace,
                    peer_authentications: &snapshot.peer_authentications,
                    destination_rule: dr,
                }));
            }
            Task::Gateway(gw) => {
                out.push(Box::new(gateways::SelectorChecker {
                    pods: &snapshot.pods,
                    gateway: gw,
                }));
            }
            Task::RouteRule(rr) => {
                out.push(Box::new(route_rules::PrecedenceChecker { route_rule: rr }));
                out.push(Box::new(route_rules::RouteChecker { route_rule: rr }));
                out.push(Box::new(route_rules::DestinationChecker {
                    namespace: rr.namespace(),
                    registry,
                    route_rule: rr,
                }));
            }
            Task::Sidecar(sc) => {
                out.push(Box::new(sidecars::EgressHostChecker {
                    namespace: sc.namespace(),
                    registry,
                    sidecar: sc,
                }));
                out.push(Box::new(WorkloadSelectorChecker {
                    namespace: sc.namespace(),
                    pods: &snapshot.pods,
                    labels: sc.spec.workload_selector.as_ref().map(|s| &s.labels),
                    path: "spec/workloadSelector",
                }));
            }
            Task::AuthorizationPolicy(ap) => {
                out.push(Box::new(authorization::NoHostChecker {
                    namespace: ap.namespace(),
                    registry,
                    authorization_policy: ap,
                }));
                out.push(Box::new(authorization::SourceNamespaceChecker {
                    registry,
                    authorization_policy: ap,
                }));
                out.push(Box::new(WorkloadSelectorChecker {
                    namespace: ap.namespace(),
                    pods: &snapshot.pods,
                    labels: ap.spec.selector.as_ref().map(|s| &s.match_labels),
                    path: "spec/selector",
                }));
            }
            Task::Pod(pod) => {
                out.push(Box::new(pods::SidecarPresenceChecker {
                    proxy_container: &ctx.settings.proxy_container,
                    pod,
                }));
                out.push(Box::new(pods::LabelPresenceChecker {
                    app_label: &ctx.settings.app_label,
                    version_label: &ctx.settings.version_label,
                    pod,
                }));
            }
        }
        out
    }

    /// Run every checker for this object. The result always holds exactly
    /// one key, even when nothing was found.
    fn run(&self, ctx: &Context<'a>) -> ValidationSet {
        let mut checks = Vec::new();
        let mut valid = true;
        for checker in self.checkers(ctx) {
            let (found, ok) = checker.check();
            checks.extend(found);
            valid &= ok;
        }
        ValidationSet::single(self.key(), checks, valid)
    }
}

fn group_checkers<'c>(ctx: &'c Context<'_>) -> Vec<Box<dyn GroupChecker + 'c>> {
    let snapshot = ctx.snapshot;
    let mut out: Vec<Box<dyn GroupChecker + 'c>> = Vec::new();
    out.push(Box::new(virtual_services::SingleHostChecker {
        cluster_domain: ctx.domain(),
        virtual_services: &snapshot.virtual_services,
    }));
    out.push(Box::new(destination_rules::MultiMatchChecker {
        cluster_domain: ctx.domain(),
        destination_rules: &snapshot.destination_rules,
    }));
    out.push(Box::new(destination_rules::TrafficPolicyChecker {
        cluster_domain: ctx.domain(),
        destination_rules: &snapshot.destination_rules,
    }));
    out.push(Box::new(gateways::MultiMatchChecker {
        gateways: &snapshot.gateways,
    }));
    out
}

pub struct Engine {
    settings: EngineSettings,
    pool: ThreadPool,
}

impl Engine {
    pub fn new(settings: EngineSettings) -> Result<Engine> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.concurrency.max(1))
            .thread_name(|i| format!("meshcheck-worker-{}", i))
            .build()?;
        Ok(Engine { settings, pool })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Validate every object of `snapshot`.
    pub fn run(&self, snapshot: &Snapshot) -> ValidationReport {
        let started = Instant::now();
        let ctx = Context::new(snapshot, &self.settings);
        let tasks = Task::all(snapshot);
        info!(
            tasks = tasks.len(),
            workers = self.pool.current_num_threads(),
            namespaces = snapshot.namespaces().len(),
            "starting validation run"
        );

        let mut aggregator = Aggregator::new();
        let (tx, rx) = mpsc::sync_channel::<ValidationSet>(self.pool.current_num_threads() * 2);
        self.pool.in_place_scope(|scope| {
            let ctx = &ctx;
            for task in tasks {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // the receiver lives until every sender is gone
                    let _ = tx.send(task.run(ctx));
                });
            }
            drop(tx);
            for partial in rx.iter() {
                aggregator.merge(partial);
            }
        });
        debug!(records = aggregator.len(), "individual checks merged");

        for checker in group_checkers(&ctx) {
            let found = checker.check();
            debug!(checker = checker.name(), flagged = found.len(), "group checker finished");
            aggregator.merge(found);
        }

        let report = aggregator.finalize(&self.settings.policy);
        info!(
            records = report.validations().len(),
            errors = report.validations().error_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "validation run finished"
        );
        report
    }
}
