//! Orchestration entrypoints: decide in-process vs isolated execution,
//! provision on demand, wire an optional observer.
//!
//! Decision order: a catalog problem runs in-process unless isolation is
//! forced; otherwise the registered run script is launched as a child, with
//! a confirmation-gated provisioning step for problems that are only in the
//! repository.

use std::io::Write;

use objbox_core::config::Config;
use objbox_core::env::provisioner;
use objbox_core::error::{Error, Result};
use objbox_core::observer::{Observer, ObserverSessionInfo};
use objbox_core::problem::{
    factory_for, BlackBox, BlackBoxInstance, CreatedProblem, EvalContext, InputBatch, OutputBatch,
    ProblemInfo,
};
use objbox_core::registry::Registry;
use objbox_ipc::{ExternalBlackBox, ProcessWrapper};

pub struct CreateOptions {
    pub name: String,
    pub seed: u64,
    pub caller_info: Option<EvalContext>,
    pub observer: Option<Box<dyn Observer>>,
    /// Provision without asking for confirmation.
    pub force_provision: bool,
    /// Never instantiate in-process, even for catalog problems.
    pub force_isolation: bool,
}

impl CreateOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: 0,
            caller_info: None,
            observer: None,
            force_provision: false,
            force_isolation: false,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn caller_info(mut self, caller_info: EvalContext) -> Self {
        self.caller_info = Some(caller_info);
        self
    }

    pub fn observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn force_provision(mut self, yes: bool) -> Self {
        self.force_provision = yes;
        self
    }

    pub fn force_isolation(mut self, yes: bool) -> Self {
        self.force_isolation = yes;
        self
    }
}

/// Everything a calling algorithm needs to begin optimizing.
pub struct Created {
    pub info: ProblemInfo,
    pub instance: BlackBoxInstance,
    pub x0: InputBatch,
    pub y0: OutputBatch,
    pub observer_session: Option<ObserverSessionInfo>,
}

impl std::fmt::Debug for Created {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Created")
            .field("info", &self.info)
            .field("x0", &self.x0)
            .field("y0", &self.y0)
            .field("observer_session", &self.observer_session)
            .finish_non_exhaustive()
    }
}

/// Instantiate a black box and evaluate its initial input.
pub fn create(config: &Config, mut opts: CreateOptions) -> Result<Created> {
    if !opts.force_isolation {
        if let Some(factory) = factory_for(&opts.name) {
            tracing::debug!(problem = %opts.name, "instantiating in-process");
            let CreatedProblem { black_box, x0, y0 } = factory.create(opts.seed)?;
            let info = black_box.info().clone();
            let mut instance = BlackBoxInstance::new(black_box);
            let observer_session = attach_observer(
                &mut instance,
                opts.observer.take(),
                &info,
                opts.caller_info.as_ref(),
                Some(&x0),
                Some(&y0),
                opts.seed,
            )?;
            return Ok(Created {
                info,
                instance,
                x0,
                y0,
                observer_session,
            });
        }
    }

    let (proxy, x0, y0) = spawn_isolated(config, &opts)?;
    let info = proxy.info().clone();
    let mut instance = BlackBoxInstance::new(Box::new(proxy));
    let observer_session = attach_observer(
        &mut instance,
        opts.observer.take(),
        &info,
        opts.caller_info.as_ref(),
        Some(&x0),
        Some(&y0),
        opts.seed,
    )?;
    Ok(Created {
        info,
        instance,
        x0,
        y0,
        observer_session,
    })
}

/// Acquire a black box without the initial evaluation. Intended for scoped
/// use: teardown runs when the instance drops.
pub fn start(config: &Config, mut opts: CreateOptions) -> Result<BlackBoxInstance> {
    if !opts.force_isolation {
        if let Some(factory) = factory_for(&opts.name) {
            let CreatedProblem { black_box, .. } = factory.create(opts.seed)?;
            let info = black_box.info().clone();
            let mut instance = BlackBoxInstance::new(black_box);
            attach_observer(
                &mut instance,
                opts.observer.take(),
                &info,
                opts.caller_info.as_ref(),
                None,
                None,
                opts.seed,
            )?;
            return Ok(instance);
        }
    }

    let (proxy, _x0, _y0) = spawn_isolated(config, &opts)?;
    let info = proxy.info().clone();
    let mut instance = BlackBoxInstance::new(Box::new(proxy));
    attach_observer(
        &mut instance,
        opts.observer.take(),
        &info,
        opts.caller_info.as_ref(),
        None,
        None,
        opts.seed,
    )?;
    Ok(instance)
}

fn spawn_isolated(
    config: &Config,
    opts: &CreateOptions,
) -> Result<(ExternalBlackBox, InputBatch, OutputBatch)> {
    let mut registry = Registry::open(config)?;
    ensure_registered(config, &mut registry, &opts.name, opts.force_provision)?;
    let entry = registry.lookup(&opts.name)?;
    tracing::debug!(problem = %opts.name, script = %entry.run_script_location.display(), "launching isolated process");
    let wrapper = ProcessWrapper::start(&entry.run_script_location, &[])?;
    ExternalBlackBox::setup(wrapper, opts.seed)
}

fn ensure_registered(
    config: &Config,
    registry: &mut Registry,
    name: &str,
    force_provision: bool,
) -> Result<()> {
    if registry.lookup(name).is_ok() {
        return Ok(());
    }
    if !provisioner::is_provisionable(config, name) {
        return Err(Error::NotAvailable(name.to_string()));
    }
    if !force_provision && !confirm_install(name)? {
        tracing::warn!(problem = name, "provisioning declined");
        return Err(Error::NotAvailable(name.to_string()));
    }
    provisioner::provision(config, registry, name)
}

fn confirm_install(name: &str) -> Result<bool> {
    eprint!(
        "Problem '{name}' is not registered but can be installed from the repository. \
         Install it? (y/[n]) "
    );
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn attach_observer(
    instance: &mut BlackBoxInstance,
    observer: Option<Box<dyn Observer>>,
    info: &ProblemInfo,
    caller_info: Option<&EvalContext>,
    x0: Option<&InputBatch>,
    y0: Option<&OutputBatch>,
    seed: u64,
) -> Result<Option<ObserverSessionInfo>> {
    let Some(mut observer) = observer else {
        return Ok(None);
    };
    let session = observer.initialize(info, caller_info, x0, y0, seed)?;
    instance.attach_observer(observer);
    Ok(Some(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> (tempfile::TempDir, Config) {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::with_root(tmp.path().join("home"));
        (tmp, cfg)
    }

    #[test]
    fn catalog_problem_runs_in_process() {
        let (_tmp, cfg) = config();
        let created = create(&cfg, CreateOptions::new("aloha")).unwrap();
        assert_eq!(created.info.name, "aloha");
        assert_eq!(created.y0, vec![vec![3.0]]);
        assert!(created.observer_session.is_none());
    }

    #[test]
    fn unknown_problem_is_not_available() {
        let (_tmp, cfg) = config();
        let err = create(&cfg, CreateOptions::new("ghost")).unwrap_err();
        assert!(matches!(err, Error::NotAvailable(_)));
    }

    #[test]
    fn start_skips_the_initial_evaluation() {
        let (_tmp, cfg) = config();
        let mut instance = start(&cfg, CreateOptions::new("aloha")).unwrap();
        let x = vec![["A", "L", "O", "H", "A"].iter().map(|s| s.to_string()).collect()];
        assert_eq!(instance.evaluate(&x, None).unwrap(), vec![vec![5.0]]);
    }

    #[test]
    fn observer_session_is_returned_when_attached() {
        use objbox_core::observer::TracingObserver;
        let (_tmp, cfg) = config();
        let created = create(
            &cfg,
            CreateOptions::new("aloha").observer(Box::new(TracingObserver::default())),
        )
        .unwrap();
        let session = created.observer_session.expect("session info expected");
        assert!(session.session_id.starts_with("aloha-"));
    }
}
