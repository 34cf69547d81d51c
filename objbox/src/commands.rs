//! Command implementations for the objbox CLI.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use objbox::factory::{self, CreateOptions};
use objbox_core::config::Config;
use objbox_core::env::{make_run_script, provision};
use objbox_core::registry::Registry;
use objbox_ipc::run_child;

pub fn register(
    config: &Config,
    name: &str,
    run_script: Option<PathBuf>,
    factory_name: Option<String>,
    force: bool,
) -> Result<()> {
    config.ensure_dirs()?;
    let script = match (run_script, factory_name) {
        (Some(path), None) => path,
        (None, Some(factory)) => {
            let launcher = std::env::current_exe().context("resolve current executable")?;
            make_run_script(config, name, &launcher, &factory, None)?
        }
        _ => bail!("pass exactly one of --run-script or --factory"),
    };
    let mut registry = Registry::open(config)?;
    registry.register(name, script, force)?;
    println!("registered '{name}'");
    Ok(())
}

pub fn delete(config: &Config, name: &str) -> Result<()> {
    let mut registry = Registry::open(config)?;
    registry.delete(name)?;
    println!("deleted '{name}'");
    Ok(())
}

pub fn list(config: &Config, include_provisionable: bool) -> Result<()> {
    let registry = Registry::open(config)?;
    for name in registry.list(config, include_provisionable) {
        println!("{name}");
    }
    Ok(())
}

pub fn set_observer(config: &Config, run_script: PathBuf) -> Result<()> {
    config.ensure_dirs()?;
    let mut registry = Registry::open(config)?;
    registry.set_observer_run_script(run_script)?;
    println!("observer run script set");
    Ok(())
}

pub fn delete_observer(config: &Config) -> Result<()> {
    let mut registry = Registry::open(config)?;
    match registry.delete_observer_run_script()? {
        Some(previous) => println!("cleared observer run script {}", previous.display()),
        None => println!("no observer run script was set"),
    }
    Ok(())
}

pub fn install(config: &Config, name: &str) -> Result<()> {
    config.ensure_dirs()?;
    let mut registry = Registry::open(config)?;
    provision(config, &mut registry, name)?;
    println!("installed '{name}'");
    Ok(())
}

pub fn child(factory: &str, port: u16, secret: &str) -> Result<()> {
    run_child(factory, port, secret, None)?;
    Ok(())
}

pub fn create(
    config: &Config,
    name: &str,
    seed: u64,
    force_isolation: bool,
    yes: bool,
) -> Result<()> {
    let created = factory::create(
        config,
        CreateOptions::new(name)
            .seed(seed)
            .force_isolation(force_isolation)
            .force_provision(yes),
    )?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "problem": created.info.name,
            "x0": created.x0,
            "y0": created.y0,
        }))?
    );
    let mut instance = created.instance;
    instance.terminate()?;
    Ok(())
}
