//! Builds isolated runtime environments (Python venv + pip) and drives the
//! one-shot self-registration entrypoint shipped with a provisionable
//! problem.
//!
//! Repository layout: `<repository>/<problem>/environment.spec` plus
//! `<repository>/<problem>/register.sh`. The entrypoint runs with the fresh
//! environment's `bin` directory at the head of `PATH` and writes the
//! problem's registry entry (normally by exec'ing `objbox register`).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Config;
use crate::env::spec::EnvironmentSpec;
use crate::error::{Error, Result};
use crate::registry::Registry;

pub const SPEC_FILE: &str = "environment.spec";
pub const REGISTER_ENTRYPOINT: &str = "register.sh";

/// Whether the repository holds a spec for this problem.
pub fn is_provisionable(config: &Config, name: &str) -> bool {
    config
        .repository_dir()
        .join(name)
        .join(SPEC_FILE)
        .is_file()
}

/// Problem names that could be installed from the repository.
pub fn provisionable_names(config: &Config) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(entries) = std::fs::read_dir(config.repository_dir()) else {
        return names;
    };
    for entry in entries.flatten() {
        if entry.path().join(SPEC_FILE).is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    names
}

/// Materialize the problem's environment and registry entry. Idempotent:
/// an existing environment is not rebuilt, and the registration entrypoint
/// is skipped when the registry already holds the entry.
pub fn provision(config: &Config, registry: &mut Registry, name: &str) -> Result<()> {
    let problem_dir = config.repository_dir().join(name);
    let spec = EnvironmentSpec::load(&problem_dir.join(SPEC_FILE))?;
    let env_dir = config.envs_dir().join(&spec.name);

    if env_ready(&env_dir) {
        tracing::debug!(env = %spec.name, "environment already present, skipping build");
    } else {
        build_env(&spec, &env_dir, name)?;
    }

    if registry.lookup(name).is_ok() {
        tracing::debug!(problem = name, "registry entry present, skipping entrypoint");
        return Ok(());
    }

    run_register_entrypoint(config, &problem_dir, &env_dir, name)?;

    // The entrypoint wrote the store from its own process.
    registry.reload()?;
    if registry.lookup(name).is_err() {
        return Err(Error::Provisioning {
            name: name.to_string(),
            detail: "registration entrypoint completed without writing a registry entry"
                .to_string(),
        });
    }
    tracing::info!(problem = name, env = %spec.name, "provisioned");
    Ok(())
}

/// Generate an executable run script forwarding `port` and `secret` to a
/// child entrypoint, optionally with an environment's `bin` dir on PATH.
/// Returns the script location for registration.
pub fn make_run_script(
    config: &Config,
    name: &str,
    launcher: &Path,
    factory: &str,
    env_dir: Option<&Path>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(config.scripts_dir())?;
    let script_path = config.scripts_dir().join(format!("{name}.sh"));
    let path_line = env_dir
        .map(|d| format!("PATH=\"{}/bin:$PATH\"\nexport PATH\n", d.display()))
        .unwrap_or_default();
    let script = format!(
        "#!/bin/sh\n{path_line}exec \"{}\" child --factory {factory} \"$@\"\n",
        launcher.display()
    );
    std::fs::write(&script_path, script)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(script_path)
}

fn env_ready(env_dir: &Path) -> bool {
    env_dir.join("bin").join("python").exists()
        || env_dir.join("Scripts").join("python.exe").exists()
}

fn build_env(spec: &EnvironmentSpec, env_dir: &Path, name: &str) -> Result<()> {
    std::fs::create_dir_all(env_dir)?;

    let python = which_python().ok_or_else(|| Error::Provisioning {
        name: name.to_string(),
        detail: "python3 or python not found in PATH".to_string(),
    })?;
    let out = Command::new(&python)
        .arg("-m")
        .arg("venv")
        .arg(env_dir)
        .output()?;
    if !out.status.success() {
        return Err(Error::Provisioning {
            name: name.to_string(),
            detail: format!("venv failed: {}", String::from_utf8_lossy(&out.stderr)),
        });
    }

    if spec.dependencies.is_empty() {
        return Ok(());
    }

    let pip_bin = env_dir.join("bin").join("pip");
    let pip_scripts = env_dir.join("Scripts").join("pip.exe");
    let pip = if pip_bin.exists() {
        pip_bin
    } else if pip_scripts.exists() {
        pip_scripts
    } else {
        env_dir.join("bin").join("python") // fallback: python -m pip
    };

    let mut cmd = if pip.file_name().map(|n| n == "python").unwrap_or(false) {
        let mut c = Command::new(&pip);
        c.arg("-m").arg("pip").arg("install");
        c
    } else {
        let mut c = Command::new(&pip);
        c.arg("install");
        c
    };
    let out = cmd.args(&spec.dependencies).output()?;
    if !out.status.success() {
        return Err(Error::Provisioning {
            name: name.to_string(),
            detail: format!("pip install failed: {}", String::from_utf8_lossy(&out.stderr)),
        });
    }
    Ok(())
}

fn which_python() -> Option<PathBuf> {
    for name in ["python3", "python"] {
        let out = Command::new(name).arg("--version").output();
        if out.map(|o| o.status.success()).unwrap_or(false) {
            return Some(PathBuf::from(name));
        }
    }
    None
}

fn run_register_entrypoint(
    config: &Config,
    problem_dir: &Path,
    env_dir: &Path,
    name: &str,
) -> Result<()> {
    let entrypoint = problem_dir.join(REGISTER_ENTRYPOINT);
    if !entrypoint.is_file() {
        return Err(Error::Provisioning {
            name: name.to_string(),
            detail: format!("registration entrypoint missing: {}", entrypoint.display()),
        });
    }
    let old_path = std::env::var("PATH").unwrap_or_default();
    let out = Command::new(&entrypoint)
        .current_dir(problem_dir)
        .env("OBJBOX_HOME", config.root())
        .env("OBJBOX_ENV_DIR", env_dir)
        .env("PATH", format!("{}/bin:{}", env_dir.display(), old_path))
        .output()?;
    if !out.status.success() {
        return Err(Error::Provisioning {
            name: name.to_string(),
            detail: format!(
                "registration entrypoint failed: {}",
                String::from_utf8_lossy(&out.stderr)
            ),
        });
    }
    Ok(())
}
