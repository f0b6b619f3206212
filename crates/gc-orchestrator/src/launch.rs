//! Launch command lines
//!
//! Each process runs as a shell command inside its tmux window. The final
//! step `exec`s the runtime so the window's process carries the launch
//! argument that the liveness check searches for.

use std::path::Path;

use gc_core::estates::load_estate_args;
use gc_core::process::ROBUST_INI;
use gc_core::{LifecycleError, LogicalId};

use crate::state::GridContext;

/// Stack limit raised before starting a simulator, in KiB
pub const SIMULATOR_STACK_KIB: u32 = 262_144;

/// Simulator assembly in the base directory
pub const SIMULATOR_DLL: &str = "OpenSim.dll";

/// Directory process assemblies, in order of preference
pub const ROBUST_DLL: &str = "Robust.dll";
pub const ROBUST_EXE: &str = "Robust.exe";

/// Shell command starting estate `name`.
///
/// `extra_args` are appended verbatim after trimming; they are operator
/// input with the same trust as shell access.
pub fn estate_command(base: &Path, estates_root: &Path, name: &str, extra_args: &str) -> String {
    let mut command = format!(
        "cd \"{}\"; ulimit -s {}; exec dotnet {} --hypergrid=true --inidirectory=\"{}\"",
        base.display(),
        SIMULATOR_STACK_KIB,
        SIMULATOR_DLL,
        estates_root.join(name).display(),
    );
    let extra_args = extra_args.trim();
    if !extra_args.is_empty() {
        command.push(' ');
        command.push_str(extra_args);
    }
    command
}

/// Shell command starting the directory process with whichever runtime
/// its assembly needs.
pub fn robust_command(base: &Path) -> String {
    format!(
        "cd \"{base}\"; \
         if [ -f {dll} ]; then exec dotnet {dll} -inifile={ini}; \
         elif [ -f {exe} ]; then exec mono --desktop -O=all {exe} -inifile={ini}; \
         else echo \"ERROR: No Robust executable found\"; fi",
        base = base.display(),
        dll = ROBUST_DLL,
        exe = ROBUST_EXE,
        ini = ROBUST_INI,
    )
}

/// Check the executable for `id` exists in the base directory
async fn require_executable(ctx: &GridContext, id: &LogicalId) -> Result<(), LifecycleError> {
    let candidates: &[&str] = match id {
        LogicalId::Robust => &[ROBUST_DLL, ROBUST_EXE],
        LogicalId::Estate(_) => &[SIMULATOR_DLL],
    };
    for candidate in candidates {
        if ctx.transport.exists(&ctx.base().join(candidate)).await {
            return Ok(());
        }
    }
    Err(LifecycleError::BinaryMissing {
        target: id.clone(),
        binary: ctx.base().join(candidates[0]).display().to_string(),
    })
}

/// Build the launch command for `id`, reading saved estate arguments
pub async fn launch_command(ctx: &GridContext, id: &LogicalId) -> Result<String, LifecycleError> {
    require_executable(ctx, id).await?;
    Ok(match id {
        LogicalId::Robust => robust_command(ctx.base()),
        LogicalId::Estate(name) => {
            let extra = load_estate_args(ctx.estates_root(), name, &ctx.transport).await;
            estate_command(ctx.base(), ctx.estates_root(), name, &extra)
        }
    })
}
