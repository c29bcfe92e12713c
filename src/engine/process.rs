// src/engine/process.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::EngineSection;
use crate::engine::ExecutionEngine;
use crate::script::ScriptContext;

/// How many leading lines of a script are scanned for directives.
const DIRECTIVE_SCAN_LINES: usize = 64;

/// Engine that runs each script file as a child process.
///
/// Before spawning, the leading lines of the file are scanned for
/// directives the script uses to talk back to the reconciler:
///
/// ```text
/// # depend: lib.sh
/// # watch: workers/pool.sh
/// ```
///
/// (`//` comments work too.) The spawned child is registered as a resource
/// on the script instance, so terminating the instance kills the process.
pub struct ProcessEngine {
    interpreter: Option<String>,
    args: Vec<String>,
    directive: Regex,
}

impl std::fmt::Debug for ProcessEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessEngine")
            .field("interpreter", &self.interpreter)
            .finish_non_exhaustive()
    }
}

impl ProcessEngine {
    pub fn new(cfg: &EngineSection) -> Result<Self> {
        let directive = Regex::new(r"^\s*(?:#|//)\s*(depend|watch):\s*(\S+)\s*$")
            .context("compiling directive pattern")?;

        Ok(Self {
            interpreter: cfg.interpreter.clone(),
            args: cfg.args.clone(),
            directive,
        })
    }

    fn apply_directives(&self, ctx: &ScriptContext, source: &str) {
        for line in source.lines().take(DIRECTIVE_SCAN_LINES) {
            let Some(caps) = self.directive.captures(line) else {
                continue;
            };

            let target = PathBuf::from(&caps[2]);
            match &caps[1] {
                "depend" => {
                    debug!(script = %ctx.name(), dep = %target.display(), "depend directive");
                    ctx.depend(&target);
                }
                "watch" => {
                    debug!(script = %ctx.name(), watch = %target.display(), "watch directive");
                    ctx.watch(&[target]);
                }
                _ => {}
            }
        }
    }
}

impl ExecutionEngine for ProcessEngine {
    fn execute(&self, ctx: &ScriptContext) -> Result<()> {
        let abs = ctx.absolute_path();

        let source = ctx
            .read_source()
            .with_context(|| format!("reading script {:?}", abs))?;
        self.apply_directives(ctx, &String::from_utf8_lossy(&source));

        let mut cmd = match &self.interpreter {
            Some(interpreter) => {
                let mut c = Command::new(interpreter);
                c.args(&self.args);
                c.arg(&abs);
                c
            }
            None => Command::new(&abs),
        };

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for script '{}'", ctx.name()))?;

        info!(script = %ctx.name(), path = %ctx.path().display(), "script process started");

        stream_output(ctx.name(), child.stdout.take(), child.stderr.take());

        // The child lives exactly as long as the instance: releasing the
        // instance's resource scope kills it.
        let script = ctx.name().to_string();
        let mut slot = Some(child);
        ctx.resources()
            .register("script-process", move || -> Result<()> {
                if let Some(mut child) = slot.take() {
                    debug!(script = %script, "killing script process");
                    child
                        .start_kill()
                        .context("sending kill to script process")?;
                }
                Ok(())
            });

        Ok(())
    }

    fn release_context(&self, path: &Path) {
        // The process handle is owned by the instance's resource scope;
        // there is no engine-side state to drop per path.
        debug!(path = %path.display(), "process engine context released");
    }
}

/// Forward child stdout/stderr lines to the log, tagged with the script
/// name. Consuming both pipes also keeps the child from blocking on a full
/// buffer.
fn stream_output(
    name: &str,
    stdout: Option<tokio::process::ChildStdout>,
    stderr: Option<tokio::process::ChildStderr>,
) {
    if let Some(stdout) = stdout {
        let script = name.to_string();
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(script = %script, "stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = stderr {
        let script = name.to_string();
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(script = %script, "stderr: {}", line);
            }
        });
    }
}
