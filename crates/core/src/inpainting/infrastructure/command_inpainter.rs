use std::collections::VecDeque;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::inpainting::domain::inpainter::{InpaintRequest, Inpainter};

pub const VIDEO_PLACEHOLDER: &str = "{video}";
pub const MASK_PLACEHOLDER: &str = "{mask}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("invalid inpaint command template: {0}")]
    InvalidTemplate(String),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{program} was killed after cancellation")]
    Cancelled { program: String },
    #[error("{program} finished but did not write {path}")]
    MissingOutput { program: String, path: PathBuf },
    #[error("output {path} is also an input of the request")]
    OutputIsInput { path: PathBuf },
    #[error("failed to clear previous output {path}: {source}")]
    PrepareOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs an external inpainting program as a child process.
///
/// The command template is split on whitespace; `{video}`, `{mask}` and
/// `{output}` are substituted in every argument. The child is polled so
/// that cancellation can kill it mid-run.
#[derive(Debug)]
pub struct CommandInpainter {
    program: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandInpainter {
    pub fn from_template(template: &str) -> Result<Self, CommandError> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| CommandError::InvalidTemplate("command is empty".to_string()))?;
        let args: Vec<String> = parts.collect();

        for placeholder in [VIDEO_PLACEHOLDER, MASK_PLACEHOLDER, OUTPUT_PLACEHOLDER] {
            if !args.iter().any(|a| a.contains(placeholder)) {
                return Err(CommandError::InvalidTemplate(format!(
                    "missing {placeholder} placeholder"
                )));
            }
        }

        Ok(Self {
            program,
            args,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders filled in for `request`.
    pub fn render_args(&self, request: &InpaintRequest<'_>) -> Vec<String> {
        let video = request.video.to_string_lossy();
        let mask = request.mask.to_string_lossy();
        let output = request.output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(VIDEO_PLACEHOLDER, &video)
                    .replace(MASK_PLACEHOLDER, &mask)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    fn run(&self, request: &InpaintRequest<'_>) -> Result<(), CommandError> {
        clear_output(request)?;
        let args = self.render_args(request);
        log::info!("Running {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr_handle = spawn_stderr_reader(&mut child);
        let status = self.wait(&mut child, request);
        let stderr_tail = stderr_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        let status = status?;
        if !status.success() {
            return Err(CommandError::NonZeroExit {
                program: self.program.clone(),
                status,
                stderr: stderr_tail,
            });
        }
        if !request.output.exists() {
            return Err(CommandError::MissingOutput {
                program: self.program.clone(),
                path: request.output.to_path_buf(),
            });
        }
        Ok(())
    }

    fn wait(
        &self,
        child: &mut Child,
        request: &InpaintRequest<'_>,
    ) -> Result<ExitStatus, CommandError> {
        loop {
            if request.cancelled.load(Ordering::Relaxed) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Cancelled {
                    program: self.program.clone(),
                });
            }
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => std::thread::sleep(self.poll_interval),
                Err(source) => {
                    let _ = child.kill();
                    return Err(CommandError::Wait {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        }
    }
}

/// Deletes any earlier file at the output path, so only a file the child
/// writes counts as its result.
fn clear_output(request: &InpaintRequest<'_>) -> Result<(), CommandError> {
    let output = request.output;
    if output == request.video || output == request.mask {
        return Err(CommandError::OutputIsInput {
            path: output.to_path_buf(),
        });
    }
    match std::fs::remove_file(output) {
        Ok(()) => {
            log::debug!("Removed previous output {}", output.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CommandError::PrepareOutput {
            path: output.to_path_buf(),
            source,
        }),
    }
}

/// Forwards child stderr to the debug log, keeping the last lines for errors.
fn spawn_stderr_reader(child: &mut Child) -> Option<JoinHandle<String>> {
    let stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            log::debug!("inpainter: {line}");
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        Vec::from(tail).join("\n")
    }))
}

impl Inpainter for CommandInpainter {
    fn inpaint(&self, request: &InpaintRequest<'_>) -> Result<(), Box<dyn std::error::Error>> {
        self.run(request)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
