use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use crate::config::CommandSpec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_description(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        }
    }
}

/// An external helper program. Implementations block until the process
/// exits.
pub trait Collaborator: Send + Sync {
    fn name(&self) -> &'static str;
    fn invoke(&self, args: &[String], stdin: Option<&str>) -> io::Result<ProcessOutput>;
}

pub struct CommandCollaborator {
    name: &'static str,
    spec: CommandSpec,
}

impl CommandCollaborator {
    pub fn new(name: &'static str, spec: CommandSpec) -> Self {
        Self { name, spec }
    }
}

impl Collaborator for CommandCollaborator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn invoke(&self, args: &[String], stdin: Option<&str>) -> io::Result<ProcessOutput> {
        let mut command = Command::new(&self.spec.program);
        command
            .args(&self.spec.args)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.spec.working_dir {
            command.current_dir(dir);
        }

        log::debug!(
            "running {}: {} {:?} {:?}",
            self.name,
            self.spec.program,
            self.spec.args,
            args
        );

        let mut child = command.spawn()?;

        // Feed stdin from a separate thread so a child that writes a lot
        // before reading cannot deadlock against us.
        let writer = match (child.stdin.take(), stdin) {
            (Some(mut pipe), Some(input)) => {
                let input = input.to_string();
                Some(thread::spawn(move || pipe.write_all(input.as_bytes())))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                Err(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        "stdin writer thread panicked",
                    ))
                }
                _ => {}
            }
        }

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
