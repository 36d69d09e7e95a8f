//! Spawning the external orchestration tool

pub mod interrupt;
pub mod invoker;

use async_trait::async_trait;
use std::io::IsTerminal;
pub use invoker::{ComposeInvoker, ComposeProgram};

use crate::core::OrchestratorError;

/// Trait for running the orchestration tool - allows swapping in a test double
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the tool with `args` and return its exit code verbatim.
    ///
    /// A non-zero exit is not an error here; only a failure to spawn is.
    async fn run(&self, args: &[String]) -> Result<i32, OrchestratorError>;

    /// Human-readable program name for messages
    fn program(&self) -> String {
        "docker-compose".to_string()
    }
}

#[async_trait]
impl<T: ProcessRunner + ?Sized> ProcessRunner for std::sync::Arc<T> {
    async fn run(&self, args: &[String]) -> Result<i32, OrchestratorError> {
        (**self).run(args).await
    }

    fn program(&self) -> String {
        (**self).program()
    }
}

/// Whether a TTY can be allocated for the child: a human must be on
/// both ends, reading our output and typing into our input
pub fn is_a_tty() -> bool {
    tty_allocatable(console::user_attended(), std::io::stdin().is_terminal())
}

fn tty_allocatable(stdout_is_term: bool, stdin_is_term: bool) -> bool {
    stdout_is_term && stdin_is_term
}
