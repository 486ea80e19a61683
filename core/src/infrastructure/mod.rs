//! Execution infrastructure.
//!
//! The runner module holds the two traits everything side-effecting goes
//! through: `CommandRunner` for one-shot commands with captured output, and
//! `ProcessLauncher` for concurrent child processes whose output is drained
//! line by line. Shell implementations spawn `sh -c`; mock implementations
//! record calls and replay scripted results for tests.

pub mod runner;
