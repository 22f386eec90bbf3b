//! Licensure CAPTCHA - client for create-task / poll-result solving services.
//!
//! Some jurisdictions gate their search forms behind a CAPTCHA. This crate
//! obtains the proof-of-solve token from a third-party solving service.
//!
//! # Protocol
//!
//! 1. `POST {endpoint}/createTask` once per solve. A non-zero `errorId`
//!    fails immediately with the vendor's code and description.
//! 2. `POST {endpoint}/getTaskResult` every poll interval until the task is
//!    `ready`. Transport failures are retried; the deadline counts from
//!    task creation.
//!
//! # Example
//!
//! ```rust,ignore
//! use licensure_captcha::{CapSolverClient, CaptchaSolver};
//! use tokio_util::sync::CancellationToken;
//!
//! let solver = CapSolverClient::new(api_key, "https://api.capsolver.com")?;
//! let token = solver
//!     .solve(&CancellationToken::new(), "https://example.gov/search", site_key)
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod solver;
pub mod task;

pub use error::{CaptchaError, Result};
pub use solver::{CapSolverClient, CaptchaSolver};
pub use task::{CaptchaTask, TaskStatus};
