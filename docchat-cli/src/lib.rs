//! # docchat-cli
//!
//! Console front end: load a text document, then ask questions about it.
//!
//! The binary reads its settings from the environment (a `.env` file is
//! honoured), builds one [`ChatSession`](docchat_rag::ChatSession) and runs
//! [`console::run_console`] over it.

pub mod console;
pub mod setup;
