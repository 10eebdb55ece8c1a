//! Client code for swcache.
//!
//! This crate provides the network fetcher and the worker policy engine
//! (install, activate, request routing, control messages) shared by the
//! server and tests.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Fetcher, canonicalize, resolve_asset};
pub use worker::{
    ActivationReport, BypassFilter, ClientControl, Command, FetchOutcome, InstallReport, MessageOutcome,
    ResponseSource, Strategy, Worker, WorkerConfig, WorkerState, classify,
};
