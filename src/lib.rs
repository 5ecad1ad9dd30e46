//! Noteport: a JSON-RPC gateway that lets AI agents work with a markdown vault.
//!
//! Agents list, read, search, append to, and surgically patch notes through a
//! single authenticated HTTP endpoint. Method names follow the Model Context
//! Protocol tool conventions, so a note tool can be called directly
//! (`get_file_contents`) or through `tools/call`.
//!
//! # Architecture
//!
//! - **Gateway**: axum router with CORS, `X-API-Key` auth, and a per-client
//!   fixed-window rate limiter in front of `POST /rpc` and `GET /health`
//! - **Patching**: heading sections, `^block` references, and nested
//!   frontmatter keys are edited in place without touching the rest of a note
//! - **Search**: case-insensitive substring scan with context windows
//! - **Dataview**: a built-in engine for a DQL subset (`LIST`, `TABLE`, `TASK`)
//!   over note frontmatter, plus inline rendering of query blocks
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`vault`]: the document store trait, filesystem and in-memory stores, frontmatter
//! - [`note`]: the patch and search engines
//! - [`dataview`]: structured queries over note metadata
//! - [`tools`]: the tool registry and per-tool handlers
//! - [`rpc`]: JSON-RPC envelopes, dispatch, rate limiting, and the HTTP gateway

pub mod cli;
pub mod config;
pub mod dataview;
pub mod error;
pub mod note;
pub mod rpc;
pub mod server;
pub mod tools;
pub mod vault;
