//! # xmlui-mcp
//!
//! An MCP server that answers coding agents' questions about the XMLUI
//! framework from a local, versioned snapshot of its documentation and
//! source tree.
//!
//! The useful part is the mediated search: a staged scan over a typed
//! corpus whose results are ranked, grouped into sections, stripped of
//! any link that the documentation site does not actually serve, and
//! annotated with guidance for the calling agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────────┐
//! │ Provisioner │──▶│   Snapshot   │──▶│ URL registry +    │
//! │ (release    │   │  repo/ under │   │ topic index       │
//! │  archive)   │   │  cache root  │   │ (built once)      │
//! └─────────────┘   └──────────────┘   └─────────┬─────────┘
//!                                                ▼
//!                   ┌──────────────┐   ┌───────────────────┐
//!                   │ ToolRegistry │──▶│ Mediator: scan →  │
//!                   │  + analytics │   │ rank → guidance   │
//!                   └──────┬───────┘   └───────────────────┘
//!                ┌─────────┴─────────┐
//!                ▼                   ▼
//!           ┌─────────┐        ┌──────────┐
//!           │  stdio  │        │   HTTP   │
//!           │  (MCP)  │        │ MCP+REST │
//!           └─────────┘        └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`provision`] | Download and atomic install of the snapshot |
//! | [`corpus`] | Snapshot layout |
//! | [`urls`] | Registry of documentation URLs that exist |
//! | [`topics`] | Heading-derived topic index |
//! | [`classify`] | Path → section label |
//! | [`query`] | Tokenization and stopwords |
//! | [`mediator`] | Staged scan, ranking, guidance, rendering |
//! | [`traits`] | `Tool` trait, shared context, dispatching registry |
//! | [`tools`] | Built-in tool handlers |
//! | [`analytics`] | JSONL usage log |
//! | [`sessions`], [`prompts`] | Prompt injection bookkeeping |
//! | [`mcp`], [`server`] | stdio and HTTP transports |

pub mod analytics;
pub mod classify;
pub mod config;
pub mod corpus;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod mediator;
pub mod params;
pub mod prompts;
pub mod provision;
pub mod query;
pub mod server;
pub mod sessions;
pub mod tools;
pub mod topics;
pub mod traits;
pub mod urls;
