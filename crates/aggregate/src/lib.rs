//! Gitdeck aggregation engine.
//!
//! Two independent paths share the core vocabulary:
//! rendered resources → [`services::aggregate`], and live applications →
//! [`applications::summarize`] / [`applications::history`].

#![forbid(unsafe_code)]

pub mod applications;
pub mod declared;
pub mod services;
pub mod status;

pub use applications::{enrich, find_live_application, history, normalize_repo_url, summarize};
pub use declared::declared_summaries;
pub use services::{aggregate, host_from_url, AggregateError};
pub use status::classify;
