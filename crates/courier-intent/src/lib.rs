//! Intent resolution engine for courier.
//!
//! This crate turns an ambiguous natural-language string into a validated,
//! typed action invocation:
//!
//! - **Entity extraction**: recipients, quoted subject, priority flag, and
//!   date/time signals pulled straight from the text ([`extract`]).
//! - **Date/time inference**: relative phrases resolved against an explicit
//!   reference instant ([`timeparse`]).
//! - **Intent resolution**: one capability, two strategies — model-backed
//!   function calling and local keyword routing ([`resolver`]).
//! - **Parameter normalization**: untrusted raw arguments validated into
//!   canonical per-action parameters ([`normalize`]).

pub mod error;
pub mod extract;
pub mod normalize;
pub mod resolver;
pub mod schema;
pub mod timeparse;

pub use error::{IntentError, Result};
pub use extract::{Extraction, extract, parse_priority};
pub use normalize::{CanonicalAction, TimeWindow, normalize};
pub use resolver::{IntentResolver, KeywordResolver, ModelResolver};
pub use schema::{ActionKind, ResolvedAction, action_declarations};
