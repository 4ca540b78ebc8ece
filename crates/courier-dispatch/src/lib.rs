//! Dispatch layer for courier — integration adapters and the request
//! pipeline.
//!
//! Each external integration sits behind a narrow port trait ([`traits`]);
//! the [`Dispatcher`] is the last gate before any network effect, and the
//! [`Pipeline`] composes resolution, normalization, and dispatch into the
//! per-request state machine.

pub mod calendar;
pub mod dispatch;
pub mod email;
pub mod error;
pub mod pipeline;
pub mod proxy;
pub mod slack;
pub mod telegram;
pub mod traits;

pub use calendar::CalendarWebhookAdapter;
pub use dispatch::{DispatchOutcome, DispatchStatus, Dispatcher};
pub use email::EmailWebhookAdapter;
pub use error::{AdapterError, Result};
pub use pipeline::{ActionRequest, Pipeline, PipelineReply};
pub use proxy::ProxyAdapter;
pub use slack::SlackAdapter;
pub use telegram::TelegramAdapter;
pub use traits::{CalendarPort, ChatPort, DirectMessagePort, EmailPort, ProxyPort};
