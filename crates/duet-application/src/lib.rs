//! Application layer for duet.
//!
//! Wires the domain rules from `duet-core` to the remote clients and the
//! on-disk cache, and offers the pieces both front-ends share.

pub mod context;
pub mod onboarding;
pub mod router;
pub mod session;
pub mod voice_reply;
pub mod worker;

pub use context::AppContext;
pub use onboarding::ProfileService;
pub use router::{ConversationRouter, RouteReply};
pub use session::ChatSession;
pub use voice_reply::{SPEECH_FAILURE_MESSAGE, VoiceReplyService};
pub use worker::{
    ChatWorker, WorkerCommand, WorkerError, WorkerEvent, WorkerEvents, WorkerServices,
};
