// Step engine for instrumentation-driven debuggers
//
// Decides, for every instrumentation event a running program reports, whether
// the active step request should suspend execution:
// - Source element kinds and suspend anchors
// - Validated, immutable step configurations
// - Session-side step tracking (repeat counts, cancellation)
// - An async step loop fed by instrumentation events

pub mod builder;
pub mod config;
pub mod element;
pub mod error;
pub mod eventloop;
pub mod request;
pub mod session;
pub mod tag;

pub use builder::StepConfigBuilder;
pub use config::{StepConfig, StepMode, StepSession};
pub use element::{AnchorMap, AnchorSet, SourceElementKind, SourceElementSet, SuspendAnchor};
pub use error::{SessionError, SessionResult, StepConfigError, StepConfigResult};
pub use eventloop::{spawn_step_loop, StepLoopHandle, Suspended};
pub use request::{StepRequest, TagRequest};
pub use session::{DebuggerSession, StepDecision};
pub use tag::{EventContext, InstrumentationEvent, Tag};
