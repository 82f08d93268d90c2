//! The agentic tool-use control loop — the heart of cyberclaw.
//!
//! Each chat turn follows the same cycle:
//!
//! 1. **Receive** a user message and append it to the transcript
//! 2. **Ask** the provider, with the full transcript and the tool catalog
//! 3. **Dispatch** any tool-use request through the namespace router and
//!    fold the result back into the transcript
//! 4. **Repeat** until the provider answers with text, or the iteration
//!    budget runs out
//!
//! The loop is strictly sequential: one provider call or one tool call in
//! flight at a time, never both.

pub mod prompts;
pub mod session;

pub use session::AgentSession;
