//! Bidirectional translation between the OpenAI Chat Completions schema
//! and Anthropic's Messages schema.

pub mod request;
pub mod response;
pub mod stop_reason;
pub mod types;

pub use request::to_anthropic_request;
pub use response::from_anthropic_response;
pub use stop_reason::map_stop_reason;
pub use types::*;
