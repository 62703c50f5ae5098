//! LLM Adapter - 文本生成服务客户端实现

mod fake;
mod http_client;
mod prompts;
mod retrying;

pub use fake::FakeStoryGenerator;
pub use http_client::{HttpLlmClient, HttpLlmClientConfig};
pub use retrying::{RetryPolicy, RetryingGenerator};
