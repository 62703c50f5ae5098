//! HTTP Handlers
//!
//! 每个处理器只做 DTO 与 Command/Query 之间的转换，业务逻辑在应用层

mod analysis;
mod auto_generator;
mod concept;
mod ping;
mod project;
mod volume;
mod websocket;
mod writer;

pub use analysis::*;
pub use auto_generator::*;
pub use concept::*;
pub use ping::*;
pub use project::*;
pub use volume::*;
pub use websocket::*;
pub use writer::*;
