/// Model Context Protocol layer
///
/// `protocol` holds the JSON-RPC and MCP message types; `server` reads
/// requests from stdin and routes tool calls to `crate::tools`.

pub mod protocol;
pub mod server;

pub use server::{tool_definitions, McpServer};
