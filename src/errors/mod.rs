mod config_error;
mod dispatch_error;
mod mcp_error;

pub use config_error::ConfigError;
pub use dispatch_error::{DispatchError, DispatchErrorKind};
pub use mcp_error::{ErrorCode, McpError};
