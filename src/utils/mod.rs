pub mod curl;
pub mod redact;
pub mod text;
