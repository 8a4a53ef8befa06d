pub mod argument_binder;
pub mod header_resolver;
pub mod invocation;
pub mod logger;
pub mod transport;
