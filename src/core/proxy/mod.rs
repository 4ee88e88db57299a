pub mod mirror;
pub mod resolver;

pub use mirror::{MirrorRoute, MirrorTable, ProxyChoice, ProxyEndpoint};
pub use resolver::ProxyResolver;
