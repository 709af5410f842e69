//! CLI command implementations.

pub(crate) mod plugins;
pub(crate) mod render;
pub(crate) mod routes;

pub(crate) use render::RenderArgs;
pub(crate) use routes::RoutesArgs;
