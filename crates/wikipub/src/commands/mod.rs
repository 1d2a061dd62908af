//! CLI command implementations.

pub(crate) mod publish;
pub(crate) mod render;
pub(crate) mod tree;

pub(crate) use publish::PublishArgs;
pub(crate) use render::RenderArgs;
pub(crate) use tree::TreeArgs;
