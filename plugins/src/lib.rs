//! Concrete collaborators for `taskdeck-core`: an OpenAI-compatible content
//! generator, a filesystem text extractor, and terminal renderers.

pub mod extractor;
pub mod factory;
pub mod generator;
pub mod renderers;
