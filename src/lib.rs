//! Client-side coordinator for selecting, downloading and tracking installation of
//! CMS components (API, modules and themes) compatible with a core version.
//!
//! [`app::App`] is the state store: typed [`msg::Msg`]s are reduced by
//! [`App::update`](app::App::update), action methods spawn requests against a
//! [`source::ComponentSource`], and selector methods expose the state to views.

pub mod app;
pub mod model;
pub mod msg;
pub mod source;
pub mod workflow;
