//! Behaviour graph data model and undoable editing engine.

pub mod actions;
pub mod document;
pub mod errors;
pub mod history;
pub mod ids;
pub mod items;
pub mod portal;
pub mod property;
pub mod resources;
pub mod schema;
pub mod session;
pub mod template;
pub mod tokens;

pub use actions::*;
pub use document::*;
pub use errors::*;
pub use history::*;
pub use ids::*;
pub use items::*;
pub use portal::*;
pub use property::*;
pub use resources::*;
pub use schema::*;
pub use session::*;
pub use template::*;
pub use tokens::*;
