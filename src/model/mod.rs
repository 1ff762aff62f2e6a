//! The extracted message tree.

pub mod attachment;
pub mod message;
pub mod properties;

pub use attachment::Attachment;
pub use message::{Children, Message};
