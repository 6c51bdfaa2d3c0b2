mod state;
mod tree;

pub use state::{App, Options, PollChange};
pub use tree::{Row, VisualRow};
