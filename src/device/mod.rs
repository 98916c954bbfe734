pub mod feedback;
pub mod reader;

pub use feedback::{FeedbackSink, LogFeedback};
pub use reader::{CardReader, ReaderError, StdinReader};
