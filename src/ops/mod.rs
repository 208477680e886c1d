//! High-level operations.
//!
//! This module contains the implementation of choco-internalize commands.

pub mod internalize;
pub mod new_package;
pub mod pack;
pub mod process;
pub mod push;

pub use internalize::{internalize, InternalizeReport, InternalizeResult, Replacement};
pub use new_package::{new_package, NewOptions};
pub use pack::{pack, PackSummary};
pub use process::{process_package, Collaborators, ProcessOptions, ProcessOutcome, PushTarget};
pub use push::{push_file, FeedPublisher, Publisher};
