//! Remote services a packaging run depends on.
//!
//! The upstream feed serves metadata and archives, and the internal mirror
//! serves the payloads that install scripts are rewritten to use.

pub mod archive;
pub mod feed;
pub mod mirror;

pub use archive::unpack_package;
pub use feed::{ODataFeed, PackageFeed};
pub use mirror::{MirrorCheck, MirrorPrefix, MirrorValidator};
