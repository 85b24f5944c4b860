//! 具体渠道实现

pub mod local_file;
pub mod zulip;

pub use local_file::LocalFileChannel;
pub use zulip::{ZulipChannel, ZulipConfig};
