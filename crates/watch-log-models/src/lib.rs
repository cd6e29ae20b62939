pub mod album;
pub mod candidate;
pub mod item_id;
pub mod media;
pub mod status;
pub mod timestamp;
pub mod watched_item;

pub use album::Album;
pub use candidate::{Candidate, CandidateDetails};
pub use item_id::ItemId;
pub use media::MediaKind;
pub use status::WatchStatus;
pub use timestamp::RawTimestamp;
pub use watched_item::{split_tokens, WatchedItem};
