pub mod filter;
pub mod sort;
pub mod paginate;
pub mod picker;
pub mod shuffle;
pub mod stats;
pub mod recommend;
pub mod albums;
pub mod cache;

pub use filter::{filter_items, filter_items_in, FilterSpec, MediaKindFilter};
pub use sort::{sort_items, SortKey, SortOrder};
pub use paginate::{page_window, paginate, ListingState, ListingView, Page};
pub use picker::{
    pick_random, watchlist_pool, Clock, ManualClock, MonotonicClock, Picker, PickerEvent, PickerState,
    PoolEntry, PoolKind, ShuffleSchedule,
};
pub use shuffle::ShuffleDriver;
pub use stats::{aggregate, aggregate_in, top_entries, RuntimeBreakdown, StatsSummary};
pub use recommend::{recommend, Recommendation};
pub use albums::{album_items, albums_containing, find_album};
pub use cache::TrendingCache;
