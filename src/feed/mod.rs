mod fetcher;

pub use fetcher::{
    fetch_and_store, store_new_entries, FeedEntry, FeedFetcher, FetchStats, MAX_STORED_CONTENT_LEN,
};
