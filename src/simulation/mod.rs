pub mod traffic_feed;

pub use traffic_feed::{FeedReading, TrafficFeed};
