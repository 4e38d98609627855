pub mod client;

pub use client::HttpRecommendationClient;
