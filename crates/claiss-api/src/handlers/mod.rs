pub mod compile;
pub mod health;
pub mod video_merge;
pub mod videos;
