pub mod ai;
pub mod alerts;
pub mod detections;
pub mod streams;
pub mod videos;
