pub mod capture;
pub mod detection;
pub mod notification;
pub mod pipeline;
pub mod shared;
