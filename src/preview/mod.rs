//! Read-through previews: memory, disk, then network

mod context;
mod fetchable;
mod remote;

pub use context::ImageCache;
pub use fetchable::ImageFetchable;
pub use remote::RemoteImage;
