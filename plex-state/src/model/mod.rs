//! Model types for plex-state

mod device_id;
mod media;
mod player_state;

pub use device_id::DeviceId;
pub use media::{MediaContentType, MediaInfo};
pub use player_state::PlayerState;
