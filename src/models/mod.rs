mod alert;
mod user;

pub use alert::{Alert, AlertStatus, AlertUpdate, AssetClass, ChannelFlags, TriggerType};
pub use user::UserPrefs;
