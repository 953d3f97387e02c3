//! Message types exchanged with the push provider.

mod message;

pub use message::{
    AndroidConfig, AndroidNotification, ApnsConfig, ApnsPayload, Aps, Notification, PushMessage,
    SendReceipt, Target,
};
