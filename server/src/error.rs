//! Request rejections reported back to the acting client.

/// A well-formed request that broke a game rule.
///
/// The `Display` text is what the requester sees in their console.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Unknown skin '{requested}'. Available skins: {available}")]
    UnknownSkin { requested: String, available: String },

    #[error("Unknown map '{requested}'. Available maps: {available}")]
    UnknownMap { requested: String, available: String },
}
