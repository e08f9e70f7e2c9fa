//! Pure mining logic: templates, nonce layout and the search loop.

pub mod nonce;
pub mod search;
pub mod template;
