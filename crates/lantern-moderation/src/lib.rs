//! Moderation core: the submission store contract, the paginated list
//! controller, and the guided destination resolver used to convert
//! resource submissions into real content.

pub mod list;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod testutil;
