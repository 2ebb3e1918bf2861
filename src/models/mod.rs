//! Domain models for Boardwalk.
//!
//! # Core Concepts
//!
//! ## Board hierarchy
//!
//! - [`Board`]: Top-level container. Owns ordered lists, labels, sprints and members.
//! - [`BoardList`]: An ordered column on a board (e.g. "Backlog", "Doing").
//! - [`Card`]: A unit of work inside a list, ordered by `position`.
//! - [`ChecklistItem`]: A sub-task on a card with its own ordering.
//!
//! ## Collaboration
//!
//! - [`User`]: Someone who can own boards, be assigned cards and log time.
//! - [`Comment`]: Discussion attached to a card.
//! - [`Label`]: Board-scoped tag applied to cards.
//!
//! ## Reporting
//!
//! - [`CardActivity`]: Append-only audit trail of card mutations.
//! - [`TimeLog`]: Minutes spent on a card by a user on a given day.
//! - [`Sprint`]: Date window that cards are committed to, used for burndown and velocity.
//! - Analytics records ([`BoardStats`], [`Burndown`], [`VelocityReport`], ...) are
//!   plain aggregates computed on demand; nothing is cached.

mod activity;
mod analytics;
mod board;
mod card;
mod checklist;
mod comment;
mod label;
mod list;
mod sprint;
mod time_log;
mod user;

pub use activity::*;
pub use analytics::*;
pub use board::*;
pub use card::*;
pub use checklist::*;
pub use comment::*;
pub use label::*;
pub use list::*;
pub use sprint::*;
pub use time_log::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable field so that an absent key and an explicit `null`
/// can be told apart: absent stays `None`, `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
