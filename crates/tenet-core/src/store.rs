//! The `BeliefStore` trait.
//!
//! Implemented by storage backends ([`crate::memory::MemoryStore`],
//! `tenet-store-sqlite`). The engine depends on this abstraction only.

use std::future::Future;

use crate::{
  topic::Topic,
  vote::{PreparedVote, Vote, VoteId},
};

/// An append-only, per-user log of votes.
///
/// There is no update or delete. Every read returns whole votes: a read that
/// starts after an append commits sees that vote entirely or not at all.
pub trait BeliefStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Assign an id to `vote` and persist it, all or nothing.
  ///
  /// Rejects a vote whose `created_at` is older than the newest stored vote
  /// of the same `(user, topic)` stream.
  fn append(
    &self,
    vote: PreparedVote,
  ) -> impl Future<Output = Result<Vote, Self::Error>> + Send + '_;

  /// Every vote for `(user_id, topic)`, oldest first, ties by id.
  fn history<'a>(
    &'a self,
    user_id: &'a str,
    topic: Topic,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + 'a;

  /// Every vote for `user_id` across topics, oldest first. Taken as a single
  /// snapshot so a full ledger never mixes two points in time.
  fn user_history<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + 'a;

  /// Up to `limit` most recent votes, newest first, optionally for one topic.
  fn recent<'a>(
    &'a self,
    user_id: &'a str,
    topic: Option<Topic>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + 'a;

  /// Retrieve a vote by id. Returns `None` if not found.
  fn get_vote(
    &self,
    id: VoteId,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;
}
