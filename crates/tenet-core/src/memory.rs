//! An in-process [`BeliefStore`]: an arena of votes indexed by
//! `(user_id, topic)`.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
  Error, Result,
  store::BeliefStore,
  topic::Topic,
  vote::{PreparedVote, Vote, VoteId},
};

#[derive(Default)]
struct Arena {
  votes:   Vec<Vote>,
  streams: HashMap<(String, Topic), Vec<usize>>,
  users:   HashMap<String, Vec<usize>>,
}

impl Arena {
  fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<Vote> {
    indices
      .map(|ix| ix.iter().map(|&i| self.votes[i].clone()).collect())
      .unwrap_or_default()
  }
}

/// Votes live in memory behind a [`RwLock`]; appends take the write half, so
/// readers never observe a partially-inserted vote.
///
/// Cloning is cheap: clones share the same arena.
#[derive(Clone, Default)]
pub struct MemoryStore {
  arena: Arc<RwLock<Arena>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub async fn len(&self) -> usize { self.arena.read().await.votes.len() }

  pub async fn is_empty(&self) -> bool { self.len().await == 0 }
}

impl BeliefStore for MemoryStore {
  type Error = Error;

  async fn append(&self, vote: PreparedVote) -> Result<Vote> {
    let mut arena = self.arena.write().await;
    let stream = (vote.user_id.clone(), vote.topic);

    // Streams are kept sorted, so the last index is the newest vote.
    if let Some(&last) = arena.streams.get(&stream).and_then(|ix| ix.last()) {
      let latest = arena.votes[last].created_at;
      if vote.created_at < latest {
        return Err(Error::OutOfOrderVote {
          user_id: vote.user_id,
          topic: vote.topic,
          attempted: vote.created_at,
          latest,
        });
      }
    }

    let index = arena.votes.len();
    let vote = vote.into_vote(VoteId(index as i64 + 1));
    arena.votes.push(vote.clone());
    arena.streams.entry(stream).or_default().push(index);
    arena.users.entry(vote.user_id.clone()).or_default().push(index);
    Ok(vote)
  }

  async fn history(&self, user_id: &str, topic: Topic) -> Result<Vec<Vote>> {
    let arena = self.arena.read().await;
    Ok(arena.collect(arena.streams.get(&(user_id.to_owned(), topic))))
  }

  async fn user_history(&self, user_id: &str) -> Result<Vec<Vote>> {
    let arena = self.arena.read().await;
    let mut votes = arena.collect(arena.users.get(user_id));
    crate::vote::sort_history(&mut votes);
    Ok(votes)
  }

  async fn recent(
    &self,
    user_id: &str,
    topic: Option<Topic>,
    limit: usize,
  ) -> Result<Vec<Vote>> {
    let mut votes = match topic {
      Some(t) => self.history(user_id, t).await?,
      None => self.user_history(user_id).await?,
    };
    votes.reverse();
    votes.truncate(limit);
    Ok(votes)
  }

  async fn get_vote(&self, id: VoteId) -> Result<Option<Vote>> {
    let arena = self.arena.read().await;
    let found = usize::try_from(id.0 - 1)
      .ok()
      .and_then(|i| arena.votes.get(i))
      .cloned();
    Ok(found)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{at, vote};
  use crate::vote::Stance;

  fn prepared(stance: Stance, minute: i64) -> PreparedVote {
    vote(0, stance, "tariffs help workers", at(minute)).to_prepared()
  }

  #[tokio::test]
  async fn append_assigns_increasing_ids() {
    let s = MemoryStore::new();
    let a = s.append(prepared(Stance::Agree, 0)).await.unwrap();
    let b = s.append(prepared(Stance::Agree, 0)).await.unwrap();
    assert!(a.id < b.id);
    assert_eq!(s.len().await, 2);
    assert_eq!(s.get_vote(b.id).await.unwrap(), Some(b));
    assert_eq!(s.get_vote(VoteId(99)).await.unwrap(), None);
    assert_eq!(s.get_vote(VoteId(0)).await.unwrap(), None);
  }

  #[tokio::test]
  async fn older_timestamp_is_rejected_without_writing() {
    let s = MemoryStore::new();
    s.append(prepared(Stance::Agree, 10)).await.unwrap();
    let err = s.append(prepared(Stance::Agree, 5)).await.unwrap_err();
    assert!(matches!(err, Error::OutOfOrderVote { .. }));
    assert_eq!(s.len().await, 1);
  }

  #[tokio::test]
  async fn streams_are_isolated_per_user_and_topic() {
    let s = MemoryStore::new();
    s.append(prepared(Stance::Agree, 10)).await.unwrap();
    let mut other_user = prepared(Stance::Agree, 0);
    other_user.user_id = "u2".into();
    s.append(other_user).await.unwrap();
    let mut other_topic = prepared(Stance::Agree, 0);
    other_topic.topic = Topic::Inflation;
    s.append(other_topic).await.unwrap();

    assert_eq!(s.history("u1", Topic::Trade).await.unwrap().len(), 1);
    assert_eq!(s.history("u2", Topic::Trade).await.unwrap().len(), 1);
    let all = s.user_history("u1").await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].topic, Topic::Inflation);

    let newest = s.recent("u1", None, 1).await.unwrap();
    assert_eq!(newest[0].topic, Topic::Trade);
  }
}
