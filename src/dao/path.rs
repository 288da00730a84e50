//! Hierarchical addresses into the shared room store.

use std::fmt;

const ROOMS: &str = "rooms";

/// Slash-separated location of a node, e.g. `rooms/ab12c/gameList/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Build a path from raw segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The collection holding every room.
    pub fn rooms() -> Self {
        Self::new([ROOMS])
    }

    /// Root node of one room.
    pub fn room(room_id: &str) -> Self {
        Self::new([ROOMS, room_id])
    }

    /// Members of a room.
    pub fn user_list(room_id: &str) -> Self {
        Self::room(room_id).child("userList")
    }

    /// Online member counter of a room.
    pub fn online_count(room_id: &str) -> Self {
        Self::room(room_id).child("onlineCount")
    }

    /// Chat log of a room.
    pub fn chat_list(room_id: &str) -> Self {
        Self::room(room_id).child("chatList")
    }

    /// Games of a room.
    pub fn game_list(room_id: &str) -> Self {
        Self::room(room_id).child("gameList")
    }

    /// One game, addressed by its position in the room's game list.
    pub fn game(room_id: &str, game_index: usize) -> Self {
        Self::game_list(room_id).index(game_index)
    }

    /// Submissions of one round, addressed by list positions.
    pub fn round_detail(room_id: &str, game_index: usize, round_index: usize) -> Self {
        Self::game(room_id, game_index)
            .child("roundList")
            .index(round_index)
            .child("roundDetail")
    }

    /// Extend the path with a named child.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Extend the path with an array position.
    pub fn index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    /// Path segments from the root.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Room the path points into, when it addresses a room or anything below one.
    pub fn room_id(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [root, room_id, ..] if root == ROOMS => Some(room_id.as_str()),
            _ => None,
        }
    }

    /// Segments below the room root. Empty for the room itself or non-room paths.
    pub fn within_room(&self) -> &[String] {
        if self.room_id().is_some() {
            &self.segments[2..]
        } else {
            &[]
        }
    }

    /// `true` when `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &StorePath) -> bool {
        other.segments.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(left, right)| left == right)
    }

    /// `true` when a change at one path can affect the value at the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_detail_path_uses_list_positions() {
        let path = StorePath::round_detail("ab12c", 2, 0);
        assert_eq!(
            path.to_string(),
            "rooms/ab12c/gameList/2/roundList/0/roundDetail"
        );
        assert_eq!(path.room_id(), Some("ab12c"));
        assert_eq!(path.within_room().len(), 5);
    }

    #[test]
    fn overlap_is_symmetric_for_ancestors() {
        let room = StorePath::room("r1");
        let chat = StorePath::chat_list("r1");
        let other_room = StorePath::chat_list("r2");

        assert!(room.overlaps(&chat));
        assert!(chat.overlaps(&room));
        assert!(!chat.overlaps(&other_room));
        assert!(!StorePath::user_list("r1").overlaps(&chat));
    }

    #[test]
    fn non_room_paths_have_no_room_id() {
        assert_eq!(StorePath::rooms().room_id(), None);
        assert!(StorePath::rooms().within_room().is_empty());
        assert!(StorePath::new(["other", "r1"]).room_id().is_none());
    }
}
