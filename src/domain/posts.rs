use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A single post as served by the upstream blog API.
///
/// Identity is `id` alone: two posts with the same `id` are the same post
/// even when their other fields differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub author: String,
    pub author_id: u64,
    pub likes: u64,
    pub popularity: f64,
    pub reads: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

/// Ordered sequence of posts, serialized as `{"posts": [...]}`.
///
/// No uniqueness is implied; call [`PostCollection::deduplicate`] to enforce it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostCollection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub posts: Vec<Post>,
}

/// Upstream emits `null` for empty lists.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl PostCollection {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.posts.iter().map(|post| post.id).collect()
    }

    /// Append copies of every post in `other`.
    pub fn extend_from(&mut self, other: &PostCollection) {
        self.posts.extend(other.posts.iter().cloned());
    }

    /// Drop every post whose `id` was already seen earlier in the sequence.
    pub fn deduplicate(&mut self) {
        let mut seen = HashSet::with_capacity(self.posts.len());
        self.posts.retain(|post| seen.insert(post.id));
    }

    /// Order posts by `key` in `direction`.
    ///
    /// Secondary keys are applied as a stable pass over an ascending-id
    /// baseline, so ties always fall back to ascending `id`, including under
    /// [`SortDirection::Desc`].
    pub fn sort_by(&mut self, key: SortKey, direction: SortDirection) {
        if key == SortKey::Id && direction == SortDirection::Desc {
            self.posts.sort_unstable_by(|a, b| b.id.cmp(&a.id));
            return;
        }

        self.posts.sort_unstable_by_key(|post| post.id);

        let posts = &mut self.posts;
        match (key, direction) {
            (SortKey::Id, _) => {}
            (SortKey::Reads, SortDirection::Asc) => posts.sort_by(|a, b| a.reads.cmp(&b.reads)),
            (SortKey::Reads, SortDirection::Desc) => posts.sort_by(|a, b| b.reads.cmp(&a.reads)),
            (SortKey::Likes, SortDirection::Asc) => posts.sort_by(|a, b| a.likes.cmp(&b.likes)),
            (SortKey::Likes, SortDirection::Desc) => posts.sort_by(|a, b| b.likes.cmp(&a.likes)),
            (SortKey::Popularity, SortDirection::Asc) => {
                posts.sort_by(|a, b| a.popularity.total_cmp(&b.popularity))
            }
            (SortKey::Popularity, SortDirection::Desc) => {
                posts.sort_by(|a, b| b.popularity.total_cmp(&a.popularity))
            }
        }
    }
}

/// Field a [`PostCollection`] can be ordered by. An empty query value means `id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    Id,
    Reads,
    Likes,
    Popularity,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" | "id" => Some(Self::Id),
            "reads" => Some(Self::Reads),
            "likes" => Some(Self::Likes),
            "popularity" => Some(Self::Popularity),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Reads => "reads",
            Self::Likes => "likes",
            Self::Popularity => "popularity",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction. An empty query value means ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" | "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, reads: u64, likes: u64, popularity: f64) -> Post {
        Post {
            id,
            author: format!("author-{id}"),
            author_id: id * 10,
            likes,
            popularity,
            reads,
            tags: vec!["tech".to_string()],
        }
    }

    fn post1() -> Post {
        Post {
            author: "Rylee Paul".to_string(),
            author_id: 9,
            tags: vec!["tech".to_string(), "health".to_string()],
            ..post(1, 50361, 960, 0.13)
        }
    }

    fn post2() -> Post {
        Post {
            author: "Zackery Turner".to_string(),
            author_id: 12,
            tags: vec![
                "startups".to_string(),
                "tech".to_string(),
                "history".to_string(),
            ],
            ..post(2, 90406, 469, 0.68)
        }
    }

    fn post4() -> Post {
        Post {
            author: "Elisha Friedman".to_string(),
            author_id: 8,
            tags: vec![
                "science".to_string(),
                "design".to_string(),
                "tech".to_string(),
            ],
            ..post(4, 19645, 728, 0.88)
        }
    }

    fn post12() -> Post {
        Post {
            author: "Adalyn Blevins".to_string(),
            author_id: 11,
            ..post(12, 80351, 590, 0.32)
        }
    }

    fn shuffled() -> PostCollection {
        PostCollection::new(vec![post4(), post12(), post1(), post2()])
    }

    fn sorted_ids(key: &str, direction: &str) -> Vec<u64> {
        let mut collection = shuffled();
        collection.sort_by(
            SortKey::parse(key).expect("valid key"),
            SortDirection::parse(direction).expect("valid direction"),
        );
        collection.ids()
    }

    #[test]
    fn deduplicate_keeps_first_occurrence_in_order() {
        let mut collection = PostCollection::new(vec![
            post1(),
            post2(),
            post1(),
            post2(),
            post4(),
            post12(),
            post4(),
            post12(),
        ]);
        collection.deduplicate();
        assert_eq!(
            collection,
            PostCollection::new(vec![post1(), post2(), post4(), post12()])
        );
    }

    #[test]
    fn deduplicate_uses_identity_not_field_equality() {
        let mut edited = post1();
        edited.likes = 1;
        let mut collection = PostCollection::new(vec![edited, post2(), post1()]);
        collection.deduplicate();
        assert_eq!(collection.ids(), vec![1, 2]);
        assert_eq!(collection.posts[0].likes, 1);

        let twin = Post { id: 99, ..post2() };
        let mut collection = PostCollection::new(vec![post2(), twin]);
        collection.deduplicate();
        assert_eq!(collection.ids(), vec![2, 99]);
    }

    #[test]
    fn deduplicate_is_idempotent() {
        let mut once = PostCollection::new(vec![post12(), post1(), post12(), post4(), post1()]);
        once.deduplicate();
        let mut twice = once.clone();
        twice.deduplicate();
        assert_eq!(once, twice);
        assert_eq!(once.ids(), vec![12, 1, 4]);
    }

    #[test]
    fn deduplicate_empty_collection() {
        let mut collection = PostCollection::default();
        collection.deduplicate();
        assert!(collection.is_empty());
    }

    #[test]
    fn empty_key_and_direction_match_id_ascending() {
        assert_eq!(sorted_ids("", ""), vec![1, 2, 4, 12]);
        assert_eq!(sorted_ids("id", "asc"), sorted_ids("", ""));
        assert_eq!(sorted_ids("", "asc"), sorted_ids("id", ""));
    }

    #[test]
    fn id_descending_is_direct() {
        assert_eq!(sorted_ids("id", "desc"), vec![12, 4, 2, 1]);
        assert_eq!(sorted_ids("", "desc"), vec![12, 4, 2, 1]);
    }

    #[test]
    fn secondary_keys_ascending() {
        assert_eq!(sorted_ids("reads", ""), vec![4, 1, 12, 2]);
        assert_eq!(sorted_ids("likes", ""), vec![2, 12, 4, 1]);
        assert_eq!(sorted_ids("popularity", ""), vec![1, 12, 2, 4]);
        assert_eq!(sorted_ids("popularity", "asc"), vec![1, 12, 2, 4]);
    }

    #[test]
    fn secondary_keys_descending() {
        assert_eq!(sorted_ids("reads", "desc"), vec![2, 12, 1, 4]);
        assert_eq!(sorted_ids("likes", "desc"), vec![1, 4, 12, 2]);
        assert_eq!(sorted_ids("popularity", "desc"), vec![4, 2, 12, 1]);
    }

    #[test]
    fn ties_break_by_ascending_id_in_both_directions() {
        let posts = vec![
            post(30, 5, 7, 0.5),
            post(10, 5, 7, 0.5),
            post(20, 9, 3, 0.1),
            post(5, 5, 7, 0.5),
        ];

        let mut asc = PostCollection::new(posts.clone());
        asc.sort_by(SortKey::Likes, SortDirection::Asc);
        assert_eq!(asc.ids(), vec![20, 5, 10, 30]);

        let mut desc = PostCollection::new(posts.clone());
        desc.sort_by(SortKey::Likes, SortDirection::Desc);
        assert_eq!(desc.ids(), vec![5, 10, 30, 20]);

        let mut reads = PostCollection::new(posts.clone());
        reads.sort_by(SortKey::Reads, SortDirection::Desc);
        assert_eq!(reads.ids(), vec![20, 5, 10, 30]);

        let mut popularity = PostCollection::new(posts);
        popularity.sort_by(SortKey::Popularity, SortDirection::Desc);
        assert_eq!(popularity.ids(), vec![5, 10, 30, 20]);
    }

    #[test]
    fn popularity_is_unbounded() {
        let mut collection = PostCollection::new(vec![
            post(1, 0, 0, 42.0),
            post(2, 0, 0, -3.5),
            post(3, 0, 0, 0.0),
        ]);
        collection.sort_by(SortKey::Popularity, SortDirection::Asc);
        assert_eq!(collection.ids(), vec![2, 3, 1]);
    }

    #[test]
    fn sort_result_independent_of_input_order() {
        let mut forward = PostCollection::new(vec![post1(), post2(), post4(), post12()]);
        let mut backward = PostCollection::new(vec![post12(), post4(), post2(), post1()]);
        forward.sort_by(SortKey::Reads, SortDirection::Desc);
        backward.sort_by(SortKey::Reads, SortDirection::Desc);
        assert_eq!(forward, backward);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert_eq!(SortKey::parse("author"), None);
        assert_eq!(SortKey::parse("Likes"), None);
        assert_eq!(SortDirection::parse("descending"), None);
        assert_eq!(SortDirection::parse(" asc"), None);
    }

    #[test]
    fn serializes_upstream_shape() {
        let collection = PostCollection::new(vec![post1()]);
        let value = serde_json::to_value(&collection).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "posts": [{
                    "id": 1,
                    "author": "Rylee Paul",
                    "authorId": 9,
                    "likes": 960,
                    "popularity": 0.13,
                    "reads": 50361,
                    "tags": ["tech", "health"],
                }]
            })
        );
    }

    #[test]
    fn deserializes_upstream_body() {
        let body = r#"{"posts":[{"author":"Adalyn Blevins","authorId":11,"id":12,"likes":590,"popularity":0.32,"reads":80351,"tags":["tech"]}]}"#;
        let collection: PostCollection = serde_json::from_str(body).expect("decode");
        assert_eq!(collection, PostCollection::new(vec![post12()]));
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let collection: PostCollection =
            serde_json::from_str(r#"{"posts":null}"#).expect("null posts");
        assert!(collection.is_empty());

        let collection: PostCollection = serde_json::from_str("{}").expect("missing posts");
        assert!(collection.is_empty());

        let body = r#"{"posts":[{"author":"Rylee Paul","authorId":9,"id":1,"likes":960,"popularity":0.13,"reads":50361,"tags":null}]}"#;
        let collection: PostCollection = serde_json::from_str(body).expect("null tags");
        assert_eq!(collection.ids(), vec![1]);
        assert!(collection.posts[0].tags.is_empty());
    }
}
