use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;

use crate::application::query::PostsQuery;
use crate::domain::posts::PostCollection;

use super::HttpState;
use super::error::ApiError;

/// Recognised query parameters. A repeated key keeps its first value;
/// unknown keys are ignored.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct PostsParams {
    tags: Option<String>,
    sort_by: Option<String>,
    direction: Option<String>,
}

impl PostsParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "tags" => &mut params.tags,
                "sortBy" => &mut params.sort_by,
                "direction" => &mut params.direction,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PingBody {
    success: bool,
}

pub(super) async fn ping() -> Json<PingBody> {
    Json(PingBody { success: true })
}

pub(super) async fn list_posts(
    State(state): State<HttpState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PostCollection>, ApiError> {
    let params = PostsParams::from_pairs(pairs);
    let query = PostsQuery::parse(
        params.tags.as_deref(),
        params.sort_by.as_deref(),
        params.direction.as_deref(),
    )?;
    let posts = state.query.run(&query).await?;
    Ok(Json(posts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn first_value_wins_for_repeated_keys() {
        let params = PostsParams::from_pairs(pairs(&[
            ("tags", "tech"),
            ("sortBy", "likes"),
            ("tags", "science"),
            ("sortBy", "bogus"),
            ("limit", "5"),
        ]));
        assert_eq!(
            params,
            PostsParams {
                tags: Some("tech".to_string()),
                sort_by: Some("likes".to_string()),
                direction: None,
            }
        );
    }

    #[test]
    fn empty_first_value_is_kept() {
        let params = PostsParams::from_pairs(pairs(&[("tags", ""), ("tags", "tech")]));
        assert_eq!(params.tags.as_deref(), Some(""));
    }
}
