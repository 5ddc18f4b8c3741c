//! Wire records returned by the search API. Extra fields are ignored by serde.

use serde::{Deserialize, Serialize};

/// A single post (or reshare) as returned by search and retweet listings.
/// Reshares carry the original post in `retweeted_status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub created_at: String,

    // `full_text` is only present with tweet_mode=extended; `text` otherwise.
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub entities: Entities,
    pub user: Author,

    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub favorite_count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<Post>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub user_mentions: Vec<Mention>,
    #[serde(default)]
    pub hashtags: Vec<Hashtag>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub screen_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hashtag {
    pub text: String,
}

/// Account that authored a post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub screen_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub friends_count: u64,
    pub created_at: String,
}

impl Post {
    /// Body text, preferring the untruncated form.
    pub fn body(&self) -> &str {
        self.full_text
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or("")
    }

    pub fn mention_handles(&self) -> Vec<String> {
        self.entities.user_mentions.iter().map(|m| m.screen_name.clone()).collect()
    }

    pub fn hashtag_texts(&self) -> Vec<String> {
        self.entities.hashtags.iter().map(|h| h.text.clone()).collect()
    }

    /// Id of the post this one reshares, if the API embedded it.
    pub fn original_id(&self) -> Option<u64> {
        self.retweeted_status.as_ref().map(|p| p.id)
    }

    #[inline]
    pub fn in_band(&self, lower: u64, upper: u64) -> bool {
        lower <= self.retweet_count && self.retweet_count <= upper
    }
}

/// Envelope of `search/tweets.json`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub statuses: Vec<Post>,
}
