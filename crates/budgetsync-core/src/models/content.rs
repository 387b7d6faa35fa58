//! Admin-curated content: articles, side-job listings and categories.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub read_time: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub full_description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub pay_range: Option<String>,
    #[serde(default)]
    pub time_commitment: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub how_to_start: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
}

// Wrapped list responses - internal to the API client
#[derive(Debug, Deserialize, Default)]
pub struct ArticlesResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[derive(Debug, Deserialize, Default)]
pub struct JobsResponse {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryCreated {
    #[serde(default)]
    pub message: Option<String>,
    pub category: Category,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jobs_response() {
        let json = r#"{"jobs":[{"_id":"j1","title":"Virtual Assistant","description":"Admin support","payRange":"150 - 300 per hour","tags":["admin","remote"]}]}"#;
        let resp: JobsResponse = serde_json::from_str(json).expect("parse jobs");
        assert_eq!(resp.jobs.len(), 1);
        assert_eq!(resp.jobs[0].pay_range.as_deref(), Some("150 - 300 per hour"));
        assert_eq!(resp.jobs[0].tags, vec!["admin", "remote"]);
    }

    #[test]
    fn test_parse_category_created() {
        let json = r#"{"message":"Category created successfully","category":{"_id":"c1","name":"Budgeting"}}"#;
        let resp: CategoryCreated = serde_json::from_str(json).expect("parse category");
        assert_eq!(resp.category.name, "Budgeting");
    }
}
