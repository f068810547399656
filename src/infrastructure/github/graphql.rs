//! GitHub GraphQL 엔드포인트 어댑터.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};

use super::GitHubConnection;
use crate::application::ports::{GraphqlGateway, GraphqlResponse};

pub struct GitHubGraphqlClient {
    conn: GitHubConnection,
}

impl GitHubGraphqlClient {
    pub fn new(conn: GitHubConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl GraphqlGateway for GitHubGraphqlClient {
    async fn execute(&self, query: &str, variables: Value) -> Result<GraphqlResponse> {
        let resp = self
            .conn
            .request(Method::POST, self.conn.graphql_endpoint())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("github: failed to send graphql request")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("github: failed to read graphql body")?;

        // errors[]가 있으면 상태 코드와 무관하게 그대로 올려 보낸다.
        let parsed = serde_json::from_str::<GraphqlResponse>(&body);
        let has_errors = parsed.as_ref().is_ok_and(|p| !p.errors.is_empty());
        if !status.is_success() && !has_errors {
            anyhow::bail!("github: graphql request failed ({status}): {body}");
        }
        parsed.context("github: invalid graphql JSON")
    }
}
