//! GitHub REST/GraphQL 연동 구현.

mod graphql;
mod rest;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};

pub use graphql::GitHubGraphqlClient;
pub use rest::GitHubRestClient;

const USER_AGENT: &str = "prsync";

/// 호스트별 공통 연결 정보(엔드포인트/인증).
#[derive(Clone)]
pub struct GitHubConnection {
    client: Client,
    host: String,
    token: Option<String>,
    api_base: Option<String>,
}

impl GitHubConnection {
    pub fn new(
        host: String,
        token: Option<String>,
        api_base: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            host,
            token,
            api_base,
        })
    }

    fn api_base(&self) -> String {
        // github.com은 공개 API, 그 외는 Enterprise 기본 경로를 사용한다.
        if let Some(base) = &self.api_base {
            return base.trim_end_matches('/').to_string();
        }
        if self.host == "github.com" {
            "https://api.github.com".to_string()
        } else {
            format!("https://{}/api/v3", self.host)
        }
    }

    fn graphql_endpoint(&self) -> String {
        let base = self.api_base();
        match base.strip_suffix("/v3") {
            Some(enterprise) => format!("{enterprise}/graphql"),
            None => format!("{base}/graphql"),
        }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        // 공통 헤더/인증 적용.
        let req = self
            .client
            .request(method, url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = &self.token {
            req.bearer_auth(token)
        } else {
            req
        }
    }
}
