//! 동기화 대상 PR 식별자와 URL 해석.

use std::fmt;

use anyhow::{Result, bail};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// `https://<host>/<owner>/<repo>/pull/<number>` 형태의 URL을 해석한다.
    /// 호스트는 함께 반환해 호스트별 토큰/엔드포인트 선택에 쓴다.
    pub fn parse(input: &str) -> Result<(String, Self)> {
        let url = Url::parse(input)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("URL host is missing"))?
            .to_string();

        let segments: Vec<String> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).map(ToString::to_string).collect())
            .unwrap_or_default();

        // /owner/repo/pull/<number>
        if segments.len() < 4 || segments[2] != "pull" {
            bail!("unsupported pull request URL: {input}");
        }
        let Ok(number) = segments[3].parse() else {
            bail!("invalid pull request number in URL: {input}");
        };

        Ok((host, Self::new(segments[0].clone(), segments[1].clone(), number)))
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_pull_url() {
        let (host, pr) = PullRequestRef::parse("https://github.com/acme/widgets/pull/42/files").unwrap();
        assert_eq!(host, "github.com");
        assert_eq!(pr, PullRequestRef::new("acme", "widgets", 42));
        assert_eq!(pr.to_string(), "acme/widgets#42");
    }

    #[test]
    fn rejects_non_pull_urls() {
        assert!(PullRequestRef::parse("https://github.com/acme/widgets/issues/42").is_err());
        assert!(PullRequestRef::parse("https://github.com/acme/widgets/pull/abc").is_err());
    }
}
