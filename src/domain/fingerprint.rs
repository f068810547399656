//! 리뷰 내용 지문(fingerprint) 생성과 작성자 단위 중복 제거 규칙.

use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};

use crate::domain::review::Review;

const SIMILARITY_MIN_LEN: usize = 50;
const SIMILARITY_RATIO: f64 = 0.8;

/// 리뷰 내용에서 파생되는 지문. 저장하지 않고 필요할 때마다 다시 계산한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFingerprint {
    pub reviewer: String,
    pub content_hash: String,
    /// 정보용. 해시 입력에는 포함되지 않는다.
    pub comment_ids: Vec<i64>,
}

/// 리뷰 본문 + 코멘트 `(path, line, body)` 서명으로 결정적 지문을 만든다.
/// 코멘트 순서에 영향받지 않도록 서명을 정렬한 뒤 해시한다.
pub fn generate_fingerprint(review: &Review) -> ReviewFingerprint {
    let mut hasher = Sha256::new();

    let body = review.body.trim();
    if !body.is_empty() {
        hash_part(&mut hasher, "body");
        hash_part(&mut hasher, body);
    }

    let mut signatures: Vec<(&str, u32, &str)> = review
        .comments
        .iter()
        .map(|c| (c.file_path.as_str(), c.line, c.body.trim()))
        .collect();
    signatures.sort_unstable();
    for (path, line, body) in signatures {
        hash_part(&mut hasher, "comment");
        hash_part(&mut hasher, path);
        hash_part(&mut hasher, &line.to_string());
        hash_part(&mut hasher, body);
    }

    let mut comment_ids: Vec<i64> = review
        .comments
        .iter()
        .filter(|c| c.has_remote_identity())
        .map(|c| c.id)
        .collect();
    comment_ids.sort_unstable();

    ReviewFingerprint {
        reviewer: review.reviewer.clone(),
        content_hash: hex::encode(hasher.finalize()),
        comment_ids,
    }
}

/// 같은 작성자의 같은 내용 리뷰를 가장 최근 것 하나로 접는다.
/// 결과는 `submitted_at` 오름차순이다.
pub fn deduplicate(reviews: Vec<Review>) -> Vec<Review> {
    let mut by_reviewer: BTreeMap<String, Vec<Review>> = BTreeMap::new();
    for review in reviews {
        by_reviewer
            .entry(review.reviewer.clone())
            .or_default()
            .push(review);
    }

    let mut out = Vec::new();
    for (_, group) in by_reviewer {
        let mut latest: HashMap<String, Review> = HashMap::new();
        for review in group {
            let hash = generate_fingerprint(&review).content_hash;
            match latest.get(&hash) {
                Some(kept) if !is_newer(&review, kept) => {}
                _ => {
                    latest.insert(hash, review);
                }
            }
        }
        out.extend(latest.into_values());
    }

    // 동일 시각은 id로 정렬해 HashMap 순회 순서가 결과에 새지 않게 한다.
    out.sort_by(|a, b| {
        a.submitted_at
            .cmp(&b.submitted_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

/// 공백 정규화 후 완전 일치, 또는 충분히 긴 문자열 사이의 포함 관계로 근사 중복을 판단한다.
pub fn is_similar_content(a: &str, b: &str) -> bool {
    let a = normalize_whitespace(a);
    let b = normalize_whitespace(b);

    if a == b {
        return true;
    }

    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    if a_len <= SIMILARITY_MIN_LEN || b_len <= SIMILARITY_MIN_LEN {
        return false;
    }

    let (shorter, longer, short_len, long_len) = if a_len <= b_len {
        (&a, &b, a_len, b_len)
    } else {
        (&b, &a, b_len, a_len)
    };

    (short_len as f64) >= (long_len as f64) * SIMILARITY_RATIO && longer.contains(shorter.as_str())
}

fn is_newer(candidate: &Review, kept: &Review) -> bool {
    match candidate.submitted_at.cmp(&kept.submitted_at) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => candidate.id > kept.id,
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 길이 접두사로 ("ab","c")와 ("a","bc")를 구분한다.
pub(crate) fn hash_part(hasher: &mut Sha256, part: &str) {
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part.as_bytes());
}
