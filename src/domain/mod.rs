//! Domain layer
//! 리뷰 동기화의 순수 규칙(엔티티/지문/정책)을 I/O 없이 표현한다.

pub mod fingerprint;
pub mod policy;
pub mod review;
pub mod target;
pub mod task;
