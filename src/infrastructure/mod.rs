//! Infrastructure layer
//! 외부 시스템(GitHub API/파일시스템)과 직접 통신하는 구현체 집합.

pub mod cache;
pub mod config;
pub mod github;
pub mod tasks;
