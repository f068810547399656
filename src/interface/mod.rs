//! 외부 진입점 모듈.
//! 설정과 어댑터를 조립해 유스케이스를 제공한다.

pub mod composition;

pub use composition::AppComposition;
