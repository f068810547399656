pub mod compare_comments;
pub mod fetch_reviews;
pub mod resolve_thread;
pub mod thread_states;
pub mod track_resolution;

#[cfg(test)]
pub(crate) mod testing;
