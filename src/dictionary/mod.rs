mod memory;
mod pg;

pub use memory::MemoryWordSource;
pub use pg::PgWordSource;

use async_trait::async_trait;
use thiserror::Error;

/// A dictionary word as seen by question generation. The dictionary itself
/// is an external collaborator; this is the narrow slice the game consumes.
#[derive(Debug, Clone)]
pub struct Word {
    pub id: i64,
    pub language_id: i16,
    pub lemma: String,
    pub part_of_speech_id: Option<i16>,
    pub frequency_rank: Option<i32>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("word lookup failed: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Candidate-word and translation lookups backing question generation.
///
/// Implementations must return rows in a deterministic order (frequency
/// rank first, nulls last, ties broken by id) so generation is reproducible
/// over the same pool state.
#[async_trait]
pub trait WordSource: Send + Sync {
    /// Source-language words at the given level that have at least one
    /// translation in the target language.
    async fn find_words_by_level_and_languages(
        &self,
        level_id: i64,
        source_language_id: i16,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError>;

    /// Source-language words tagged with the given topic that have at least
    /// one translation in the target language.
    async fn find_words_by_topic_and_languages(
        &self,
        topic_id: i64,
        source_language_id: i16,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError>;

    /// Translations of a word into the target language, best first.
    async fn find_translations_for_word(
        &self,
        word_id: i64,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError>;
}
