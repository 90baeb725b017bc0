use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{SourceError, Word, WordSource};

/// Postgres-backed word source reading the dictionary tables directly.
pub struct PgWordSource {
    pool: PgPool,
}

impl PgWordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn word_from_row(row: &sqlx::postgres::PgRow) -> Result<Word, sqlx::Error> {
    Ok(Word {
        id: row.try_get("id")?,
        language_id: row.try_get("language_id")?,
        lemma: row.try_get("lemma")?,
        part_of_speech_id: row.try_get("part_of_speech_id")?,
        frequency_rank: row.try_get("frequency_rank")?,
    })
}

#[async_trait]
impl WordSource for PgWordSource {
    async fn find_words_by_level_and_languages(
        &self,
        level_id: i64,
        source_language_id: i16,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT w.id, w.language_id, w.lemma, w.part_of_speech_id, w.frequency_rank
            FROM words w
            INNER JOIN senses s ON w.id = s.word_id
            WHERE s.level_id = $1
              AND w.language_id = $2
              AND EXISTS (
                  SELECT 1
                  FROM sense_translations st
                  INNER JOIN words tw ON st.target_word_id = tw.id
                  WHERE st.source_sense_id = s.id
                    AND tw.language_id = $3
              )
            ORDER BY w.frequency_rank NULLS LAST, w.id
            LIMIT $4
            "#,
        )
        .bind(level_id)
        .bind(source_language_id)
        .bind(target_language_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| word_from_row(row).map_err(SourceError::Sqlx))
            .collect()
    }

    async fn find_words_by_topic_and_languages(
        &self,
        topic_id: i64,
        source_language_id: i16,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT w.id, w.language_id, w.lemma, w.part_of_speech_id, w.frequency_rank
            FROM words w
            INNER JOIN word_topics wt ON w.id = wt.word_id
            WHERE wt.topic_id = $1
              AND w.language_id = $2
              AND EXISTS (
                  SELECT 1
                  FROM senses s
                  INNER JOIN sense_translations st ON s.id = st.source_sense_id
                  INNER JOIN words tw ON st.target_word_id = tw.id
                  WHERE s.word_id = w.id
                    AND tw.language_id = $3
              )
            ORDER BY w.frequency_rank NULLS LAST, w.id
            LIMIT $4
            "#,
        )
        .bind(topic_id)
        .bind(source_language_id)
        .bind(target_language_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| word_from_row(row).map_err(SourceError::Sqlx))
            .collect()
    }

    async fn find_translations_for_word(
        &self,
        word_id: i64,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError> {
        let rows = sqlx::query(
            r#"
            SELECT tw.id, tw.language_id, tw.lemma, tw.part_of_speech_id,
                   tw.frequency_rank
            FROM words sw
            INNER JOIN senses s ON sw.id = s.word_id
            INNER JOIN sense_translations st ON s.id = st.source_sense_id
            INNER JOIN words tw ON st.target_word_id = tw.id
            WHERE sw.id = $1
              AND tw.language_id = $2
            GROUP BY tw.id, tw.language_id, tw.lemma, tw.part_of_speech_id,
                     tw.frequency_rank
            ORDER BY MIN(st.priority), tw.frequency_rank NULLS LAST, tw.id
            LIMIT $3
            "#,
        )
        .bind(word_id)
        .bind(target_language_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| word_from_row(row).map_err(SourceError::Sqlx))
            .collect()
    }
}
