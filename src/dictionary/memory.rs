use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{SourceError, Word, WordSource};

#[derive(Debug, Clone)]
struct StoredWord {
    word: Word,
    level_ids: Vec<i64>,
    topic_ids: Vec<i64>,
}

/// In-memory word source for tests and local tooling. Seeded through the
/// builder-style `add_*` methods, then queried like the Postgres source,
/// with the same deterministic ordering.
#[derive(Default)]
pub struct MemoryWordSource {
    words: Mutex<Vec<StoredWord>>,
    // source word id -> ordered (priority, target word id)
    translations: Mutex<HashMap<i64, Vec<(i16, i64)>>>,
    call_count: AtomicU32,
}

impl MemoryWordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_word(&self, word: Word, level_ids: &[i64], topic_ids: &[i64]) {
        self.words.lock().push(StoredWord {
            word,
            level_ids: level_ids.to_vec(),
            topic_ids: topic_ids.to_vec(),
        });
    }

    pub fn add_translation(&self, source_word_id: i64, target_word_id: i64, priority: i16) {
        let mut map = self.translations.lock();
        let entry = map.entry(source_word_id).or_default();
        entry.push((priority, target_word_id));
        entry.sort();
    }

    /// Number of lookup calls made against this source.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn find_word(&self, word_id: i64) -> Option<Word> {
        self.words
            .lock()
            .iter()
            .find(|stored| stored.word.id == word_id)
            .map(|stored| stored.word.clone())
    }

    fn has_translation_in(&self, word_id: i64, target_language_id: i16) -> bool {
        let map = self.translations.lock();
        let Some(targets) = map.get(&word_id) else {
            return false;
        };
        targets.iter().any(|(_, target_id)| {
            self.find_word(*target_id)
                .is_some_and(|w| w.language_id == target_language_id)
        })
    }

    fn select_candidates<F>(
        &self,
        source_language_id: i16,
        target_language_id: i16,
        limit: i64,
        filter: F,
    ) -> Vec<Word>
    where
        F: Fn(&StoredWord) -> bool,
    {
        let mut matches: Vec<Word> = self
            .words
            .lock()
            .iter()
            .filter(|stored| stored.word.language_id == source_language_id)
            .filter(|stored| filter(stored))
            .map(|stored| stored.word.clone())
            .collect();
        matches.retain(|word| self.has_translation_in(word.id, target_language_id));
        sort_by_rank(&mut matches);
        matches.truncate(limit.max(0) as usize);
        matches
    }
}

fn sort_by_rank(words: &mut [Word]) {
    words.sort_by_key(|w| (w.frequency_rank.is_none(), w.frequency_rank, w.id));
}

#[async_trait]
impl WordSource for MemoryWordSource {
    async fn find_words_by_level_and_languages(
        &self,
        level_id: i64,
        source_language_id: i16,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.select_candidates(source_language_id, target_language_id, limit, |stored| {
            stored.level_ids.contains(&level_id)
        }))
    }

    async fn find_words_by_topic_and_languages(
        &self,
        topic_id: i64,
        source_language_id: i16,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.select_candidates(source_language_id, target_language_id, limit, |stored| {
            stored.topic_ids.contains(&topic_id)
        }))
    }

    async fn find_translations_for_word(
        &self,
        word_id: i64,
        target_language_id: i16,
        limit: i64,
    ) -> Result<Vec<Word>, SourceError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let targets: Vec<(i16, i64)> = self
            .translations
            .lock()
            .get(&word_id)
            .cloned()
            .unwrap_or_default();

        // A target reachable through several senses keeps its best priority
        // and is returned once.
        let mut seen = std::collections::HashSet::new();
        let mut words: Vec<Word> = targets
            .into_iter()
            .filter(|(_, target_id)| seen.insert(*target_id))
            .filter_map(|(_, target_id)| self.find_word(target_id))
            .filter(|word| word.language_id == target_language_id)
            .collect();
        words.truncate(limit.max(0) as usize);
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: i64, language_id: i16, lemma: &str, rank: Option<i32>) -> Word {
        Word {
            id,
            language_id,
            lemma: lemma.to_string(),
            part_of_speech_id: None,
            frequency_rank: rank,
        }
    }

    #[tokio::test]
    async fn level_lookup_requires_reachable_translation() {
        let source = MemoryWordSource::new();
        source.add_word(word(1, 1, "mèo", Some(10)), &[3], &[]);
        source.add_word(word(2, 1, "chó", Some(5)), &[3], &[]);
        source.add_word(word(10, 2, "cat", Some(1)), &[], &[]);
        source.add_translation(1, 10, 1);

        let found = source
            .find_words_by_level_and_languages(3, 1, 2, 20)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[tokio::test]
    async fn ordering_is_rank_then_id_with_nulls_last() {
        let source = MemoryWordSource::new();
        source.add_word(word(3, 1, "ba", None), &[1], &[]);
        source.add_word(word(2, 1, "hai", Some(7)), &[1], &[]);
        source.add_word(word(1, 1, "một", Some(7)), &[1], &[]);
        for id in [1, 2, 3] {
            source.add_word(word(100 + id, 2, "t", None), &[], &[]);
            source.add_translation(id, 100 + id, 1);
        }

        let found = source
            .find_words_by_level_and_languages(1, 1, 2, 20)
            .await
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn translations_ordered_by_priority() {
        let source = MemoryWordSource::new();
        source.add_word(word(1, 1, "nhà", None), &[1], &[]);
        source.add_word(word(20, 2, "house", None), &[], &[]);
        source.add_word(word(21, 2, "home", None), &[], &[]);
        source.add_translation(1, 21, 2);
        source.add_translation(1, 20, 1);

        let found = source.find_translations_for_word(1, 2, 10).await.unwrap();
        assert_eq!(found[0].id, 20);
        assert_eq!(found[1].id, 21);
    }

    #[tokio::test]
    async fn target_reached_through_several_senses_appears_once() {
        let source = MemoryWordSource::new();
        source.add_word(word(1, 1, "sáng", None), &[1], &[]);
        source.add_word(word(30, 2, "bright", None), &[], &[]);
        source.add_word(word(31, 2, "light", None), &[], &[]);
        source.add_translation(1, 30, 1);
        source.add_translation(1, 30, 2);
        source.add_translation(1, 31, 3);

        let found = source.find_translations_for_word(1, 2, 2).await.unwrap();
        let ids: Vec<i64> = found.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![30, 31]);
    }
}
