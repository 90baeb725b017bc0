use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use thiserror::Error;

use crate::dictionary::{SourceError, Word, WordSource};
use crate::game::model::{NewOption, NewQuestion};

pub const MIN_QUESTION_COUNT: usize = 1;
pub const MAX_QUESTION_COUNT: usize = 20;
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Four choices per question, labelled A through D.
const OPTIONS_PER_QUESTION: usize = 4;
const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// How many candidate words to pull from the source before selection.
const CANDIDATE_FETCH_LIMIT: i64 = 100;
/// How many translations to consider per word.
const TRANSLATION_FETCH_LIMIT: i64 = 10;

const QUESTION_TYPE_TRANSLATION: &str = "translation";

#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Recoverable, user-facing: the pool cannot support a session. Distinct
    /// from lookup failures so callers can suggest another topic or level.
    #[error("not enough candidate words: need {required}, have {available}")]
    InsufficientCandidates { required: usize, available: usize },
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub session_id: i64,
    pub source_language_id: i16,
    pub target_language_id: i16,
    pub topic_ids: Vec<i64>,
    pub level_id: i64,
    pub max_count: usize,
}

/// Builds the question set for a session: one question per candidate word,
/// each with one correct translation and up to three distractors drawn from
/// the other candidates' translations. Pure selection over the source; does
/// not persist anything.
pub async fn generate_questions(
    source: &dyn WordSource,
    params: &GenerationParams,
) -> Result<(Vec<NewQuestion>, Vec<NewOption>), GeneratorError> {
    let candidates = select_candidates(source, params).await?;
    if candidates.len() < MIN_QUESTION_COUNT {
        return Err(GeneratorError::InsufficientCandidates {
            required: MIN_QUESTION_COUNT,
            available: candidates.len(),
        });
    }

    // Translations per candidate, fetched once; the same pool supplies both
    // correct options and distractors.
    let mut translations: HashMap<i64, Vec<Word>> = HashMap::with_capacity(candidates.len());
    for word in &candidates {
        let found = source
            .find_translations_for_word(word.id, params.target_language_id, TRANSLATION_FETCH_LIMIT)
            .await?;
        translations.insert(word.id, found);
    }

    let max_count = params.max_count.min(MAX_QUESTION_COUNT);
    let mut questions: Vec<NewQuestion> = Vec::new();
    let mut options: Vec<NewOption> = Vec::new();
    let mut rng = rand::rng();

    for word in &candidates {
        if questions.len() >= max_count {
            break;
        }

        let Some(word_translations) = translations.get(&word.id).filter(|t| !t.is_empty()) else {
            continue;
        };
        let correct = &word_translations[0];
        let valid_ids: HashSet<i64> = word_translations.iter().map(|t| t.id).collect();
        let valid_texts: HashSet<&str> =
            word_translations.iter().map(|t| t.lemma.as_str()).collect();

        let distractors = pick_distractors(word.id, &candidates, &translations, &valid_ids, &valid_texts);
        if distractors.is_empty() {
            // A single-option question is not multiple choice; skip the word.
            continue;
        }

        let question_order = questions.len() as i16 + 1;
        let mut generated: Vec<NewOption> = Vec::with_capacity(1 + distractors.len());
        generated.push(NewOption {
            question_order,
            option_label: String::new(),
            target_word_id: correct.id,
            word_text: correct.lemma.clone(),
            is_correct: true,
        });
        for distractor in distractors {
            generated.push(NewOption {
                question_order,
                option_label: String::new(),
                target_word_id: distractor.id,
                word_text: distractor.lemma.clone(),
                is_correct: false,
            });
        }
        generated.shuffle(&mut rng);
        for (index, option) in generated.iter_mut().enumerate() {
            option.option_label = OPTION_LABELS[index].to_string();
        }

        questions.push(NewQuestion {
            session_id: params.session_id,
            question_order,
            question_type: QUESTION_TYPE_TRANSLATION.to_string(),
            source_word_id: word.id,
            correct_target_word_id: correct.id,
            source_language_id: params.source_language_id,
            target_language_id: params.target_language_id,
            prompt_text: word.lemma.clone(),
        });
        options.extend(generated);
    }

    if questions.len() < MIN_QUESTION_COUNT {
        return Err(GeneratorError::InsufficientCandidates {
            required: MIN_QUESTION_COUNT,
            available: questions.len(),
        });
    }

    Ok((questions, options))
}

/// Candidate words in deterministic order. Level lookup when no topics are
/// given; otherwise the union over all requested topics, de-duplicated and
/// re-sorted by rank.
async fn select_candidates(
    source: &dyn WordSource,
    params: &GenerationParams,
) -> Result<Vec<Word>, GeneratorError> {
    if params.topic_ids.is_empty() {
        let words = source
            .find_words_by_level_and_languages(
                params.level_id,
                params.source_language_id,
                params.target_language_id,
                CANDIDATE_FETCH_LIMIT,
            )
            .await?;
        return Ok(words);
    }

    let mut seen: HashSet<i64> = HashSet::new();
    let mut merged: Vec<Word> = Vec::new();
    for topic_id in &params.topic_ids {
        let words = source
            .find_words_by_topic_and_languages(
                *topic_id,
                params.source_language_id,
                params.target_language_id,
                CANDIDATE_FETCH_LIMIT,
            )
            .await?;
        for word in words {
            if seen.insert(word.id) {
                merged.push(word);
            }
        }
    }
    merged.sort_by_key(|w| (w.frequency_rank.is_none(), w.frequency_rank, w.id));
    Ok(merged)
}

/// Plausible-but-incorrect options: translations of the other candidates,
/// excluding anything that is a valid translation of this word (by id or by
/// display text, so a shared lemma never yields two "correct" choices).
fn pick_distractors<'a>(
    word_id: i64,
    candidates: &[Word],
    translations: &'a HashMap<i64, Vec<Word>>,
    valid_ids: &HashSet<i64>,
    valid_texts: &HashSet<&str>,
) -> Vec<&'a Word> {
    let mut chosen: Vec<&Word> = Vec::new();
    let mut chosen_texts: HashSet<&str> = HashSet::new();

    for other in candidates {
        if other.id == word_id {
            continue;
        }
        let Some(other_translations) = translations.get(&other.id) else {
            continue;
        };
        for translation in other_translations {
            if chosen.len() >= OPTIONS_PER_QUESTION - 1 {
                return chosen;
            }
            if valid_ids.contains(&translation.id)
                || valid_texts.contains(translation.lemma.as_str())
                || chosen_texts.contains(translation.lemma.as_str())
                || chosen.iter().any(|c| c.id == translation.id)
            {
                continue;
            }
            chosen_texts.insert(translation.lemma.as_str());
            chosen.push(translation);
        }
    }

    chosen
}
