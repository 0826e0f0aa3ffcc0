// Word pools per locale, custom-word blending, and the per-turn draw.

use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Language {
    English,
    EnglishGb,
    German,
    French,
    Italian,
    Dutch,
    Swedish,
}

impl Language {
    /// Unknown codes fall back to the default (English), per the word-source spec.
    pub fn from_code(code: &str) -> Self {
        match code {
            "english_gb" => Language::EnglishGb,
            "german" => Language::German,
            "french" => Language::French,
            "italian" => Language::Italian,
            "dutch" => Language::Dutch,
            "swedish" => Language::Swedish,
            "english" => Language::English,
            _ => Language::English,
        }
    }

    fn pool(self) -> &'static [&'static str] {
        match self {
            Language::English => ENGLISH,
            Language::EnglishGb => ENGLISH_GB,
            Language::German => GERMAN,
            Language::French => FRENCH,
            Language::Italian => ITALIAN,
            Language::Dutch => DUTCH,
            Language::Swedish => SWEDISH,
        }
    }
}

// Representative samples per locale; these are a content asset, not engine
// logic, so the lists here are a curated subset rather than a full dictionary.
const ENGLISH: &[&str] = &[
    "apple", "bicycle", "castle", "dolphin", "elephant", "forest", "guitar", "hammer",
    "island", "jacket", "kangaroo", "lighthouse", "mountain", "notebook", "octopus",
    "pancake", "queen", "rainbow", "sandwich", "telescope", "umbrella", "volcano",
    "waterfall", "xylophone", "yoyo", "zebra", "astronaut", "butterfly", "campfire",
    "dinosaur",
];
const ENGLISH_GB: &[&str] = &[
    "lorry", "flat", "biscuit", "trainers", "petrol", "postbox", "jumper", "torch",
    "pavement", "roundabout", "wellies", "lift", "fortnight", "motorway", "crisps",
];
const GERMAN: &[&str] = &[
    "apfel", "fahrrad", "schloss", "delfin", "elefant", "wald", "gitarre", "hammer",
    "insel", "jacke", "kaenguru", "leuchtturm", "berg", "notizbuch", "krake",
];
const FRENCH: &[&str] = &[
    "pomme", "velo", "chateau", "dauphin", "elephant", "foret", "guitare", "marteau",
    "ile", "veste", "kangourou", "phare", "montagne", "carnet", "poulpe",
];
const ITALIAN: &[&str] = &[
    "mela", "bicicletta", "castello", "delfino", "elefante", "foresta", "chitarra",
    "martello", "isola", "giacca", "canguro", "faro", "montagna", "quaderno", "polpo",
];
const DUTCH: &[&str] = &[
    "appel", "fiets", "kasteel", "dolfijn", "olifant", "bos", "gitaar", "hamer",
    "eiland", "jas", "kangoeroe", "vuurtoren", "berg", "notitieboek", "octopus",
];
const SWEDISH: &[&str] = &[
    "aeppel", "cykel", "slott", "delfin", "elefant", "skog", "gitarr", "hammare",
    "ö", "jacka", "kaenguru", "fyr", "berg", "anteckningsbok", "bläckfisk",
];

/// A lobby's custom-word pool: shuffled once at creation, drawn without
/// replacement; falls back to the locale pool once exhausted.
#[derive(Debug, Default, Clone)]
pub struct CustomWordPool {
    words: Vec<String>,
    next: usize,
}

impl CustomWordPool {
    pub fn new<R: Rng + ?Sized>(mut words: Vec<String>, rng: &mut R) -> Self {
        words.shuffle(rng);
        Self { words, next: 0 }
    }

    fn draw(&mut self) -> Option<&str> {
        let word = self.words.get(self.next)?;
        self.next += 1;
        Some(word.as_str())
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.words.len()
    }
}

/// Parses newline- or comma-separated custom word text, lowercased by the
/// given locale, retaining insertion order (the caller shuffles once).
pub fn parse_custom_words(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Draws `count` candidate words for a word-choice prompt. For each slot,
/// with probability `custom_words_chance / 100`, draws from the (pre-shuffled)
/// custom pool if it still has unused entries; otherwise draws uniformly
/// from the locale's built-in pool without replacement within this call.
pub fn get_random_words<R: Rng + ?Sized>(
    count: usize,
    language: Language,
    custom_words_chance: u8,
    custom_pool: &mut CustomWordPool,
    rng: &mut R,
) -> Vec<String> {
    let builtin = language.pool();
    let mut used_builtin_indices: Vec<usize> = Vec::new();
    let mut result = Vec::with_capacity(count);

    for _ in 0..count {
        let roll_custom = rng.gen_range(0..100) < custom_words_chance && !custom_pool.is_exhausted();
        if roll_custom
            && let Some(word) = custom_pool.draw() {
                result.push(word.to_string());
                continue;
            }

        let available: Vec<usize> = (0..builtin.len())
            .filter(|i| !used_builtin_indices.contains(i))
            .collect();
        let pick = if available.is_empty() {
            // Pool smaller than `count`: allow repeats rather than panicking.
            rng.gen_range(0..builtin.len())
        } else {
            *available.choose(rng).expect("non-empty available set")
        };
        used_builtin_indices.push(pick);
        result.push(builtin[pick].to_string());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn unknown_language_code_falls_back_to_english() {
        assert_eq!(Language::from_code("klingon"), Language::English);
        assert_eq!(Language::from_code("german"), Language::German);
    }

    #[test]
    fn custom_pool_falls_back_once_exhausted() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = CustomWordPool::new(vec!["foo".into()], &mut rng);
        let words = get_random_words(3, Language::English, 100, &mut pool, &mut rng);
        assert_eq!(words.len(), 3);
        assert!(words.contains(&"foo".to_string()));
        // Exhausted after the first draw; remaining slots come from the builtin pool.
        assert!(pool.is_exhausted());
    }

    #[test]
    fn custom_words_parsed_and_lowercased() {
        let words = parse_custom_words("Foo, Bar\nBaz,, qux ");
        assert_eq!(words, vec!["foo", "bar", "baz", "qux"]);
    }
}
