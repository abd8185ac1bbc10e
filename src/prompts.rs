//! Prompt synthesis
//!
//! Builds a display title and a model prompt by sampling the [`WordBank`].
//! Occasionally two animals are fused into a chimera.

use crate::models::GeneratedPrompt;
use crate::words::{WordBank, ADJECTIVES, ANIMALS, GENERAL_STYLE, SYMBOLISM};
use rand::Rng;

pub const IMAGE_PROMPT: &str = include_str!("../data/prompts/image_prompt.txt");
pub const TITLE: &str = include_str!("../data/prompts/title.txt");

pub const CHIMERA_CHANCE: f64 = 0.1;

pub const FALLBACK_CREATURE: &str = "mystical creature";
pub const FALLBACK_SECOND_CREATURE: &str = "legendary beast";
pub const FALLBACK_ADJECTIVE: &str = "mysterious";
pub const FALLBACK_SYMBOLISM: &str = "wanders";
pub const FALLBACK_GENERAL_STYLE: &str = "Highly detailed illustration";

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Capitalise the first letter of every alphabetic run and lowercase the rest.
pub fn title_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut previous_is_letter = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}

/// Samples titles and prompts from a loaded word bank.
#[derive(Debug, Clone)]
pub struct PromptSynthesizer {
    bank: Option<WordBank>,
    chimera_chance: f64,
}

impl PromptSynthesizer {
    /// `bank` is `None` when the word directory was absent at startup.
    pub fn new(bank: Option<WordBank>) -> Self {
        Self {
            bank,
            chimera_chance: CHIMERA_CHANCE,
        }
    }

    pub fn with_chimera_chance(mut self, chance: f64) -> Self {
        self.chimera_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn has_words(&self) -> bool {
        self.bank.is_some()
    }

    /// Build one title/prompt pair, or `None` without a word bank.
    pub fn synthesize(&self, rng: &mut impl Rng) -> Option<GeneratedPrompt> {
        let bank = self.bank.as_ref()?;

        let creature = if rng.gen_bool(self.chimera_chance) {
            let first = bank.sample(ANIMALS, rng).unwrap_or(FALLBACK_CREATURE);
            let second = bank
                .sample(ANIMALS, rng)
                .unwrap_or(FALLBACK_SECOND_CREATURE);
            format!("{}-{} chimera", first, second)
        } else {
            bank.sample(ANIMALS, rng)
                .unwrap_or(FALLBACK_CREATURE)
                .to_string()
        };

        let adjective = bank.sample(ADJECTIVES, rng).unwrap_or(FALLBACK_ADJECTIVE);
        let symbolism = bank.sample(SYMBOLISM, rng).unwrap_or(FALLBACK_SYMBOLISM);
        let title = render(
            TITLE.trim_end(),
            &[
                ("adjective", title_case(adjective).as_str()),
                ("creature", title_case(&creature).as_str()),
                ("symbolism", title_case(symbolism).as_str()),
            ],
        );

        let details: Vec<&str> = bank
            .category_names()
            .filter(|name| *name != ANIMALS)
            .filter_map(|name| bank.sample(name, rng))
            .collect();

        let style = bank
            .sample(GENERAL_STYLE, rng)
            .unwrap_or(FALLBACK_GENERAL_STYLE);
        let prompt = render(
            IMAGE_PROMPT.trim_end(),
            &[
                ("style", style),
                ("creature", creature.as_str()),
                ("details", details.join(", ").as_str()),
            ],
        );
        // No detail categories leaves a dangling separator.
        let prompt = prompt.trim_end().trim_end_matches(',').to_string();

        Some(GeneratedPrompt { title, prompt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;

    fn example_bank() -> WordBank {
        WordBank::from_categories([
            (ANIMALS, vec!["fox", "wolf"]),
            (ADJECTIVES, vec!["mysterious"]),
            (SYMBOLISM, vec!["wanders"]),
        ])
    }

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_multiple_vars() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "cats"), ("b", "dogs")]),
            "cats and dogs"
        );
    }

    #[test]
    fn test_templates_have_placeholders() {
        assert!(IMAGE_PROMPT.contains("{{style}}"));
        assert!(IMAGE_PROMPT.contains("{{creature}}"));
        assert!(IMAGE_PROMPT.contains("{{details}}"));
        assert!(TITLE.contains("{{adjective}}"));
        assert!(TITLE.contains("{{symbolism}}"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("snowy owl"), "Snowy Owl");
        assert_eq!(title_case("fox-wolf chimera"), "Fox-Wolf Chimera");
        assert_eq!(title_case("THE last HARVEST"), "The Last Harvest");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_example_title_without_chimera() {
        let synthesizer = PromptSynthesizer::new(Some(example_bank())).with_chimera_chance(0.0);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let generated = synthesizer.synthesize(&mut rng).unwrap();
            assert!(
                generated.title == "Mysterious Fox of Wanders"
                    || generated.title == "Mysterious Wolf of Wanders",
                "unexpected title: {}",
                generated.title
            );
        }
    }

    #[test]
    fn test_forced_chimera_joins_two_animals() {
        let synthesizer = PromptSynthesizer::new(Some(example_bank())).with_chimera_chance(1.0);
        let animals = ["fox", "wolf"];
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let generated = synthesizer.synthesize(&mut rng).unwrap();
            let creature = generated
                .prompt
                .split(" of a ")
                .nth(1)
                .and_then(|rest| rest.split(", with natural anatomy").next())
                .unwrap();
            let pair = creature.strip_suffix(" chimera").unwrap();
            let (first, second) = pair.split_once('-').unwrap();
            assert!(animals.contains(&first));
            assert!(animals.contains(&second));
            assert!(generated.title.contains("Chimera"));
        }
    }

    #[test]
    fn test_missing_bank_yields_none() {
        let synthesizer = PromptSynthesizer::new(None);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(synthesizer.synthesize(&mut rng).is_none());
        assert!(!synthesizer.has_words());
    }

    #[test]
    fn test_empty_bank_uses_fallbacks() {
        let synthesizer = PromptSynthesizer::new(Some(WordBank::default())).with_chimera_chance(0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let generated = synthesizer.synthesize(&mut rng).unwrap();
        assert_eq!(generated.title, "Mysterious Mystical Creature of Wanders");
        assert_eq!(
            generated.prompt,
            "Highly detailed illustration of a mystical creature, with natural anatomy"
        );
    }

    #[test]
    fn test_empty_bank_chimera_fallbacks() {
        let synthesizer = PromptSynthesizer::new(Some(WordBank::default())).with_chimera_chance(1.0);
        let mut rng = StdRng::seed_from_u64(3);
        let generated = synthesizer.synthesize(&mut rng).unwrap();
        assert!(generated
            .prompt
            .contains("mystical creature-legendary beast chimera"));
    }

    #[test]
    fn test_prompt_includes_every_detail_category() {
        let bank = WordBank::from_categories([
            (ANIMALS, vec!["otter"]),
            (ADJECTIVES, vec!["ancient"]),
            (SYMBOLISM, vec!["first frost"]),
            (GENERAL_STYLE, vec!["Oil painting"]),
            ("lighting", vec!["moonlit"]),
        ]);
        let synthesizer = PromptSynthesizer::new(Some(bank)).with_chimera_chance(0.0);
        let mut rng = StdRng::seed_from_u64(11);
        let generated = synthesizer.synthesize(&mut rng).unwrap();

        assert_eq!(
            generated.prompt,
            "Oil painting of a otter, with natural anatomy, ancient, Oil painting, moonlit, first frost"
        );
        assert_eq!(generated.title, "Ancient Otter of First Frost");
    }

    #[test]
    fn test_same_seed_same_output() {
        let synthesizer = PromptSynthesizer::new(Some(example_bank()));
        let a = synthesizer.synthesize(&mut StdRng::seed_from_u64(99));
        let b = synthesizer.synthesize(&mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_bundled_word_lists_cover_required_categories() {
        let bank = WordBank::from_dir(Path::new("data/words"))
            .unwrap()
            .expect("bundled word lists");
        let synthesizer = PromptSynthesizer::new(Some(bank.clone()));
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..25 {
            let generated = synthesizer.synthesize(&mut rng).unwrap();
            for category in bank.category_names() {
                assert!(
                    bank.phrases(category)
                        .iter()
                        .any(|phrase| generated.prompt.contains(phrase.as_str())),
                    "prompt '{}' has nothing from '{}'",
                    generated.prompt,
                    category
                );
            }
        }
    }
}
