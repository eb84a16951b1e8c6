/*!
 * Prompt templates for document translation.
 *
 * Every prompt is a system/user pair. User prompts carry their payload in
 * the last `---` fenced section; absent context is rendered as "None".
 */

use crate::translation::context::{AuthorProfile, Glossary, NO_CONTEXT};

/// System prompt template with `{placeholder}` variables.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// System prompt for translating a single block.
    pub const BLOCK_TRANSLATOR: &'static str = r#"You are a professional literary translator working from {source_language} into {target_language}.

## Your Role
- Preserve the author's tone, humor and narrative rhythm
- Use glossary terms exactly as defined
- Make the transition from the previous translated segment fluid
- Avoid literal translation when a natural {target_language} expression exists

## Output Requirements
- Output ONLY the translated {target_language} text
- Keep the paragraph breaks of the source text
- Never translate the context sections, only the text to translate"#;

    /// System prompt for reviewing and merging a batch of translated blocks.
    pub const BATCH_REVIEWER: &'static str = r#"You are a bilingual literary editor reviewing a {source_language} to {target_language} translation.

## Your Job
1. Verify the stylistic and tonal continuity across the translated segments
2. Smooth transitions between paragraphs and keep vocabulary consistent
3. Correct minor inconsistencies of tense, register and rhythm
4. Preserve the author's tone as described in the profile

## Output Requirements
- Output the merged and refined {target_language} text of all segments, in order
- No commentary, no explanations, no segment labels"#;

    /// System prompt for selecting and translating glossary terms.
    pub const TERMINOLOGIST: &'static str = r#"You are a terminology expert building a {source_language} to {target_language} translation glossary for a book.

## Output Requirements
- Return ONLY a JSON object whose keys are source terms and whose values are their {target_language} translations
- No introductory text, no explanations, no code block markers"#;

    /// System prompt for analysing the author's style.
    pub const LITERARY_ANALYST: &'static str = r#"You are a literary analyst describing the writing style of an author from a text sample.

## Output Requirements
- Return ONLY a JSON object
- No introductory text, no explanations, no code block markers"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Render the template with the given language names.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

/// Builder for the prompt translating one block with its neighbours.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder<'a> {
    source_language: &'a str,
    target_language: &'a str,
    glossary: Option<&'a Glossary>,
    profile: Option<&'a AuthorProfile>,
    previous_translation: Option<&'a str>,
    next_source: Option<&'a str>,
}

impl<'a> TranslationPromptBuilder<'a> {
    /// Create a new prompt builder from language display names.
    pub fn new(source_language: &'a str, target_language: &'a str) -> Self {
        Self {
            source_language,
            target_language,
            glossary: None,
            profile: None,
            previous_translation: None,
            next_source: None,
        }
    }

    /// Set the glossary for terminology consistency.
    pub fn with_glossary(mut self, glossary: &'a Glossary) -> Self {
        self.glossary = Some(glossary);
        self
    }

    /// Set the author profile.
    pub fn with_profile(mut self, profile: &'a AuthorProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Set the translated unit preceding the block.
    pub fn with_previous_translation(mut self, previous: Option<&'a str>) -> Self {
        self.previous_translation = previous;
        self
    }

    /// Set the source block following the block.
    pub fn with_next_source(mut self, next: Option<&'a str>) -> Self {
        self.next_source = next;
        self
    }

    /// Build the system and user prompts for `block`.
    pub fn build(&self, block: &str) -> (String, String) {
        let system = PromptTemplate::new(PromptTemplate::BLOCK_TRANSLATOR)
            .render(self.source_language, self.target_language);

        let user = format!(
            "Author profile:\n{}\n\n\
             Glossary:\n{}\n\n\
             Previous translated segment (for continuity):\n---\n{}\n---\n\n\
             Next segment (for context):\n---\n{}\n---\n\n\
             Text to translate:\n---\n{}\n---",
            self.profile.map(|p| p.to_prompt_text()).unwrap_or_else(|| NO_CONTEXT.to_string()),
            self.glossary.map(|g| g.to_prompt_text()).unwrap_or_else(|| NO_CONTEXT.to_string()),
            self.previous_translation.unwrap_or(NO_CONTEXT),
            self.next_source.unwrap_or(NO_CONTEXT),
            block,
        );

        (system, user)
    }
}

/// Build the system and user prompts reviewing `units` against `source_window`.
pub fn review_prompt(
    source_language: &str,
    target_language: &str,
    units: &[&str],
    source_window: &[&str],
    glossary: &Glossary,
    profile: &AuthorProfile,
) -> (String, String) {
    let system = PromptTemplate::new(PromptTemplate::BATCH_REVIEWER)
        .render(source_language, target_language);

    let user = format!(
        "Author profile:\n{}\n\n\
         Glossary (use consistently):\n{}\n\n\
         Source excerpts ({} blocks, context only):\n---\n{}\n---\n\n\
         Translated segments to review ({}):\n---\n{}\n---",
        profile.to_prompt_text(),
        glossary.to_prompt_text(),
        source_window.len(),
        labelled(source_window),
        units.len(),
        labelled(units),
    );

    (system, user)
}

/// Build the prompts asking the model to pick and translate glossary terms.
pub fn glossary_prompt(
    source_language: &str,
    target_language: &str,
    candidates: &[String],
    profile: &AuthorProfile,
) -> (String, String) {
    let system = PromptTemplate::new(PromptTemplate::TERMINOLOGIST)
        .render(source_language, target_language);

    let candidate_list = serde_json::to_string_pretty(candidates).unwrap_or_else(|_| "[]".to_string());

    let user = format!(
        "Author context:\n{}\n\n\
         Instructions:\n\
         1. From the candidate terms, select only terms that are ambiguous, metaphorical, \
         culturally specific or essential to the story's meaning.\n\
         2. Exclude common nouns and generic words that need no specific translation.\n\
         3. Give each selected term its {} translation.\n\n\
         Example output:\n{{\"example term\": \"translation\"}}\n\n\
         Candidate terms:\n---\n{}\n---",
        profile.to_prompt_text(),
        target_language,
        candidate_list,
    );

    (system, user)
}

/// Build the prompts asking the model to analyse the author's style.
pub fn profile_prompt(author: Option<&str>, sample: &str) -> (String, String) {
    let system = PromptTemplate::LITERARY_ANALYST.to_string();
    let author = author.unwrap_or("Unknown");

    let user = format!(
        "Analyse the style of the text sample and return a JSON object with this structure:\n\
         {{\n  \"author\": \"{}\",\n  \"style_analysis\": {{\n    \
         \"tone\": \"...\",\n    \"sentence_structure\": \"...\",\n    \"vocabulary\": \"...\",\n    \
         \"emotional_register\": \"...\",\n    \"cultural_context\": \"...\",\n    \
         \"comparison_to_other_authors\": \"...\"\n  }}\n}}\n\n\
         Text sample:\n---\n{}\n---",
        author,
        sample,
    );

    (system, user)
}

/// Number each piece so the model can tell consecutive blocks apart
fn labelled(pieces: &[&str]) -> String {
    pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| format!("[Segment {}]\n{}", i + 1, piece))
        .collect::<Vec<_>>()
        .join("\n\n")
}
