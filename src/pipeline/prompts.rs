/*!
 * Instruction templates for the generation stages.
 *
 * Each template pairs a role preamble (sent as the system message) with a
 * task body containing `{slot}` placeholders. Slots are filled in a single
 * pass, so text bound into one slot is never scanned for further
 * placeholders.
 */

/// The fixed instruction templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Outline,
    Script,
    Metadata,
    ScriptTranslation,
    MetadataTranslation,
}

const OUTLINE_SYSTEM: &str = "You are a knowledge architect for popular-science videos. \
You turn scattered material into a rigorously structured outline: clear hierarchy, accurate facts, \
and a logical path that leads the viewer step by step from fundamentals to depth. \
You value precision and structure over narrative flourish.";

const OUTLINE_BODY: &str = r#"Analyze the topic below and design a video content outline in {source_language}.

**Topic:**
{topic}
{context_section}
**Requirements:**
- Build a clear knowledge structure with sections and sub-points that deepen progressively.
- Every point must be factually accurate; do not invent data or sources.
- Make the relationships between points explicit so viewers form a systematic understanding.
- Return the outline as Markdown only, without commentary."#;

const SCRIPT_SYSTEM: &str = "You are a narration writer for long-form YouTube videos. \
You write spoken-word scripts that are vivid, accurate and easy to follow when heard aloud.";

const SCRIPT_BODY: &str = r#"Write a complete narration script in {source_language} based on the confirmed outline below.

**Outline:**
{outline}
{style_section}
**Requirements:**
- Cover every section of the outline in order.
- Write for the ear: short sentences, natural transitions, no stage directions.
- Put each paragraph on its own line so the script can be aligned line by line later.
- If a style guide is provided, follow its tone, structure and phrasing habits.
- Return plain text only."#;

const METADATA_SYSTEM: &str = "You are a YouTube SEO specialist with a deep understanding of the \
platform's recommendation system. You write titles, descriptions and tags that maximize organic reach.";

const METADATA_BODY: &str = r#"Based on the video outline and narration script below, produce optimized YouTube metadata in {source_language}.

**Outline:**
{outline}

**Script:**
{script}

**Requirements:**
- **Title:** compelling, contains the core keyword, 50-70 characters.
- **Description:** a detailed summary that weaves in keywords naturally; timestamps or links may be included.
- **Tags:** a set of relevant keyword tags separated by commas.
- Organize the three items into a single, clearly structured Markdown block."#;

const TRANSLATION_SYSTEM: &str = "You are a professional multilingual translator. \
Your translations are accurate, natural and fluent, and you always keep the paragraph \
structure of the source so translations can be proofread side by side.";

const SCRIPT_TRANSLATION_BODY: &str = r#"Translate the following {source_language} script into {target_language}.

**Requirements:**
- The translation must be accurate, natural and fluent.
- Return the translated script as plain text.
- Keep the same number of paragraphs and lines as the source so a comparison table can be built.
- Produce the translation directly; do not ask any questions.

**Source script:**
{script}"#;

const METADATA_TRANSLATION_BODY: &str = r#"Translate the following {source_language} video metadata (title, description and tags) into these {language_count} languages: {target_languages}.

**Requirements:**
- For each language, provide a translated title, description and tags.
- Organize all translations into one clearly structured Markdown block, one section per language,
  each introduced by a level-three heading such as '### French (fr)'.

**Source metadata:**
{metadata}"#;

impl TemplateKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Script => "script",
            Self::Metadata => "metadata",
            Self::ScriptTranslation => "script-translation",
            Self::MetadataTranslation => "metadata-translation",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Outline => OUTLINE_SYSTEM,
            Self::Script => SCRIPT_SYSTEM,
            Self::Metadata => METADATA_SYSTEM,
            Self::ScriptTranslation | Self::MetadataTranslation => TRANSLATION_SYSTEM,
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            Self::Outline => OUTLINE_BODY,
            Self::Script => SCRIPT_BODY,
            Self::Metadata => METADATA_BODY,
            Self::ScriptTranslation => SCRIPT_TRANSLATION_BODY,
            Self::MetadataTranslation => METADATA_TRANSLATION_BODY,
        }
    }

    /// Fill the body's placeholders. Unknown placeholders are left as written.
    pub fn render(self, slots: &[(&str, &str)]) -> String {
        render_template(self.body(), slots)
    }
}

/// Single-pass `{name}` substitution
pub fn render_template(template: &str, slots: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len() + slots.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .map(|close| (&after[..close], close))
            .and_then(|(name, close)| {
                slots
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value, close))
            });

        match value {
            Some((value, close)) => {
                output.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                output.push('{');
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}

/// A titled block for optional inputs; empty when the input is absent or blank
pub fn optional_section(title: &str, text: Option<&str>) -> String {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => format!("\n**{}:**\n{}\n", title, text),
        None => String::new(),
    }
}
