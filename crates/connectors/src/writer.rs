//! SEO content generation on top of a chat model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConnectorError;
use crate::groq::{extract_json, ChatCompletion, ChatMessage, ChatRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Service,
    About,
    Product,
    Landing,
    Faq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Creative,
    Persuasive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

fn default_word_count() -> u32 {
    800
}

fn default_true() -> bool {
    true
}

/// What to write.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub topic: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default = "default_word_count")]
    pub word_count: u32,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_true")]
    pub include_outline: bool,
    #[serde(default = "default_true")]
    pub include_faq: bool,
    #[serde(default = "default_true")]
    pub include_meta_description: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub title: String,
    pub content: String,
    pub meta_title: String,
    pub meta_description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub faqs: Vec<Faq>,
    pub readability_score: f64,
    pub seo_score: u32,
}

/// Edits to apply to existing copy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvements {
    #[serde(default)]
    pub add_keywords: Vec<String>,
    pub change_tone: Option<String>,
    #[serde(default)]
    pub expand_length: bool,
    #[serde(default)]
    pub add_faq: bool,
    #[serde(default)]
    pub fix_grammar: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoTags {
    pub meta_title: String,
    pub meta_description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub open_graph: OpenGraph,
}

/// Writes marketing copy with a chat model.
///
/// Generation errors propagate. Outline, improve and SEO tags degrade to
/// a usable fallback instead.
#[derive(Clone)]
pub struct ContentWriter {
    chat: Arc<dyn ChatCompletion>,
    content_model: String,
    fast_model: String,
}

impl ContentWriter {
    pub fn new(
        chat: Arc<dyn ChatCompletion>,
        content_model: impl Into<String>,
        fast_model: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            content_model: content_model.into(),
            fast_model: fast_model.into(),
        }
    }

    pub async fn generate(&self, request: &ContentRequest) -> Result<GeneratedContent, ConnectorError> {
        if request.topic.trim().is_empty() {
            return Err(ConnectorError::Config("topic is required".to_string()));
        }
        let chat = ChatRequest {
            model: self.content_model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt(request.language)),
                ChatMessage::user(content_prompt(request)),
            ],
            temperature: if request.tone == Tone::Creative { 0.8 } else { 0.7 },
            max_tokens: 4000,
        };
        let text = self.chat.complete(&chat).await?;
        let mut generated = parse_generated(&text);
        generated.readability_score = readability_score(&generated.content);
        generated.seo_score = seo_score(&generated.content, &request.keywords);
        Ok(generated)
    }

    pub async fn outline(&self, topic: &str, content_type: &str) -> Vec<String> {
        let prompt = format!(
            "Create a detailed content outline for a {} about \"{}\".\n\
             Include 5-7 main sections with 2-3 subsections each.\n\
             Format as a simple list.",
            content_type, topic
        );
        let chat = ChatRequest {
            model: self.fast_model.clone(),
            messages: vec![
                ChatMessage::system("You are a content strategist."),
                ChatMessage::user(prompt),
            ],
            temperature: 0.6,
            max_tokens: 500,
        };
        match self.chat.complete(&chat).await {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                tracing::error!(error = %e, "outline generation failed");
                Vec::new()
            }
        }
    }

    /// Rewrite `content`; the original comes back unchanged on failure.
    pub async fn improve(&self, content: &str, improvements: &Improvements) -> String {
        let chat = ChatRequest {
            model: self.content_model.clone(),
            messages: vec![
                ChatMessage::system("You are a professional content editor."),
                ChatMessage::user(improve_prompt(content, improvements)),
            ],
            temperature: 0.6,
            max_tokens: 4000,
        };
        match self.chat.complete(&chat).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => content.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "content improvement failed");
                content.to_string()
            }
        }
    }

    pub async fn seo_tags(&self, content: &str, topic: &str) -> SeoTags {
        let prompt = format!(
            "Based on this content about \"{}\", generate SEO tags:\n\n\
             Content preview: {}...\n\n\
             Generate:\n\
             1. Meta title (50-60 characters)\n\
             2. Meta description (150-160 characters)\n\
             3. 5-8 relevant keywords\n\
             4. Open Graph title\n\
             5. Open Graph description\n\n\
             Format as JSON with keys metaTitle, metaDescription, keywords and openGraph {{title, description}}.",
            topic,
            truncate_chars(content, 500)
        );
        let chat = ChatRequest {
            model: self.fast_model.clone(),
            messages: vec![
                ChatMessage::system("You are an SEO expert. Generate optimized meta tags."),
                ChatMessage::user(prompt),
            ],
            temperature: 0.5,
            max_tokens: 500,
        };
        let parsed = match self.chat.complete(&chat).await {
            Ok(text) => serde_json::from_str::<SeoTags>(extract_json(&text)).map_err(ConnectorError::from),
            Err(e) => Err(e),
        };
        parsed.unwrap_or_else(|e| {
            tracing::error!(error = %e, "SEO tag generation failed, using fallback");
            fallback_seo_tags(content, topic)
        })
    }
}

fn system_prompt(language: Language) -> String {
    format!(
        "You are an expert content writer and SEO specialist. Create high-quality, \
         SEO-optimized content that ranks well in search engines and engages readers. {}",
        match language {
            Language::Ar => "Write in Arabic.",
            Language::En => "Write in English.",
        }
    )
}

pub(crate) fn content_prompt(request: &ContentRequest) -> String {
    let topic = &request.topic;
    let brief = match request.content_type {
        ContentType::Blog => format!(
            "Write an engaging blog post about \"{}\". Make it informative and valuable to readers.",
            topic
        ),
        ContentType::Service => format!(
            "Create a compelling service page for \"{}\". Focus on benefits, features, and why customers should choose this service.",
            topic
        ),
        ContentType::About => format!(
            "Write an engaging \"About Us\" section for a company specializing in \"{}\". Include mission, values, and unique selling points.",
            topic
        ),
        ContentType::Product => format!(
            "Create a detailed product description for \"{}\". Include features, benefits, specifications, and use cases.",
            topic
        ),
        ContentType::Landing => format!(
            "Create a high-converting landing page content for \"{}\". Include hero section, benefits, social proof, and call-to-action.",
            topic
        ),
        ContentType::Faq => format!(
            "Generate comprehensive FAQ content about \"{}\". Cover common questions and provide detailed answers.",
            topic
        ),
    };
    let tone = match request.tone {
        Tone::Professional => "Use a professional, authoritative tone suitable for business audiences.",
        Tone::Casual => "Use a friendly, conversational tone that connects with readers.",
        Tone::Creative => "Use creative language, metaphors, and engaging storytelling.",
        Tone::Persuasive => "Use persuasive language that motivates action and highlights benefits.",
    };
    let language = match request.language {
        Language::Ar => "Arabic",
        Language::En => "English",
    };

    let mut requirements = vec![
        format!("- Tone: {}", tone),
        format!("- Target word count: {} words", request.word_count),
        format!("- Language: {}", language),
    ];
    if !request.keywords.is_empty() {
        requirements.push(format!(
            "- Include these keywords naturally: {}",
            request.keywords.join(", ")
        ));
    }
    if request.include_outline {
        requirements.push("- Start with a content outline".to_string());
    }
    if request.include_meta_description {
        requirements.push("- Include a 155-character meta description".to_string());
    }
    if request.include_faq {
        requirements.push("- Add 5 relevant FAQs at the end, each as a 'Q:' line followed by an 'A:' line".to_string());
    }

    let mut structure = vec![
        "1. Compelling title (H1)",
        "2. Introduction that hooks the reader",
        "3. Well-structured body with subheadings (H2, H3)",
        "4. Clear paragraphs with transition sentences",
        "5. Strong conclusion with call-to-action",
    ];
    if request.include_faq {
        structure.push("6. FAQ section");
    }

    format!(
        "{}\n\nRequirements:\n{}\n\nStructure:\n{}\n\nSEO Guidelines:\n\
         - Use keywords naturally (2-3% density)\n\
         - Include semantic keywords\n\
         - Write scannable content with bullet points\n\
         - Use active voice\n\
         - Include internal linking opportunities\n\
         - Optimize for featured snippets\n\n\
         Please generate the content now.",
        brief,
        requirements.join("\n"),
        structure.join("\n")
    )
}

pub(crate) fn improve_prompt(content: &str, improvements: &Improvements) -> String {
    let mut instructions = Vec::new();
    if !improvements.add_keywords.is_empty() {
        instructions.push(format!(
            "Add these keywords naturally: {}",
            improvements.add_keywords.join(", ")
        ));
    }
    if let Some(tone) = improvements.change_tone.as_deref().filter(|t| !t.is_empty()) {
        instructions.push(format!("Change the tone to {}", tone));
    }
    if improvements.expand_length {
        instructions.push("Expand the content with more details and examples".to_string());
    }
    if improvements.add_faq {
        instructions.push("Add a FAQ section with 5 questions and answers".to_string());
    }
    if improvements.fix_grammar {
        instructions.push("Fix any grammar and spelling errors".to_string());
    }
    format!(
        "Improve the following content based on these instructions:\n{}\n\nOriginal content:\n{}\n\nPlease provide the improved version.",
        instructions.join("\n"),
        content
    )
}

fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let line = line.trim().trim_start_matches(['*', '#', '-', ' ']);
    let rest = line
        .strip_prefix(marker)
        .or_else(|| line.strip_prefix(&marker.to_ascii_lowercase()))?;
    if !rest.starts_with([':', '.', ')']) {
        return None;
    }
    Some(rest.trim_start_matches([':', '.', ')', '*', ' ']).trim())
}

/// Split a model reply into title, body, meta description and FAQs.
pub(crate) fn parse_generated(text: &str) -> GeneratedContent {
    let title = text
        .lines()
        .find_map(|l| l.trim().strip_prefix("# ").map(str::trim))
        .or_else(|| text.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(|t| t.trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let mut meta_description = None;
    let mut faqs = Vec::new();
    let mut pending_question: Option<String> = None;
    let mut body = Vec::new();
    let mut in_faq = false;

    for line in text.lines() {
        let lower = line.to_ascii_lowercase();
        if let Some(idx) = lower.find("meta description") {
            let value = line[idx + "meta description".len()..]
                .trim_start_matches([':', '*', ' '])
                .trim();
            if !value.is_empty() {
                meta_description = Some(value.to_string());
            }
            continue;
        }
        if lower.contains("meta title") || lower.trim_start_matches(['*', ' ']).starts_with("keywords") {
            continue;
        }
        if lower.contains("faq") || lower.contains("frequently asked questions") {
            in_faq = true;
        }
        if in_faq {
            if let Some(q) = strip_marker(line, "Q") {
                pending_question = Some(q.to_string());
            } else if let Some(a) = strip_marker(line, "A") {
                if let Some(question) = pending_question.take() {
                    faqs.push(Faq {
                        question,
                        answer: a.to_string(),
                    });
                }
            }
        }
        body.push(line);
    }

    let content = body.join("\n").trim().to_string();
    GeneratedContent {
        meta_title: truncate_chars(&title, 60),
        meta_description: meta_description.unwrap_or_else(|| truncate_chars(text.trim(), 155)),
        title,
        content,
        faqs,
        readability_score: 0.0,
        seo_score: 0,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Flesch reading ease, clamped to 0..=100. Syllables are approximated by
/// vowel count.
pub fn readability_score(text: &str) -> f64 {
    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let words: Vec<&str> = text.split_whitespace().collect();
    if sentences == 0 || words.is_empty() {
        return 0.0;
    }
    let syllables: usize = words
        .iter()
        .map(|w| w.chars().filter(|c| "aeiouAEIOU".contains(*c)).count().max(1))
        .sum();

    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;
    let score = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    score.clamp(0.0, 100.0)
}

/// Heuristic SEO score out of 100.
pub fn seo_score(content: &str, keywords: &[String]) -> u32 {
    let mut score = 50.0;

    let word_count = content.split_whitespace().count();
    if word_count >= 600 {
        score += 10.0;
    }
    if word_count >= 1000 {
        score += 10.0;
    }

    if !keywords.is_empty() {
        let lower = content.to_lowercase();
        let matched = keywords
            .iter()
            .filter(|k| lower.contains(&k.to_lowercase()))
            .count();
        score += matched as f64 / keywords.len() as f64 * 20.0;
    }

    if content.contains("##") {
        score += 10.0;
    }
    if content.contains("- ") || content.contains("* ") {
        score += 5.0;
    }
    if content.matches('?').count() > 2 {
        score += 5.0;
    }

    (score.round() as u32).min(100)
}

pub(crate) fn fallback_seo_tags(content: &str, topic: &str) -> SeoTags {
    SeoTags {
        meta_title: truncate_chars(topic, 60),
        meta_description: truncate_chars(content, 160),
        keywords: topic
            .split_whitespace()
            .filter(|w| w.chars().count() > 3)
            .map(str::to_string)
            .collect(),
        open_graph: OpenGraph {
            title: topic.to_string(),
            description: truncate_chars(content, 200),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<String, ConnectorError>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Scripted {
        fn new(reply: Result<String, ConnectorError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatCompletion for Scripted {
        async fn complete(&self, request: &ChatRequest) -> Result<String, ConnectorError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    fn writer(chat: Arc<Scripted>) -> ContentWriter {
        ContentWriter::new(chat, "big", "small")
    }

    fn request(tone: Tone) -> ContentRequest {
        serde_json::from_value(serde_json::json!({
            "topic": "Luxury villa interiors",
            "contentType": "service",
            "tone": tone,
            "keywords": ["villa", "marble"],
        }))
        .unwrap()
    }

    const REPLY: &str = "# Luxury Villa Interiors\n\n\
        Meta Description: Bespoke villa interiors crafted with marble and warm light.\n\n\
        ## Why us\n- Marble finishes\n\nWe design homes.\n\n\
        ## FAQ\nQ: How long does a villa take?\nA: Around four months.\n\
        Q: Do you source furniture?\nA: Yes, worldwide.\n";

    #[test]
    fn test_parse_generated() {
        let parsed = parse_generated(REPLY);
        assert_eq!(parsed.title, "Luxury Villa Interiors");
        assert_eq!(
            parsed.meta_description,
            "Bespoke villa interiors crafted with marble and warm light."
        );
        assert!(!parsed.content.contains("Meta Description"));
        assert_eq!(parsed.faqs.len(), 2);
        assert_eq!(parsed.faqs[1].answer, "Yes, worldwide.");
    }

    #[test]
    fn test_parse_generated_without_heading() {
        let parsed = parse_generated("\nPlain first line\nmore text");
        assert_eq!(parsed.title, "Plain first line");
        assert!(parsed.faqs.is_empty());
        assert_eq!(parsed.meta_description, "Plain first line\nmore text");
    }

    #[test]
    fn test_readability_bounds() {
        assert_eq!(readability_score(""), 0.0);
        let easy = readability_score("The cat sat. The dog ran. We are home.");
        assert!(easy > 80.0 && easy <= 100.0);
    }

    #[test]
    fn test_seo_score() {
        let keywords = vec!["villa".to_string(), "pool".to_string()];
        // base 50 + half the keywords (10) + heading (10) + list (5)
        assert_eq!(seo_score("## Villa\n- item", &keywords), 75);
        assert_eq!(seo_score("", &[]), 50);
    }

    #[tokio::test]
    async fn test_generate_uses_creative_temperature() {
        let chat = Scripted::new(Ok(REPLY.to_string()));
        let generated = writer(Arc::clone(&chat)).generate(&request(Tone::Creative)).await.unwrap();
        assert_eq!(generated.title, "Luxury Villa Interiors");
        assert!(generated.seo_score > 50);

        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen[0].model, "big");
        assert_eq!(seen[0].temperature, 0.8);
        assert_eq!(seen[0].max_tokens, 4000);
        assert!(seen[0].messages[1].content.contains("villa, marble"));
    }

    #[tokio::test]
    async fn test_generate_propagates_errors() {
        let chat = Scripted::new(Err(ConnectorError::RateLimited));
        let result = writer(chat).generate(&request(Tone::Professional)).await;
        assert!(matches!(result, Err(ConnectorError::RateLimited)));
    }

    #[tokio::test]
    async fn test_improve_falls_back_to_original() {
        let chat = Scripted::new(Err(ConnectorError::Timeout));
        let text = writer(chat).improve("original copy", &Improvements::default()).await;
        assert_eq!(text, "original copy");
    }

    #[tokio::test]
    async fn test_outline_lines() {
        let chat = Scripted::new(Ok("1. Intro\n\n2. Materials\n".to_string()));
        let outline = writer(chat).outline("villas", "blog").await;
        assert_eq!(outline, vec!["1. Intro", "2. Materials"]);
    }

    #[tokio::test]
    async fn test_seo_tags_parse_and_fallback() {
        let chat = Scripted::new(Ok(
            "```json\n{\"metaTitle\":\"T\",\"metaDescription\":\"D\",\"keywords\":[\"k\"],\"openGraph\":{\"title\":\"OT\",\"description\":\"OD\"}}\n```"
                .to_string(),
        ));
        let tags = writer(chat).seo_tags("body", "topic").await;
        assert_eq!(tags.meta_title, "T");
        assert_eq!(tags.open_graph.description, "OD");

        let chat = Scripted::new(Ok("not json".to_string()));
        let tags = writer(chat).seo_tags("Body text", "Modern kitchen design").await;
        assert_eq!(tags.meta_title, "Modern kitchen design");
        assert_eq!(tags.keywords, vec!["Modern", "kitchen", "design"]);
        assert_eq!(tags.meta_description, "Body text");
    }
}
