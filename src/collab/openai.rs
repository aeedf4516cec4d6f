//! OpenAI-backed collaborators (Chat Completions API).
//!
//! - [`OpenAiTextAnalyzer`]: orientation / floor / view extraction from the
//!   listing text, answered as a small JSON object.
//! - [`OpenAiVisionAnalyzer`]: per-photo natural light estimate; the listing
//!   brightness is the mean over the photos that could be analyzed.
//!
//! Both require an API key (see [`AiConfig::resolve_api_key`]). Every
//! request carries the configured timeout; a timeout is reported as
//! [`CollaboratorError::Timeout`] and the cascade treats it as absent evidence.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::{
    AnswerCache, CollaboratorError, FloorAnalysis, LightImpact, LuminosityLevel, PhotoBrightnessAnalyzer,
    PhotoBrightnessReport, TextOrientationAnalyzer, TextOrientationReport, ValidationStatus,
    ViewAnalysis, ViewKind,
};
use crate::config::AiConfig;
use crate::extract::floor::parse_floor;
use crate::normalize;
use crate::signal::{Orientation, SignalClass};

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const USER_AGENT: &str = concat!("exposition-scout/", env!("CARGO_PKG_VERSION"));
const PHOTO_KIND: &str = "photo";

const TEXT_PROMPT: &str = "Tu analyses des annonces immobilières parisiennes. \
À partir de la description, des caractéristiques et de l'étage, indique l'exposition \
EXPLICITEMENT mentionnée (orientation des fenêtres). Une mention géographique \
(\"sud parisien\", \"nord de Paris\") n'est PAS une exposition: signale-la comme faux positif. \
Analyse aussi l'étage, la vue et la luminosité annoncée. Réponds uniquement avec un objet JSON: \
{\"exposition\": \"sud|sud_ouest|sud_est|est|ouest|nord|nord_ouest|nord_est|null\", \
\"confiance_globale\": 0.0-1.0, \"est_faux_positif\": bool, \
\"etage_analyse\": {\"etage_trouve\": \"4ème|RDC|null\", \"impact_luminosite\": \"positif|neutre|negatif\", \"confiance_etage\": 0.0-1.0}, \
\"vue_mentionnee\": {\"vue_trouvee\": bool, \"type_vue\": \"degagee|panoramique|correcte|vis_a_vis|obstruee|null\", \"impact_luminosite\": \"positif|neutre|negatif\", \"confiance_vue\": 0.0-1.0}, \
\"luminosite\": \"excellent|bon|moyen|faible|null\", \"justification\": \"une phrase\"}";

const VISION_PROMPT: &str = "Photo d'un appartement. Estime la luminosité naturelle de la pièce \
(lumière du jour, taille des fenêtres, ombres, lumière directe), pas l'éclairage artificiel. \
Réponds uniquement avec un objet JSON: \
{\"luminosite\": 0.0-1.0, \"confiance\": 0.0-1.0, \"details\": \"une phrase\"}";

fn http_client(cfg: &AiConfig) -> Result<reqwest::Client, CollaboratorError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()?)
}

fn require_key(cfg: &AiConfig) -> Result<String, CollaboratorError> {
    if cfg.has_key() {
        Ok(cfg.api_key.clone())
    } else {
        Err(CollaboratorError::Unavailable("missing OpenAI API key".into()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// POST one chat request and return the first choice's content.
async fn complete(
    http: &reqwest::Client,
    api_key: &str,
    timeout: Duration,
    req: &ChatRequest<'_>,
) -> Result<String, CollaboratorError> {
    let resp = http
        .post(CHAT_URL)
        .bearer_auth(api_key)
        .json(req)
        .send()
        .await
        .map_err(|e| map_http(e, timeout))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(CollaboratorError::Unavailable(format!("openai returned {status}")));
    }
    let body: ChatResponse = resp.json().await.map_err(|e| map_http(e, timeout))?;
    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| CollaboratorError::MalformedResponse("empty completion".into()))
}

fn map_http(e: reqwest::Error, timeout: Duration) -> CollaboratorError {
    if e.is_timeout() {
        CollaboratorError::Timeout(timeout)
    } else {
        CollaboratorError::Http(e)
    }
}

/// Models sometimes wrap their JSON in a ```json fence.
pub fn strip_fences(content: &str) -> &str {
    let t = content.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}

// ------------------------------------------------------------
// Text analyzer
// ------------------------------------------------------------

pub struct OpenAiTextAnalyzer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiTextAnalyzer {
    pub fn new(cfg: &AiConfig) -> Result<Self, CollaboratorError> {
        Ok(Self {
            api_key: require_key(cfg)?,
            http: http_client(cfg)?,
            model: cfg.text_model.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }
}

#[async_trait]
impl TextOrientationAnalyzer for OpenAiTextAnalyzer {
    async fn analyze(
        &self,
        description: &str,
        characteristics: &str,
        floor_text: &str,
    ) -> Result<TextOrientationReport, CollaboratorError> {
        let user = format!(
            "Description: {description}\nCaractéristiques: {characteristics}\nÉtage: {floor_text}"
        );
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: MessageContent::Text(TEXT_PROMPT) },
                ChatMessage { role: "user", content: MessageContent::Text(&user) },
            ],
            temperature: 0.1,
            max_tokens: 500,
        };
        let content = complete(&self.http, &self.api_key, self.timeout, &req).await?;
        parse_text_answer(&content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Debug, Default, Deserialize)]
struct TextAnswer {
    #[serde(default)]
    exposition: Option<String>,
    #[serde(default)]
    confiance_globale: f32,
    #[serde(default)]
    est_faux_positif: bool,
    #[serde(default)]
    etage_analyse: Option<FloorAnswer>,
    #[serde(default)]
    vue_mentionnee: Option<ViewAnswer>,
    #[serde(default)]
    luminosite: Option<String>,
    #[serde(default)]
    justification: String,
}

#[derive(Debug, Default, Deserialize)]
struct FloorAnswer {
    #[serde(default)]
    etage_trouve: Option<String>,
    #[serde(default)]
    impact_luminosite: Option<String>,
    #[serde(default)]
    confiance_etage: f32,
}

#[derive(Debug, Default, Deserialize)]
struct ViewAnswer {
    #[serde(default)]
    vue_trouvee: bool,
    #[serde(default)]
    type_vue: Option<String>,
    #[serde(default)]
    impact_luminosite: Option<String>,
    #[serde(default)]
    confiance_vue: f32,
}

/// Turn the model's JSON answer into a report.
pub fn parse_text_answer(content: &str) -> Result<TextOrientationReport, CollaboratorError> {
    let answer: TextAnswer = serde_json::from_str(strip_fences(content))
        .map_err(|e| CollaboratorError::MalformedResponse(e.to_string()))?;

    let floor = answer.etage_analyse.unwrap_or_default();
    let floor_found = floor.etage_trouve.filter(|s| !is_null_word(s));
    let level = floor_found
        .as_deref()
        .and_then(|s| parse_floor(&format!("{s} étage")))
        .map(|m| m.level);

    let view = answer.vue_mentionnee.unwrap_or_default();
    let kind = view.type_vue.as_deref().and_then(parse_view_kind);

    Ok(TextOrientationReport {
        available: true,
        orientation: answer
            .exposition
            .as_deref()
            .filter(|s| !is_null_word(s))
            .and_then(Orientation::parse),
        is_false_positive: answer.est_faux_positif,
        global_confidence: unit(answer.confiance_globale),
        floor_analysis: FloorAnalysis {
            floor_found,
            level,
            impact: floor.impact_luminosite.as_deref().and_then(parse_impact),
            confidence: unit(floor.confiance_etage),
        },
        view_analysis: ViewAnalysis {
            view_found: view.vue_trouvee,
            kind,
            impact: view
                .impact_luminosite
                .as_deref()
                .and_then(parse_impact)
                .or_else(|| kind.map(ViewKind::impact)),
            confidence: unit(view.confiance_vue),
        },
        luminosity: answer.luminosite.as_deref().and_then(LuminosityLevel::parse),
        justification: answer.justification,
    })
}

fn unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn is_null_word(s: &str) -> bool {
    matches!(normalize::fold(s).as_str(), "" | "null" | "none" | "aucune" | "aucun" | "n a")
}

fn parse_impact(s: &str) -> Option<LightImpact> {
    match normalize::fold(s).as_str() {
        "positif" | "positive" => Some(LightImpact::Positive),
        "neutre" | "neutral" => Some(LightImpact::Neutral),
        "negatif" | "negative" => Some(LightImpact::Negative),
        _ => None,
    }
}

fn parse_view_kind(s: &str) -> Option<ViewKind> {
    let f = normalize::fold(s);
    if f.contains("panoram") || f.contains("imprenable") {
        Some(ViewKind::Panoramique)
    } else if f.contains("pas de vis") || f.contains("degag") {
        Some(ViewKind::Degagee)
    } else if f.contains("vis") {
        Some(ViewKind::VisAVis)
    } else if f.contains("obstru") || f.contains("limit") {
        Some(ViewKind::Obstruee)
    } else if f.contains("correct") || f.contains("cour") {
        Some(ViewKind::Correcte)
    } else {
        None
    }
}

// ------------------------------------------------------------
// Vision analyzer
// ------------------------------------------------------------

pub struct OpenAiVisionAnalyzer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
    cache: Option<AnswerCache>,
}

impl OpenAiVisionAnalyzer {
    pub fn new(cfg: &AiConfig, cache: Option<AnswerCache>) -> Result<Self, CollaboratorError> {
        Ok(Self {
            api_key: require_key(cfg)?,
            http: http_client(cfg)?,
            model: cfg.vision_model.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
            cache,
        })
    }

    async fn photo_brightness(&self, photo: &str) -> Result<f32, CollaboratorError> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get::<f32>(PHOTO_KIND, photo)) {
            return Ok(hit);
        }

        let url = image_url(photo).await?;
        let req = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: VISION_PROMPT },
                    ContentPart::ImageUrl { image_url: ImageUrl { url } },
                ]),
            }],
            temperature: 0.1,
            max_tokens: 300,
        };
        let content = complete(&self.http, &self.api_key, self.timeout, &req).await?;
        let value = parse_vision_answer(&content)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(PHOTO_KIND, photo, &value) {
                tracing::warn!(target: "exposition", error = %e, "photo cache write failed");
            }
        }
        Ok(value)
    }
}

#[async_trait]
impl PhotoBrightnessAnalyzer for OpenAiVisionAnalyzer {
    async fn analyze(
        &self,
        photos: &[String],
        max: usize,
        text_hint: Option<SignalClass>,
    ) -> Result<PhotoBrightnessReport, CollaboratorError> {
        let mut values = Vec::new();
        for photo in photos.iter().take(max) {
            match self.photo_brightness(photo).await {
                Ok(v) => values.push(v),
                Err(e) => {
                    tracing::debug!(target: "exposition", error = %e, "photo skipped");
                }
            }
        }

        if values.is_empty() {
            return Ok(PhotoBrightnessReport {
                photos_analyzed: 0,
                brightness_value: None,
                validation_status: ValidationStatus::PhotoOnly,
            });
        }
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        Ok(PhotoBrightnessReport {
            photos_analyzed: values.len(),
            brightness_value: Some(mean),
            validation_status: ValidationStatus::assess(text_hint, mean),
        })
    }

    fn name(&self) -> &'static str {
        "openai-vision"
    }
}

/// Remote photos are passed by URL; local files are inlined as a data URL.
async fn image_url(photo: &str) -> Result<String, CollaboratorError> {
    if photo.starts_with("http://") || photo.starts_with("https://") || photo.starts_with("data:") {
        return Ok(photo.to_string());
    }
    let bytes = tokio::fs::read(photo).await?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{encoded}", mime_for(Path::new(photo))))
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Deserialize)]
struct VisionAnswer {
    luminosite: serde_json::Value,
}

/// Brightness in `[0, 1]`. Accepts a number (0–1, or 0–10 scores) or one of
/// the labels "excellent" / "bon" / "moyen" / "faible".
/// `[0, 1]` as is; a whole number in `2..=10` is read as a 0-10 score.
/// Fractional values above 1 are ambiguous and rejected.
fn scale_score(v: f64) -> Option<f32> {
    if (0.0..=1.0).contains(&v) {
        Some(v as f32)
    } else if v.fract() == 0.0 && (2.0..=10.0).contains(&v) {
        Some((v / 10.0) as f32)
    } else {
        None
    }
}

pub fn parse_vision_answer(content: &str) -> Result<f32, CollaboratorError> {
    let answer: VisionAnswer = serde_json::from_str(strip_fences(content))
        .map_err(|e| CollaboratorError::MalformedResponse(e.to_string()))?;

    let value = match &answer.luminosite {
        serde_json::Value::Number(n) => n.as_f64().and_then(scale_score),
        serde_json::Value::String(s) => match normalize::fold(s).as_str() {
            "excellent" | "excellente" | "tres lumineux" => Some(0.9),
            "bon" | "bonne" | "lumineux" => Some(0.75),
            "moyen" | "moyenne" => Some(0.5),
            "faible" | "sombre" => Some(0.2),
            _ => None,
        },
        _ => None,
    };

    match value {
        Some(v) if (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err(CollaboratorError::MalformedResponse(format!(
            "unusable luminosite {}",
            answer.luminosite
        ))),
    }
}
