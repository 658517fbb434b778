use crate::config::AppConfig;
use crate::llm::{OpenAiClient, TextGenerator, VisionAnalyzer};
use crate::session::SessionContext;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Held for a whole request, external calls included, so one action
    /// runs at a time.
    pub session: Arc<Mutex<SessionContext>>,
    pub vision: Arc<dyn VisionAnalyzer>,
    pub chat: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        if config.llm.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set; photo analysis and chat will fail");
        }

        let client = Arc::new(OpenAiClient::new(config.llm.clone()));
        let session = SessionContext::new(config.default_settings);

        Ok(Self::from_parts(
            config,
            session,
            client.clone() as Arc<dyn VisionAnalyzer>,
            client as Arc<dyn TextGenerator>,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        session: SessionContext,
        vision: Arc<dyn VisionAnalyzer>,
        chat: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config,
            session: Arc::new(Mutex::new(session)),
            vision,
            chat,
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake() -> Self {
        use crate::llm::fakes::{ScriptedChat, ScriptedVision};

        Self::fake_with(
            Arc::new(ScriptedVision::replying(
                "CARBS: 45g\nPROTEIN: 12g\nFAT: 8g\nCONFIDENCE: High\nFOODS: [rice, beans]\nNOTES: none",
            )),
            Arc::new(ScriptedChat::replying(&["This is ", "educational."])),
        )
    }

    pub fn fake_with(vision: Arc<dyn VisionAnalyzer>, chat: Arc<dyn TextGenerator>) -> Self {
        let config = Arc::new(AppConfig {
            llm: crate::config::LlmConfig::default(),
            default_settings: crate::settings::Settings::default(),
            max_upload_bytes: 1024 * 1024,
        });
        Self::from_parts(config, SessionContext::default(), vision, chat)
    }
}
