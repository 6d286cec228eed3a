//! Message handler: keyword chain, worksheet logging, knowledge base, completion fallback.
//!
//! The router knows nothing about Telegram. It takes the sender and the text and
//! returns the replies to send, in order, plus an optional notice for the admin.

use std::sync::Arc;

use crate::chatlog::ChatLog;
use crate::classify::{classify_persona, classify_tag, invite_hook, GroupLinks, Persona};
use crate::config;
use crate::error::AppResult;
use crate::history::{ChatHistory, ChatMessage};
use crate::intent::{detect_intent, Intent};
use crate::llm::{ChatCompleter, OpenAiClient};
use crate::publish::{parse_publish_form, USAGE};
use crate::qa::{KnowledgeBase, UnmatchedLog};
use crate::sheets::{
    self, timestamp_now, InteractionRow, ReportRow, ResourceRow, SheetStore, Worksheet, REPORT_PENDING,
};
use crate::text::{normalize, NormalizedText};

pub const PUBLISH_GUIDE: &str = "📝 请按照格式发送资源内容：地区 + 类型 + 内容 + 联系方式";
pub const REPORT_ACK: &str = "📩 举报信息已记录，我们将尽快处理。";
pub const IDENTITY_REPLY: &str = "我是资源撮合客服助手，欢迎提问。";
pub const PUBLISH_ACK: &str = "✅ 资源已提交，管理员审核后将上线。";
pub const AI_ERROR_PREFIX: &str = "AI错误：";

/// Reply used when handling fails for any reason the user cannot fix.
pub const GENERIC_FAILURE: &str = "⚠️ 系统繁忙，请稍后再试。";

/// An inbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub user_id: u64,
    pub username: Option<String>,
    pub text: String,
}

impl Incoming {
    /// Username if the sender has one, numeric id otherwise.
    pub fn display_name(&self) -> String {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.user_id.to_string())
    }
}

/// What to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub intent: Intent,
    pub replies: Vec<String>,
    pub admin_notice: Option<String>,
}

impl Outcome {
    fn reply(intent: Intent, text: impl Into<String>) -> Self {
        Self {
            intent,
            replies: vec![text.into()],
            admin_notice: None,
        }
    }

    fn with_admin_notice(mut self, notice: String) -> Self {
        self.admin_notice = Some(notice);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSettings {
    /// Channel named in the resource-request reply
    pub channel: String,
    pub links: GroupLinks,
}

impl RouterSettings {
    pub fn from_config() -> Self {
        Self {
            channel: config::RESOURCE_CHANNEL.clone(),
            links: GroupLinks::from_config(),
        }
    }
}

pub struct MessageRouter {
    settings: RouterSettings,
    sheets: Arc<dyn SheetStore>,
    completer: Arc<dyn ChatCompleter>,
    knowledge: KnowledgeBase,
    unmatched: Option<UnmatchedLog>,
    history: ChatHistory,
    chat_log: Option<ChatLog>,
}

impl MessageRouter {
    /// Router with no knowledge base, no unmatched counter and no chat log.
    pub fn new(settings: RouterSettings, sheets: Arc<dyn SheetStore>, completer: Arc<dyn ChatCompleter>) -> Self {
        Self {
            settings,
            sheets,
            completer,
            knowledge: KnowledgeBase::default(),
            unmatched: None,
            history: ChatHistory::default(),
            chat_log: None,
        }
    }

    pub fn with_knowledge_base(mut self, knowledge: KnowledgeBase, unmatched: UnmatchedLog) -> Self {
        self.knowledge = knowledge;
        self.unmatched = Some(unmatched);
        self
    }

    pub fn with_chat_log(mut self, chat_log: ChatLog) -> Self {
        self.chat_log = Some(chat_log);
        self
    }

    pub fn with_history(mut self, history: ChatHistory) -> Self {
        self.history = history;
        self
    }

    /// Router wired from environment configuration.
    pub fn from_config() -> AppResult<Self> {
        let sheets = sheets::store_from_config()?;
        let completer: Arc<dyn ChatCompleter> = Arc::new(OpenAiClient::from_config()?);
        let knowledge = KnowledgeBase::load(config::QA_FILE.as_str())?;

        Ok(Self::new(RouterSettings::from_config(), sheets, completer)
            .with_knowledge_base(knowledge, UnmatchedLog::new(config::UNMATCHED_FILE.as_str()))
            .with_chat_log(ChatLog::new(config::LOG_DIR.as_str())))
    }

    /// Completion client shared with the HTTP endpoint.
    pub fn completer(&self) -> Arc<dyn ChatCompleter> {
        Arc::clone(&self.completer)
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub async fn handle(&self, incoming: &Incoming) -> AppResult<Outcome> {
        let text = normalize(&incoming.text);
        let username = incoming.display_name();

        match detect_intent(&text.clean) {
            Some(intent @ Intent::ResourceRequest) => {
                self.log_interaction(&username, &text.raw, intent).await;
                Ok(Outcome::reply(
                    intent,
                    format!("📦 请进入频道 {}，查看最新资源", self.settings.channel),
                ))
            }
            Some(intent @ Intent::PublishIntent) => {
                self.log_interaction(&username, &text.raw, intent).await;
                Ok(Outcome::reply(intent, PUBLISH_GUIDE))
            }
            Some(Intent::Report) => self.handle_report(&username, &text).await,
            Some(intent @ Intent::JoinGroup) => {
                Ok(Outcome::reply(intent, format!("🎯 主群地址：{}", self.settings.links.main)))
            }
            Some(intent @ Intent::Identity) => Ok(Outcome::reply(intent, IDENTITY_REPLY)),
            Some(Intent::PublishForm) => self.handle_publish_form(&username, &text).await,
            Some(Intent::KnowledgeBase | Intent::Fallback) | None => self.handle_unrouted(incoming, &text).await,
        }
    }

    /// Interaction rows are analytics; a failed append does not block the reply.
    async fn log_interaction(&self, username: &str, raw: &str, intent: Intent) {
        let row = InteractionRow {
            username: username.to_string(),
            text: raw.to_string(),
            intent,
            timestamp: timestamp_now(),
        };
        if let Err(e) = self.sheets.append_row(Worksheet::Interactions, row.into_cells()).await {
            log::warn!("Failed to append interaction row for {}: {}", username, e);
        }
    }

    async fn handle_report(&self, username: &str, text: &NormalizedText) -> AppResult<Outcome> {
        let tag = classify_tag(&text.raw);
        let row = ReportRow {
            username: username.to_string(),
            text: text.raw.clone(),
            tag,
            timestamp: timestamp_now(),
            status: REPORT_PENDING.to_string(),
        };
        self.sheets.append_row(Worksheet::Reports, row.into_cells()).await?;
        log::info!("Report recorded from {} (tag {})", username, tag);

        Ok(Outcome::reply(Intent::Report, REPORT_ACK)
            .with_admin_notice(format!("📩 新举报\n用户：{}\n标签：{}\n内容：{}", username, tag, text.raw)))
    }

    async fn handle_publish_form(&self, username: &str, text: &NormalizedText) -> AppResult<Outcome> {
        let submission = match parse_publish_form(&text.raw) {
            Ok(submission) => submission,
            Err(e) => {
                log::info!("Rejected publish form from {}: {}", username, e);
                return Ok(Outcome::reply(Intent::PublishForm, USAGE));
            }
        };

        let tag = submission.tag();
        let notice = format!(
            "🆕 新资源待审核\n用户：{}\n地区：{}\n类型：{}\n内容：{}\n联系方式：{}\n标签：{}",
            username, submission.region, submission.resource_type, submission.content, submission.contact, tag
        );
        let row = ResourceRow {
            submission,
            tag,
            timestamp: timestamp_now(),
        };
        self.sheets.append_row(Worksheet::Resources, row.into_cells()).await?;
        log::info!("Resource submission recorded from {} (tag {})", username, tag);

        Ok(Outcome::reply(Intent::PublishForm, PUBLISH_ACK).with_admin_notice(notice))
    }

    async fn handle_unrouted(&self, incoming: &Incoming, text: &NormalizedText) -> AppResult<Outcome> {
        let picked = self
            .knowledge
            .lookup(&text.raw)
            .and_then(|entry| entry.pick_reply(&mut rand::thread_rng()))
            .filter(|reply| !reply.trim().is_empty());
        if let Some(reply) = picked {
            return Ok(Outcome::reply(Intent::KnowledgeBase, reply));
        }

        if let Some(unmatched) = &self.unmatched {
            if let Err(e) = unmatched.record(&text.raw).await {
                log::warn!("Failed to record unmatched text in {}: {}", unmatched.path().display(), e);
            }
        }

        Ok(self.complete_with_history(incoming.user_id, &text.raw).await)
    }

    /// One fallback turn. The user's history lock is held for the whole turn.
    async fn complete_with_history(&self, user_id: u64, raw: &str) -> Outcome {
        let reply = {
            let mut conversation = self.history.lock(user_id).await;
            conversation.push(ChatMessage::user(raw));

            let reply = match self.completer.complete(&conversation.messages()).await {
                Ok(reply) => reply,
                Err(e) => {
                    log::warn!("Completion failed for user {}: {}", user_id, e);
                    format!("{}{}", AI_ERROR_PREFIX, e)
                }
            };
            conversation.push(ChatMessage::assistant(reply.clone()));
            reply
        };

        let persona = classify_persona(raw);
        if let Some(chat_log) = &self.chat_log {
            if let Err(e) = chat_log.record(user_id, raw, &reply, persona).await {
                log::warn!("Failed to write chat log in {}: {}", chat_log.dir().display(), e);
            }
        }

        let mut replies = vec![reply];
        if persona != Persona::Ordinary {
            replies.push(invite_hook(persona, &self.settings.links));
        }

        Outcome {
            intent: Intent::Fallback,
            replies,
            admin_notice: None,
        }
    }
}
