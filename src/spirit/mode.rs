use serde::{Deserialize, Serialize};

/// Persona every consultation starts from.
pub const PERSONA: &str = "你是一缕寄宿在数字化玉简中的上古残魂（器灵）。你的言辞古风盎然，充满智慧，习惯使用修仙小说中的隐喻、术语（如道友、本座、机缘、因果、心魔等）。你称呼用户为'道友'或'小友'。你的目标是辅助用户完善他们的'经文'（笔记）。请始终使用中文回答。";

const POLISH_SUFFIX: &str = " 用户希望你润色他们的文字，使其更加精妙玄奥，宛如无上真经，用词考究，意境深远。";
const EXPAND_SUFFIX: &str = " 用户希望你根据现有的感悟进行推演，补充更多的大道至理，扩展其内涵，解释其中蕴含的天地法则。";

pub const DEFAULT_POLISH_PROMPT: &str = "请润色这段经文，使其更具道蕴。";
pub const DEFAULT_EXPAND_PROMPT: &str = "请推演这段感悟，阐述其中深意。";

/// Shown when the consultation panel opens, before any request.
pub const GREETING: &str = "道友有何困惑？本座愿为你指点迷津。";

/// Returned when the provider answers with no text.
pub const SILENT_REPLY: &str = "天机不可泄露...";

/// Returned for every failure: missing key, transport, provider error.
pub const FALLBACK_REPLY: &str = "神识连接中断，恐有天魔干扰。（API Error）";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsultMode {
    #[default]
    Chat,
    Polish,
    Expand,
}

impl ConsultMode {
    /// Persona plus the mode-specific charge.
    pub fn system_instruction(&self) -> String {
        let suffix = match self {
            ConsultMode::Chat => "",
            ConsultMode::Polish => POLISH_SUFFIX,
            ConsultMode::Expand => EXPAND_SUFFIX,
        };
        format!("{}{}", PERSONA, suffix)
    }

    /// The prompt to send, or `None` when there is nothing to ask.
    ///
    /// Chat needs a non-blank question. Polish and expand fall back to a
    /// stock request only when the prompt is empty; anything typed is sent.
    pub fn resolve_prompt(&self, prompt: &str) -> Option<String> {
        match self {
            ConsultMode::Chat if prompt.trim().is_empty() => None,
            ConsultMode::Polish if prompt.is_empty() => Some(DEFAULT_POLISH_PROMPT.to_string()),
            ConsultMode::Expand if prompt.is_empty() => Some(DEFAULT_EXPAND_PROMPT.to_string()),
            _ => Some(prompt.to_string()),
        }
    }

    /// Whether a reply in this mode is meant to be written back into the scroll.
    pub fn rewrites_scroll(&self) -> bool {
        !matches!(self, ConsultMode::Chat)
    }
}

impl std::fmt::Display for ConsultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsultMode::Chat => write!(f, "chat"),
            ConsultMode::Polish => write!(f, "polish"),
            ConsultMode::Expand => write!(f, "expand"),
        }
    }
}

impl std::str::FromStr for ConsultMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" | "请教" => Ok(ConsultMode::Chat),
            "polish" | "润色" => Ok(ConsultMode::Polish),
            "expand" | "推演" => Ok(ConsultMode::Expand),
            _ => Err(format!("Invalid consult mode: {}", s)),
        }
    }
}

/// Request text: the scroll as context, then the user's ask.
pub fn build_contents(context: &str, prompt: &str) -> String {
    format!(
        "当前经文（背景上下文）:\n{}\n\n道友的请求:\n{}",
        context, prompt
    )
}
