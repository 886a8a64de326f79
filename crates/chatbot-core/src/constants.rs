/// Centralized constants.
/// Endpoints, prompt shaping, timings and file names live here.

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    /// Remote answer service: `POST {"text"}` → `{"response"}`.
    pub const ANSWER_URL: &str = "https://ai.webhunt.ru/ask";
}

// ─── Prompt Shaping ───────────────────────────────────────────────────────────

pub mod prompts {
    /// Appended to every outgoing question. Describes the stack the answers
    /// should target and the answer language.
    pub const CONTEXT_SUFFIX: &str =
        ": стек технологий: PySide6, SQLAlchemy, mysql, ответь на русском";

    /// Prefix put in front of any transport failure shown to the user.
    pub const ERROR_PREFIX: &str = "Ошибка: ";
}

// ─── Template ─────────────────────────────────────────────────────────────────

pub mod template {
    /// Code inserted by the template commands.
    pub const CODE_TEMPLATE: &str = include_str!("../assets/template.py");
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const TYPING_INTERVAL_MS: u64 = 30;
    pub const SERIALIZE_REQUESTS: bool = true;
    pub const PERSIST_HISTORY: bool = true;
    pub const THEME: &str = "dark";
}

// ─── Commands ─────────────────────────────────────────────────────────────────

pub mod commands {
    pub const OPEN_PANEL: &str = "chatbot.openPanel";
    pub const INSERT_TEMPLATE: &str = "chatbot.insertTemplate";
    pub const START_TYPING: &str = "chatbot.startTyping";
    pub const STOP_TYPING: &str = "chatbot.stopTyping";
    pub const RESET_TYPING: &str = "chatbot.resetTyping";
    pub const GENERATE_CODE: &str = "chatbot.generateCode";
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "chatbot";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const VIEW_STATE_FILE: &str = "view_state.json";
    pub const LOG_FILE: &str = "chatbot.log";
}
