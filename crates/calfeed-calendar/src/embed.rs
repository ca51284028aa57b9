//! Iframe snippets for embedding a public calendar in a web page.

use crate::error::CalendarError;

pub const DEFAULT_EMBED_URL: &str = "https://www.google.com/calendar/embed";

/// Option keys and their query-parameter names, in output order.
const PARAM_NAMES: [(&str, &str); 12] = [
    ("mode", "mode"),
    ("height", "height"),
    ("width", "width"),
    ("bg_color", "bgcolor"),
    ("color", "color"),
    ("show_title", "showTitle"),
    ("show_nav", "showNav"),
    ("show_date", "showDate"),
    ("show_print", "showPrint"),
    ("show_tabs", "showTabs"),
    ("show_calendars", "showCalendars"),
    ("show_timezone", "showTimezone"),
];

/// A loosely typed option value, as supplied through [`EmbedOptions::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Text(String),
    Number(u32),
    Flag(bool),
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl OptionValue {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(n) => n.to_string(),
            Self::Flag(flag) => flag.to_string(),
        }
    }

    fn into_number(self) -> Option<u32> {
        match self {
            Self::Text(text) => text.trim().parse().ok(),
            Self::Number(n) => Some(n),
            Self::Flag(_) => None,
        }
    }

    fn into_flag(self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(flag),
            Self::Number(n) => Some(n != 0),
            Self::Text(text) => match text.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

/// Display options of the embedded calendar view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOptions {
    pub mode: String,
    pub height: u32,
    pub width: u32,
    pub bg_color: String,
    pub color: String,
    pub show_title: bool,
    pub show_nav: bool,
    pub show_date: bool,
    pub show_print: bool,
    pub show_tabs: bool,
    pub show_calendars: bool,
    pub show_timezone: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            mode: "WEEK".to_string(),
            height: 600,
            width: 600,
            bg_color: "#FFFFFF".to_string(),
            color: "#2852A3".to_string(),
            show_title: false,
            show_nav: true,
            show_date: true,
            show_print: true,
            show_tabs: true,
            show_calendars: true,
            show_timezone: true,
        }
    }
}

impl EmbedOptions {
    /// Apply `key => value` pairs over these options.
    ///
    /// Keys use the field names (`bg_color`, `show_nav`, ...). Unknown keys
    /// and values of the wrong shape are dropped.
    pub fn merge<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<OptionValue>,
    {
        for (key, value) in params {
            let key = key.as_ref();
            if !self.apply(key, value.into()) {
                tracing::debug!(key, "dropping embed option");
            }
        }
        self
    }

    fn apply(&mut self, key: &str, value: OptionValue) -> bool {
        fn set<T>(slot: &mut T, value: Option<T>) -> bool {
            match value {
                Some(value) => {
                    *slot = value;
                    true
                }
                None => false,
            }
        }

        match key {
            "mode" => set(&mut self.mode, Some(value.into_text())),
            "height" => set(&mut self.height, value.into_number()),
            "width" => set(&mut self.width, value.into_number()),
            "bg_color" => set(&mut self.bg_color, Some(value.into_text())),
            "color" => set(&mut self.color, Some(value.into_text())),
            "show_title" => set(&mut self.show_title, value.into_flag()),
            "show_nav" => set(&mut self.show_nav, value.into_flag()),
            "show_date" => set(&mut self.show_date, value.into_flag()),
            "show_print" => set(&mut self.show_print, value.into_flag()),
            "show_tabs" => set(&mut self.show_tabs, value.into_flag()),
            "show_calendars" => set(&mut self.show_calendars, value.into_flag()),
            "show_timezone" => set(&mut self.show_timezone, value.into_flag()),
            _ => false,
        }
    }

    fn param_value(&self, key: &str) -> String {
        let flag = |on: bool| String::from(if on { "1" } else { "0" });
        match key {
            "mode" => self.mode.clone(),
            "height" => self.height.to_string(),
            "width" => self.width.to_string(),
            "bg_color" => self.bg_color.clone(),
            "color" => self.color.clone(),
            "show_title" => flag(self.show_title),
            "show_nav" => flag(self.show_nav),
            "show_date" => flag(self.show_date),
            "show_print" => flag(self.show_print),
            "show_tabs" => flag(self.show_tabs),
            "show_calendars" => flag(self.show_calendars),
            "show_timezone" => flag(self.show_timezone),
            _ => String::new(),
        }
    }

    /// `name=value` pairs in service parameter names, values percent-encoded.
    pub fn query_pairs(&self) -> Vec<String> {
        PARAM_NAMES
            .iter()
            .map(|(key, name)| format!("{}={}", name, urlencoding::encode(&self.param_value(key))))
            .collect()
    }
}

/// Iframe for calendar `id` against the default embed endpoint.
pub fn to_iframe(id: &str, options: &EmbedOptions) -> Result<String, CalendarError> {
    iframe_at(DEFAULT_EMBED_URL, id, options)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Iframe for calendar `id` against `embed_url`.
pub fn iframe_at(embed_url: &str, id: &str, options: &EmbedOptions) -> Result<String, CalendarError> {
    if id.trim().is_empty() {
        return Err(CalendarError::MissingId);
    }

    Ok(format!(
        "<iframe src='{}?src={}&amp;{}' width='{}' height='{}' frameborder='0' scrolling='no'></iframe>",
        embed_url,
        html_escape(id),
        options.query_pairs().join("&amp;"),
        options.width,
        options.height,
    ))
}
