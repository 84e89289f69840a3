use agentic_clock::clock::ClockSample;
use chrono::{DateTime, Utc};

const GLOBE: &str = "\u{1F310}";

/// Terminal rendition of the clock screen: live time, globe, echoed text.
pub struct ClockView {
    current_time: DateTime<Utc>,
    text_content: String,
}

impl ClockView {
    pub fn new(current_time: DateTime<Utc>) -> Self {
        ClockView {
            current_time,
            text_content: "Hello, world!".to_string(),
        }
    }

    pub fn set_time(&mut self, sample: ClockSample) {
        self.current_time = sample.timestamp();
    }

    pub fn set_text(&mut self, text: String) {
        self.text_content = text;
    }

    pub fn render(&self) -> String {
        format!(
            "{}  {}  {}",
            self.current_time.format("%H:%M:%S"),
            GLOBE,
            self.text_content
        )
    }
}
