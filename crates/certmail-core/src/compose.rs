//! Notice text.

/// Completion, correction window and farewell paragraphs shared by every
/// notice.
const CLOSING_PARAGRAPHS: [&str; 4] = [
    "您已順利完成本次課程，並依規定完成所有作品繳交，寄發電子課程證書，以茲證明。",
    "如您發現證書內容有誤或無法順利下載，請於 7 日內回信通知，我們將協助您更正或補發。",
    "再次感謝您的投入與參與，我們期待未來與您在更多課程中再次相見，共同開啟更多 AI 學習與實作的可能！",
    "敬祝 學習順利！",
];

/// Builds the subject and body of a certificate notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageComposer {
    course_name: String,
    signature: Option<String>,
}

impl MessageComposer {
    /// Creates a composer for `course_name`.
    #[must_use]
    pub fn new(course_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            signature: None,
        }
    }

    /// Appends `signature` as the final paragraph of every body.
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        let signature = signature.into();
        self.signature = Some(signature).filter(|s| !s.trim().is_empty());
        self
    }

    /// The course this composer writes about.
    #[must_use]
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    /// `「{course}」課程證書寄發通知`, marked in test mode.
    #[must_use]
    pub fn build_subject(&self, test_mode: bool) -> String {
        let mut subject = format!("「{}」課程證書寄發通知", self.course_name);
        if test_mode {
            subject.push_str(" (測試模式)");
        }
        subject
    }

    /// Personalized body for `name`.
    ///
    /// In test mode the body names the address the message was redirected to.
    #[must_use]
    pub fn build_body(&self, name: &str, test_mode: bool, test_recipient: Option<&str>) -> String {
        let mut paragraphs = vec![format!("{name} 同學，您好：")];

        if let (true, Some(recipient)) = (test_mode, test_recipient) {
            paragraphs.push(format!("(此為測試模式郵件，實際寄送至 {recipient})"));
        }

        paragraphs.push(format!(
            "感謝您參加「{}」課程，我們很高興與您一同探索 AI 的應用，見證您的學習成長與成果！",
            self.course_name
        ));
        paragraphs.extend(CLOSING_PARAGRAPHS.iter().map(ToString::to_string));

        if let Some(signature) = &self.signature {
            paragraphs.push(signature.clone());
        }

        let mut body = paragraphs.join("\n\n");
        body.push('\n');
        body
    }
}
