use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Broken,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Broken => "broken",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Text,
    Json,
}

impl AttachmentKind {
    pub fn mime(&self) -> &'static str {
        match self {
            AttachmentKind::Text => "text/plain",
            AttachmentKind::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AttachmentKind::Text => ".txt",
            AttachmentKind::Json => ".json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub label: String,
    pub content: String,
    pub kind: AttachmentKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct StepRecord {
    pub title: String,
    pub status: Status,
    pub start: i64,
    pub stop: i64,
    pub attachments: Vec<Attachment>,
    pub steps: Vec<StepRecord>,
}

impl StepRecord {
    pub(super) fn started(title: String, start: i64) -> Self {
        Self {
            title,
            status: Status::Passed,
            start,
            stop: start,
            attachments: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Depth-first search by title, including nested steps.
    pub fn find(&self, title: &str) -> Option<&StepRecord> {
        if self.title == title {
            return Some(self);
        }
        self.steps.iter().find_map(|step| step.find(title))
    }

    pub fn attachment(&self, label: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.label == label)
    }
}

/// Everything recorded for one scenario, ready to publish.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub uuid: String,
    pub name: String,
    pub full_name: String,
    pub status: Status,
    pub message: Option<String>,
    pub labels: Vec<Label>,
    pub start: i64,
    pub stop: i64,
    pub steps: Vec<StepRecord>,
    pub attachments: Vec<Attachment>,
}

impl TestResult {
    pub fn duration_ms(&self) -> i64 {
        (self.stop - self.start).max(0)
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    pub fn find_step(&self, title: &str) -> Option<&StepRecord> {
        self.steps.iter().find_map(|step| step.find(title))
    }

    /// Every attachment in the result, top level first, then steps in order.
    pub fn all_attachments(&self) -> Vec<&Attachment> {
        fn collect<'a>(steps: &'a [StepRecord], out: &mut Vec<&'a Attachment>) {
            for step in steps {
                out.extend(step.attachments.iter());
                collect(&step.steps, out);
            }
        }

        let mut out: Vec<&Attachment> = self.attachments.iter().collect();
        collect(&self.steps, &mut out);
        out
    }
}
