use super::types::{ContentPart, OutputItem};

/// Concatenates every `output_text` fragment of every message item, in order.
pub fn collect_output_text(output: &[OutputItem]) -> String {
    let mut text = String::new();
    for item in output {
        if let OutputItem::Message { content } = item {
            append_message_text(content, &mut text);
        }
    }
    text
}

pub fn append_message_text(content: &[ContentPart], out: &mut String) {
    for part in content {
        if let ContentPart::OutputText { text } = part {
            out.push_str(text);
        }
    }
}
