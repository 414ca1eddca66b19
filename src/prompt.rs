use crate::types::GenerateRequest;

pub const DEFAULT_MODEL: &str = "gpt-4o";

pub const SYSTEM_PROMPT: &str = "You are a document analysis expert. Analyze documents to \
identify fillable fields that users would need to complete. Return only valid JSON.";

const PROMPT_PREAMBLE: &str = "Analyze this document and identify all fillable fields that \
would typically need to be completed by a user.

Document content:
";

const PROMPT_INSTRUCTIONS: &str = r#"

Please identify fields such as:
- Names (first name, last name, full name)
- Addresses (street, city, state, zip)
- Contact information (phone, email)
- Dates (birth date, signature date, etc.)
- Numbers (SSN, ID numbers, amounts)
- Text fields (descriptions, comments)
- Checkboxes or selections

For each field found, provide a JSON response in this exact format:
{
  "fields": [
    {
      "name": "field_name",
      "type": "text|number|date|email|phone|address|checkbox",
      "description": "Brief description of what this field is for",
      "placeholder": "[[FIELD_NAME]]",
      "required": true|false
    }
  ]
}

Only return the JSON, no other text."#;

/// Embeds the document verbatim between the fixed preamble and the output-format instructions.
pub fn build_prompt(document_text: &str) -> String {
    let mut prompt = String::with_capacity(
        PROMPT_PREAMBLE.len() + document_text.len() + PROMPT_INSTRUCTIONS.len(),
    );
    prompt.push_str(PROMPT_PREAMBLE);
    prompt.push_str(document_text);
    prompt.push_str(PROMPT_INSTRUCTIONS);
    prompt
}

pub fn build_request(model: &str, document_text: &str) -> GenerateRequest {
    GenerateRequest {
        model: model.to_string(),
        system: SYSTEM_PROMPT.to_string(),
        prompt: build_prompt(document_text),
    }
}
