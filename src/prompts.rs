use crate::sampler::SampledSet;

/// Persona paragraph that opens the system primer.
pub const PERSONA_PREAMBLE: &str = "You are a mental health helpline assistant. \
You respond with empathy and understanding. \
Learn from these examples, especially you will be the agent who responds to the client.\n\n";

/// Instruction paragraph that closes the system primer.
pub const CLOSING_INSTRUCTION: &str = "When the user sends a message, reply as an empathetic helpline agent. \
Keep responses concise, supportive, and aligned with the style shown in the examples. \
Ask clarifying questions when necessary.";

/// Marker that precedes every example's agent label.
pub const RESPONSE_MARKER: &str = "Agent's response:";

/// Render the sampled examples between the persona and closing paragraphs.
///
/// Surrounding whitespace on each field is stripped; empty fields render as
/// empty lines.
pub fn build_system_primer(sampled: &SampledSet) -> String {
    let mut primer = String::from(PERSONA_PREAMBLE);

    for example in sampled {
        primer.push_str("Example Conversation:\n");
        primer.push_str(example.dialogue.trim());
        primer.push('\n');
        primer.push_str(RESPONSE_MARKER);
        primer.push(' ');
        primer.push_str(example.label.trim());
        primer.push_str("\n\n");
    }

    primer.push_str(CLOSING_INSTRUCTION);
    primer
}
